use anyhow::Result;
use glam::{Vec2, Vec3};
use joint_mover::camera3d::OrthoProjection;
use joint_mover::cli::CliOverrides;
use joint_mover::config::ManipulationConfig;
use joint_mover::input::{HandFrame, HandleEvent, PointerEvent, PointerInput};
use joint_mover::selection::ManipulationMode;
use joint_mover::{FrameInput, Workbench};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};
use winit::event::MouseButton;

const FRAME_DT: f32 = 1.0 / 60.0;
const CONFIG_PATH: &str = "config/manipulation.json";

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = Registry::default().with(env_filter).with(fmt::layer().with_target(true)).try_init() {
        eprintln!("[log] {err}");
    }
}

fn main() {
    init_logging();
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    if let Err(err) = run(cli) {
        tracing::error!("Application error: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: CliOverrides) -> Result<()> {
    let mut config = match cli.config_path() {
        Some(path) => ManipulationConfig::load(path)?,
        None => ManipulationConfig::load_or_default(CONFIG_PATH),
    };
    config.apply_overrides(&cli.into_config_overrides());
    tracing::info!(
        sizing_factor = config.pointer.sizing_factor,
        rotate_speed = config.pointer.rotate_speed_degrees,
        "workbench starting"
    );

    let mut bench = Workbench::new(config);
    let projection = OrthoProjection::new(Vec2::new(400.0, 300.0), 100.0, 10.0);
    let mut pointer = PointerInput::new();
    let hands = HandFrame::default();

    let joint = bench.spawn_joint(Vec3::ZERO);
    let link = bench.spawn_link(Vec3::new(0.5, 0.0, 0.0));
    bench.set_selected(Some(link));
    if let Some(outcome) = bench.attach() {
        tracing::info!(?outcome, "attached");
    }

    // Drag the link to the right in scale mode; the click lands on the node itself.
    bench.set_mode(ManipulationMode::Scale);
    let start = Vec2::new(450.0, 300.0);
    pointer.push(PointerEvent::CursorPos { x: start.x, y: start.y });
    pointer.push(PointerEvent::Button { button: MouseButton::Left, pressed: true, hit: Some(link) });
    for step in 1..=10 {
        let cursor = start + Vec2::new(step as f32 * 6.0, 0.0);
        pointer.push(PointerEvent::CursorPos { x: cursor.x, y: cursor.y });
        run_frame(&mut bench, &mut pointer, &hands, &[], &projection);
    }
    pointer.push(PointerEvent::Button { button: MouseButton::Left, pressed: false, hit: Some(link) });
    run_frame(&mut bench, &mut pointer, &hands, &[], &projection);

    // Spin the joint with its rotation handle.
    bench.set_selected(Some(joint));
    let ring = bench.grasp().handles().iter().find(|handle| handle.kind.translation_axis().is_none()).map(|h| h.id);
    if let Some(ring) = ring {
        let spin = glam::Quat::from_rotation_y(0.1);
        run_frame(&mut bench, &mut pointer, &hands, &[HandleEvent::Grasped(ring)], &projection);
        for _ in 0..5 {
            run_frame(&mut bench, &mut pointer, &hands, &[HandleEvent::Rotated(spin)], &projection);
        }
        run_frame(&mut bench, &mut pointer, &hands, &[HandleEvent::Released(ring)], &projection);
    }

    for node in bench.scene.nodes() {
        if let Some(info) = bench.scene.node_info(node) {
            tracing::info!(?info, "final node");
        }
    }
    for diagnostic in bench.drain_diagnostics() {
        tracing::info!("diagnostic: {diagnostic}");
    }
    Ok(())
}

fn run_frame(
    bench: &mut Workbench,
    pointer: &mut PointerInput,
    hands: &HandFrame,
    handle_events: &[HandleEvent],
    projection: &OrthoProjection,
) {
    bench.frame(FRAME_DT, FrameInput { pointer, hands, handle_events, projection });
}
