use glam::{Vec2, Vec3};
use joint_mover::camera3d::OrthoProjection;
use joint_mover::gizmo::{Axis, HandleId, HandleKind, HandleSign};
use joint_mover::grasp::ToolState;
use joint_mover::input::{HandFrame, HandleEvent, PointerInput};
use joint_mover::{FrameInput, ManipulationError, Workbench};

fn approx(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() < 1e-4
}

fn assert_vec3_eq(actual: Vec3, expected: Vec3) {
    assert!((actual - expected).abs().max_element() < 1e-4, "expected {expected:?}, got {actual:?}");
}

/// Palms `spread_mm` apart along x, centred on the origin.
fn hands(spread_mm: f32) -> HandFrame {
    HandFrame::with_palms(&[Vec3::new(-spread_mm / 2.0, 0.0, 0.0), Vec3::new(spread_mm / 2.0, 0.0, 0.0)])
}

fn update(bench: &mut Workbench, hands: &HandFrame, events: &[HandleEvent]) {
    let mut pointer = PointerInput::new();
    let projection = OrthoProjection::new(Vec2::ZERO, 100.0, 10.0);
    bench.update(FrameInput { pointer: &mut pointer, hands, handle_events: events, projection: &projection });
}

fn translation(bench: &Workbench, axis: Axis, sign: HandleSign) -> HandleId {
    bench.grasp().handle_id(HandleKind::Translation { axis, sign }).expect("standard handle")
}

fn selected_link(bench: &mut Workbench) -> bevy_ecs::entity::Entity {
    let link = bench.spawn_link(Vec3::ZERO);
    bench.set_selected(Some(link));
    link
}

#[test]
fn moves_accumulate_and_flush_once_per_physics_step() {
    let mut bench = Workbench::default();
    let link = selected_link(&mut bench);
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    let step = Vec3::new(0.1, 0.0, 0.0);
    update(
        &mut bench,
        &HandFrame::default(),
        &[HandleEvent::Grasped(pos_x), HandleEvent::Moved(step), HandleEvent::Moved(step)],
    );
    assert_eq!(bench.tool_state(), ToolState::Translating);
    assert_vec3_eq(bench.scene.world_position(link).expect("link"), Vec3::ZERO);

    bench.post_physics();
    assert_vec3_eq(bench.scene.world_position(link).expect("link"), Vec3::new(0.2, 0.0, 0.0));
    assert_vec3_eq(bench.grasp().tool_position(), Vec3::new(0.2, 0.0, 0.0));

    bench.post_physics();
    assert_vec3_eq(bench.scene.world_position(link).expect("link"), Vec3::new(0.2, 0.0, 0.0));
}

#[test]
fn two_hand_scaling_on_x() {
    let mut bench = Workbench::default();
    let link = selected_link(&mut bench);
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    let neg_x = translation(&bench, Axis::X, HandleSign::Neg);

    update(&mut bench, &hands(200.0), &[HandleEvent::Grasped(pos_x), HandleEvent::Grasped(neg_x)]);
    assert_eq!(bench.tool_state(), ToolState::Translating);
    bench.post_physics();
    assert_eq!(bench.tool_state(), ToolState::Scaling);
    let session = bench.grasp().session().expect("session captured");
    assert_eq!(session.axis, Axis::X);
    assert!(approx(session.initial_hand_distance, 0.2));

    update(&mut bench, &hands(300.0), &[]);
    let scale = bench.scene.pose(link).expect("link").scale;
    assert_vec3_eq(scale, Vec3::new(1.1, 1.0, 1.0));

    let pos_x_handle = bench.grasp().handle(pos_x).expect("handle");
    assert_vec3_eq(pos_x_handle.scale, Vec3::new(0.8 / 1.1, 0.8, 0.8 / 1.1));
    let rot_y = bench.grasp().handle_id(HandleKind::Rotation { axis: Axis::Y }).expect("rotation handle");
    assert_vec3_eq(bench.grasp().handle(rot_y).expect("handle").scale, Vec3::new(0.5 / 1.1, 0.5, 0.5));
    let pos_y = translation(&bench, Axis::Y, HandleSign::Pos);
    // Depth follows the y scale for y handles.
    assert_vec3_eq(bench.grasp().handle(pos_y).expect("handle").scale, Vec3::new(0.8 / 1.1, 0.8, 0.8));

    update(&mut bench, &hands(300.0), &[HandleEvent::Released(neg_x)]);
    assert_eq!(bench.tool_state(), ToolState::Translating);
    assert_eq!(bench.grasp().active_axes().as_slice(), &[Axis::X]);
    assert!(bench.grasp().session().is_none());

    update(&mut bench, &hands(300.0), &[HandleEvent::Released(pos_x)]);
    assert_eq!(bench.tool_state(), ToolState::Idle);
    assert!(bench.drain_diagnostics().is_empty());
}

#[test]
fn scaling_waits_for_two_tracked_hands() {
    let mut bench = Workbench::default();
    let link = selected_link(&mut bench);
    let pos_y = translation(&bench, Axis::Y, HandleSign::Pos);
    let neg_y = translation(&bench, Axis::Y, HandleSign::Neg);
    let one_hand = HandFrame::with_palms(&[Vec3::ZERO]);

    update(&mut bench, &one_hand, &[HandleEvent::Grasped(pos_y), HandleEvent::Grasped(neg_y)]);
    bench.post_physics();
    assert_eq!(bench.tool_state(), ToolState::Scaling);
    assert!(bench.grasp().session().is_none());
    update(&mut bench, &one_hand, &[]);
    assert_vec3_eq(bench.scene.pose(link).expect("link").scale, Vec3::ONE);

    update(&mut bench, &hands(100.0), &[]);
    bench.post_physics();
    assert_eq!(bench.grasp().session().map(|session| session.axis), Some(Axis::Y));
    update(&mut bench, &hands(150.0), &[]);
    assert_vec3_eq(bench.scene.pose(link).expect("link").scale, Vec3::new(1.0, 1.05, 1.0));
}

#[test]
fn grasp_scale_never_goes_non_positive() {
    let mut bench = Workbench::default();
    let link = selected_link(&mut bench);
    bench.scene.set_local_scale(link, Vec3::new(0.05, 1.0, 1.0));
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    let neg_x = translation(&bench, Axis::X, HandleSign::Neg);

    update(&mut bench, &hands(200.0), &[HandleEvent::Grasped(pos_x), HandleEvent::Grasped(neg_x)]);
    bench.post_physics();
    // 0.05 + (0.1 - 0.2) is negative.
    update(&mut bench, &hands(100.0), &[]);
    assert_vec3_eq(bench.scene.pose(link).expect("link").scale, Vec3::new(0.05, 1.0, 1.0));
    update(&mut bench, &hands(140.0), &[]);
    assert_vec3_eq(bench.scene.pose(link).expect("link").scale, Vec3::new(0.05, 1.0, 1.0));
}

#[test]
fn z_handles_pair_with_negative_y_only() {
    let mut bench = Workbench::default();
    let link = selected_link(&mut bench);
    let pos_z = translation(&bench, Axis::Z, HandleSign::Pos);
    let neg_z = translation(&bench, Axis::Z, HandleSign::Neg);
    let neg_y = translation(&bench, Axis::Y, HandleSign::Neg);

    // The two z handles never form a scaling pair.
    update(&mut bench, &hands(200.0), &[HandleEvent::Grasped(pos_z), HandleEvent::Grasped(neg_z)]);
    bench.post_physics();
    assert_eq!(bench.tool_state(), ToolState::Translating);
    update(&mut bench, &hands(200.0), &[HandleEvent::Released(neg_z)]);

    // "Pos Z" with "Neg Y" scales along z.
    update(&mut bench, &hands(200.0), &[HandleEvent::Grasped(neg_y)]);
    bench.post_physics();
    assert_eq!(bench.tool_state(), ToolState::Scaling);
    assert_eq!(bench.grasp().session().map(|session| session.axis), Some(Axis::Z));
    update(&mut bench, &hands(400.0), &[]);
    assert_vec3_eq(bench.scene.pose(link).expect("link").scale, Vec3::new(1.0, 1.0, 1.2));
}

#[test]
fn rejected_grasps_are_reported() {
    let mut bench = Workbench::default();
    selected_link(&mut bench);
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    let rot_x = bench.grasp().handle_id(HandleKind::Rotation { axis: Axis::X }).expect("rotation handle");

    update(&mut bench, &HandFrame::default(), &[HandleEvent::Released(pos_x)]);
    update(&mut bench, &HandFrame::default(), &[HandleEvent::Grasped(pos_x), HandleEvent::Grasped(rot_x)]);
    assert_eq!(
        bench.drain_diagnostics(),
        vec![ManipulationError::ReleasedWhileIdle(pos_x), ManipulationError::RotateWhileTranslating]
    );
    assert_eq!(bench.tool_state(), ToolState::Translating);
}

#[test]
fn changing_selection_rebinds_tool() {
    let mut bench = Workbench::default();
    let first = selected_link(&mut bench);
    let second = bench.spawn_link(Vec3::new(2.0, 0.0, 0.0));
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    update(&mut bench, &HandFrame::default(), &[HandleEvent::Grasped(pos_x), HandleEvent::Moved(Vec3::X)]);

    bench.set_selected(Some(second));
    assert_eq!(bench.tool_state(), ToolState::Idle);
    assert_eq!(bench.grasp().target(), Some(second));
    assert_vec3_eq(bench.grasp().tool_position(), Vec3::new(2.0, 0.0, 0.0));
    bench.post_physics();
    assert_vec3_eq(bench.scene.world_position(first).expect("first"), Vec3::ZERO);
    assert_vec3_eq(bench.scene.world_position(second).expect("second"), Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn frame_runs_post_physics_per_fixed_step() {
    let mut bench = Workbench::default();
    let link = selected_link(&mut bench);
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    let mut pointer = PointerInput::new();
    let projection = OrthoProjection::new(Vec2::ZERO, 100.0, 10.0);
    let hands = HandFrame::default();
    let events = [HandleEvent::Grasped(pos_x), HandleEvent::Moved(Vec3::Y)];

    let steps = bench.frame(
        0.045,
        FrameInput { pointer: &mut pointer, hands: &hands, handle_events: &events, projection: &projection },
    );
    assert_eq!(steps, 2);
    // The buffer empties on the first step; the second has nothing left to apply.
    assert_vec3_eq(bench.scene.world_position(link).expect("link"), Vec3::Y);
}

#[test]
fn two_hand_scaling_compensates_children() {
    let mut bench = Workbench::default();
    let joint = bench.spawn_joint(Vec3::ZERO);
    let link = bench.spawn_link(Vec3::new(0.5, 0.0, 0.0));
    bench.set_selected(Some(link));
    bench.attach().expect("link attaches");
    bench.set_selected(Some(joint));
    let pos_x = translation(&bench, Axis::X, HandleSign::Pos);
    let neg_x = translation(&bench, Axis::X, HandleSign::Neg);

    update(&mut bench, &hands(200.0), &[HandleEvent::Grasped(pos_x), HandleEvent::Grasped(neg_x)]);
    bench.post_physics();
    assert_eq!(bench.tool_state(), ToolState::Scaling);
    update(&mut bench, &hands(300.0), &[]);

    assert_vec3_eq(bench.scene.pose(joint).expect("joint").scale, Vec3::new(1.1, 1.0, 1.0));
    assert_vec3_eq(bench.scene.pose(link).expect("link").scale, Vec3::new(1.0 / 1.1, 1.0, 1.0));
    assert!(bench.drain_diagnostics().is_empty());
}
