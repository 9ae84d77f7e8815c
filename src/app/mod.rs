mod runtime_loop;

use self::runtime_loop::RuntimeLoop;
use crate::camera3d::Projection;
use crate::config::ManipulationConfig;
use crate::ecs::SceneWorld;
use crate::error::ManipulationError;
use crate::events::Diagnostics;
use crate::grasp::{GraspManipulationMachine, ToolState};
use crate::input::{HandFrame, HandleEvent, PointerInput};
use crate::kinematics::{self, AttachOutcome};
use crate::pointer::{PointerManipulationMachine, PointerState};
use crate::selection::{ManipulationMode, SelectionContext};
use bevy_ecs::prelude::Entity;
use glam::{Vec2, Vec3};

/// Everything sampled by the host for one rendered frame.
pub struct FrameInput<'a> {
    pub pointer: &'a mut PointerInput,
    pub hands: &'a HandFrame,
    pub handle_events: &'a [HandleEvent],
    pub projection: &'a dyn Projection,
}

/// Owns the scene, the selection and both manipulation front ends. Driven from a single
/// update loop: [`Workbench::update`] during input handling, then
/// [`Workbench::post_physics`] once per physics step.
pub struct Workbench {
    pub scene: SceneWorld,
    config: ManipulationConfig,
    selection: SelectionContext,
    pointer: PointerManipulationMachine,
    grasp: GraspManipulationMachine,
    diagnostics: Diagnostics,
    runtime: RuntimeLoop,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(ManipulationConfig::default())
    }
}

impl Workbench {
    pub fn new(config: ManipulationConfig) -> Self {
        let mut selection = SelectionContext::new();
        selection.set_mode(config.initial_mode);
        Self {
            scene: SceneWorld::new(),
            pointer: PointerManipulationMachine::new(config.pointer.clone()),
            grasp: GraspManipulationMachine::with_standard_handles(config.grasp.clone()),
            runtime: RuntimeLoop::new(config.runtime.fixed_step_seconds, config.runtime.max_backlog_seconds),
            selection,
            diagnostics: Diagnostics::default(),
            config,
        }
    }

    pub fn config(&self) -> &ManipulationConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionContext {
        &self.selection
    }

    pub fn selected(&self) -> Option<Entity> {
        self.selection.selected()
    }

    pub fn enabled_mode(&self) -> ManipulationMode {
        self.selection.mode()
    }

    pub fn tool_state(&self) -> ToolState {
        self.grasp.state()
    }

    pub fn pointer_state(&self) -> PointerState {
        self.pointer.state()
    }

    pub fn pointer(&self) -> &PointerManipulationMachine {
        &self.pointer
    }

    pub fn grasp(&self) -> &GraspManipulationMachine {
        &self.grasp
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn drain_diagnostics(&mut self) -> Vec<ManipulationError> {
        self.diagnostics.drain()
    }

    pub fn spawn_joint(&mut self, position: Vec3) -> Entity {
        self.scene.spawn_joint(position)
    }

    pub fn spawn_link(&mut self, position: Vec3) -> Entity {
        self.scene.spawn_link(position)
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        if self.selection.is_selected(entity) {
            self.set_selected(None);
        }
        self.scene.remove(entity)
    }

    pub fn set_mode(&mut self, mode: ManipulationMode) {
        self.selection.set_mode(mode);
    }

    /// Changes the selection. Gesture state bound to the previous node is discarded and the
    /// grasp tool is re-pointed at the new one.
    pub fn set_selected(&mut self, node: Option<Entity>) -> bool {
        let node = node.filter(|node| self.scene.contains(*node));
        if !self.selection.set_selected(node) {
            return false;
        }
        if self.pointer.target().is_some() && self.pointer.target() != node {
            self.pointer.cancel();
        }
        self.grasp.bind(&self.scene, node);
        tracing::debug!(?node, "selection changed");
        true
    }

    /// Attaches the selected node to its nearest partner; failures become one diagnostic.
    pub fn attach(&mut self) -> Option<AttachOutcome> {
        match kinematics::attach(&mut self.scene, self.selection.selected()) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                self.diagnostics.report(err);
                None
            }
        }
    }

    /// Input/update phase: pointer gestures, hand samples, scaling and handle notifications.
    pub fn update(&mut self, frame: FrameInput<'_>) {
        let FrameInput { pointer, hands, handle_events, projection } = frame;

        if let Some(press) = pointer.take_press() {
            if let Some(hit) = press.hit {
                self.set_selected(Some(hit));
                self.pointer.begin_drag(&self.scene, &self.selection, press);
            }
        }
        if self.pointer.state() == PointerState::Dragging && pointer.left_held() {
            let cursor = pointer.cursor_position().unwrap_or(Vec2::ZERO);
            self.pointer.drag(&mut self.scene, &self.selection, cursor, pointer.mouse_delta(), projection);
        }
        if pointer.take_release() {
            self.pointer.end_drag();
        }
        pointer.clear_frame();

        self.grasp.update(&mut self.scene, hands);
        for event in handle_events {
            self.grasp.handle_event(*event, &mut self.diagnostics);
        }
    }

    /// Application phase; runs after each physics step.
    pub fn post_physics(&mut self) {
        self.grasp.post_physics(&mut self.scene);
    }

    /// Runs one rendered frame: the update phase followed by as many post-physics phases as
    /// `dt` covers. Returns the number of physics steps taken.
    pub fn frame(&mut self, dt: f32, frame: FrameInput<'_>) -> usize {
        self.update(frame);
        if let Some(dropped) = self.runtime.advance(dt) {
            tracing::debug!(dropped, "physics backlog dropped");
        }
        let mut steps = 0;
        while self.runtime.pop_fixed_step().is_some() {
            self.post_physics();
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_the_selected_node_clears_selection() {
        let mut bench = Workbench::default();
        let joint = bench.spawn_joint(Vec3::ZERO);
        assert!(bench.set_selected(Some(joint)));
        assert_eq!(bench.grasp().target(), Some(joint));
        assert!(bench.remove(joint));
        assert_eq!(bench.selected(), None);
        assert_eq!(bench.grasp().target(), None);
    }

    #[test]
    fn selecting_a_missing_node_selects_nothing() {
        let mut bench = Workbench::default();
        let joint = bench.spawn_joint(Vec3::ZERO);
        bench.scene.remove(joint);
        assert!(!bench.set_selected(Some(joint)));
        assert_eq!(bench.selected(), None);
    }
}
