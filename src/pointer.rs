//! Mouse-driven manipulation of the selected node.

use crate::camera3d::Projection;
use crate::config::PointerConfig;
use crate::ecs::{NodeKind, SceneWorld};
use crate::gizmo::{dominant_axis, propose_axis_scale, Axis};
use crate::input::PointerPress;
use crate::scale_compensation::compensate_children;
use crate::selection::{ManipulationMode, SelectionContext};
use bevy_ecs::prelude::Entity;
use glam::{Quat, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerState {
    #[default]
    Idle,
    Dragging,
}

/// Captured on pointer-down in scale mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleGesture {
    pub start_screen: Vec2,
    pub initial_scale: Vec3,
    /// World position of the edge that stays put while the node grows.
    pub initial_edge: Vec3,
    /// `(local, world)` axes, frozen the first frame the pointer moves.
    pub axes: Option<(Axis, Axis)>,
}

#[derive(Debug, Default)]
pub struct PointerManipulationMachine {
    config: PointerConfig,
    state: PointerState,
    target: Option<Entity>,
    scale: Option<ScaleGesture>,
}

impl PointerManipulationMachine {
    pub fn new(config: PointerConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn scale_gesture(&self) -> Option<&ScaleGesture> {
        self.scale.as_ref()
    }

    /// Drops any in-flight drag without touching the scene.
    pub fn cancel(&mut self) {
        if self.state == PointerState::Dragging {
            tracing::debug!(node = ?self.target, "pointer drag cancelled");
        }
        self.state = PointerState::Idle;
        self.target = None;
        self.scale = None;
    }

    /// Pointer-down over `press.hit`. The caller selects the hit node first.
    pub fn begin_drag(&mut self, scene: &SceneWorld, selection: &SelectionContext, press: PointerPress) {
        let Some(hit) = press.hit.filter(|hit| scene.contains(*hit)) else {
            return;
        };
        self.cancel();
        self.state = PointerState::Dragging;
        self.target = Some(hit);
        if selection.mode() == ManipulationMode::Scale && selection.is_selected(hit) {
            if let (Some(pose), Some(world)) = (scene.pose(hit), scene.world_position(hit)) {
                self.scale = Some(ScaleGesture {
                    start_screen: press.screen,
                    initial_scale: pose.scale,
                    initial_edge: world - pose.scale / 2.0,
                    axes: None,
                });
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.state = PointerState::Idle;
        self.target = None;
        self.scale = None;
    }

    /// One frame of an active drag.
    pub fn drag(
        &mut self,
        scene: &mut SceneWorld,
        selection: &SelectionContext,
        cursor: Vec2,
        mouse_delta: Vec2,
        projection: &dyn Projection,
    ) {
        if self.state != PointerState::Dragging {
            return;
        }
        let Some(target) = self.target.filter(|target| scene.contains(*target)) else {
            self.cancel();
            return;
        };
        match selection.mode() {
            ManipulationMode::Translate => self.translate(scene, target, cursor, projection),
            ManipulationMode::Rotate => {
                if selection.is_selected(target) {
                    self.rotate(scene, target, mouse_delta);
                }
            }
            ManipulationMode::Scale => {
                if selection.is_selected(target) {
                    self.scale(scene, target, cursor, projection);
                }
            }
            ManipulationMode::Move => {}
        }
    }

    fn translate(&self, scene: &mut SceneWorld, target: Entity, cursor: Vec2, projection: &dyn Projection) {
        let locks = scene.locks(target).unwrap_or_default();
        // A locked node drags its whole assembly; depth is taken from the root being moved.
        let moving = if locks.any() { scene.kinematic_root(target).unwrap_or(target) } else { target };
        let Some(anchor) = scene.world_position(moving) else {
            return;
        };
        let depth = projection.world_to_screen(anchor).z;
        let pointer_world = projection.screen_to_world(cursor.extend(depth));
        scene.set_world_position(moving, pointer_world);
    }

    fn rotate(&self, scene: &mut SceneWorld, target: Entity, mouse_delta: Vec2) {
        if mouse_delta == Vec2::ZERO {
            return;
        }
        let speed = self.config.rotate_speed_degrees.to_radians() * self.config.axis_sensitivity;
        // Screen y grows downward; pitch follows the pointer moving up.
        let rot_x = mouse_delta.x * speed;
        let rot_y = -mouse_delta.y * speed;
        let yaw = Quat::from_axis_angle(Vec3::Y, -rot_x);
        let pitch = Quat::from_axis_angle(Vec3::X, rot_y);

        let locks = scene.locks(target).unwrap_or_default();
        match scene.kind(target) {
            Some(NodeKind::Joint) => {
                scene.rotate_world(target, yaw);
                if !locks.rotation {
                    scene.rotate_world(target, pitch);
                }
            }
            Some(NodeKind::Link) if !locks.translation => {
                scene.rotate_world(target, yaw);
                scene.rotate_world(target, pitch);
            }
            Some(NodeKind::Link) => {
                let parent_joint = scene
                    .linkage(target)
                    .and_then(|linkage| linkage.parent_joint)
                    .or_else(|| scene.parent(target));
                let Some(joint) = parent_joint else {
                    return;
                };
                scene.rotate_world(joint, yaw);
                if !scene.locks(joint).unwrap_or_default().rotation {
                    scene.rotate_world(joint, pitch);
                }
            }
            None => {}
        }
    }

    fn scale(&mut self, scene: &mut SceneWorld, target: Entity, cursor: Vec2, projection: &dyn Projection) {
        let Some(mut gesture) = self.scale else {
            return;
        };
        if cursor == gesture.start_screen {
            return;
        }
        let Some(node_world) = scene.world_position(target) else {
            return;
        };
        let depth = projection.world_to_screen(node_world).z;
        let pointer_world = projection.screen_to_world(cursor.extend(depth));
        let offset = pointer_world - node_world;

        match gesture.axes {
            None => {
                let local_hit = scene.inverse_transform_point(target, pointer_world).unwrap_or(Vec3::ZERO);
                let local_axis = dominant_axis(local_hit).unwrap_or_default();
                let world_axis = dominant_axis(offset).unwrap_or_default();
                gesture.axes = Some((local_axis, world_axis));
                tracing::debug!(node = ?target, local = local_axis.label(), world = world_axis.label(), "scale axes chosen");
                self.apply_scale(scene, target, &gesture, local_axis, world_axis.component(offset));
            }
            Some((local_axis, world_axis)) => {
                self.apply_scale(scene, target, &gesture, local_axis, world_axis.component(offset));
                let (Some(pose), Some(mut position)) = (scene.pose(target), scene.world_position(target)) else {
                    return;
                };
                let pinned = world_axis.component(gesture.initial_edge) + world_axis.component(pose.scale) / 2.0;
                position = world_axis.with_component(position, pinned);
                scene.set_world_position(target, position);
            }
        }
        self.scale = Some(gesture);
    }

    fn apply_scale(&self, scene: &mut SceneWorld, target: Entity, gesture: &ScaleGesture, axis: Axis, amount: f32) {
        let Some(current) = scene.pose(target).map(|pose| pose.scale) else {
            return;
        };
        let candidate = axis.component(gesture.initial_scale) + amount * self.config.sizing_factor;
        match propose_axis_scale(current, axis, candidate) {
            Some(next) => {
                compensate_children(scene, target, next);
            }
            None => tracing::trace!(node = ?target, candidate, "non-positive scale ignored"),
        }
    }
}
