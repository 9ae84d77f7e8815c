//! Two-handed, handle-based manipulation for tracked hands.
//!
//! Handle widgets report grasps, releases and per-event deltas. Deltas are buffered during
//! the update phase and flushed onto the target once per physics step in [`post_physics`],
//! so several notifications in one frame never apply partially or twice.
//!
//! [`post_physics`]: GraspManipulationMachine::post_physics

use crate::config::GraspConfig;
use crate::ecs::SceneWorld;
use crate::error::ManipulationError;
use crate::events::Diagnostics;
use crate::gizmo::{propose_axis_scale, Axis, HandleId, HandleKind, HandleSign, DEGENERATE_DISTANCE};
use crate::input::{HandFrame, HandleEvent};
use crate::scale_compensation::compensate_children;
use bevy_ecs::prelude::Entity;
use glam::{Quat, Vec3};
use smallvec::SmallVec;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    Translating,
    Rotating,
    Scaling,
}

impl ToolState {
    pub fn label(self) -> &'static str {
        match self {
            ToolState::Idle => "Idle",
            ToolState::Translating => "Translating",
            ToolState::Rotating => "Rotating",
            ToolState::Scaling => "Scaling",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraspHandle {
    pub id: HandleId,
    pub kind: HandleKind,
    /// Offset from the tool origin, in tool space.
    pub offset: Vec3,
    pub visible: bool,
    pub active: bool,
    /// Cosmetic widget scale, kept inverse to the target's scale while scaling.
    pub scale: Vec3,
}

/// State captured when two handles on one axis start a scaling gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingSession {
    pub axis: Axis,
    pub initial_scale: Vec3,
    /// Scene units.
    pub initial_hand_distance: f32,
    pub handles: (HandleId, HandleId),
}

#[derive(Debug)]
pub struct GraspManipulationMachine {
    config: GraspConfig,
    target: Option<Entity>,
    tool_position: Vec3,
    tool_rotation: Quat,
    handles: Vec<GraspHandle>,
    state: ToolState,
    active: BTreeSet<HandleId>,
    move_buffer: Vec3,
    rotate_buffer: Quat,
    scaling_axis: Option<Axis>,
    session: Option<ScalingSession>,
    hands: HandFrame,
}

impl GraspManipulationMachine {
    pub fn new(config: GraspConfig) -> Self {
        Self {
            config,
            target: None,
            tool_position: Vec3::ZERO,
            tool_rotation: Quat::IDENTITY,
            handles: Vec::new(),
            state: ToolState::Idle,
            active: BTreeSet::new(),
            move_buffer: Vec3::ZERO,
            rotate_buffer: Quat::IDENTITY,
            scaling_axis: None,
            session: None,
            hands: HandFrame::default(),
        }
    }

    /// Six translation handles (±x, ±y, ±z) followed by one rotation handle per axis.
    pub fn with_standard_handles(config: GraspConfig) -> Self {
        let mut tool = Self::new(config);
        for axis in Axis::ALL {
            tool.add_handle(HandleKind::Translation { axis, sign: HandleSign::Pos }, axis.unit());
            tool.add_handle(HandleKind::Translation { axis, sign: HandleSign::Neg }, -axis.unit());
        }
        for axis in Axis::ALL {
            let ring_offset = axis.unit() * 0.75 + Vec3::splat(0.25);
            tool.add_handle(HandleKind::Rotation { axis }, ring_offset);
        }
        tool
    }

    pub fn add_handle(&mut self, kind: HandleKind, offset: Vec3) -> HandleId {
        let id = HandleId(self.handles.len());
        let scale = match kind {
            HandleKind::Translation { .. } => Vec3::splat(self.config.translation_handle_scale),
            HandleKind::Rotation { .. } => Vec3::splat(self.config.rotation_handle_scale),
        };
        self.handles.push(GraspHandle { id, kind, offset, visible: false, active: false, scale });
        id
    }

    pub fn handle_id(&self, kind: HandleKind) -> Option<HandleId> {
        self.handles.iter().find(|handle| handle.kind == kind).map(|handle| handle.id)
    }

    pub fn handle(&self, id: HandleId) -> Option<&GraspHandle> {
        self.handles.get(id.0)
    }

    pub fn handles(&self) -> &[GraspHandle] {
        &self.handles
    }

    pub fn state(&self) -> ToolState {
        self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn session(&self) -> Option<&ScalingSession> {
        self.session.as_ref()
    }

    pub fn tool_position(&self) -> Vec3 {
        self.tool_position
    }

    pub fn tool_rotation(&self) -> Quat {
        self.tool_rotation
    }

    pub fn active_handles(&self) -> impl Iterator<Item = HandleId> + '_ {
        self.active.iter().copied()
    }

    /// Translation axes of the currently grasped handles, in x, y, z order.
    pub fn active_axes(&self) -> SmallVec<[Axis; 3]> {
        let grasped: SmallVec<[Axis; 6]> = self
            .active
            .iter()
            .filter_map(|id| self.handle(*id))
            .filter_map(|handle| handle.kind.translation_axis())
            .collect();
        Axis::ALL.into_iter().filter(|axis| grasped.contains(axis)).collect()
    }

    pub fn handle_world_position(&self, id: HandleId) -> Option<Vec3> {
        self.handle(id).map(|handle| self.tool_position + self.tool_rotation * handle.offset)
    }

    /// Points the tool at `target` (or nothing), discarding every in-flight gesture.
    pub fn bind(&mut self, scene: &SceneWorld, target: Option<Entity>) {
        self.cancel();
        self.target = target.filter(|target| scene.contains(*target));
        if let Some(target) = self.target {
            self.tool_position = scene.world_position(target).unwrap_or(Vec3::ZERO);
            self.tool_rotation = scene.world_rotation(target).unwrap_or(Quat::IDENTITY);
        }
    }

    pub fn cancel(&mut self) {
        if self.state != ToolState::Idle {
            tracing::debug!(from = self.state.label(), "grasp gesture cancelled");
        }
        for handle in &mut self.handles {
            handle.active = false;
        }
        self.active.clear();
        self.state = ToolState::Idle;
        self.move_buffer = Vec3::ZERO;
        self.rotate_buffer = Quat::IDENTITY;
        self.scaling_axis = None;
        self.session = None;
    }

    pub fn handle_event(&mut self, event: HandleEvent, diagnostics: &mut Diagnostics) {
        let result = match event {
            HandleEvent::Grasped(id) => self.notify_handle_grasped(id),
            HandleEvent::Released(id) => self.notify_handle_released(id),
            HandleEvent::Moved(delta) => {
                self.notify_handle_movement(delta);
                Ok(())
            }
            HandleEvent::Rotated(delta) => {
                self.notify_handle_rotation(delta);
                Ok(())
            }
        };
        if let Err(err) = result {
            diagnostics.report(err);
        }
    }

    pub fn notify_handle_movement(&mut self, delta: Vec3) {
        self.move_buffer += delta;
    }

    pub fn notify_handle_rotation(&mut self, delta: Quat) {
        self.rotate_buffer = delta * self.rotate_buffer;
    }

    pub fn notify_handle_grasped(&mut self, id: HandleId) -> Result<(), ManipulationError> {
        let kind = self.handle(id).ok_or(ManipulationError::UnknownHandle(id))?.kind;
        match (self.state, kind) {
            (ToolState::Idle, HandleKind::Translation { .. }) => self.set_state(ToolState::Translating),
            (ToolState::Idle, HandleKind::Rotation { .. }) => self.set_state(ToolState::Rotating),
            (ToolState::Translating | ToolState::Scaling, HandleKind::Translation { .. }) => {}
            (ToolState::Translating | ToolState::Scaling, HandleKind::Rotation { .. }) => {
                return Err(ManipulationError::RotateWhileTranslating);
            }
            (ToolState::Rotating, _) => return Err(ManipulationError::GraspWhileRotating),
        }
        self.active.insert(id);
        if let Some(handle) = self.handles.get_mut(id.0) {
            handle.active = true;
        }
        tracing::trace!(handle = %kind.name(), "handle grasped");
        Ok(())
    }

    pub fn notify_handle_released(&mut self, id: HandleId) -> Result<(), ManipulationError> {
        let handle = self.handles.get_mut(id.0).ok_or(ManipulationError::UnknownHandle(id))?;
        handle.active = false;
        self.active.remove(&id);
        let state = self.state;
        match state {
            ToolState::Idle => return Err(ManipulationError::ReleasedWhileIdle(id)),
            _ if self.active.is_empty() => {
                self.end_scaling();
                self.set_state(ToolState::Idle);
            }
            ToolState::Scaling => {
                self.end_scaling();
                self.set_state(ToolState::Translating);
            }
            _ => {}
        }
        Ok(())
    }

    /// Update phase: record the hand sample, refresh handle visibility and apply scaling.
    pub fn update(&mut self, scene: &mut SceneWorld, hands: &HandFrame) {
        self.hands = hands.clone();
        self.update_handle_visibility();
        self.scale_target(scene);
    }

    /// Application phase, once per physics step.
    pub fn post_physics(&mut self, scene: &mut SceneWorld) {
        self.detect_scaling(scene);
        if let Some(target) = self.target.filter(|target| scene.contains(*target)) {
            match self.state {
                ToolState::Rotating => {
                    scene.rotate_world(target, self.rotate_buffer);
                    self.tool_rotation = scene.world_rotation(target).unwrap_or(self.tool_rotation);
                }
                ToolState::Translating => {
                    scene.translate_world(target, self.move_buffer);
                    self.tool_position = scene.world_position(target).unwrap_or(self.tool_position);
                }
                ToolState::Scaling | ToolState::Idle => {}
            }
        }
        self.move_buffer = Vec3::ZERO;
        self.rotate_buffer = Quat::IDENTITY;
    }

    fn set_state(&mut self, next: ToolState) {
        if self.state != next {
            tracing::debug!(from = self.state.label(), to = next.label(), "grasp tool state");
            self.state = next;
        }
    }

    fn end_scaling(&mut self) {
        self.scaling_axis = None;
        self.session = None;
    }

    fn update_handle_visibility(&mut self) {
        match self.state {
            ToolState::Idle => {
                let mut closest: Option<(HandleId, f32)> = None;
                for hover in &self.hands.hovers {
                    if self.handle(hover.handle).is_none() {
                        continue;
                    }
                    match closest {
                        Some((_, best)) if hover.distance >= best => {}
                        _ => closest = Some((hover.handle, hover.distance)),
                    }
                }
                let closest = closest.map(|(id, _)| id);
                for handle in &mut self.handles {
                    handle.visible = Some(handle.id) == closest;
                }
            }
            ToolState::Translating | ToolState::Scaling => {
                for handle in &mut self.handles {
                    handle.visible = matches!(handle.kind, HandleKind::Translation { .. });
                }
            }
            ToolState::Rotating => {
                for handle in &mut self.handles {
                    handle.visible = handle.active;
                }
            }
        }
    }

    /// Looks for exactly two grasped handles that pair on one scale axis.
    fn paired_axis(&self) -> Option<(Axis, HandleId, HandleId)> {
        if self.active.len() != 2 {
            return None;
        }
        let mut counts = [0u8; 3];
        let mut first: [Option<HandleId>; 3] = [None; 3];
        let mut chosen = None;
        for id in &self.active {
            let Some(handle) = self.handle(*id) else {
                continue;
            };
            for axis in Axis::ALL {
                if !handle.kind.scale_axes()[axis.index()] {
                    continue;
                }
                let slot = axis.index();
                counts[slot] += 1;
                match counts[slot] {
                    1 => first[slot] = Some(*id),
                    2 => chosen = first[slot].map(|one| (axis, one, *id)),
                    _ => {}
                }
            }
        }
        chosen
    }

    fn detect_scaling(&mut self, scene: &SceneWorld) {
        match self.paired_axis() {
            Some((axis, one, two)) => {
                // A different pair on the same axis starts over from the current scale.
                if self.scaling_axis != Some(axis) || self.session.is_some_and(|s| s.handles != (one, two)) {
                    self.session = None;
                }
                self.scaling_axis = Some(axis);
                self.set_state(ToolState::Scaling);
                if self.session.is_none() {
                    self.session = self.capture_session(scene, axis, one, two);
                }
            }
            None => {
                if self.state == ToolState::Scaling {
                    self.set_state(if self.active.is_empty() { ToolState::Idle } else { ToolState::Translating });
                }
                self.end_scaling();
            }
        }
    }

    fn capture_session(&self, scene: &SceneWorld, axis: Axis, one: HandleId, two: HandleId) -> Option<ScalingSession> {
        let target = self.target?;
        let initial_scale = scene.pose(target)?.scale;
        let initial_hand_distance = self.hands.two_hand_distance(self.config.device_units_per_scene_unit)?;
        if initial_hand_distance <= DEGENERATE_DISTANCE {
            return None;
        }
        let session = ScalingSession { axis, initial_scale, initial_hand_distance, handles: (one, two) };
        tracing::debug!(axis = axis.label(), initial_hand_distance, "scaling session started");
        Some(session)
    }

    fn scale_target(&mut self, scene: &mut SceneWorld) {
        if self.state != ToolState::Scaling {
            return;
        }
        let (Some(session), Some(target)) = (self.session, self.target) else {
            return;
        };
        let Some(distance) = self.hands.two_hand_distance(self.config.device_units_per_scene_unit) else {
            return;
        };
        let Some(current) = scene.pose(target).map(|pose| pose.scale) else {
            return;
        };
        let axis = session.axis;
        let candidate = axis.component(session.initial_scale) + (distance - session.initial_hand_distance);
        let next = propose_axis_scale(current, axis, candidate).unwrap_or(current);
        self.rescale_handles(next);
        if next != current {
            compensate_children(scene, target, next);
        }
    }

    /// Keeps handle widgets a constant apparent size. Translation handles divide their depth
    /// by the scale along their own axis so the arrows stay equally thick.
    fn rescale_handles(&mut self, target_scale: Vec3) {
        let translation = Vec3::splat(self.config.translation_handle_scale);
        let rotation = Vec3::splat(self.config.rotation_handle_scale);
        for handle in &mut self.handles {
            handle.scale = match handle.kind {
                HandleKind::Translation { axis, .. } => {
                    let mut scale = translation / target_scale;
                    scale.z = translation.z / axis.component(target_scale);
                    scale
                }
                HandleKind::Rotation { .. } => rotation / target_scale,
            };
        }
    }
}
