use crate::gizmo::HandleId;
use bevy_ecs::prelude::Entity;
use glam::{Quat, Vec2, Vec3};
use smallvec::SmallVec;
use winit::event::MouseButton;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// `hit` is the node under the cursor as reported by the host's hit test.
    Button { button: MouseButton, pressed: bool, hit: Option<Entity> },
    CursorPos { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPress {
    pub screen: Vec2,
    pub hit: Option<Entity>,
}

/// Pointer state accumulated over one frame.
#[derive(Debug, Default)]
pub struct PointerInput {
    cursor_pos: Option<Vec2>,
    mouse_delta: Vec2,
    left_pressed: bool,
    press: Option<PointerPress>,
    released: bool,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ev: PointerEvent) {
        match ev {
            PointerEvent::CursorPos { x, y } => {
                let next = Vec2::new(x, y);
                if let Some(previous) = self.cursor_pos {
                    self.mouse_delta += next - previous;
                }
                self.cursor_pos = Some(next);
            }
            PointerEvent::Button { button: MouseButton::Left, pressed, hit } => {
                if pressed {
                    self.left_pressed = true;
                    self.press = Some(PointerPress { screen: self.cursor_pos.unwrap_or(Vec2::ZERO), hit });
                } else {
                    self.left_pressed = false;
                    self.released = true;
                }
            }
            PointerEvent::Button { .. } => {}
        }
    }

    pub fn clear_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.press = None;
        self.released = false;
    }

    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_pos
    }

    /// Cursor motion in pixels since the last `clear_frame`.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    pub fn left_held(&self) -> bool {
        self.left_pressed
    }

    pub fn take_press(&mut self) -> Option<PointerPress> {
        self.press.take()
    }

    pub fn take_release(&mut self) -> bool {
        let was = self.released;
        self.released = false;
        was
    }
}

/// A tracked controller hovering one of the tool's handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverSample {
    pub handle: HandleId,
    pub distance: f32,
}

/// One frame of hand-tracking data.
#[derive(Debug, Clone, Default)]
pub struct HandFrame {
    /// Palm positions of the tracked hands in device units (millimetres).
    pub palms: SmallVec<[Vec3; 2]>,
    pub hovers: SmallVec<[HoverSample; 4]>,
}

impl HandFrame {
    pub fn with_palms(palms: &[Vec3]) -> Self {
        Self { palms: palms.iter().copied().collect(), hovers: SmallVec::new() }
    }

    /// Distance between the first two palms converted to scene units.
    pub fn two_hand_distance(&self, device_units_per_scene_unit: f32) -> Option<f32> {
        match self.palms.as_slice() {
            [first, second, ..] => {
                let scale = 1.0 / device_units_per_scene_unit;
                Some((*first * scale).distance(*second * scale))
            }
            _ => None,
        }
    }
}

/// Notifications sent by handle widgets; the only way they talk to the grasp machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleEvent {
    Grasped(HandleId),
    Released(HandleId),
    Moved(Vec3),
    Rotated(Quat),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_motion_accumulates_until_cleared() {
        let mut input = PointerInput::new();
        input.push(PointerEvent::CursorPos { x: 10.0, y: 10.0 });
        input.push(PointerEvent::CursorPos { x: 14.0, y: 7.0 });
        input.push(PointerEvent::CursorPos { x: 15.0, y: 7.0 });
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, -3.0));
        input.clear_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        assert_eq!(input.cursor_position(), Some(Vec2::new(15.0, 7.0)));
    }

    #[test]
    fn press_and_release_are_consumed_once() {
        let mut input = PointerInput::new();
        input.push(PointerEvent::CursorPos { x: 3.0, y: 4.0 });
        input.push(PointerEvent::Button { button: MouseButton::Left, pressed: true, hit: None });
        assert!(input.left_held());
        assert_eq!(input.take_press(), Some(PointerPress { screen: Vec2::new(3.0, 4.0), hit: None }));
        assert_eq!(input.take_press(), None);
        input.push(PointerEvent::Button { button: MouseButton::Left, pressed: false, hit: None });
        assert!(input.take_release());
        assert!(!input.take_release());
    }

    #[test]
    fn hand_distance_uses_device_units() {
        let frame = HandFrame::with_palms(&[Vec3::new(-100.0, 0.0, 0.0), Vec3::new(100.0, 0.0, 0.0)]);
        let distance = frame.two_hand_distance(1000.0).expect("two hands");
        assert!((distance - 0.2).abs() < 1e-6);
        assert_eq!(HandFrame::default().two_hand_distance(1000.0), None);
    }
}
