use glam::Vec3;

/// Pointer drag sensitivity applied to scale gestures.
pub const DEFAULT_SIZING_FACTOR: f32 = 0.4;
/// Degrees of rotation per pointer-axis unit.
pub const DEFAULT_ROTATE_SPEED_DEGREES: f32 = 5.0;
/// Pointer-axis units per pixel of pointer motion.
pub const DEFAULT_POINTER_AXIS_SENSITIVITY: f32 = 0.1;
/// Hand-tracking devices report millimetres.
pub const DEFAULT_DEVICE_UNITS_PER_SCENE_UNIT: f32 = 1000.0;
pub const DEFAULT_TRANSLATION_HANDLE_SCALE: f32 = 0.8;
pub const DEFAULT_ROTATION_HANDLE_SCALE: f32 = 0.5;
pub const DEGENERATE_DISTANCE: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn component(self, v: Vec3) -> f32 {
        v[self.index()]
    }

    pub fn with_component(self, mut v: Vec3, value: f32) -> Vec3 {
        v[self.index()] = value;
        v
    }
}

/// Axis with the largest absolute component, scanning x, y, z with a strict `>` against a
/// running maximum that starts at zero. Equal magnitudes keep the earlier axis; an all-zero
/// vector has no dominant axis.
pub fn dominant_axis(v: Vec3) -> Option<Axis> {
    let mut best = 0.0_f32;
    let mut chosen = None;
    for axis in Axis::ALL {
        let magnitude = axis.component(v).abs();
        if magnitude > best {
            best = magnitude;
            chosen = Some(axis);
        }
    }
    chosen
}

/// Replaces one scale component, refusing results that are not strictly positive.
pub fn propose_axis_scale(current: Vec3, axis: Axis, candidate: f32) -> Option<Vec3> {
    if candidate > 0.0 && candidate.is_finite() {
        Some(axis.with_component(current, candidate))
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleSign {
    Pos,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Translation { axis: Axis, sign: HandleSign },
    Rotation { axis: Axis },
}

impl HandleKind {
    pub fn name(self) -> String {
        match self {
            HandleKind::Translation { axis, sign } => {
                let sign = match sign {
                    HandleSign::Pos => "Pos",
                    HandleSign::Neg => "Neg",
                };
                format!("Translate {sign} {}", axis.label())
            }
            HandleKind::Rotation { axis } => format!("Rotate {}", axis.label()),
        }
    }

    pub fn translation_axis(self) -> Option<Axis> {
        match self {
            HandleKind::Translation { axis, .. } => Some(axis),
            HandleKind::Rotation { .. } => None,
        }
    }

    /// Scale axes a grasped handle counts towards when pairing two handles.
    ///
    /// The z group accepts "Translate Pos Z" and "Translate Neg Y" (not "Neg Z"), so a
    /// `-y` handle counts for both y and z and `+z/-z` never pairs. Kept until product
    /// decides what the z pairing should be.
    pub fn scale_axes(self) -> [bool; 3] {
        use HandleSign::{Neg, Pos};
        match self {
            HandleKind::Translation { axis: Axis::X, .. } => [true, false, false],
            HandleKind::Translation { axis: Axis::Y, sign: Pos } => [false, true, false],
            HandleKind::Translation { axis: Axis::Y, sign: Neg } => [false, true, true],
            HandleKind::Translation { axis: Axis::Z, sign: Pos } => [false, false, true],
            HandleKind::Translation { axis: Axis::Z, sign: Neg } => [false, false, false],
            HandleKind::Rotation { .. } => [false, false, false],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_axis_prefers_earlier_axis_on_ties() {
        assert_eq!(dominant_axis(Vec3::new(0.5, -0.5, 0.2)), Some(Axis::X));
        assert_eq!(dominant_axis(Vec3::new(0.1, 0.7, -0.7)), Some(Axis::Y));
        assert_eq!(dominant_axis(Vec3::new(0.0, 0.0, -0.3)), Some(Axis::Z));
        assert_eq!(dominant_axis(Vec3::ZERO), None);
    }

    #[test]
    fn non_positive_scales_are_refused() {
        let current = Vec3::new(1.0, 2.0, 3.0);
        for candidate in [0.0, -0.001, -5.0, f32::NAN] {
            assert_eq!(propose_axis_scale(current, Axis::Y, candidate), None);
        }
        assert_eq!(propose_axis_scale(current, Axis::Y, 0.5), Some(Vec3::new(1.0, 0.5, 3.0)));
    }

    #[test]
    fn handle_names_match_scene_naming() {
        let handle = HandleKind::Translation { axis: Axis::X, sign: HandleSign::Neg };
        assert_eq!(handle.name(), "Translate Neg X");
    }
}
