use crate::gizmo::{
    DEFAULT_DEVICE_UNITS_PER_SCENE_UNIT, DEFAULT_POINTER_AXIS_SENSITIVITY, DEFAULT_ROTATE_SPEED_DEGREES,
    DEFAULT_ROTATION_HANDLE_SCALE, DEFAULT_SIZING_FACTOR, DEFAULT_TRANSLATION_HANDLE_SCALE,
};
use crate::selection::ManipulationMode;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct PointerConfig {
    #[serde(default = "PointerConfig::default_sizing_factor")]
    pub sizing_factor: f32,
    #[serde(default = "PointerConfig::default_rotate_speed_degrees")]
    pub rotate_speed_degrees: f32,
    #[serde(default = "PointerConfig::default_axis_sensitivity")]
    pub axis_sensitivity: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraspConfig {
    #[serde(default = "GraspConfig::default_device_units_per_scene_unit")]
    pub device_units_per_scene_unit: f32,
    #[serde(default = "GraspConfig::default_translation_handle_scale")]
    pub translation_handle_scale: f32,
    #[serde(default = "GraspConfig::default_rotation_handle_scale")]
    pub rotation_handle_scale: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "RuntimeConfig::default_fixed_step_seconds")]
    pub fixed_step_seconds: f32,
    #[serde(default = "RuntimeConfig::default_max_backlog_seconds")]
    pub max_backlog_seconds: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ManipulationConfig {
    #[serde(default)]
    pub pointer: PointerConfig,
    #[serde(default)]
    pub grasp: GraspConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub initial_mode: ManipulationMode,
}

#[derive(Debug, Clone, Default)]
pub struct ManipulationConfigOverrides {
    pub sizing_factor: Option<f32>,
    pub rotate_speed_degrees: Option<f32>,
}

impl PointerConfig {
    fn default_sizing_factor() -> f32 {
        DEFAULT_SIZING_FACTOR
    }

    fn default_rotate_speed_degrees() -> f32 {
        DEFAULT_ROTATE_SPEED_DEGREES
    }

    fn default_axis_sensitivity() -> f32 {
        DEFAULT_POINTER_AXIS_SENSITIVITY
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            sizing_factor: Self::default_sizing_factor(),
            rotate_speed_degrees: Self::default_rotate_speed_degrees(),
            axis_sensitivity: Self::default_axis_sensitivity(),
        }
    }
}

impl GraspConfig {
    fn default_device_units_per_scene_unit() -> f32 {
        DEFAULT_DEVICE_UNITS_PER_SCENE_UNIT
    }

    fn default_translation_handle_scale() -> f32 {
        DEFAULT_TRANSLATION_HANDLE_SCALE
    }

    fn default_rotation_handle_scale() -> f32 {
        DEFAULT_ROTATION_HANDLE_SCALE
    }
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            device_units_per_scene_unit: Self::default_device_units_per_scene_unit(),
            translation_handle_scale: Self::default_translation_handle_scale(),
            rotation_handle_scale: Self::default_rotation_handle_scale(),
        }
    }
}

impl RuntimeConfig {
    const fn default_fixed_step_seconds() -> f32 {
        0.02
    }

    const fn default_max_backlog_seconds() -> f32 {
        0.25
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fixed_step_seconds: Self::default_fixed_step_seconds(),
            max_backlog_seconds: Self::default_max_backlog_seconds(),
        }
    }
}

impl ManipulationConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ManipulationConfigOverrides) {
        if let Some(sizing_factor) = overrides.sizing_factor {
            self.pointer.sizing_factor = sizing_factor;
        }
        if let Some(rotate_speed) = overrides.rotate_speed_degrees {
            self.pointer.rotate_speed_degrees = rotate_speed;
        }
    }
}

impl ManipulationConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.sizing_factor.is_none() && self.rotate_speed_degrees.is_none()
    }
}
