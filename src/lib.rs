pub mod app;
pub mod camera3d;
pub mod cli;
pub mod config;
pub mod ecs;
pub mod error;
pub mod events;
pub mod gizmo;
pub mod grasp;
pub mod input;
pub mod kinematics;
pub mod pointer;
pub mod scale_compensation;
pub mod selection;

pub use app::{FrameInput, Workbench};
pub use error::ManipulationError;
