use crate::gizmo::HandleId;
use bevy_ecs::prelude::Entity;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Rejected manipulation requests. None of these are fatal: the caller logs them, surfaces
/// them to the user and keeps its current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManipulationError {
    #[error("node {0:?} does not exist")]
    UnknownNode(Entity),
    #[error("nothing is selected")]
    NothingSelected,
    #[error("you need a joint to attach the link to")]
    NoJointAvailable,
    #[error("you need a link to attach the joint to")]
    NoLinkAvailable,
    #[error("link {0:?} is already attached to a joint")]
    AlreadyAttached(Entity),
    #[error("attaching {child:?} under {parent:?} would make it its own ancestor")]
    WouldCreateCycle { child: Entity, parent: Entity },
    #[error("can't rotate a transform while it is already being translated")]
    RotateWhileTranslating,
    #[error("only one handle can be active while a transform is being rotated")]
    GraspWhileRotating,
    #[error("handle {0:?} was released while the tool was already idle")]
    ReleasedWhileIdle(HandleId),
    #[error("handle {0:?} does not belong to this tool")]
    UnknownHandle(HandleId),
}

impl ManipulationError {
    pub fn severity(&self) -> Severity {
        match self {
            ManipulationError::ReleasedWhileIdle(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}
