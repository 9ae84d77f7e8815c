//! Attach protocol that assembles joints and links into a kinematic tree.
//!
//! Nearest-node searches scan every live node on each call, which is fine for hand-built
//! robots of a few dozen parts.

use crate::ecs::{Locks, NodeKind, SceneWorld};
use crate::error::ManipulationError;
use bevy_ecs::prelude::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// A link now hangs under a joint; both are translation-locked.
    LinkToJoint { link: Entity, joint: Entity },
    /// A joint now hangs under a link and chains to that link's joint, if it has one.
    JointToLink { joint: Entity, link: Entity, parent_joint: Option<Entity> },
}

fn nearest_matching(scene: &SceneWorld, from: Entity, accept: impl Fn(NodeKind, Locks) -> bool) -> Option<Entity> {
    let origin = scene.world_position(from)?;
    let mut closest: Option<(Entity, f32)> = None;
    for candidate in scene.nodes() {
        if candidate == from {
            continue;
        }
        let (Some(kind), Some(locks)) = (scene.kind(candidate), scene.locks(candidate)) else {
            continue;
        };
        if !accept(kind, locks) {
            continue;
        }
        let Some(position) = scene.world_position(candidate) else {
            continue;
        };
        let distance = origin.distance(position);
        match closest {
            Some((_, best)) if distance >= best => {}
            _ => closest = Some((candidate, distance)),
        }
    }
    closest.map(|(entity, _)| entity)
}

/// Closest joint that is not translation-locked. Ties go to the earliest spawned.
pub fn nearest_unlocked_joint(scene: &SceneWorld, from: Entity) -> Option<Entity> {
    nearest_matching(scene, from, |kind, locks| kind == NodeKind::Joint && !locks.translation)
}

pub fn nearest_link(scene: &SceneWorld, from: Entity) -> Option<Entity> {
    nearest_matching(scene, from, |kind, _| kind == NodeKind::Link)
}

/// Attaches the selected node to its nearest eligible partner.
///
/// On any error nothing in the scene has been modified.
pub fn attach(scene: &mut SceneWorld, selected: Option<Entity>) -> Result<AttachOutcome, ManipulationError> {
    let selected = selected.ok_or(ManipulationError::NothingSelected)?;
    let kind = scene.kind(selected).ok_or(ManipulationError::UnknownNode(selected))?;
    let locks = scene.locks(selected).unwrap_or_default();
    match kind {
        NodeKind::Link => {
            if locks.translation {
                return Err(ManipulationError::AlreadyAttached(selected));
            }
            let joint = nearest_unlocked_joint(scene, selected).ok_or(ManipulationError::NoJointAvailable)?;
            scene.reparent(selected, Some(joint))?;
            scene.update_linkage(joint, |linkage| linkage.child_link = Some(selected));
            scene.update_linkage(selected, |linkage| linkage.parent_joint = Some(joint));
            scene.set_locks(selected, Locks { translation: true, ..locks });
            let joint_locks = scene.locks(joint).unwrap_or_default();
            scene.set_locks(joint, Locks { translation: true, ..joint_locks });
            tracing::info!(?selected, ?joint, "link attached to joint");
            Ok(AttachOutcome::LinkToJoint { link: selected, joint })
        }
        NodeKind::Joint => {
            let link = nearest_link(scene, selected).ok_or(ManipulationError::NoLinkAvailable)?;
            let parent_joint = scene.linkage(link).and_then(|linkage| linkage.parent_joint);
            let previous_joint = scene.linkage(selected).and_then(|linkage| linkage.parent_joint);
            scene.reparent(selected, Some(link))?;
            if let Some(previous) = previous_joint.filter(|previous| Some(*previous) != parent_joint) {
                scene.update_linkage(previous, |linkage| linkage.child_joints.retain(|joint| *joint != selected));
            }
            scene.update_linkage(selected, |linkage| {
                linkage.parent_joint = parent_joint;
                linkage.parent_link = Some(link);
            });
            if let Some(parent_joint) = parent_joint {
                scene.update_linkage(parent_joint, |linkage| {
                    if !linkage.child_joints.contains(&selected) {
                        linkage.child_joints.push(selected);
                    }
                });
            }
            scene.set_locks(selected, Locks { rotation: true, ..locks });
            tracing::info!(?selected, ?link, ?parent_joint, "joint attached to link");
            Ok(AttachOutcome::JointToLink { joint: selected, link, parent_joint })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn nearest_joint_tie_goes_to_first_spawned() {
        let mut scene = SceneWorld::new();
        let first = scene.spawn_joint(Vec3::new(-1.0, 0.0, 0.0));
        let _second = scene.spawn_joint(Vec3::new(1.0, 0.0, 0.0));
        let link = scene.spawn_link(Vec3::ZERO);
        assert_eq!(nearest_unlocked_joint(&scene, link), Some(first));
    }

    #[test]
    fn locked_joints_are_skipped() {
        let mut scene = SceneWorld::new();
        let near = scene.spawn_joint(Vec3::new(0.5, 0.0, 0.0));
        let far = scene.spawn_joint(Vec3::new(4.0, 0.0, 0.0));
        let link = scene.spawn_link(Vec3::ZERO);
        scene.set_locks(near, Locks { translation: true, rotation: false });
        assert_eq!(nearest_unlocked_joint(&scene, link), Some(far));
    }
}
