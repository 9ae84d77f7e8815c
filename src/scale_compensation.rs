//! Reciprocal child scaling.
//!
//! When a node's local scale changes, each direct child's local scale is divided by the new
//! parent scale, and the same rule is applied one level down using the child's adjusted scale
//! as the divisor for the grandchildren. Because that divisor is the child's *local* scale
//! rather than the change in its world scale, deep chains drift (shrink or grow) on repeated
//! gestures. Callers rely on the current numbers, so the rule is kept as is.

use crate::ecs::SceneWorld;
use bevy_ecs::prelude::Entity;
use glam::Vec3;

fn usable_divisor(scale: Vec3) -> bool {
    scale.is_finite() && scale.x != 0.0 && scale.y != 0.0 && scale.z != 0.0
}

/// Sets `node`'s local scale to `new_scale` after rescaling its descendants.
///
/// Returns `false` without touching anything when the node is missing or `new_scale` has a
/// zero or non-finite component.
pub fn compensate_children(scene: &mut SceneWorld, node: Entity, new_scale: Vec3) -> bool {
    if !scene.contains(node) || !usable_divisor(new_scale) {
        return false;
    }
    for child in scene.children(node) {
        rescale_subtree(scene, child, new_scale);
    }
    scene.set_local_scale(node, new_scale)
}

fn rescale_subtree(scene: &mut SceneWorld, node: Entity, divisor: Vec3) {
    let Some(pose) = scene.pose(node) else {
        return;
    };
    let adjusted = pose.scale / divisor;
    scene.set_local_scale(node, adjusted);
    if !usable_divisor(adjusted) {
        return;
    }
    for child in scene.children(node) {
        rescale_subtree(scene, child, adjusted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_component_is_refused() {
        let mut scene = SceneWorld::new();
        let joint = scene.spawn_joint(Vec3::ZERO);
        assert!(!compensate_children(&mut scene, joint, Vec3::new(0.0, 1.0, 1.0)));
        assert_eq!(scene.pose(joint).map(|pose| pose.scale), Some(Vec3::ONE));
    }

    #[test]
    fn childless_node_just_takes_the_scale() {
        let mut scene = SceneWorld::new();
        let link = scene.spawn_link(Vec3::ZERO);
        assert!(compensate_children(&mut scene, link, Vec3::new(1.0, 3.0, 1.0)));
        assert_eq!(scene.pose(link).map(|pose| pose.scale), Some(Vec3::new(1.0, 3.0, 1.0)));
    }
}
