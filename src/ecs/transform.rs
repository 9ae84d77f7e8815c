use super::{Parent, Pose};
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

/// Upper bound on parent walks; a well-formed tree never gets near it.
pub(crate) const MAX_HIERARCHY_DEPTH: usize = 256;

/// Collects `entity` and its ancestors, nearest first.
pub(crate) fn ancestry(world: &World, entity: Entity) -> SmallVec<[Entity; 16]> {
    let mut chain = SmallVec::new();
    let mut current = Some(entity);
    while let Some(node) = current {
        if chain.len() >= MAX_HIERARCHY_DEPTH {
            break;
        }
        chain.push(node);
        current = world.get::<Parent>(node).map(|parent| parent.0);
    }
    chain
}

pub(crate) fn world_matrix(world: &World, entity: Entity) -> Option<Mat4> {
    world.get::<Pose>(entity)?;
    let chain = ancestry(world, entity);
    let mut matrix = Mat4::IDENTITY;
    for node in chain.iter().rev() {
        let local = world.get::<Pose>(*node).map(Pose::matrix).unwrap_or(Mat4::IDENTITY);
        matrix *= local;
    }
    Some(matrix)
}

pub(crate) fn world_rotation(world: &World, entity: Entity) -> Option<Quat> {
    world.get::<Pose>(entity)?;
    let chain = ancestry(world, entity);
    let mut rotation = Quat::IDENTITY;
    for node in chain.iter().rev() {
        if let Some(pose) = world.get::<Pose>(*node) {
            rotation *= pose.orientation;
        }
    }
    Some(rotation.normalize())
}

/// Expresses a world-space matrix relative to `parent_world`, splitting it back into a pose.
pub(crate) fn pose_relative_to(parent_world: Mat4, child_world: Mat4) -> Pose {
    let local = parent_world.inverse() * child_world;
    let (scale, orientation, position) = local.to_scale_rotation_translation();
    Pose { position, orientation: orientation.normalize(), scale }
}

pub(crate) fn transform_point_inverse(world_matrix: Mat4, point: Vec3) -> Vec3 {
    world_matrix.inverse().transform_point3(point)
}
