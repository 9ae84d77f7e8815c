use super::transform::{self, ancestry};
use super::{Children, Linkage, Locks, NodeInfo, NodeKind, Parent, Pose, SpawnCounter, SpawnOrder};
use crate::error::ManipulationError;
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

/// Arena of manipulable nodes. Entities are the opaque handles; parent/child relations are
/// stored as components and kept as mutual inverses by every mutating method here.
pub struct SceneWorld {
    pub world: World,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(SpawnCounter::default());
        Self { world }
    }

    pub fn spawn_joint(&mut self, position: Vec3) -> Entity {
        self.spawn_node(NodeKind::Joint, Pose::at(position))
    }

    pub fn spawn_link(&mut self, position: Vec3) -> Entity {
        self.spawn_node(NodeKind::Link, Pose::at(position))
    }

    pub fn spawn_node(&mut self, kind: NodeKind, pose: Pose) -> Entity {
        let order = {
            let mut counter = self.world.resource_mut::<SpawnCounter>();
            counter.0 += 1;
            counter.0
        };
        let entity = self
            .world
            .spawn((pose, kind, Locks::default(), Linkage::default(), Children::default(), SpawnOrder(order)))
            .id();
        tracing::debug!(?entity, kind = kind.label(), "spawned node");
        entity
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<Pose>(entity).is_some()
    }

    pub fn kind(&self, entity: Entity) -> Option<NodeKind> {
        self.world.get::<NodeKind>(entity).copied()
    }

    pub fn pose(&self, entity: Entity) -> Option<Pose> {
        self.world.get::<Pose>(entity).copied()
    }

    pub fn locks(&self, entity: Entity) -> Option<Locks> {
        self.world.get::<Locks>(entity).copied()
    }

    pub fn linkage(&self, entity: Entity) -> Option<Linkage> {
        self.world.get::<Linkage>(entity).cloned()
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<Parent>(entity).map(|parent| parent.0)
    }

    pub fn children(&self, entity: Entity) -> SmallVec<[Entity; 4]> {
        self.world.get::<Children>(entity).map(|children| children.0.clone()).unwrap_or_default()
    }

    pub fn node_info(&self, entity: Entity) -> Option<NodeInfo> {
        Some(NodeInfo {
            entity,
            kind: self.kind(entity)?,
            pose: self.pose(entity)?,
            locks: self.locks(entity)?,
            parent: self.parent(entity),
        })
    }

    /// All live nodes in spawn order.
    pub fn nodes(&self) -> Vec<Entity> {
        let mut ordered: Vec<(SpawnOrder, Entity)> = self
            .world
            .iter_entities()
            .filter_map(|entity_ref| entity_ref.get::<SpawnOrder>().map(|order| (*order, entity_ref.id())))
            .collect();
        ordered.sort_by_key(|(order, _)| *order);
        ordered.into_iter().map(|(_, entity)| entity).collect()
    }

    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        transform::world_matrix(&self.world, entity)
    }

    pub fn world_position(&self, entity: Entity) -> Option<Vec3> {
        self.world_matrix(entity).map(|matrix| matrix.w_axis.truncate())
    }

    pub fn world_rotation(&self, entity: Entity) -> Option<Quat> {
        transform::world_rotation(&self.world, entity)
    }

    /// Maps a world-space point into the node's local frame (scale included).
    pub fn inverse_transform_point(&self, entity: Entity, point: Vec3) -> Option<Vec3> {
        self.world_matrix(entity).map(|matrix| transform::transform_point_inverse(matrix, point))
    }

    pub fn set_pose(&mut self, entity: Entity, pose: Pose) -> bool {
        if let Some(mut current) = self.world.get_mut::<Pose>(entity) {
            *current = pose;
            true
        } else {
            false
        }
    }

    pub fn set_local_position(&mut self, entity: Entity, position: Vec3) -> bool {
        if let Some(mut pose) = self.world.get_mut::<Pose>(entity) {
            pose.position = position;
            true
        } else {
            false
        }
    }

    pub fn set_local_scale(&mut self, entity: Entity, scale: Vec3) -> bool {
        if let Some(mut pose) = self.world.get_mut::<Pose>(entity) {
            pose.scale = scale;
            true
        } else {
            false
        }
    }

    pub fn set_orientation(&mut self, entity: Entity, orientation: Quat) -> bool {
        if let Some(mut pose) = self.world.get_mut::<Pose>(entity) {
            pose.orientation = orientation.normalize();
            true
        } else {
            false
        }
    }

    pub fn set_world_position(&mut self, entity: Entity, position: Vec3) -> bool {
        let local = match self.parent(entity).and_then(|parent| self.world_matrix(parent)) {
            Some(parent_world) => parent_world.inverse().transform_point3(position),
            None => position,
        };
        self.set_local_position(entity, local)
    }

    pub fn translate_world(&mut self, entity: Entity, delta: Vec3) -> bool {
        match self.world_position(entity) {
            Some(current) => self.set_world_position(entity, current + delta),
            None => false,
        }
    }

    /// Applies `delta` in world space, on the left of the node's current world rotation.
    pub fn rotate_world(&mut self, entity: Entity, delta: Quat) -> bool {
        let parent_rotation =
            self.parent(entity).and_then(|parent| self.world_rotation(parent)).unwrap_or(Quat::IDENTITY);
        if let Some(mut pose) = self.world.get_mut::<Pose>(entity) {
            let local_delta = parent_rotation.inverse() * delta * parent_rotation;
            pose.orientation = (local_delta * pose.orientation).normalize();
            true
        } else {
            false
        }
    }

    pub fn set_locks(&mut self, entity: Entity, locks: Locks) -> bool {
        if let Some(mut current) = self.world.get_mut::<Locks>(entity) {
            *current = locks;
            true
        } else {
            false
        }
    }

    pub(crate) fn update_linkage(&mut self, entity: Entity, edit: impl FnOnce(&mut Linkage)) -> bool {
        if let Some(mut linkage) = self.world.get_mut::<Linkage>(entity) {
            edit(&mut linkage);
            true
        } else {
            false
        }
    }

    /// Topmost ancestor reached by following parent references.
    pub fn kinematic_root(&self, entity: Entity) -> Option<Entity> {
        if !self.contains(entity) {
            return None;
        }
        ancestry(&self.world, entity).last().copied()
    }

    /// True when `ancestor` is `node` itself or sits anywhere above it.
    pub fn is_ancestor_or_self(&self, ancestor: Entity, node: Entity) -> bool {
        ancestry(&self.world, node).contains(&ancestor)
    }

    /// Moves `child` under `new_parent` (or to the root) keeping its world pose.
    pub fn reparent(&mut self, child: Entity, new_parent: Option<Entity>) -> Result<(), ManipulationError> {
        if !self.contains(child) {
            return Err(ManipulationError::UnknownNode(child));
        }
        if let Some(parent) = new_parent {
            if !self.contains(parent) {
                return Err(ManipulationError::UnknownNode(parent));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(ManipulationError::WouldCreateCycle { child, parent });
            }
        }
        let child_world = self.world_matrix(child).ok_or(ManipulationError::UnknownNode(child))?;
        let parent_world = new_parent.and_then(|parent| self.world_matrix(parent));

        self.unlink_from_parent(child);
        let mut pose = match parent_world {
            Some(parent_world) => transform::pose_relative_to(parent_world, child_world),
            None => transform::pose_relative_to(Mat4::IDENTITY, child_world),
        };
        if pose.scale.is_nan() || pose.position.is_nan() {
            pose = self.pose(child).unwrap_or_default();
        }
        self.set_pose(child, pose);
        if let Some(parent) = new_parent {
            self.world.entity_mut(child).insert(Parent(parent));
            if let Some(mut children) = self.world.get_mut::<Children>(parent) {
                if !children.0.contains(&child) {
                    children.0.push(child);
                }
            }
        }
        Ok(())
    }

    pub fn detach(&mut self, child: Entity) -> Result<(), ManipulationError> {
        self.reparent(child, None)
    }

    fn unlink_from_parent(&mut self, child: Entity) {
        if let Some(old_parent) = self.parent(child) {
            if let Some(mut siblings) = self.world.get_mut::<Children>(old_parent) {
                siblings.0.retain(|sibling| *sibling != child);
            }
            self.world.entity_mut(child).remove::<Parent>();
        }
    }

    /// Removes a node. Children are detached first, keep their world pose and lose their
    /// locks; robot linkage pointing at the node is cleared. A joint whose link is removed
    /// no longer drives a child and becomes free to translate again.
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        for child in self.children(entity) {
            if let Err(err) = self.detach(child) {
                tracing::warn!("failed to detach {child:?} from removed node: {err}");
            }
            self.set_locks(child, Locks::default());
        }
        let partner_joint = self.linkage(entity).and_then(|linkage| linkage.parent_joint);
        if let Some(joint) = partner_joint {
            if self.linkage(joint).and_then(|linkage| linkage.child_link) == Some(entity) {
                let locks = self.locks(joint).unwrap_or_default();
                self.set_locks(joint, Locks { translation: false, ..locks });
            }
        }
        self.unlink_from_parent(entity);
        let others: Vec<Entity> = self.nodes().into_iter().filter(|other| *other != entity).collect();
        for other in others {
            self.update_linkage(other, |linkage| {
                if linkage.parent_joint == Some(entity) {
                    linkage.parent_joint = None;
                }
                if linkage.parent_link == Some(entity) {
                    linkage.parent_link = None;
                }
                if linkage.child_link == Some(entity) {
                    linkage.child_link = None;
                }
                linkage.child_joints.retain(|joint| *joint != entity);
            });
        }
        let removed = self.world.despawn(entity);
        if removed {
            tracing::debug!(?entity, "removed node");
        }
        removed
    }
}
