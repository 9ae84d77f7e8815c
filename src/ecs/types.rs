use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use smallvec::SmallVec;

/// Local pose of a node relative to its parent (or the world when unparented).
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self { position: Vec3::ZERO, orientation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position)
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Joint,
    Link,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Joint => "joint",
            NodeKind::Link => "link",
        }
    }
}

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Locks {
    /// Position is driven by the parent; drags move the whole assembly instead.
    pub translation: bool,
    /// One rotational degree of freedom (pitch) is ceded to the parent.
    pub rotation: bool,
}

impl Locks {
    pub fn any(&self) -> bool {
        self.translation || self.rotation
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

#[derive(Component, Clone, Debug, Default)]
pub struct Children(pub SmallVec<[Entity; 4]>);

/// Robot-level relations between joints and links. These sit next to the scene graph
/// because a joint attached to a link names the link's joint as its parent joint.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct Linkage {
    pub parent_joint: Option<Entity>,
    pub parent_link: Option<Entity>,
    pub child_link: Option<Entity>,
    pub child_joints: SmallVec<[Entity; 2]>,
}

/// Monotonic spawn counter; nearest-node searches enumerate in this order.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);

#[derive(Resource, Default)]
pub struct SpawnCounter(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeInfo {
    pub entity: Entity,
    pub kind: NodeKind,
    pub pose: Pose,
    pub locks: Locks,
    pub parent: Option<Entity>,
}
