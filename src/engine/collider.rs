//! Colliders and collider attachments

use glam::{DVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{
    Billboard, Component, EnvMapProbe, ForceField, Light, NavigationBlocker, NavigationSpace,
    ParticleEmitter, Shared, Speaker,
};
use crate::loader::Resource;

/// How a collider reacts to physics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderResponseType {
    #[default]
    Static,
    Kinematic,
    Dynamic,
}

/// Volume colliders carry their own shapes, component colliders use the
/// shapes of their component's rig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColliderKind {
    Volume,
    Component,
}

/// Category and filter bit masks. Two filters collide if each category
/// matches the other's filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub category: u64,
    pub filter: u64,
}

impl CollisionFilter {
    pub const fn new(category: u64, filter: u64) -> Self {
        Self { category, filter }
    }

    /// Filter colliding with nothing
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn collides_with(&self, other: &CollisionFilter) -> bool {
        (self.category & other.filter) != 0 && (other.category & self.filter) != 0
    }
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self::new(u64::MAX, u64::MAX)
    }
}

/// Axis aligned box shape in collider space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShape {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl BoxShape {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Box spanning `min` to `max`
    pub fn from_extents(min: Vec3, max: Vec3) -> Self {
        Self::new((min + max) * 0.5, (max - min) * 0.5)
    }
}

/// How an attached resource follows its collider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentMode {
    /// Fixed relative transform
    Static,
    /// Bone states are copied from the collider's rig
    Rig,
    /// Follows a single bone
    Bone,
}

/// Resource attached to a collider
#[derive(Debug, Clone)]
pub enum AttachTarget {
    Collider(Shared<Collider>),
    Component(Shared<Component>),
    Billboard(Shared<Billboard>),
    Light(Shared<Light>),
    Speaker(Shared<Speaker>),
    ParticleEmitter(Shared<ParticleEmitter>),
    ForceField(Shared<ForceField>),
    EnvMapProbe(Shared<EnvMapProbe>),
    NavigationSpace(Shared<NavigationSpace>),
    NavigationBlocker(Shared<NavigationBlocker>),
}

impl AttachTarget {
    /// Identity comparison
    pub fn same_as(&self, other: &AttachTarget) -> bool {
        use AttachTarget::*;
        match (self, other) {
            (Collider(a), Collider(b)) => a.ptr_eq(b),
            (Component(a), Component(b)) => a.ptr_eq(b),
            (Billboard(a), Billboard(b)) => a.ptr_eq(b),
            (Light(a), Light(b)) => a.ptr_eq(b),
            (Speaker(a), Speaker(b)) => a.ptr_eq(b),
            (ParticleEmitter(a), ParticleEmitter(b)) => a.ptr_eq(b),
            (ForceField(a), ForceField(b)) => a.ptr_eq(b),
            (EnvMapProbe(a), EnvMapProbe(b)) => a.ptr_eq(b),
            (NavigationSpace(a), NavigationSpace(b)) => a.ptr_eq(b),
            (NavigationBlocker(a), NavigationBlocker(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Attachment record of a collider
#[derive(Debug, Clone)]
pub struct ColliderAttachment {
    pub target: AttachTarget,
    pub mode: AttachmentMode,
    pub track_bone: String,
    pub position: Vec3,
    pub orientation: Quat,
    pub no_scaling: bool,
}

impl ColliderAttachment {
    pub fn new(target: AttachTarget, mode: AttachmentMode) -> Self {
        Self {
            target,
            mode,
            track_bone: String::new(),
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            no_scaling: false,
        }
    }

    /// Bone attachment if `bone` is not empty, static attachment otherwise
    pub fn static_or_bone(target: AttachTarget, bone: &str) -> Self {
        if bone.is_empty() {
            Self::new(target, AttachmentMode::Static)
        } else {
            Self::new(target, AttachmentMode::Bone).with_bone(bone)
        }
    }

    pub fn with_bone(mut self, bone: impl Into<String>) -> Self {
        self.track_bone = bone.into();
        self
    }

    pub fn with_transform(mut self, position: Vec3, orientation: Quat) -> Self {
        self.position = position;
        self.orientation = orientation;
        self
    }

    pub fn with_no_scaling(mut self, no_scaling: bool) -> Self {
        self.no_scaling = no_scaling;
        self
    }
}

/// Physics collider
#[derive(Debug, Clone)]
pub struct Collider {
    pub kind: ColliderKind,
    pub enabled: bool,
    pub position: DVec3,
    pub orientation: Quat,
    pub scale: Vec3,
    pub response_type: ColliderResponseType,
    pub use_local_gravity: bool,
    pub mass: f32,
    pub shapes: Vec<BoxShape>,
    pub collision_filter: CollisionFilter,
    pub attachments: Vec<ColliderAttachment>,
    pub component: Option<Shared<Component>>,
    pub rig: Option<Resource>,
    /// Opaque token identifying the object the collider belongs to
    pub user_pointer: Option<u64>,
    /// Token of the object receiving collision notifications
    pub delegate: Option<u64>,
}

impl Collider {
    fn new(kind: ColliderKind) -> Self {
        Self {
            kind,
            enabled: true,
            position: DVec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
            response_type: ColliderResponseType::Static,
            use_local_gravity: false,
            mass: 1.0,
            shapes: Vec::new(),
            collision_filter: CollisionFilter::default(),
            attachments: Vec::new(),
            component: None,
            rig: None,
            user_pointer: None,
            delegate: None,
        }
    }

    pub fn new_volume() -> Self {
        Self::new(ColliderKind::Volume)
    }

    pub fn new_component() -> Self {
        Self::new(ColliderKind::Component)
    }

    pub fn add_attachment(&mut self, attachment: ColliderAttachment) {
        self.attachments.push(attachment);
    }

    /// Remove the attachment of `target`. Returns false if there is none.
    pub fn remove_attachment(&mut self, target: &AttachTarget) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| !a.target.same_as(target));
        self.attachments.len() != before
    }

    pub fn attachment_for(&self, target: &AttachTarget) -> Option<&ColliderAttachment> {
        self.attachments.iter().find(|a| a.target.same_as(target))
    }

    pub fn has_attachment(&self, target: &AttachTarget) -> bool {
        self.attachment_for(target).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_filter() {
        let a = CollisionFilter::new(0b01, 0b10);
        let b = CollisionFilter::new(0b10, 0b01);
        let c = CollisionFilter::new(0b10, 0b10);
        assert!(a.collides_with(&b));
        assert!(!a.collides_with(&c));
        assert!(!CollisionFilter::none().collides_with(&CollisionFilter::default()));
    }

    #[test]
    fn test_attachments() {
        let mut parent = Collider::new_volume();
        let child = Shared::new(Collider::new_component());
        let target = AttachTarget::Collider(child.clone());

        parent.add_attachment(ColliderAttachment::static_or_bone(target.clone(), "hand"));
        let attachment = parent.attachment_for(&target).unwrap();
        assert_eq!(attachment.mode, AttachmentMode::Bone);
        assert_eq!(attachment.track_bone, "hand");

        let other = AttachTarget::Collider(Shared::new(Collider::new_volume()));
        assert!(!parent.has_attachment(&other));
        assert!(parent.remove_attachment(&target));
        assert!(!parent.remove_attachment(&target));
    }

    #[test]
    fn test_box_from_extents() {
        let shape = BoxShape::from_extents(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 2.0, 2.0));
        assert_eq!(shape.center, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(shape.half_extents, Vec3::new(1.0, 1.0, 2.0));
    }
}
