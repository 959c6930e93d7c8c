//! Engine resource model
//!
//! A minimal stand-in for the game engine's scene objects: colliders,
//! components, lights and the other resources sub-objects create, plus the
//! world holding them.

mod collider;
mod resources;
mod shared;
mod world;

pub use collider::{
    AttachTarget, AttachmentMode, BoxShape, Collider, ColliderAttachment, ColliderKind,
    ColliderResponseType, CollisionFilter,
};
pub use resources::{
    Animator, AnimatorController, Billboard, Component, ComponentTexture, EnvMapProbe,
    ForceApplication, ForceField, ForceFieldType, Light, LightType, MovementHint, NamedEnum,
    NavigationBlocker, NavigationSpace, NavigationSpaceType, ParticleEmitter, Speaker,
    TexCoordTransform,
};
pub use shared::{ResourceSet, Shared, WeakShared};
pub use world::World;
