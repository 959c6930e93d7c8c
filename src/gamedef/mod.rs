//! Game definition model
//!
//! Object classes with their properties, inheritance and sub-object
//! descriptors, loaded from TOML or JSON.

mod class;
mod definition;
mod descriptors;
mod property;

pub use class::{GdClass, GdClassInherit};
pub use definition::GameDefinition;
pub use descriptors::{
    BillboardProperty, ComponentProperty, EnvMapProbeProperty, ForceFieldProperty, GdBillboard,
    GdComponent, GdEnvMapProbe, GdForceField, GdLight, GdNavigationBlocker, GdNavigationSpace,
    GdParticleEmitter, GdPlacement, GdSpeaker, GdTexture, GdWorld, LightProperty,
    NavigationBlockerProperty, NavigationSpaceProperty, ParticleEmitterProperty, SpeakerProperty,
    WorldProperty,
};
pub use property::{GdProperty, PropertyType};
