//! Typed access to the sub-objects of a wrapper

use super::subobject::{
    BillboardSubObject, ComponentSubObject, EnvMapProbeSubObject, ForceFieldSubObject,
    LightSubObject, NavigationBlockerSubObject, NavigationSpaceSubObject, ParticleEmitterSubObject,
    SpeakerSubObject, WorldSubObject,
};

/// Visitor dispatched on the concrete sub-object kind. Every method defaults
/// to doing nothing.
pub trait SubObjectVisitor {
    fn visit_component(&mut self, _sub_object: &mut ComponentSubObject) {}

    fn visit_billboard(&mut self, _sub_object: &mut BillboardSubObject) {}

    fn visit_light(&mut self, _sub_object: &mut LightSubObject) {}

    fn visit_speaker(&mut self, _sub_object: &mut SpeakerSubObject) {}

    fn visit_particle_emitter(&mut self, _sub_object: &mut ParticleEmitterSubObject) {}

    fn visit_force_field(&mut self, _sub_object: &mut ForceFieldSubObject) {}

    fn visit_env_map_probe(&mut self, _sub_object: &mut EnvMapProbeSubObject) {}

    fn visit_navigation_space(&mut self, _sub_object: &mut NavigationSpaceSubObject) {}

    fn visit_navigation_blocker(&mut self, _sub_object: &mut NavigationBlockerSubObject) {}

    fn visit_world(&mut self, _sub_object: &mut WorldSubObject) {}
}
