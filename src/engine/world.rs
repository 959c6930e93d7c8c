//! Game world holding live resources

use super::{
    Billboard, Collider, Component, EnvMapProbe, ForceField, Light, NavigationBlocker,
    NavigationSpace, ParticleEmitter, ResourceSet, Shared, Speaker,
};

/// Container of all resources placed in a scene
#[derive(Debug, Default)]
pub struct World {
    pub colliders: ResourceSet<Collider>,
    pub components: ResourceSet<Component>,
    pub billboards: ResourceSet<Billboard>,
    pub lights: ResourceSet<Light>,
    pub speakers: ResourceSet<Speaker>,
    pub particle_emitters: ResourceSet<ParticleEmitter>,
    pub force_fields: ResourceSet<ForceField>,
    pub env_map_probes: ResourceSet<EnvMapProbe>,
    pub navigation_spaces: ResourceSet<NavigationSpace>,
    pub navigation_blockers: ResourceSet<NavigationBlocker>,
}

impl World {
    /// Create a new shared empty world
    pub fn new_shared() -> Shared<World> {
        Shared::new(World::default())
    }

    /// Total number of resources in the world
    pub fn resource_count(&self) -> usize {
        self.colliders.len()
            + self.components.len()
            + self.billboards.len()
            + self.lights.len()
            + self.speakers.len()
            + self.particle_emitters.len()
            + self.force_fields.len()
            + self.env_map_probes.len()
            + self.navigation_spaces.len()
            + self.navigation_blockers.len()
    }
}
