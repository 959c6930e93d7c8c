//! Object wrapper
//!
//! [`ObjectWrapper`] turns a game definition class plus a property
//! dictionary into live engine resources inside a [`World`](crate::engine::World).
//! Each sub-object descriptor of the class becomes a [`SubObject`]; loads run
//! through the environment's resource loader and complete on
//! [`ObjectWrapper::update`].

mod animator_file;
mod async_load;
mod context;
mod events;
mod latch;
mod object;
mod subobject;
mod visitor;
mod world_file;

pub use async_load::SubObjectId;
pub use context::{Properties, WrapperContext};
pub use events::{WrapperCallback, WrapperEvent, WrapperEventKind};
pub use latch::LoadLatch;
pub use object::ObjectWrapper;
pub use subobject::{
    BillboardSubObject, ComponentSubObject, EnvMapProbeSubObject, ForceFieldSubObject,
    LightSubObject, NavigationBlockerSubObject, NavigationSpaceSubObject,
    ParticleEmitterSubObject, SpeakerSubObject, SubObject, SubObjectBase, SubObjectKind,
    WorldSubObject,
};
pub use visitor::SubObjectVisitor;
pub use world_file::{parse_world, WorldFile, WorldFileObject, WorldFileTexture};

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;
    use std::sync::Arc;

    use super::ObjectWrapper;
    use crate::engine::{Shared, World};
    use crate::environment::{Environment, MemoryFileSystem};
    use crate::gamedef::GdClass;
    use crate::loader::{MemoryBackend, ResourceLoader};
    use crate::triggers::TriggerTargetList;

    /// Environment over an empty memory backend and file system
    pub fn environment() -> (Arc<MemoryBackend>, Rc<Environment>) {
        let backend = Arc::new(MemoryBackend::new());
        let env = Environment::new(ResourceLoader::new(backend.clone()), MemoryFileSystem::new());
        (backend, Rc::new(env))
    }

    /// Wrapper of `class` with `properties`, placed into a new world and
    /// loaded. Trigger targets come from `table`.
    pub fn placed_wrapper(
        env: &Rc<Environment>,
        class: GdClass,
        properties: &[(&str, &str)],
        table: &Rc<TriggerTargetList>,
    ) -> (ObjectWrapper, Shared<World>) {
        let world = World::new_shared();
        let mut wrapper = ObjectWrapper::new(env.clone());
        wrapper.set_trigger_table(Some(table.clone()));
        for (key, value) in properties {
            wrapper.set_property(*key, *value);
        }
        wrapper.set_gd_class(Some(Arc::new(class)));
        wrapper.set_world(Some(world.clone()));
        env.update();
        wrapper.update(0.0);
        (wrapper, world)
    }
}
