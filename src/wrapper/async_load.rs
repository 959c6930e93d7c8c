//! Per sub-object resource load tracking
//!
//! Each sub-object owns one [`AsyncLoad`] per load round. The loader only
//! holds it weakly, so dropping the sub-object silences late callbacks.
//! Replacing a load round calls [`AsyncLoad::drop_owner`] first, after which
//! callbacks of the old round are ignored even if something still holds it.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::environment::Environment;
use crate::loader::{LoadTask, Resource, ResourceLoaderListener, ResourceType};

/// Identifier of a sub-object, unique for the lifetime of its wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubObjectId(pub(crate) u64);

/// Queue of sub-objects whose load round completed
pub(crate) type Mailbox = Rc<RefCell<VecDeque<SubObjectId>>>;

pub(crate) struct AsyncLoad {
    owner: Cell<Option<SubObjectId>>,
    mailbox: Mailbox,
    requested: RefCell<Vec<LoadTask>>,
    results: RefCell<HashMap<LoadTask, Option<Resource>>>,
    delivered: Cell<bool>,
}

impl AsyncLoad {
    pub fn new(owner: SubObjectId, mailbox: Mailbox) -> Rc<Self> {
        Rc::new(Self {
            owner: Cell::new(Some(owner)),
            mailbox,
            requested: RefCell::new(Vec::new()),
            results: RefCell::new(HashMap::new()),
            delivered: Cell::new(false),
        })
    }

    /// Request a resource. Empty paths and repeated requests are ignored.
    pub fn request(self: &Rc<Self>, env: &Environment, path: &str, resource_type: ResourceType) {
        if path.is_empty() {
            return;
        }

        let task = LoadTask::new(path, resource_type);
        {
            let mut requested = self.requested.borrow_mut();
            if requested.contains(&task) {
                return;
            }
            requested.push(task);
        }

        let listener: Rc<dyn ResourceLoaderListener> = self.clone();
        env.loader().request(path, resource_type, &listener);
    }

    pub fn pending(&self) -> usize {
        self.requested.borrow().len() - self.results.borrow().len()
    }

    pub fn is_finished(&self) -> bool {
        self.pending() == 0
    }

    /// True if no request of this round failed
    pub fn succeeded(&self) -> bool {
        self.results.borrow().values().all(Option::is_some)
    }

    /// Outcome of the round once it finished. Handed out only once.
    pub fn take_completion(&self) -> Option<bool> {
        if !self.is_finished() || self.delivered.get() {
            return None;
        }
        self.delivered.set(true);
        Some(self.succeeded())
    }

    /// Loaded resource, `None` if not requested, pending or failed
    pub fn get(&self, path: &str, resource_type: ResourceType) -> Option<Resource> {
        if path.is_empty() {
            return None;
        }
        self.results
            .borrow()
            .get(&LoadTask::new(path, resource_type))
            .cloned()
            .flatten()
    }

    /// Detach from the owner. Later callbacks become no-ops.
    pub fn drop_owner(&self) {
        self.owner.set(None);
    }

    fn complete(&self, task: &LoadTask, result: Option<Resource>) {
        let Some(owner) = self.owner.get() else {
            return;
        };
        if !self.requested.borrow().contains(task) || self.results.borrow().contains_key(task) {
            return;
        }

        self.results.borrow_mut().insert(task.clone(), result);
        if self.is_finished() {
            self.mailbox.borrow_mut().push_back(owner);
        }
    }
}

impl ResourceLoaderListener for AsyncLoad {
    fn loading_finished(&self, task: &LoadTask, resource: &Resource) {
        self.complete(task, Some(resource.clone()));
    }

    fn loading_failed(&self, task: &LoadTask) {
        self.complete(task, None);
    }
}

impl std::fmt::Debug for AsyncLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncLoad")
            .field("owner", &self.owner.get())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::environment::MemoryFileSystem;
    use crate::loader::{MemoryBackend, ModelInfo, ResourceLoader, SkinInfo};

    fn setup() -> (Arc<MemoryBackend>, Environment, Mailbox) {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(Resource::model("/a.demodel", ModelInfo::default()));
        backend.insert(Resource::skin("/a.deskin", SkinInfo::default()));
        let env = Environment::new(ResourceLoader::new(backend.clone()), MemoryFileSystem::new());
        (backend, env, Mailbox::default())
    }

    #[test]
    fn test_round_completes_after_all_results() {
        let (backend, env, mailbox) = setup();
        backend.set_deferred(true);
        let load = AsyncLoad::new(SubObjectId(7), mailbox.clone());

        load.request(&env, "/a.demodel", ResourceType::Model);
        load.request(&env, "/a.deskin", ResourceType::Skin);
        load.request(&env, "/a.deskin", ResourceType::Skin);
        load.request(&env, "", ResourceType::Rig);
        assert_eq!(load.pending(), 2);

        backend.release("/a.deskin", ResourceType::Skin);
        env.update();
        assert!(mailbox.borrow().is_empty());

        backend.release_all();
        env.update();
        assert_eq!(mailbox.borrow_mut().pop_front(), Some(SubObjectId(7)));
        assert_eq!(load.take_completion(), Some(true));
        assert_eq!(load.take_completion(), None);
        assert!(load.get("/a.demodel", ResourceType::Model).is_some());
    }

    #[test]
    fn test_failure_is_aggregated() {
        let (_backend, env, mailbox) = setup();
        let load = AsyncLoad::new(SubObjectId(1), mailbox.clone());

        load.request(&env, "/a.demodel", ResourceType::Model);
        load.request(&env, "/missing.deskin", ResourceType::Skin);
        env.update();

        assert_eq!(mailbox.borrow().len(), 1);
        assert_eq!(load.take_completion(), Some(false));
        assert!(load.get("/missing.deskin", ResourceType::Skin).is_none());
    }

    #[test]
    fn test_dropped_owner_ignores_callbacks() {
        let (backend, env, mailbox) = setup();
        backend.set_deferred(true);
        let load = AsyncLoad::new(SubObjectId(3), mailbox.clone());
        load.request(&env, "/a.demodel", ResourceType::Model);

        load.drop_owner();
        backend.release_all();
        env.update();

        assert!(mailbox.borrow().is_empty());
        assert_eq!(load.pending(), 1);
    }

    #[test]
    fn test_dropped_load_is_skipped_by_loader() {
        let (backend, env, mailbox) = setup();
        backend.set_deferred(true);
        let load = AsyncLoad::new(SubObjectId(3), mailbox.clone());
        load.request(&env, "/a.demodel", ResourceType::Model);
        drop(load);

        backend.release_all();
        assert_eq!(env.update(), 1);
        assert!(mailbox.borrow().is_empty());
    }
}
