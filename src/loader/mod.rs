//! Asynchronous resource loader
//!
//! Requests are deduplicated by path and resource type. Every listener that
//! asked for a request is told about its result exactly once, always from
//! [`ResourceLoader::update`] on the caller's thread.

mod backend;
mod resource;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

pub use backend::{Completion, CompletionSink, LoadOutcome, LoadTask, LoaderBackend, MemoryBackend};
pub use resource::{
    AnimationInfo, AnimationMove, ModelInfo, Resource, ResourceData, ResourceKind, ResourceType,
    RigBone, RigInfo, SkinInfo,
};

/// Receives the result of load requests
pub trait ResourceLoaderListener {
    fn loading_finished(&self, task: &LoadTask, resource: &Resource);
    fn loading_failed(&self, task: &LoadTask);
}

/// Multiplexing front end of a [`LoaderBackend`]
pub struct ResourceLoader {
    backend: Box<dyn LoaderBackend>,
    sink: CompletionSink,
    pending: RefCell<HashMap<LoadTask, Vec<Weak<dyn ResourceLoaderListener>>>>,
}

impl ResourceLoader {
    pub fn new(backend: impl LoaderBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            sink: CompletionSink::default(),
            pending: RefCell::new(HashMap::new()),
        }
    }

    /// Request a resource. Listeners are held weakly; a listener dropped before
    /// completion is skipped.
    pub fn request(
        &self,
        path: &str,
        resource_type: ResourceType,
        listener: &Rc<dyn ResourceLoaderListener>,
    ) {
        let task = LoadTask::new(path, resource_type);
        let weak = Rc::downgrade(listener);

        {
            let mut pending = self.pending.borrow_mut();
            if let Some(listeners) = pending.get_mut(&task) {
                if !listeners.iter().any(|l| l.ptr_eq(&weak)) {
                    listeners.push(weak);
                }
                return;
            }
            pending.insert(task.clone(), vec![weak]);
        }

        log::debug!("Loading {:?} '{}'", resource_type, path);
        self.backend.start(&task, &self.sink);
    }

    /// Dispatch finished loads. Returns the number of completed requests.
    pub fn update(&self) -> usize {
        let completions = self.sink.drain();
        let count = completions.len();

        for completion in completions {
            let listeners = self
                .pending
                .borrow_mut()
                .remove(&completion.task)
                .unwrap_or_default();

            if let LoadOutcome::Failed = completion.outcome {
                log::debug!(
                    "Loading {:?} '{}' failed",
                    completion.task.resource_type,
                    completion.task.path
                );
            }

            for listener in listeners.iter().filter_map(Weak::upgrade) {
                match &completion.outcome {
                    LoadOutcome::Finished(resource) => {
                        listener.loading_finished(&completion.task, resource)
                    }
                    LoadOutcome::Failed => listener.loading_failed(&completion.task),
                }
            }
        }

        count
    }

    /// Number of requests waiting for a result
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl std::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("pending", &self.pending_count())
            .finish()
    }
}
