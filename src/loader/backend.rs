//! Loader backends
//!
//! A backend performs the actual loading, possibly on another thread, and
//! reports results into a [`CompletionSink`]. The [`ResourceLoader`]
//! dispatches them to listeners on the next update.
//!
//! [`ResourceLoader`]: super::ResourceLoader

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Resource, ResourceType};

/// Identifies a load request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTask {
    pub path: String,
    pub resource_type: ResourceType,
}

impl LoadTask {
    pub fn new(path: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            path: path.into(),
            resource_type,
        }
    }
}

/// Result of a load request
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Finished(Resource),
    Failed,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub task: LoadTask,
    pub outcome: LoadOutcome,
}

/// Thread safe queue receiving finished loads
#[derive(Debug, Clone, Default)]
pub struct CompletionSink {
    queue: Arc<Mutex<VecDeque<Completion>>>,
}

impl CompletionSink {
    pub fn push(&self, task: LoadTask, outcome: LoadOutcome) {
        self.queue.lock().push_back(Completion { task, outcome });
    }

    /// Take all queued completions in arrival order
    pub fn drain(&self) -> Vec<Completion> {
        self.queue.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

/// Performs load requests
pub trait LoaderBackend {
    /// Start loading `task`. The result has to be pushed into `sink` exactly
    /// once, now or later.
    fn start(&self, task: &LoadTask, sink: &CompletionSink);
}

impl<T: LoaderBackend + ?Sized> LoaderBackend for Arc<T> {
    fn start(&self, task: &LoadTask, sink: &CompletionSink) {
        (**self).start(task, sink)
    }
}

/// Backend serving resources registered in memory
///
/// Unknown paths fail. In deferred mode results are held back until
/// [`release`](Self::release) or [`release_all`](Self::release_all) is
/// called, which allows controlling completion order.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    resources: Mutex<HashMap<LoadTask, Resource>>,
    deferred: Mutex<bool>,
    held: Mutex<Vec<(LoadTask, CompletionSink)>>,
    started: Mutex<Vec<LoadTask>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its own path and type
    pub fn insert(&self, resource: Resource) {
        let task = LoadTask::new(resource.path(), resource.resource_type());
        self.resources.lock().insert(task, resource);
    }

    pub fn set_deferred(&self, deferred: bool) {
        *self.deferred.lock() = deferred;
    }

    /// Complete a held request. Returns false if no such request is held.
    pub fn release(&self, path: &str, resource_type: ResourceType) -> bool {
        let entry = {
            let mut held = self.held.lock();
            held.iter()
                .position(|(t, _)| t.path == path && t.resource_type == resource_type)
                .map(|index| held.remove(index))
        };

        match entry {
            Some((task, sink)) => {
                self.complete(task, &sink);
                true
            }
            None => false,
        }
    }

    /// Complete all held requests in request order
    pub fn release_all(&self) -> usize {
        let held: Vec<_> = self.held.lock().drain(..).collect();
        let count = held.len();
        for (task, sink) in held {
            self.complete(task, &sink);
        }
        count
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// All requests seen so far, in order
    pub fn started(&self) -> Vec<LoadTask> {
        self.started.lock().clone()
    }

    fn complete(&self, task: LoadTask, sink: &CompletionSink) {
        let resource = self.resources.lock().get(&task).cloned();
        let outcome = match resource {
            Some(resource) => LoadOutcome::Finished(resource),
            None => LoadOutcome::Failed,
        };
        sink.push(task, outcome);
    }
}

impl LoaderBackend for MemoryBackend {
    fn start(&self, task: &LoadTask, sink: &CompletionSink) {
        self.started.lock().push(task.clone());

        if *self.deferred.lock() {
            self.held.lock().push((task.clone(), sink.clone()));
        } else {
            self.complete(task.clone(), sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SkinInfo;

    #[test]
    fn test_immediate() {
        let backend = MemoryBackend::new();
        backend.insert(Resource::skin("/a.deskin", SkinInfo::default()));
        let sink = CompletionSink::default();

        backend.start(&LoadTask::new("/a.deskin", ResourceType::Skin), &sink);
        backend.start(&LoadTask::new("/b.deskin", ResourceType::Skin), &sink);

        let completions = sink.drain();
        assert_eq!(completions.len(), 2);
        assert!(matches!(completions[0].outcome, LoadOutcome::Finished(_)));
        assert!(matches!(completions[1].outcome, LoadOutcome::Failed));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_deferred_release_order() {
        let backend = MemoryBackend::new();
        backend.set_deferred(true);
        let sink = CompletionSink::default();

        backend.start(&LoadTask::new("/a", ResourceType::Model), &sink);
        backend.start(&LoadTask::new("/b", ResourceType::Model), &sink);
        assert!(sink.is_empty());
        assert_eq!(backend.held_count(), 2);

        assert!(backend.release("/b", ResourceType::Model));
        assert!(!backend.release("/b", ResourceType::Model));
        assert_eq!(sink.drain()[0].task.path, "/b");

        assert_eq!(backend.release_all(), 1);
        assert_eq!(sink.len(), 1);
    }
}
