//! Trigger target table

use std::cell::RefCell;
use std::rc::Rc;

use super::TriggerTarget;
use crate::error::{IgdeError, Result};

/// Registry of trigger targets with unique names
///
/// The table is shared by reference across a whole wrapper tree. Targets are
/// created on first reference through [`get_named_add_if_missing`] and stay
/// until [`remove_unused`] finds nobody else holding them.
///
/// [`get_named_add_if_missing`]: TriggerTargetList::get_named_add_if_missing
/// [`remove_unused`]: TriggerTargetList::remove_unused
#[derive(Debug, Default)]
pub struct TriggerTargetList {
    targets: RefCell<Vec<Rc<TriggerTarget>>>,
}

impl TriggerTargetList {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.targets.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.borrow().is_empty()
    }

    pub fn get_at(&self, index: usize) -> Option<Rc<TriggerTarget>> {
        self.targets.borrow().get(index).cloned()
    }

    pub fn get_named(&self, name: &str) -> Option<Rc<TriggerTarget>> {
        self.targets
            .borrow()
            .iter()
            .find(|t| t.name() == name)
            .cloned()
    }

    pub fn has_named(&self, name: &str) -> bool {
        self.targets.borrow().iter().any(|t| t.name() == name)
    }

    pub fn index_of(&self, target: &Rc<TriggerTarget>) -> Option<usize> {
        self.targets
            .borrow()
            .iter()
            .position(|t| Rc::ptr_eq(t, target))
    }

    /// Snapshot of all targets in insertion order
    pub fn targets(&self) -> Vec<Rc<TriggerTarget>> {
        self.targets.borrow().clone()
    }

    /// Add a target. Fails if a target with the same name exists.
    pub fn add(&self, target: Rc<TriggerTarget>) -> Result<()> {
        if self.has_named(target.name()) {
            return Err(IgdeError::DuplicateTarget(target.name().to_string()));
        }
        self.targets.borrow_mut().push(target);
        Ok(())
    }

    /// Get the named target, creating it if missing
    pub fn get_named_add_if_missing(&self, name: &str) -> Rc<TriggerTarget> {
        let mut targets = self.targets.borrow_mut();
        if let Some(target) = targets.iter().find(|t| t.name() == name) {
            return target.clone();
        }

        let target = TriggerTarget::new(name);
        targets.push(target.clone());
        target
    }

    pub fn remove(&self, target: &Rc<TriggerTarget>) {
        self.targets.borrow_mut().retain(|t| !Rc::ptr_eq(t, target));
    }

    pub fn remove_all(&self) {
        self.targets.borrow_mut().clear();
    }

    /// Remove every target nobody but the table holds
    pub fn remove_unused(&self) {
        let mut targets = self.targets.borrow_mut();
        let before = targets.len();
        targets.retain(|t| Rc::strong_count(t) > 1);

        let removed = before - targets.len();
        if removed > 0 {
            log::debug!("Removed {} unused trigger targets", removed);
        }
    }

    /// Fire every target
    pub fn fire_all(&self) {
        for target in self.targets() {
            target.fire();
        }
    }

    /// Reset every target, keeping `has_fired`
    pub fn reset_all(&self) {
        for target in self.targets() {
            target.reset();
        }
    }

    /// Fully reset every target
    pub fn full_reset_all(&self) {
        for target in self.targets() {
            target.full_reset();
        }
    }
}
