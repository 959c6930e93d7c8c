//! Shared engine resource handles

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// Single-threaded shared handle to an engine resource
///
/// Handles compare by identity. Two handles are equal only if they refer to
/// the same resource.
pub struct Shared<T>(Rc<RefCell<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Shared<T>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakShared<T> {
        WeakShared(Rc::downgrade(&self.0))
    }

    /// Number of handles to this resource
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Shared<T> {}

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(value) => value.fmt(f),
            Err(_) => f.write_str("Shared(<borrowed>)"),
        }
    }
}

/// Weak counterpart of [`Shared`]
pub struct WeakShared<T>(Weak<RefCell<T>>);

impl<T> WeakShared<T> {
    pub fn upgrade(&self) -> Option<Shared<T>> {
        self.0.upgrade().map(Shared)
    }
}

impl<T> Clone for WeakShared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> fmt::Debug for WeakShared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakShared")
    }
}

/// Ordered set of shared resources, compared by identity
#[derive(Debug)]
pub struct ResourceSet<T> {
    items: Vec<Shared<T>>,
}

impl<T> Default for ResourceSet<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> ResourceSet<T> {
    /// Add a resource. Returns false if it is already present.
    pub fn add(&mut self, item: &Shared<T>) -> bool {
        if self.contains(item) {
            return false;
        }
        self.items.push(item.clone());
        true
    }

    /// Remove a resource. Returns false if it was not present.
    pub fn remove(&mut self, item: &Shared<T>) -> bool {
        let before = self.items.len();
        self.items.retain(|i| !i.ptr_eq(item));
        self.items.len() != before
    }

    pub fn contains(&self, item: &Shared<T>) -> bool {
        self.items.iter().any(|i| i.ptr_eq(item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shared<T>> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let a = Shared::new(1);
        let b = Shared::new(1);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_weak() {
        let a = Shared::new(String::from("x"));
        let weak = a.downgrade();
        assert!(weak.upgrade().is_some());
        drop(a);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_set() {
        let mut set = ResourceSet::default();
        let a = Shared::new(1);
        assert!(set.add(&a));
        assert!(!set.add(&a));
        assert_eq!(set.len(), 1);
        assert!(set.remove(&a));
        assert!(!set.remove(&a));
        assert!(set.is_empty());
    }
}
