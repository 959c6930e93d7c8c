//! Named trigger targets

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Receives notifications when a trigger target changes state
pub trait TriggerListener {
    fn trigger_target_changed(&self, target: &TriggerTarget);
}

/// A named two-state signal
///
/// `fired` is the current state, `has_fired` records whether the target fired
/// at least once since the last full reset. Listeners are weak back-references;
/// a target never keeps its listeners alive.
pub struct TriggerTarget {
    name: String,
    fired: Cell<bool>,
    has_fired: Cell<bool>,
    listeners: RefCell<Vec<Weak<dyn TriggerListener>>>,
}

impl TriggerTarget {
    /// Create a new target in the unfired state
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            fired: Cell::new(false),
            has_fired: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    pub fn fired(&self) -> bool {
        self.fired.get()
    }

    /// Whether the target fired since the last full reset
    pub fn has_fired(&self) -> bool {
        self.has_fired.get()
    }

    /// Set the target fired
    pub fn fire(&self) {
        if self.fired.get() {
            return;
        }
        self.fired.set(true);
        self.has_fired.set(true);
        self.notify_listeners();
    }

    /// Clear the current state. `has_fired` is kept.
    pub fn reset(&self) {
        if !self.fired.get() {
            return;
        }
        self.fired.set(false);
        self.notify_listeners();
    }

    /// Clear both the current state and `has_fired`
    pub fn full_reset(&self) {
        if !self.fired.get() && !self.has_fired.get() {
            return;
        }
        self.fired.set(false);
        self.has_fired.set(false);
        self.notify_listeners();
    }

    /// Register a listener. Registering the same listener twice has no effect.
    pub fn add_listener(&self, listener: &Rc<dyn TriggerListener>) {
        let mut listeners = self.listeners.borrow_mut();
        let ptr = Rc::as_ptr(listener);
        if listeners.iter().any(|l| std::ptr::addr_eq(l.as_ptr(), ptr)) {
            return;
        }
        listeners.push(Rc::downgrade(listener));
    }

    pub fn remove_listener(&self, listener: &Rc<dyn TriggerListener>) {
        let ptr = Rc::as_ptr(listener);
        self.listeners
            .borrow_mut()
            .retain(|l| !std::ptr::addr_eq(l.as_ptr(), ptr));
    }

    pub(crate) fn remove_listener_weak(&self, listener: &Weak<dyn TriggerListener>) {
        let ptr = listener.as_ptr();
        self.listeners
            .borrow_mut()
            .retain(|l| !std::ptr::addr_eq(l.as_ptr(), ptr));
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    fn notify_listeners(&self) {
        // listeners may add or remove listeners while being notified
        let listeners: Vec<Rc<dyn TriggerListener>> = {
            let mut list = self.listeners.borrow_mut();
            list.retain(|l| l.strong_count() > 0);
            list.iter().filter_map(|l| l.upgrade()).collect()
        };

        for listener in listeners {
            listener.trigger_target_changed(self);
        }
    }
}

impl fmt::Debug for TriggerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerTarget")
            .field("name", &self.name)
            .field("fired", &self.fired.get())
            .field("has_fired", &self.has_fired.get())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Listener counting notifications
    #[derive(Default)]
    pub struct CountingListener {
        pub count: Cell<usize>,
    }

    impl TriggerListener for CountingListener {
        fn trigger_target_changed(&self, _target: &TriggerTarget) {
            self.count.set(self.count.get() + 1);
        }
    }
}
