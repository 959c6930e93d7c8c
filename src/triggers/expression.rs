//! Trigger expressions

use std::rc::Rc;

use super::{TriggerExpressionComponent, TriggerListener, TriggerTargetList};

/// A boolean formula over trigger targets with a cached result
///
/// Evaluation is pull based. Owners register a listener through
/// [`link_targets`](Self::link_targets) and call [`evaluate`](Self::evaluate)
/// once notified. A disabled expression keeps returning its last result.
#[derive(Debug)]
pub struct TriggerExpression {
    root: Option<TriggerExpressionComponent>,
    result: bool,
    enabled: bool,
}

impl Default for TriggerExpression {
    fn default() -> Self {
        Self {
            root: None,
            result: false,
            enabled: true,
        }
    }
}

impl TriggerExpression {
    /// Create an empty expression
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: Option<TriggerExpressionComponent>) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    pub fn root(&self) -> Option<&TriggerExpressionComponent> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut TriggerExpressionComponent> {
        self.root.as_mut()
    }

    /// Replace the root. The previous root is unlinked.
    pub fn set_root(&mut self, root: Option<TriggerExpressionComponent>) {
        if let Some(old) = self.root.as_mut() {
            old.unlink_targets();
        }
        self.root = root;
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Result of the last evaluation
    pub fn result(&self) -> bool {
        self.result
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Re-evaluate and cache the result. Empty expressions are false.
    pub fn evaluate(&mut self) -> bool {
        if !self.enabled {
            return self.result;
        }

        self.result = self
            .root
            .as_ref()
            .is_some_and(TriggerExpressionComponent::evaluate);
        self.result
    }

    pub fn link_targets(&mut self, table: &TriggerTargetList, listener: &Rc<dyn TriggerListener>) {
        if let Some(root) = self.root.as_mut() {
            root.link_targets(table, listener);
        }
    }

    pub fn unlink_targets(&mut self) {
        if let Some(root) = self.root.as_mut() {
            root.unlink_targets();
        }
    }
}
