//! Trigger expression tree nodes

use std::rc::{Rc, Weak};

use super::{TriggerListener, TriggerTarget, TriggerTargetList};
use crate::error::{IgdeError, Result};

/// Node kind without payload, for editors and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Target,
    And,
    Or,
}

/// Payload of a node
pub enum ComponentNode {
    /// Leaf referencing a trigger target by name
    Target {
        name: String,
        target: Option<Rc<TriggerTarget>>,
        listener: Option<Weak<dyn TriggerListener>>,
    },
    /// True if there is at least one child and all children are true
    And(Vec<TriggerExpressionComponent>),
    /// True if any child is true
    Or(Vec<TriggerExpressionComponent>),
}

/// A node of a trigger expression
///
/// `negate` applies to every kind. `cur_state` selects between the current
/// state and the has-fired state of a target leaf and is ignored otherwise.
pub struct TriggerExpressionComponent {
    negate: bool,
    cur_state: bool,
    node: ComponentNode,
}

impl TriggerExpressionComponent {
    /// Create a target leaf
    pub fn target(name: impl Into<String>) -> Self {
        Self {
            negate: false,
            cur_state: false,
            node: ComponentNode::Target {
                name: name.into(),
                target: None,
                listener: None,
            },
        }
    }

    pub fn and(children: Vec<TriggerExpressionComponent>) -> Self {
        Self {
            negate: false,
            cur_state: false,
            node: ComponentNode::And(children),
        }
    }

    pub fn or(children: Vec<TriggerExpressionComponent>) -> Self {
        Self {
            negate: false,
            cur_state: false,
            node: ComponentNode::Or(children),
        }
    }

    pub fn with_negate(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn with_cur_state(mut self, cur_state: bool) -> Self {
        self.cur_state = cur_state;
        self
    }

    pub fn kind(&self) -> ComponentType {
        match self.node {
            ComponentNode::Target { .. } => ComponentType::Target,
            ComponentNode::And(_) => ComponentType::And,
            ComponentNode::Or(_) => ComponentType::Or,
        }
    }

    pub fn node(&self) -> &ComponentNode {
        &self.node
    }

    pub fn negate(&self) -> bool {
        self.negate
    }

    pub fn set_negate(&mut self, negate: bool) {
        self.negate = negate;
    }

    pub fn cur_state(&self) -> bool {
        self.cur_state
    }

    pub fn set_cur_state(&mut self, cur_state: bool) {
        self.cur_state = cur_state;
    }

    /// Target name of a leaf, `None` for groups
    pub fn target_name(&self) -> Option<&str> {
        match &self.node {
            ComponentNode::Target { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Rename a leaf. Unlinks the old target; call `link_targets` again afterwards.
    pub fn set_target_name(&mut self, new_name: impl Into<String>) -> Result<()> {
        self.unlink_targets();
        match &mut self.node {
            ComponentNode::Target { name, .. } => {
                *name = new_name.into();
                Ok(())
            }
            _ => Err(IgdeError::invalid_param("only target components have a name")),
        }
    }

    /// Resolved target of a leaf
    pub fn bound_target(&self) -> Option<&Rc<TriggerTarget>> {
        match &self.node {
            ComponentNode::Target { target, .. } => target.as_ref(),
            _ => None,
        }
    }

    /// Children of a group, empty for leaves
    pub fn children(&self) -> &[TriggerExpressionComponent] {
        match &self.node {
            ComponentNode::Target { .. } => &[],
            ComponentNode::And(children) | ComponentNode::Or(children) => children,
        }
    }

    fn children_mut(&mut self) -> Result<&mut Vec<TriggerExpressionComponent>> {
        match &mut self.node {
            ComponentNode::Target { .. } => Err(IgdeError::invalid_param(
                "target components can not have children",
            )),
            ComponentNode::And(children) | ComponentNode::Or(children) => Ok(children),
        }
    }

    pub fn add_child(&mut self, child: TriggerExpressionComponent) -> Result<()> {
        self.children_mut()?.push(child);
        Ok(())
    }

    pub fn insert_child(&mut self, index: usize, child: TriggerExpressionComponent) -> Result<()> {
        let children = self.children_mut()?;
        if index > children.len() {
            return Err(IgdeError::invalid_param(format!(
                "child index {} out of range",
                index
            )));
        }
        children.insert(index, child);
        Ok(())
    }

    pub fn remove_child(&mut self, index: usize) -> Result<TriggerExpressionComponent> {
        let children = self.children_mut()?;
        if index >= children.len() {
            return Err(IgdeError::invalid_param(format!(
                "child index {} out of range",
                index
            )));
        }
        let mut child = children.remove(index);
        child.unlink_targets();
        Ok(child)
    }

    /// Evaluate the node against the bound targets
    pub fn evaluate(&self) -> bool {
        match &self.node {
            ComponentNode::Target { target, .. } => match target {
                Some(target) => {
                    let state = if self.cur_state {
                        target.fired()
                    } else {
                        target.has_fired()
                    };
                    state ^ self.negate
                }
                // unbound targets are a configuration error, never true
                None => false,
            },
            ComponentNode::And(children) => {
                let result = !children.is_empty() && children.iter().all(|c| c.evaluate());
                result ^ self.negate
            }
            ComponentNode::Or(children) => {
                let result = children.iter().any(|c| c.evaluate());
                result ^ self.negate
            }
        }
    }

    /// Bind leaves to targets of `table`, creating missing targets, and
    /// register `listener` on them
    pub fn link_targets(&mut self, table: &TriggerTargetList, listener: &Rc<dyn TriggerListener>) {
        self.unlink_targets();

        match &mut self.node {
            ComponentNode::Target {
                name,
                target,
                listener: bound_listener,
            } => {
                if name.is_empty() {
                    return;
                }
                let resolved = table.get_named_add_if_missing(name);
                resolved.add_listener(listener);
                *target = Some(resolved);
                *bound_listener = Some(Rc::downgrade(listener));
            }
            ComponentNode::And(children) | ComponentNode::Or(children) => {
                for child in children {
                    child.link_targets(table, listener);
                }
            }
        }
    }

    /// Release all bindings. Safe to call repeatedly.
    pub fn unlink_targets(&mut self) {
        match &mut self.node {
            ComponentNode::Target {
                target, listener, ..
            } => {
                if let (Some(target), Some(listener)) = (target.as_ref(), listener.as_ref()) {
                    target.remove_listener_weak(listener);
                }
                *target = None;
                *listener = None;
            }
            ComponentNode::And(children) | ComponentNode::Or(children) => {
                for child in children {
                    child.unlink_targets();
                }
            }
        }
    }
}

impl Drop for TriggerExpressionComponent {
    fn drop(&mut self) {
        if let ComponentNode::Target {
            target: Some(target),
            listener: Some(listener),
            ..
        } = &self.node
        {
            target.remove_listener_weak(listener);
        }
    }
}

impl std::fmt::Debug for TriggerExpressionComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("TriggerExpressionComponent");
        s.field("negate", &self.negate);
        match &self.node {
            ComponentNode::Target { name, target, .. } => {
                s.field("target", name)
                    .field("cur_state", &self.cur_state)
                    .field("bound", &target.is_some());
            }
            ComponentNode::And(children) => {
                s.field("and", children);
            }
            ComponentNode::Or(children) => {
                s.field("or", children);
            }
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::target::test_support::CountingListener;

    fn listener() -> Rc<dyn TriggerListener> {
        Rc::new(CountingListener::default())
    }

    #[test]
    fn test_unbound_leaf_is_false() {
        let leaf = TriggerExpressionComponent::target("a");
        assert!(!leaf.evaluate());

        let negated = TriggerExpressionComponent::target("a").with_negate(true);
        assert!(!negated.evaluate());
    }

    #[test]
    fn test_leaf_state_selection() {
        let table = TriggerTargetList::new();
        let listener = listener();
        let mut has_fired = TriggerExpressionComponent::target("a");
        let mut current = TriggerExpressionComponent::target("a").with_cur_state(true);
        has_fired.link_targets(&table, &listener);
        current.link_targets(&table, &listener);

        let target = table.get_named("a").unwrap();
        target.fire();
        target.reset();

        assert!(has_fired.evaluate());
        assert!(!current.evaluate());
    }

    #[test]
    fn test_empty_groups_are_false() {
        assert!(!TriggerExpressionComponent::and(vec![]).evaluate());
        assert!(!TriggerExpressionComponent::or(vec![]).evaluate());
        assert!(TriggerExpressionComponent::and(vec![]).with_negate(true).evaluate());
    }

    #[test]
    fn test_single_child_identity() {
        let table = TriggerTargetList::new();
        let listener = listener();
        let mut and = TriggerExpressionComponent::and(vec![TriggerExpressionComponent::target("a")]);
        let mut or = TriggerExpressionComponent::or(vec![TriggerExpressionComponent::target("a")]);
        and.link_targets(&table, &listener);
        or.link_targets(&table, &listener);

        assert!(!and.evaluate());
        assert!(!or.evaluate());

        table.get_named("a").unwrap().fire();
        assert!(and.evaluate());
        assert!(or.evaluate());
    }

    #[test]
    fn test_link_creates_targets_and_registers_listener() {
        let table = TriggerTargetList::new();
        let listener = listener();
        let mut expr = TriggerExpressionComponent::or(vec![
            TriggerExpressionComponent::target("a"),
            TriggerExpressionComponent::target("b"),
        ]);

        expr.link_targets(&table, &listener);
        expr.link_targets(&table, &listener);

        assert_eq!(table.count(), 2);
        assert_eq!(table.get_named("a").unwrap().listener_count(), 1);

        expr.unlink_targets();
        expr.unlink_targets();
        assert_eq!(table.get_named("a").unwrap().listener_count(), 0);
        assert!(expr.children()[0].bound_target().is_none());
    }

    #[test]
    fn test_drop_unregisters_listener() {
        let table = TriggerTargetList::new();
        let listener = listener();
        {
            let mut leaf = TriggerExpressionComponent::target("a");
            leaf.link_targets(&table, &listener);
            assert_eq!(table.get_named("a").unwrap().listener_count(), 1);
        }
        assert_eq!(table.get_named("a").unwrap().listener_count(), 0);
    }

    #[test]
    fn test_leaf_has_no_children() {
        let mut leaf = TriggerExpressionComponent::target("a");
        assert!(leaf.add_child(TriggerExpressionComponent::target("b")).is_err());
        assert!(leaf.set_target_name("c").is_ok());
        assert_eq!(leaf.target_name(), Some("c"));
    }

    #[test]
    fn test_edit_children() {
        let mut group = TriggerExpressionComponent::and(vec![]);
        group.add_child(TriggerExpressionComponent::target("a")).unwrap();
        group.insert_child(0, TriggerExpressionComponent::target("b")).unwrap();
        assert_eq!(group.children()[0].target_name(), Some("b"));

        let removed = group.remove_child(1).unwrap();
        assert_eq!(removed.target_name(), Some("a"));
        assert!(group.remove_child(5).is_err());
    }
}
