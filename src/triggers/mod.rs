//! Trigger targets and trigger expressions
//!
//! Trigger targets are named two-state signals kept in a shared
//! [`TriggerTargetList`]. Expressions combine targets with AND, OR and NOT,
//! and are re-evaluated by their owners whenever a bound target changes.

mod component;
mod expression;
mod parser;
mod target;
mod target_list;

pub use component::{ComponentNode, ComponentType, TriggerExpressionComponent};
pub use expression::TriggerExpression;
pub use parser::TriggerExpressionParser;
pub use target::{TriggerListener, TriggerTarget};
pub use target_list::TriggerTargetList;
