//! Trigger expressions bound to a shared target table

use std::cell::Cell;
use std::rc::Rc;

use igde_shared::{TriggerExpressionParser, TriggerListener, TriggerTarget, TriggerTargetList};

#[derive(Default)]
struct Counter {
    notifications: Cell<usize>,
}

impl TriggerListener for Counter {
    fn trigger_target_changed(&self, _target: &TriggerTarget) {
        self.notifications.set(self.notifications.get() + 1);
    }
}

#[test]
fn test_round_trip_preserves_structure() {
    let parser = TriggerExpressionParser::strict();
    for text in [
        "door",
        "!door",
        "@door&lever",
        "(a|b)&!(c|@d)",
        "\"gate (north)\"|\"say \\\"hi\\\"\"",
    ] {
        let expression = parser.string_to_expression(text).unwrap();
        let written = parser.expression_to_string(&expression);
        assert_eq!(written, text);
        let reparsed = parser.string_to_expression(&written).unwrap();
        assert_eq!(parser.expression_to_string(&reparsed), written);
    }
}

#[test]
fn test_mixed_operators_need_parentheses() {
    let strict = TriggerExpressionParser::strict();
    assert!(strict.string_to_expression("a&b|c").is_err());
    assert!(strict.string_to_expression("a|b&c").is_err());
    assert!(strict.string_to_expression("(a&b)|c").is_ok());
    assert!(strict.string_to_expression("a&(b|c)").is_ok());

    // lenient parsing keeps the first operator
    let lenient = TriggerExpressionParser::lenient()
        .string_to_expression("a|b&c")
        .unwrap();
    assert_eq!(
        TriggerExpressionParser::strict().expression_to_string(&lenient),
        "a|b|c"
    );
}

#[test]
fn test_linked_expression_follows_targets() {
    let table = TriggerTargetList::new();
    let counter = Rc::new(Counter::default());
    let listener: Rc<dyn TriggerListener> = counter.clone();

    let mut expression = TriggerExpressionParser::strict()
        .string_to_expression("power&(@lever|!alarm)")
        .unwrap();
    expression.link_targets(&table, &listener);
    assert_eq!(table.count(), 3);

    assert!(!expression.evaluate());

    let power = table.get_named("power").unwrap();
    power.fire();
    assert!(expression.evaluate());

    let alarm = table.get_named("alarm").unwrap();
    alarm.fire();
    assert!(!expression.evaluate());

    let lever = table.get_named("lever").unwrap();
    lever.fire();
    assert!(expression.evaluate());

    // has-fired survives a reset, the current state does not
    power.reset();
    lever.reset();
    assert!(!expression.evaluate());
    lever.fire();
    assert!(expression.evaluate());

    expression.unlink_targets();
    let before = counter.notifications.get();
    power.fire();
    assert_eq!(counter.notifications.get(), before);
}

#[test]
fn test_fire_and_reset_notify_once() {
    let target = TriggerTarget::new("bell");
    let counter = Rc::new(Counter::default());
    let listener: Rc<dyn TriggerListener> = counter.clone();
    target.add_listener(&listener);

    target.fire();
    target.fire();
    assert_eq!(counter.notifications.get(), 1);

    target.reset();
    target.reset();
    assert_eq!(counter.notifications.get(), 2);

    let fresh = TriggerTarget::new("quiet");
    fresh.add_listener(&listener);
    fresh.reset();
    assert_eq!(counter.notifications.get(), 2);
}
