//! Trigger expression parser and serializer
//!
//! Grammar:
//!
//! ```text
//! expr  := group (op group)*      all operators of one expr identical
//! group := ['!'] ['@'] (name | '(' expr ')')
//! name  := '"' quoted '"' | bareword
//! op    := '&' | '|'
//! ```
//!
//! `!` negates the following leaf or group, `@` makes a leaf query the
//! current state instead of the has-fired state. Groups holding a single
//! child collapse into that child.

use super::{TriggerExpression, TriggerExpressionComponent};
use crate::error::ExpressionParseError;

const NEGATE: char = '!';
const CUR_STATE: char = '@';
const AND: char = '&';
const OR: char = '|';
const GROUP_OPEN: char = '(';
const GROUP_CLOSE: char = ')';
const QUOTE: char = '"';
const ESCAPE: char = '\\';

type ParseResult<T> = std::result::Result<T, ExpressionParseError>;

fn is_reserved(c: char) -> bool {
    matches!(
        c,
        NEGATE | CUR_STATE | AND | OR | GROUP_OPEN | GROUP_CLOSE | QUOTE
    ) || c.is_whitespace()
}

/// Converts between expression strings and component trees
///
/// In strict mode malformed input is an error. In lenient mode the parser
/// logs the problem and recovers with a best-effort tree, which lets editors
/// keep working on half typed expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerExpressionParser {
    strict: bool,
}

impl TriggerExpressionParser {
    /// Parser recovering from malformed input
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Parser failing on malformed input
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Parse `text` into a component tree. Blank text yields `None`.
    pub fn parse_component(&self, text: &str) -> ParseResult<Option<TriggerExpressionComponent>> {
        Cursor::new(text, self.strict).parse_root()
    }

    /// Parse `text` into an unlinked expression
    pub fn string_to_expression(&self, text: &str) -> ParseResult<TriggerExpression> {
        Ok(TriggerExpression::with_root(self.parse_component(text)?))
    }

    /// Serialize an expression. Empty expressions give an empty string.
    pub fn expression_to_string(&self, expression: &TriggerExpression) -> String {
        expression
            .root()
            .map(|root| self.component_to_string(root))
            .unwrap_or_default()
    }

    /// Serialize a component tree
    pub fn component_to_string(&self, component: &TriggerExpressionComponent) -> String {
        let mut out = String::new();
        write_component(&mut out, component, true);
        out
    }
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
    strict: bool,
    /// Problems recovered from in lenient mode
    warnings: usize,
}

impl Cursor {
    fn new(text: &str, strict: bool) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            strict,
            warnings: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn consume_if(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip to after the `)` closing the current group, or to the end
    fn skip_past_group_close(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                GROUP_OPEN => depth += 1,
                GROUP_CLOSE if depth == 0 => return,
                GROUP_CLOSE => depth -= 1,
                _ => (),
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    /// Fail in strict mode, log and continue otherwise
    fn recover(&mut self, message: String) -> ParseResult<()> {
        if self.strict {
            return Err(ExpressionParseError::new(message, self.pos));
        }
        self.warnings += 1;
        log::warn!(
            "Trigger expression: {} at position {}, recovering",
            message,
            self.pos
        );
        Ok(())
    }

    fn parse_root(&mut self) -> ParseResult<Option<TriggerExpressionComponent>> {
        self.skip_whitespace();
        if self.at_end() {
            return Ok(None);
        }

        let root = self.parse_expr()?;

        self.skip_whitespace();
        if let Some(c) = self.peek() {
            self.recover(format!("unexpected '{}' after expression", c))?;
        }

        Ok(Some(root))
    }

    fn parse_expr(&mut self) -> ParseResult<TriggerExpressionComponent> {
        let first = self.parse_group()?;
        let mut children = vec![first];
        let mut operator: Option<char> = None;

        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };

            match c {
                AND | OR => {
                    match operator {
                        None => operator = Some(c),
                        Some(op) if op != c => {
                            self.recover(format!(
                                "mixing '{}' and '{}' requires parentheses",
                                op, c
                            ))?;
                        }
                        Some(_) => (),
                    }
                    self.pos += 1;
                    children.push(self.parse_group()?);
                }
                // reported by the enclosing group or the root
                _ => break,
            }
        }

        if children.len() == 1 {
            return Ok(children.remove(0));
        }

        Ok(match operator {
            Some(OR) => TriggerExpressionComponent::or(children),
            _ => TriggerExpressionComponent::and(children),
        })
    }

    fn parse_group(&mut self) -> ParseResult<TriggerExpressionComponent> {
        self.skip_whitespace();
        let mut negate = self.consume_if(NEGATE);
        self.skip_whitespace();
        while self.peek() == Some(NEGATE) {
            self.recover("repeated '!'".to_string())?;
            self.pos += 1;
            negate = !negate;
            self.skip_whitespace();
        }
        let cur_state = self.consume_if(CUR_STATE);
        self.skip_whitespace();

        if self.peek() == Some(GROUP_OPEN) {
            if cur_state {
                self.recover("'@' is only allowed before a target name".to_string())?;
            }
            self.pos += 1;
            self.skip_whitespace();

            if self.consume_if(GROUP_CLOSE) {
                return Ok(TriggerExpressionComponent::and(Vec::new()).with_negate(negate));
            }

            let mut inner = self.parse_expr()?;

            self.skip_whitespace();
            match self.peek() {
                Some(GROUP_CLOSE) => self.pos += 1,
                None => self.recover("missing ')'".to_string())?,
                Some(c) => {
                    self.recover(format!("expected ')', found '{}'", c))?;
                    self.skip_past_group_close();
                }
            }

            let combined = inner.negate() ^ negate;
            inner.set_negate(combined);
            return Ok(inner);
        }

        let name = match self.parse_name()? {
            Some(name) => name,
            None => {
                match self.peek() {
                    Some(c) => self.recover(format!("expected target name, found '{}'", c))?,
                    None => self.recover("expected target name".to_string())?,
                }
                String::new()
            }
        };

        Ok(TriggerExpressionComponent::target(name)
            .with_negate(negate)
            .with_cur_state(cur_state))
    }

    fn parse_name(&mut self) -> ParseResult<Option<String>> {
        if self.consume_if(QUOTE) {
            let mut name = String::new();
            loop {
                match self.peek() {
                    None => {
                        self.recover("unterminated quoted name".to_string())?;
                        break;
                    }
                    Some(QUOTE) => {
                        self.pos += 1;
                        break;
                    }
                    Some(ESCAPE) => {
                        self.pos += 1;
                        match self.peek() {
                            Some(escaped @ (QUOTE | ESCAPE)) => {
                                name.push(escaped);
                                self.pos += 1;
                            }
                            _ => name.push(ESCAPE),
                        }
                    }
                    Some(c) => {
                        name.push(c);
                        self.pos += 1;
                    }
                }
            }
            return Ok(Some(name));
        }

        let start = self.pos;
        while self.peek().is_some_and(|c| !is_reserved(c)) {
            self.pos += 1;
        }

        if self.pos == start {
            return Ok(None);
        }
        Ok(Some(self.chars[start..self.pos].iter().collect()))
    }
}

fn needs_quotes(name: &str) -> bool {
    name.is_empty() || name.chars().any(is_reserved)
}

fn write_name(out: &mut String, name: &str) {
    if !needs_quotes(name) {
        out.push_str(name);
        return;
    }

    out.push(QUOTE);
    for c in name.chars() {
        if c == QUOTE || c == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

fn write_component(out: &mut String, component: &TriggerExpressionComponent, top_level: bool) {
    if component.negate() {
        out.push(NEGATE);
    }

    if let Some(name) = component.target_name() {
        if component.cur_state() {
            out.push(CUR_STATE);
        }
        write_name(out, name);
        return;
    }

    let children = component.children();
    let operator = match component.kind() {
        super::ComponentType::Or => OR,
        _ => AND,
    };
    let parenthesize = !top_level || component.negate() || children.is_empty();

    if parenthesize {
        out.push(GROUP_OPEN);
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push(operator);
        }
        write_component(out, child, false);
    }
    if parenthesize {
        out.push(GROUP_CLOSE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::ComponentType;

    fn parse(text: &str) -> TriggerExpressionComponent {
        TriggerExpressionParser::strict()
            .parse_component(text)
            .unwrap()
            .unwrap()
    }

    fn to_string(component: &TriggerExpressionComponent) -> String {
        TriggerExpressionParser::strict().component_to_string(component)
    }

    #[test]
    fn test_blank_is_empty() {
        let parser = TriggerExpressionParser::strict();
        assert!(parser.parse_component("").unwrap().is_none());
        assert!(parser.parse_component("   \t").unwrap().is_none());
    }

    #[test]
    fn test_leaf_prefixes() {
        let leaf = parse("!@door");
        assert_eq!(leaf.kind(), ComponentType::Target);
        assert_eq!(leaf.target_name(), Some("door"));
        assert!(leaf.negate());
        assert!(leaf.cur_state());
        assert_eq!(to_string(&leaf), "!@door");
    }

    #[test]
    fn test_groups() {
        let and = parse("a & b & c");
        assert_eq!(and.kind(), ComponentType::And);
        assert_eq!(and.children().len(), 3);

        let or = parse("a|(b&c)");
        assert_eq!(or.kind(), ComponentType::Or);
        assert_eq!(or.children()[1].kind(), ComponentType::And);
        assert_eq!(to_string(&or), "a|(b&c)");
    }

    #[test]
    fn test_single_child_collapses() {
        let leaf = parse("(a)");
        assert_eq!(leaf.kind(), ComponentType::Target);
        assert!(!leaf.negate());

        let negated = parse("!(a)");
        assert_eq!(negated.kind(), ComponentType::Target);
        assert!(negated.negate());

        let double = parse("!(!a)");
        assert!(!double.negate());
    }

    #[test]
    fn test_negated_group() {
        let group = parse("!(a&b)");
        assert_eq!(group.kind(), ComponentType::And);
        assert!(group.negate());
        assert_eq!(to_string(&group), "!(a&b)");
    }

    #[test]
    fn test_quoted_names() {
        let leaf = parse(r#""my \"big\" target""#);
        assert_eq!(leaf.target_name(), Some(r#"my "big" target"#));
        assert_eq!(to_string(&leaf), r#""my \"big\" target""#);

        let empty = parse(r#""""#);
        assert_eq!(empty.target_name(), Some(""));
        assert_eq!(to_string(&empty), r#""""#);

        let slash = TriggerExpressionComponent::target(r"a\b c");
        assert_eq!(parse(&to_string(&slash)).target_name(), Some(r"a\b c"));
    }

    #[test]
    fn test_empty_group() {
        let group = parse("()");
        assert_eq!(group.kind(), ComponentType::And);
        assert!(group.children().is_empty());
        assert_eq!(to_string(&group), "()");
    }

    #[test]
    fn test_strict_errors() {
        let parser = TriggerExpressionParser::strict();
        assert!(parser.parse_component("a&b|c").is_err());
        assert!(parser.parse_component("@(a&b)").is_err());
        assert!(parser.parse_component("(a&b").is_err());
        assert!(parser.parse_component("a&").is_err());
        assert!(parser.parse_component("a b").is_err());
        assert!(parser.parse_component("a)").is_err());
        assert!(parser.parse_component("\"open").is_err());
        assert!(parser.parse_component("!!a").is_err());

        let err = parser.parse_component("a&b|c").unwrap_err();
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_lenient_recovery() {
        let parser = TriggerExpressionParser::lenient();

        let mixed = parser.parse_component("a&b|c").unwrap().unwrap();
        assert_eq!(mixed.kind(), ComponentType::And);
        assert_eq!(mixed.children().len(), 3);

        let missing = parser.parse_component("a&").unwrap().unwrap();
        assert_eq!(missing.children()[1].target_name(), Some(""));

        let unclosed = parser.parse_component("!(a|b").unwrap().unwrap();
        assert_eq!(unclosed.kind(), ComponentType::Or);
        assert!(unclosed.negate());

        let trailing = parser.parse_component("a b").unwrap().unwrap();
        assert_eq!(trailing.target_name(), Some("a"));

        let quote = parser.parse_component("\"open end").unwrap().unwrap();
        assert_eq!(quote.target_name(), Some("open end"));

        let at_group = parser.parse_component("@(a&b)").unwrap().unwrap();
        assert_eq!(at_group.kind(), ComponentType::And);

        let double = parser.parse_component("!!a").unwrap().unwrap();
        assert_eq!(double.target_name(), Some("a"));
        assert!(!double.negate());

        let triple = parser.parse_component("!!!a").unwrap().unwrap();
        assert_eq!(triple.target_name(), Some("a"));
        assert!(triple.negate());
    }

    #[test]
    fn test_lenient_problems_warn_once() {
        let mut trailing = Cursor::new("a b", false);
        let root = trailing.parse_root().unwrap().unwrap();
        assert_eq!(root.target_name(), Some("a"));
        assert_eq!(trailing.warnings, 1);

        let mut group = Cursor::new("(a b (c)) & d", false);
        let root = group.parse_root().unwrap().unwrap();
        assert_eq!(group.warnings, 1);
        assert_eq!(root.kind(), ComponentType::And);
        assert_eq!(root.children()[0].target_name(), Some("a"));
        assert_eq!(root.children()[1].target_name(), Some("d"));

        let mut clean = Cursor::new("a&(b|c)", false);
        clean.parse_root().unwrap().unwrap();
        assert_eq!(clean.warnings, 0);
    }

    #[test]
    fn test_unknown_escape_keeps_backslash() {
        assert_eq!(parse(r#""a\q""#).target_name(), Some(r"a\q"));
        assert_eq!(parse(r#""a\\q""#).target_name(), Some(r"a\q"));
        assert_eq!(parse(r#""a\"""#).target_name(), Some(r#"a""#));
    }

    #[test]
    fn test_expression_round_trip() {
        let parser = TriggerExpressionParser::strict();
        for text in ["a&b", "a|b|c", "!(a&b)", "@a", "\"my target\"&b"] {
            let expression = parser.string_to_expression(text).unwrap();
            assert_eq!(parser.expression_to_string(&expression), text);
        }
        let empty = parser.string_to_expression("").unwrap();
        assert_eq!(parser.expression_to_string(&empty), "");
    }
}
