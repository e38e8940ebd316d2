// src/normalize/mod.rs

//! Turns a model reply into a structured record.
//!
//! Accepted encodings: a bare literal mapping, a mapping behind an
//! assignment prefix (`ACTION_TEMPLATE = {...}`), either of those inside a
//! markdown code fence, or a record that is already structured.

pub mod literal;

use crate::error::ParseError;
use serde_json::Value;

pub use literal::{parse_literal, to_literal};

/// One way of reading a literal expression.
pub trait LiteralStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, expr: &str) -> Result<Value, ParseError>;
}

/// The restricted native literal grammar from [`literal`].
pub struct NativeLiteral;

impl LiteralStrategy for NativeLiteral {
    fn name(&self) -> &'static str {
        "native_literal"
    }

    fn parse(&self, expr: &str) -> Result<Value, ParseError> {
        parse_literal(expr)
    }
}

/// Strict JSON, for replies using `true`/`false`/`null`.
pub struct StrictJson;

impl LiteralStrategy for StrictJson {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, expr: &str) -> Result<Value, ParseError> {
        serde_json::from_str(expr).map_err(|e| ParseError::Json(e.to_string()))
    }
}

/// Tries each strategy in order and returns the first success.
pub fn first_success(strategies: &[&dyn LiteralStrategy], expr: &str) -> Result<Value, ParseError> {
    let mut reasons = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        match strategy.parse(expr) {
            Ok(value) => return Ok(value),
            Err(e) => reasons.push(format!("{}: {}", strategy.name(), e)),
        }
    }
    Err(ParseError::Exhausted(reasons.join("; ")))
}

pub struct Normalizer {
    strategies: Vec<Box<dyn LiteralStrategy>>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            strategies: vec![Box::new(NativeLiteral), Box::new(StrictJson)],
        }
    }

    pub fn with_strategies(strategies: Vec<Box<dyn LiteralStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extracts a mapping from reply text.
    pub fn normalize(&self, reply: &str) -> Result<Value, ParseError> {
        let text = strip_code_fence(reply);
        let expr = candidate_expression(&text)?;
        let strategies: Vec<&dyn LiteralStrategy> =
            self.strategies.iter().map(|s| s.as_ref()).collect();
        let value = first_success(&strategies, expr)?;
        match value {
            Value::Object(_) => Ok(value),
            other => Err(ParseError::NotAMapping(value_kind(&other))),
        }
    }

    /// Like [`Normalizer::normalize`], but a reply that is already a mapping
    /// passes through unchanged.
    pub fn normalize_value(&self, reply: &Value) -> Result<Value, ParseError> {
        match reply {
            Value::Object(_) => Ok(reply.clone()),
            Value::String(text) => self.normalize(text),
            other => Err(ParseError::NotAMapping(value_kind(other))),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes with the default strategy order (native literal, then JSON).
pub fn normalize(reply: &str) -> Result<Value, ParseError> {
    Normalizer::new().normalize(reply)
}

pub fn normalize_value(reply: &Value) -> Result<Value, ParseError> {
    Normalizer::new().normalize_value(reply)
}

/// Trims the reply and drops an enclosing ```` ``` ```` fence, if any.
pub fn strip_code_fence(reply: &str) -> String {
    let trimmed = reply.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|l| l.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Picks the literal expression out of fence-free reply text: the whole text
/// when it opens a mapping, otherwise everything after the first `=`.
pub fn candidate_expression(text: &str) -> Result<&str, ParseError> {
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    if text.starts_with('{') {
        return Ok(text);
    }
    match text.split_once('=') {
        Some((_, rest)) => Ok(rest.trim()),
        None => Err(ParseError::NoLiteral),
    }
}

pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_json_block() {
        let reply = "```json\n{\"ACTION\": \"MOVE\"}\n```";
        assert_eq!(normalize(reply).unwrap(), json!({"ACTION": "MOVE"}));
    }

    #[test]
    fn assignment_prefix() {
        let reply = "ACTION_TEMPLATE = {'ACTION': 'SEND', 'RESOURCE': {'QUANTITY': 3}}";
        assert_eq!(
            normalize(reply).unwrap(),
            json!({"ACTION": "SEND", "RESOURCE": {"QUANTITY": 3}})
        );
    }

    #[test]
    fn fenced_assignment_with_surrounding_whitespace() {
        let reply = "\n  ```python\nACTION_TEMPLATE = {\n  'ACTION': 'REPEAT',\n}\n```  \n";
        assert_eq!(normalize(reply).unwrap(), json!({"ACTION": "REPEAT"}));
    }

    #[test]
    fn falls_back_to_json() {
        let reply = "{\"ACTION\": \"SCAN\", \"OK\": true, \"X\": null}";
        assert_eq!(
            normalize(reply).unwrap(),
            json!({"ACTION": "SCAN", "OK": true, "X": null})
        );
    }

    #[test]
    fn empty_and_prose_replies_fail_cleanly() {
        assert_eq!(normalize(""), Err(ParseError::Empty));
        assert_eq!(normalize("   \n "), Err(ParseError::Empty));
        assert_eq!(normalize("```\n```"), Err(ParseError::Empty));
        assert_eq!(
            normalize("I will move to (3, 4) now."),
            Err(ParseError::NoLiteral)
        );
    }

    #[test]
    fn garbage_after_assignment_exhausts_strategies() {
        match normalize("ACTION = move please") {
            Err(ParseError::Exhausted(reason)) => {
                assert!(reason.contains("native_literal"));
                assert!(reason.contains("json"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn non_mapping_literals_are_rejected() {
        assert_eq!(normalize("X = [1, 2]"), Err(ParseError::NotAMapping("sequence")));
    }

    #[test]
    fn structured_input_passes_through() {
        let record = json!({"ACTION": "MOVE", "LOCATION": {"COORDINATE": "(1, 2)"}});
        assert_eq!(normalize_value(&record).unwrap(), record);
        assert_eq!(
            normalize_value(&json!("{'ACTION': 'MOVE'}")).unwrap(),
            json!({"ACTION": "MOVE"})
        );
        assert!(normalize_value(&json!(false)).is_err());
    }

    #[test]
    fn strategy_order_is_configurable() {
        let json_only = Normalizer::with_strategies(vec![Box::new(StrictJson)]);
        assert!(matches!(
            json_only.normalize("{'ACTION': 'MOVE'}"),
            Err(ParseError::Exhausted(reason)) if !reason.contains("native_literal")
        ));
        assert_eq!(
            json_only.normalize("{\"ACTION\": \"MOVE\"}").unwrap(),
            json!({"ACTION": "MOVE"})
        );

        let literal_only = Normalizer::with_strategies(vec![Box::new(NativeLiteral)]);
        assert!(literal_only.normalize("{\"OK\": true}").is_err());
        assert_eq!(
            literal_only.normalize("{'OK': True}").unwrap(),
            json!({"OK": true})
        );
    }
}
