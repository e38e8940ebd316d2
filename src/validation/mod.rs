// src/validation/mod.rs

pub mod subset;

use crate::error::ParseError;
use crate::normalize::Normalizer;
use serde_json::Value;

pub use subset::{FieldMismatch, is_subset, mismatches};

/// Outcome of checking one reply against its expected record.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The parsed reply covers the expected record.
    Match(Value),
    /// The reply parsed, but some field disagrees.
    Mismatch(Value),
    /// No mapping could be read from the reply.
    Unparseable(ParseError),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Match(_))
    }

    pub fn parsed(&self) -> Option<&Value> {
        match self {
            Verdict::Match(v) | Verdict::Mismatch(v) => Some(v),
            Verdict::Unparseable(_) => None,
        }
    }
}

/// An absent reply never verifies.
pub fn verify(expected: &Value, actual: Option<&Value>) -> bool {
    actual.is_some_and(|actual| is_subset(expected, actual))
}

/// Normalizes `reply` and checks it against `expected`.
pub fn verify_reply(normalizer: &Normalizer, expected: &Value, reply: &str) -> Verdict {
    match normalizer.normalize(reply) {
        Ok(parsed) if is_subset(expected, &parsed) => Verdict::Match(parsed),
        Ok(parsed) => Verdict::Mismatch(parsed),
        Err(e) => Verdict::Unparseable(e),
    }
}
