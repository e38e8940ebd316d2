// src/error.rs

use thiserror::Error;

/// Raised by the synthesizer. Vocabularies and ranges are closed, so any
/// occurrence is a defect in the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("unknown category '{category}' for domain {domain}")]
    UnknownCategory {
        domain: &'static str,
        category: String,
    },
}

/// The respondent could not produce any reply text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("non-success status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode completion: {0}")]
    Decode(String),
    #[error("completion has no message content")]
    MissingContent,
}

/// The normalizer could not pull a literal mapping out of a reply.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("reply is empty")]
    Empty,
    #[error("reply has no literal and no '=' assignment")]
    NoLiteral,
    #[error("invalid literal at byte {offset}: {reason}")]
    Literal { offset: usize, reason: String },
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("all literal strategies failed: {0}")]
    Exhausted(String),
    #[error("reply is a {0}, not a mapping")]
    NotAMapping(&'static str),
}

/// Crate-level errors for the parts that touch disk and configuration.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
}

impl HarnessError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
