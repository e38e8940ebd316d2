// src/lib.rs

//! Conformance harness for model-driven teammates that translate game
//! messages into action records.

pub mod agent;
pub mod analysis;
pub mod config;
pub mod error;
pub mod logger;
pub mod memory;
pub mod normalize;
pub mod protocol;
pub mod runner;
pub mod synth;
pub mod validation;

pub use agent::{CooperativeAgent, Respondent, llm::ChatClient};
pub use config::HarnessConfig;
pub use error::{HarnessError, ParseError, SynthesisError, TransportError};
pub use protocol::{Domain, Mode, ProtocolDefinition};
pub use runner::{AggregateResult, TrialRunner};
pub use synth::{Synthesized, Synthesizer};
