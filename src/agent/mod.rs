// src/agent/mod.rs

pub mod llm;

use crate::error::TransportError;
use crate::protocol::{Domain, Mode};
use llm::ChatClient;
use tracing::debug;

/// Anything that can answer an incoming game message with free text.
pub trait Respondent {
    fn respond(&self, message: &str, mode: Mode) -> Result<String, TransportError>;
}

impl<F> Respondent for F
where
    F: Fn(&str, Mode) -> Result<String, TransportError>,
{
    fn respond(&self, message: &str, mode: Mode) -> Result<String, TransportError> {
        self(message, mode)
    }
}

/// A model-backed teammate for one domain. The system instructions depend on
/// whether incoming messages use the command syntax or free text.
pub struct CooperativeAgent {
    domain: Domain,
    client: ChatClient,
    structured_instructions: String,
    natural_instructions: String,
}

impl CooperativeAgent {
    pub fn new(domain: Domain, client: ChatClient) -> Self {
        let definition = domain.definition();
        Self {
            domain,
            client,
            structured_instructions: definition.system_instructions(Mode::Structured),
            natural_instructions: definition.system_instructions(Mode::NaturalLanguage),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn model(&self) -> &str {
        &self.client.model
    }

    pub fn instructions(&self, mode: Mode) -> &str {
        match mode {
            Mode::Structured => &self.structured_instructions,
            Mode::NaturalLanguage => &self.natural_instructions,
        }
    }
}

impl Respondent for CooperativeAgent {
    fn respond(&self, message: &str, mode: Mode) -> Result<String, TransportError> {
        debug!(domain = %self.domain, %mode, incoming = message, "sending message to model");
        self.client.complete(self.instructions(mode), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn closures_are_respondents() {
        let echo = |message: &str, mode: Mode| -> Result<String, TransportError> {
            Ok(format!("{mode}:{message}"))
        };
        assert_eq!(
            echo.respond("MOVE:(1, 2)", Mode::Structured).unwrap(),
            "structured:MOVE:(1, 2)"
        );
    }

    #[test]
    fn agent_picks_instructions_by_mode() {
        let client =
            ChatClient::new("m", "http://127.0.0.1:9", None, Duration::from_millis(100)).unwrap();
        let agent = CooperativeAgent::new(Domain::Minecraft, client);
        assert!(agent.instructions(Mode::Structured).contains("CMD_CODES"));
        assert!(!agent.instructions(Mode::NaturalLanguage).contains("CMD_CODES"));
        assert_eq!(agent.model(), "m");
    }
}
