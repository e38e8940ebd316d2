// src/agent/llm.rs

use crate::error::TransportError;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Blocking client for an OpenAI-style `POST /chat/completions` endpoint.
pub struct ChatClient {
    pub model: String,
    api_base: String,
    api_key: Option<String>,
    http: reqwest::blocking::Client,
}

impl ChatClient {
    pub fn new(
        model: &str,
        api_base: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self {
            model: model.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    /// Sends one system + user exchange and returns the assistant's text.
    pub fn complete(&self, system: &str, user: &str) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", self.api_base);
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        });

        let mut request = self.http.post(&url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        read_completion(status, &body)
    }
}

/// Maps a chat-completion response to the assistant's text.
fn read_completion(status: u16, body: &str) -> Result<String, TransportError> {
    if !(200..300).contains(&status) {
        return Err(TransportError::Status {
            status,
            body: body.to_string(),
        });
    }
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(TransportError::MissingContent)
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
