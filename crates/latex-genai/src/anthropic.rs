use std::env;
use std::thread;
use std::time::Duration;

use latex_doc_config::GenAiSettings;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::{ChatBackend, ChatRequest};
use crate::error::{GenAiError, Result};

const API_VERSION: &str = "2023-06-01";
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Messages-API backend over blocking HTTP.
pub struct AnthropicBackend {
    http: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    max_retries: u32,
    api_key: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

enum Attempt {
    Done(String),
    Retry(GenAiError),
}

impl AnthropicBackend {
    /// Build a backend from settings, reading the key from `api_key_env`.
    pub fn from_settings(settings: &GenAiSettings) -> Result<Self> {
        let api_key = env::var(&settings.api_key_env).map_err(|_| GenAiError::MissingApiKey {
            var: settings.api_key_env.clone(),
        })?;
        Self::new(settings, api_key)
    }

    pub fn new(settings: &GenAiSettings, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            max_retries: settings.max_retries,
            api_key: api_key.into(),
        })
    }

    fn attempt(&self, request: ChatRequest<'_>) -> Result<Attempt> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: request.system_prompt,
            messages: [Message {
                role: "user",
                content: request.user_prompt,
            }],
        };

        let response = match self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
        {
            Ok(response) => response,
            Err(err) if err.is_connect() || err.is_timeout() => {
                return Ok(Attempt::Retry(err.into()))
            }
            Err(err) => return Err(err.into()),
        };

        let status = response.status();
        if !status.is_success() {
            let error = GenAiError::Status {
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            };
            return if is_transient(status) {
                Ok(Attempt::Retry(error))
            } else {
                Err(error)
            };
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|err| GenAiError::Decode(err.to_string()))?;
        Ok(Attempt::Done(join_text(parsed)?))
    }
}

impl ChatBackend for AnthropicBackend {
    fn complete(&self, request: ChatRequest<'_>) -> Result<String> {
        let mut backoff = INITIAL_BACKOFF;
        let mut retries = 0;
        loop {
            match self.attempt(request)? {
                Attempt::Done(text) => return Ok(text),
                Attempt::Retry(error) if retries < self.max_retries => {
                    retries += 1;
                    warn!(%error, retries, delay_ms = backoff.as_millis() as u64, "retrying generation request");
                    thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Attempt::Retry(error) => return Err(error),
            }
        }
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn join_text(response: MessagesResponse) -> Result<String> {
    let mut parts = Vec::with_capacity(response.content.len());
    for block in response.content {
        if block.kind != "text" {
            return Err(GenAiError::Decode(format!(
                "unexpected content block type '{}'",
                block.kind
            )));
        }
        parts.push(block.text);
    }
    Ok(parts.join("\n"))
}
