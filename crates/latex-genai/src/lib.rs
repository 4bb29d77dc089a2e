//! Text-generation client used to repair and review LaTeX fragments.
//!
//! [`GenAiClient`] is the context object handed to every call site. It wraps a
//! [`ChatBackend`] transport, counts calls and, when a log directory is set,
//! records each exchange in its own file.

mod anthropic;
mod client;
mod error;

pub use anthropic::AnthropicBackend;
pub use client::{sanitize_label, ChatBackend, ChatRequest, GenAiClient};
pub use error::{GenAiError, Result};

/// A source of replies to a system prompt plus user prompt.
pub trait TextGenerator: Send + Sync {
    /// `label` names the call in logs; it does not influence the reply.
    fn query(&self, system_prompt: &str, user_prompt: &str, label: &str) -> Result<String>;
}
