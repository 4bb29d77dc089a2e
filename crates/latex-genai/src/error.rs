use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("environment variable {var} with the API key is not set")]
    MissingApiKey { var: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("empty response for '{label}'")]
    EmptyResponse { label: String },

    #[error("failed to write call log: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, GenAiError>;
