use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Local;
use tracing::{debug, info};

use crate::error::{GenAiError, Result};
use crate::TextGenerator;

const RULE_WIDTH: usize = 80;

/// One prompt pair sent to a backend.
#[derive(Clone, Copy, Debug)]
pub struct ChatRequest<'a> {
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
}

/// Transport for a single request/reply exchange.
pub trait ChatBackend: Send + Sync {
    fn complete(&self, request: ChatRequest<'_>) -> Result<String>;
}

/// Call counter and optional per-call log directory around a backend.
pub struct GenAiClient<B> {
    backend: B,
    calls: AtomicUsize,
    log_dir: Option<PathBuf>,
}

impl<B: ChatBackend> GenAiClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            calls: AtomicUsize::new(0),
            log_dir: None,
        }
    }

    /// Write one file per call into `dir`, creating it if needed.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        self.log_dir = Some(dir);
        Ok(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn write_log(&self, call: usize, request: ChatRequest<'_>, response: &str, label: &str) -> Result<()> {
        let Some(dir) = &self.log_dir else {
            return Ok(());
        };

        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let path = dir.join(format!("{timestamp}-{call:04}-{}.txt", sanitize_label(label)));
        fs::write(&path, render_log(call, request, response))?;
        debug!(path = %path.display(), "wrote generation log");
        Ok(())
    }
}

impl<B: ChatBackend> TextGenerator for GenAiClient<B> {
    fn query(&self, system_prompt: &str, user_prompt: &str, label: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let request = ChatRequest {
            system_prompt,
            user_prompt,
        };
        info!(call, label, "querying text generator");

        let response = self.backend.complete(request)?;
        self.write_log(call, request, &response, label)?;

        if response.trim().is_empty() {
            return Err(GenAiError::EmptyResponse {
                label: label.to_string(),
            });
        }
        Ok(response)
    }
}

/// Make `label` safe to use inside a file name.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        let ch = match ch {
            ' ' | ':' | '\'' | '"' | '$' | '{' | '}' | '\\' | '/' | '^' => '_',
            other => other,
        };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }
    out
}

fn render_log(call: usize, request: ChatRequest<'_>, response: &str) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    format!(
        "Call # {call}\n{heavy}\nSYSTEM PROMPT:\n{light}\n{}\n{light}\n\nUSER PROMPT:\n{light}\n{}\n{light}\n\nRESPONSE:\n{light}\n{response}\n{heavy}\n",
        request.system_prompt, request.user_prompt
    )
}
