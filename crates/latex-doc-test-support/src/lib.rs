//! Shared test harness utilities for latex-review crates.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use latex_doc_compile::{CommandResult, CompileGateway, Result as CompileResult};
use latex_doc_config::Config;
use latex_doc_model::{markers, Document, SupportingFiles};
use latex_doc_parser::parse_from_latex;
use latex_genai::{GenAiError, Result as GenAiResult, TextGenerator};

/// The smallest document with one labelled section.
pub const INTRODUCTION: &str = "\\documentclass{article}\n\\begin{document}\n\\maketitle\n\\section{Introduction}\n\\label{sec:intro}\nHello world.\n\\end{document}";

/// Returns a baseline configuration for tests.
pub fn test_config() -> Config {
    Config::from_toml_str("", "/").expect("built-in defaults are valid")
}

pub fn introduction_document() -> Document {
    parse_from_latex(INTRODUCTION).expect("fixture parses")
}

/// Parse a fixture, panicking with the parse error on failure.
pub fn parse_fixture(source: &str) -> Document {
    match parse_from_latex(source) {
        Ok(doc) => doc,
        Err(err) => panic!("fixture does not parse: {err}"),
    }
}

/// Compiler stand-in that fails on unbalanced braces.
///
/// Brace depth is tracked across lines and checked at every `\typeout{..}`
/// line and at the end of the file. The log echoes each `\typeout` message
/// and reports a group left open as `! Unbalanced braces on line N: <text>`
/// (the line that opened it) just before the next message, so callers can
/// isolate the diagnostics of a bracketed fragment. A stray `}` is reported
/// on its own line.
#[derive(Default)]
pub struct BraceCheckingCompiler {
    compiles: AtomicUsize,
}

impl BraceCheckingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiles run so far.
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl CompileGateway for BraceCheckingCompiler {
    fn compile(&self, files: &SupportingFiles, main_file: &Path) -> CompileResult<Vec<CommandResult>> {
        self.compiles.fetch_add(1, Ordering::SeqCst);

        let source = files
            .get(main_file)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        let mut log = Vec::new();
        let mut failed = false;
        let mut depth = 0i64;
        let mut opened: Option<(usize, &str)> = None;

        for (idx, line) in source.lines().enumerate() {
            let number = idx + 1;
            if let Some(message) = markers::first_argument(markers::TYPEOUT, line.trim()) {
                if let Some((open_number, open_text)) = opened.take() {
                    failed = true;
                    log.push(unbalanced(open_number, open_text));
                    depth = 0;
                }
                log.push(message.to_string());
                continue;
            }

            let before = depth;
            depth += brace_depth(line);
            if depth < 0 {
                failed = true;
                log.push(unbalanced(number, line));
                depth = 0;
                opened = None;
            } else if before == 0 && depth > 0 {
                opened = Some((number, line));
            } else if depth == 0 {
                opened = None;
            }
        }
        if let Some((open_number, open_text)) = opened {
            failed = true;
            log.push(unbalanced(open_number, open_text));
        }
        if source.is_empty() {
            failed = true;
            log.push(format!("! I can't find file `{}'.", main_file.display()));
        }

        Ok(vec![CommandResult {
            command: vec!["brace-check".to_string(), main_file.display().to_string()],
            stdout: log.join("\n"),
            stderr: String::new(),
            returncode: i32::from(failed),
            output_files: files.clone(),
        }])
    }
}

fn unbalanced(number: usize, text: &str) -> String {
    format!("! Unbalanced braces on line {number}: {text}")
}

fn brace_depth(line: &str) -> i64 {
    let mut depth = 0i64;
    let mut escaped = false;
    for ch in line.chars() {
        match ch {
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            '{' if !escaped => depth += 1,
            '}' if !escaped => depth -= 1,
            _ => {}
        }
        escaped = false;
    }
    depth
}

/// Generator that replays queued replies and records every user prompt.
///
/// Once the queue is empty each query fails with an empty-response error.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt log poisoned").clone()
    }

    pub fn queries(&self) -> usize {
        self.prompts.lock().expect("prompt log poisoned").len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn query(&self, _system_prompt: &str, user_prompt: &str, label: &str) -> GenAiResult<String> {
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(user_prompt.to_string());
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .pop_front()
            .ok_or_else(|| GenAiError::EmptyResponse {
                label: label.to_string(),
            })
    }
}

/// Generator that always answers with the same text.
pub struct FixedGenerator {
    reply: String,
    queries: AtomicUsize,
}

impl FixedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl TextGenerator for FixedGenerator {
    fn query(&self, _system_prompt: &str, _user_prompt: &str, _label: &str) -> GenAiResult<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}
