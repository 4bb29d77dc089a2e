use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Structural problems that make a document unusable. None of these are
/// retried; the source has to be fixed.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing required marker {marker}")]
    MissingMarker { marker: &'static str },
    #[error("line {line}: unexpected {marker}")]
    UnexpectedMarker { line: usize, marker: &'static str },
    #[error("line {line}: content outside the document envelope: {text}")]
    ContentOutsideEnvelope { line: usize, text: String },
    #[error("line {line}: malformed {marker}: {text}")]
    MalformedMarker {
        line: usize,
        marker: &'static str,
        text: String,
    },
    #[error("duplicate labels: {}", labels.join(", "))]
    DuplicateLabels { labels: Vec<String> },
    #[error("main file {path} not found")]
    MainFileMissing { path: PathBuf },
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, ParseError>;
