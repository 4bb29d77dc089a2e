use std::io;

use latex_doc_model::ContentReference;
use latex_doc_parser::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    TooManyMatches = 2,
    InvalidArguments = 3,
    Io = 4,
    InvalidContent = 5,
    Parse = 6,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NotFound),
            2 => Some(Self::TooManyMatches),
            3 => Some(Self::InvalidArguments),
            4 => Some(Self::Io),
            5 => Some(Self::InvalidContent),
            6 => Some(Self::Parse),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("content reference not found in document: {reference}")]
    ReferenceNotFound { reference: ContentReference },

    #[error("comment must not open a new section: {line}")]
    StructuralHazard { line: String },

    #[error("no matching sections found")]
    NotFound,

    #[error("pattern matches {actual} sections, at most {max} allowed")]
    TooManyMatches { max: usize, actual: usize },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid content source: {0}")]
    InvalidContent(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl EditError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ReferenceNotFound { .. } | Self::NotFound => ExitCode::NotFound,
            Self::TooManyMatches { .. } => ExitCode::TooManyMatches,
            Self::InvalidArguments(_) => ExitCode::InvalidArguments,
            Self::StructuralHazard { .. } | Self::InvalidContent(_) => ExitCode::InvalidContent,
            Self::Parse(_) => ExitCode::Parse,
            Self::Io(_) => ExitCode::Io,
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
