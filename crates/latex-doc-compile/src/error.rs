use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("no compile steps configured")]
    NoSteps,

    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` did not finish within {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("compile scratch directory error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;
