use latex_doc_compile::CompileError;
use latex_edit_core::EditError;
use latex_genai::GenAiError;
use rayon::ThreadPoolBuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("the unmodified document does not compile; fix it before guarding fragments")]
    BaselineDoesNotCompile { log: String },

    #[error("compile failed: {0}")]
    Compile(#[from] CompileError),

    #[error("text generation failed: {0}")]
    Generation(#[from] GenAiError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("failed to start guard workers: {0}")]
    Pool(#[from] ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, GuardError>;
