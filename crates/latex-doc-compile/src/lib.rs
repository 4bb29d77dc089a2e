//! Compile gateway: runs a fixed list of build commands over a set of files
//! in a scratch directory and reports what each command printed and produced.

mod error;
mod runner;

use std::path::Path;
use std::time::Duration;

use latex_doc_config::{CompileSettings, CompileStep};
use latex_doc_model::{to_latex, Document, SupportingFiles};

pub use error::{CompileError, Result};
pub use runner::{expand_command, run_steps, CommandResult};

/// Anything that can build a document from its files.
///
/// Execution stops after the first failing step that is not allowed to fail.
/// Any earlier non-zero return code therefore belongs to a step marked
/// `allow_failure`; only the last result decides whether the build passed.
pub trait CompileGateway: Send + Sync {
    fn compile(&self, files: &SupportingFiles, main_file: &Path) -> Result<Vec<CommandResult>>;
}

/// Gateway that runs configured command-line steps (`pdflatex`, `bibtex`, ...).
#[derive(Clone, Debug)]
pub struct LatexCompiler {
    steps: Vec<CompileStep>,
    timeout: Option<Duration>,
}

impl LatexCompiler {
    pub fn new(steps: Vec<CompileStep>) -> Self {
        Self {
            steps,
            timeout: None,
        }
    }

    pub fn from_settings(settings: &CompileSettings) -> Self {
        Self {
            steps: settings.steps.clone(),
            timeout: settings.timeout,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn steps(&self) -> &[CompileStep] {
        &self.steps
    }
}

impl CompileGateway for LatexCompiler {
    fn compile(&self, files: &SupportingFiles, main_file: &Path) -> Result<Vec<CommandResult>> {
        run_steps(files, &self.steps, main_file, self.timeout)
    }
}

/// True when at least one step ran and the last one exited with 0.
///
/// Tolerated failures of earlier steps do not count; a tolerated failure of
/// the final step does.
pub fn compile_succeeded(results: &[CommandResult]) -> bool {
    results.last().is_some_and(CommandResult::succeeded)
}

/// Serialize `doc` as `main_file` next to its supporting files and compile.
pub fn compile_document<G>(gateway: &G, doc: &Document, main_file: &Path) -> Result<Vec<CommandResult>>
where
    G: CompileGateway + ?Sized,
{
    let mut files = doc.supporting_files().clone();
    let mut source = to_latex(doc);
    source.push('\n');
    files.insert(main_file.to_path_buf(), source.into_bytes());
    gateway.compile(&files, main_file)
}
