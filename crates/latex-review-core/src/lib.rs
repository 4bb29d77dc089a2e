//! Core orchestration layer for latex-review.
//!
//! [`LatexReview`] wires configuration, parser, compiler and guard together.
//! Choosing what to review is left to the caller: it hands in one
//! [`ReviewRequest`] per comment and gets back the commented document.

use std::path::{Path, PathBuf};

use latex_doc_compile::{
    compile_document, CommandResult, CompileError, CompileGateway, LatexCompiler,
};
use latex_doc_config::Config;
use latex_doc_model::{ContentReference, Document};
use latex_doc_parser::{ParseError, ParserContext};
use latex_edit_core::{add_comment, comment_lines, wrap_review_block, EditError};
use latex_genai::{AnthropicBackend, GenAiClient, GenAiError, TextGenerator};
use latex_review_guard::{Guard, GuardError, GuardOptions, GuardReport};
use thiserror::Error;
use tracing::info;

/// Package needed by review blocks.
pub const REVIEW_PACKAGE: &str = "color";

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Generation(#[from] GenAiError),
}

pub type Result<T> = std::result::Result<T, ReviewError>;

/// A document read from disk together with where it came from.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub document: Document,
    pub dir: PathBuf,
    /// Main file name relative to `dir`.
    pub main_file: PathBuf,
}

/// One comment to place in front of `reference`.
#[derive(Clone, Debug)]
pub struct ReviewRequest {
    pub reference: ContentReference,
    /// Label used in the `\typeout` markers around the block.
    pub label: String,
    pub header: String,
    pub body: String,
}

#[derive(Debug)]
pub struct ReviewOutcome {
    pub document: Document,
    pub reports: Vec<GuardReport>,
}

/// Entry point for higher-level consumers such as the CLI.
pub struct LatexReview {
    config: Config,
    parser: ParserContext,
    compiler: Box<dyn CompileGateway>,
}

impl LatexReview {
    /// Bootstrap the review engine from configuration.
    pub fn bootstrap(config: Config) -> Self {
        Self {
            parser: ParserContext::new(config.clone()),
            compiler: Box::new(LatexCompiler::from_settings(&config.compile)),
            config,
        }
    }

    /// Replace the configured command-line compiler.
    pub fn with_compiler(mut self, compiler: impl CompileGateway + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parser(&self) -> &ParserContext {
        &self.parser
    }

    pub fn compiler(&self) -> &dyn CompileGateway {
        self.compiler.as_ref()
    }

    pub fn load(&self, path: &Path) -> Result<LoadedDocument> {
        let (dir, main_file) = self.parser.resolve_main_file(path)?;
        let document = self.parser.load(path)?;
        Ok(LoadedDocument {
            document,
            dir,
            main_file,
        })
    }

    /// Compile the document as loaded, without any change.
    pub fn check(&self, loaded: &LoadedDocument) -> Result<Vec<CommandResult>> {
        Ok(compile_document(
            self.compiler.as_ref(),
            &loaded.document,
            &loaded.main_file,
        )?)
    }

    /// Text-generation client built from the `[genai]` settings.
    pub fn genai_client(&self) -> Result<GenAiClient<AnthropicBackend>> {
        let settings = &self.config.genai;
        let client = GenAiClient::new(AnthropicBackend::from_settings(settings)?);
        Ok(match &settings.log_dir {
            Some(dir) => client.with_log_dir(dir)?,
            None => client,
        })
    }

    pub fn guard<'a>(&'a self, generator: &'a dyn TextGenerator, main_file: &Path) -> Guard<'a> {
        let options = GuardOptions::from_settings(&self.config.guard).with_main_file(main_file);
        Guard::new(self.compiler.as_ref(), generator, options)
    }

    /// Guard every request as a review block and attach the results to the
    /// document in request order.
    pub fn review(
        &self,
        loaded: &LoadedDocument,
        generator: &dyn TextGenerator,
        requests: Vec<ReviewRequest>,
    ) -> Result<ReviewOutcome> {
        let document = loaded.document.with_extra_package(REVIEW_PACKAGE);
        let fragments = requests
            .into_iter()
            .map(|request| {
                let block = wrap_review_block(&request.label, &request.header, &request.body);
                (request.reference, block)
            })
            .collect();

        let reports = self
            .guard(generator, &loaded.main_file)
            .guard_all(&document, fragments, self.config.compile.workers)?;
        let document = fold_reports(&document, &reports)?;

        info!(
            comments = reports.len(),
            repaired = reports.iter().filter(|report| report.attempts > 1).count(),
            exhausted = reports.iter().filter(|report| !report.is_accepted()).count(),
            "review complete"
        );
        Ok(ReviewOutcome { document, reports })
    }
}

/// Insert every report's fragment, one after another, in the given order.
pub fn fold_reports(doc: &Document, reports: &[GuardReport]) -> std::result::Result<Document, EditError> {
    reports.iter().try_fold(doc.clone(), |current, report| {
        add_comment(&current, &report.reference, &comment_lines(&report.fragment))
    })
}
