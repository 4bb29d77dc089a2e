//! Guard against generated fragments that break the build.
//!
//! A candidate fragment is inserted into a copy of the document between two
//! unique `\typeout` markers and compiled. When the build fails, the log lines
//! printed between the markers are sent back to the text generator together
//! with the fragment, and the repaired reply is tried next. After the attempt
//! budget is spent the last candidate is returned visibly flagged.

mod error;
mod isolate;
mod prompt;
mod state;

use std::path::PathBuf;

use latex_doc_compile::{compile_document, compile_succeeded, CommandResult, CompileGateway};
use latex_doc_config::GuardSettings;
use latex_doc_model::{markers, ContentReference, Document};
use latex_doc_utils::bounded_parallel_map;
use latex_edit_core::{add_comment, EditError};
use latex_genai::TextGenerator;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use error::{GuardError, Result};
pub use isolate::isolate_diagnostics;
pub use prompt::{repair_prompt, REPAIR_SYSTEM_PROMPT};
pub use state::GuardState;

/// Prefix placed in front of a fragment that could not be repaired.
pub const EXHAUSTED_PREFIX: &str = "\\textbf{Unable to automatically fix the LaTeX errors below:}";

const REPAIR_LABEL: &str = "latex-guard";
const DEFAULT_MAIN_FILE: &str = "main.tex";

#[derive(Clone, Debug)]
pub struct GuardOptions {
    /// Compile attempts per fragment, the first one included.
    pub max_attempts: usize,
    /// Name the document is compiled under.
    pub main_file: PathBuf,
}

impl GuardOptions {
    pub fn from_settings(settings: &GuardSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            ..Self::default()
        }
    }

    pub fn with_main_file(mut self, main_file: impl Into<PathBuf>) -> Self {
        self.main_file = main_file.into();
        self
    }
}

impl Default for GuardOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            main_file: PathBuf::from(DEFAULT_MAIN_FILE),
        }
    }
}

/// Final outcome for one fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardReport {
    pub reference: ContentReference,
    /// The accepted candidate, or the flagged last candidate.
    pub fragment: String,
    /// Either [`GuardState::Accepted`] or [`GuardState::Exhausted`].
    pub state: GuardState,
    /// Compiles run for this fragment, baseline excluded.
    pub attempts: usize,
}

impl GuardReport {
    pub fn is_accepted(&self) -> bool {
        self.state == GuardState::Accepted
    }
}

enum Probe {
    Compiles,
    Fails { diagnostics: String },
}

/// Repair loop bound to a compiler and a text generator.
pub struct Guard<'a> {
    compiler: &'a dyn CompileGateway,
    generator: &'a dyn TextGenerator,
    options: GuardOptions,
}

impl<'a> Guard<'a> {
    pub fn new(
        compiler: &'a dyn CompileGateway,
        generator: &'a dyn TextGenerator,
        options: GuardOptions,
    ) -> Self {
        Self {
            compiler,
            generator,
            options,
        }
    }

    pub fn options(&self) -> &GuardOptions {
        &self.options
    }

    /// Guard a single fragment destined for `reference`.
    pub fn guard(
        &self,
        doc: &Document,
        reference: &ContentReference,
        fragment: &str,
    ) -> Result<GuardReport> {
        ensure_reference(doc, reference)?;
        self.ensure_baseline(doc)?;
        self.repair_loop(doc, reference, fragment)
    }

    /// Guard independent fragments concurrently on at most `workers` threads.
    ///
    /// The baseline is compiled once. Reports come back in request order.
    pub fn guard_all(
        &self,
        doc: &Document,
        requests: Vec<(ContentReference, String)>,
        workers: usize,
    ) -> Result<Vec<GuardReport>> {
        for (reference, _) in &requests {
            ensure_reference(doc, reference)?;
        }
        self.ensure_baseline(doc)?;
        info!(fragments = requests.len(), workers, "guarding fragments");

        bounded_parallel_map(requests, workers, |(reference, fragment)| {
            self.repair_loop(doc, &reference, &fragment)
        })?
        .into_iter()
        .collect()
    }

    fn ensure_baseline(&self, doc: &Document) -> Result<()> {
        let results = compile_document(self.compiler, doc, &self.options.main_file)?;
        if compile_succeeded(&results) {
            debug!("baseline document compiles");
            return Ok(());
        }
        Err(GuardError::BaselineDoesNotCompile {
            log: last_stdout(&results).to_string(),
        })
    }

    fn repair_loop(
        &self,
        doc: &Document,
        reference: &ContentReference,
        fragment: &str,
    ) -> Result<GuardReport> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut candidate = fragment.to_string();
        let mut state = GuardState::Unchecked;

        for attempt in 1..=max_attempts {
            state = state.advance(GuardState::Compiling, reference);
            match self.probe(doc, reference, &candidate)? {
                Probe::Compiles => {
                    info!(%reference, attempts = attempt, "fragment accepted");
                    return Ok(GuardReport {
                        reference: reference.clone(),
                        fragment: candidate,
                        state: state.advance(GuardState::Accepted, reference),
                        attempts: attempt,
                    });
                }
                Probe::Fails { diagnostics } => {
                    state = state.advance(GuardState::NeedsRepair, reference);
                    if attempt == max_attempts {
                        break;
                    }
                    state = state.advance(GuardState::RepairQuerying, reference);
                    candidate = self.generator.query(
                        REPAIR_SYSTEM_PROMPT,
                        &repair_prompt(&candidate, &diagnostics),
                        REPAIR_LABEL,
                    )?;
                }
            }
        }

        warn!(%reference, attempts = max_attempts, "could not repair fragment");
        Ok(GuardReport {
            reference: reference.clone(),
            fragment: flag_unrepaired(&candidate),
            state: state.advance(GuardState::Exhausted, reference),
            attempts: max_attempts,
        })
    }

    fn probe(&self, doc: &Document, reference: &ContentReference, candidate: &str) -> Result<Probe> {
        let token = format!("guard-run={}", Uuid::new_v4());
        let marker = markers::typeout(&token);
        let lines = [marker.clone(), candidate.to_string(), marker];

        let probe = match add_comment(doc, reference, &lines) {
            Ok(probe) => probe,
            Err(EditError::StructuralHazard { line }) => {
                return Ok(Probe::Fails {
                    diagnostics: format!(
                        "! The snippet must not start a new section, subsection or subsubsection: {line}"
                    ),
                })
            }
            Err(err) => return Err(err.into()),
        };

        let results = compile_document(self.compiler, &probe, &self.options.main_file)?;
        if compile_succeeded(&results) {
            return Ok(Probe::Compiles);
        }
        Ok(Probe::Fails {
            diagnostics: isolate_diagnostics(last_stdout(&results), &token),
        })
    }
}

/// `fragment` behind the visible "could not fix" banner.
///
/// Sectioning commands are printed literally so the flagged fragment can
/// always be inserted.
pub fn flag_unrepaired(fragment: &str) -> String {
    format!(
        "{EXHAUSTED_PREFIX}\n\n{}",
        markers::escape_sectioning_commands(fragment)
    )
}

fn ensure_reference(doc: &Document, reference: &ContentReference) -> Result<()> {
    if doc.content().contains_key(reference) {
        Ok(())
    } else {
        Err(EditError::ReferenceNotFound {
            reference: reference.clone(),
        }
        .into())
    }
}

fn last_stdout(results: &[CommandResult]) -> &str {
    results.last().map_or("", |result| result.stdout.as_str())
}
