//! Structural parser for LaTeX documents.
//!
//! The parser recognises only the envelope (`\documentclass`,
//! `\begin{document}`, `\maketitle`, the bibliography and `\end{document}`),
//! the `\appendix` split and top-level `\section{..}` markers. Everything else
//! is kept verbatim as lines of the surrounding entry so that serializing the
//! result reproduces the input.

mod error;
mod structure;

use std::path::{Path, PathBuf};

use globset::GlobMatcher;
use latex_doc_config::{Config, PatternList};
use latex_doc_model::{Document, SupportingFiles};
use latex_doc_utils::read_directory;
use tracing::{debug, info};

pub use error::{ParseError, Result};
pub use structure::parse_from_latex;

/// Parse the `main_file` entry of `files`; every other entry is carried as a
/// supporting file.
pub fn parse_from_files(mut files: SupportingFiles, main_file: &Path) -> Result<Document> {
    let Some(bytes) = files.remove(main_file) else {
        return Err(ParseError::MainFileMissing {
            path: main_file.to_path_buf(),
        });
    };
    let text = String::from_utf8(bytes).map_err(|_| ParseError::Encoding {
        path: main_file.to_path_buf(),
    })?;

    let document = parse_from_latex(&text)?;
    Ok(document.with_supporting_files(files))
}

/// High-level parser context configured with resolved settings.
#[derive(Clone)]
pub struct ParserContext {
    config: Config,
}

impl ParserContext {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether a supporting file (relative to the document directory) is
    /// loaded alongside the main file.
    pub fn is_path_in_scope(&self, relative: &Path) -> bool {
        !matches_patterns(&self.config.project.exclude, relative)
    }

    /// Resolve the main `.tex` file for `path`, which may name the file itself
    /// or the directory holding it.
    pub fn resolve_main_file(&self, path: &Path) -> Result<(PathBuf, PathBuf)> {
        let absolute = self.absolute_path(path);
        if absolute.is_dir() {
            let main = self.config.project.main_file.clone().ok_or_else(|| {
                ParseError::MainFileMissing {
                    path: absolute.join("<project.main_file>"),
                }
            })?;
            return Ok((absolute, main));
        }

        match (absolute.parent(), absolute.file_name()) {
            (Some(dir), Some(name)) => Ok((dir.to_path_buf(), PathBuf::from(name))),
            _ => Err(ParseError::MainFileMissing { path: absolute }),
        }
    }

    /// Load a document and its supporting files from disk.
    pub fn load(&self, path: &Path) -> Result<Document> {
        let (dir, main_file) = self.resolve_main_file(path)?;
        let files = read_directory(&dir, |relative| {
            relative == main_file.as_path() || self.is_path_in_scope(relative)
        })
        .map_err(|source| ParseError::Io {
            path: dir.clone(),
            source,
        })?;
        debug!(dir = %dir.display(), files = files.len(), "read document directory");

        let document = parse_from_files(files, &main_file)?;
        info!(
            main = %main_file.display(),
            entries = document.content().len(),
            supporting = document.supporting_files().len(),
            "parsed document"
        );
        Ok(document)
    }

    fn absolute_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.project.root.join(path)
        }
    }
}

fn matches_patterns(patterns: &PatternList, path: &Path) -> bool {
    patterns.iter().any(|pattern| {
        let matcher: GlobMatcher = pattern.glob().compile_matcher();
        matcher.is_match(path)
    })
}
