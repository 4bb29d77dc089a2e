use std::path::PathBuf;

use latex_doc_model::{to_latex, ContentReference, Document};
use latex_doc_parser::parse_from_latex;
use regex::Regex;
use tracing::{debug, info};

use crate::comment::{add_comment, comment_lines};
use crate::diff::build_unified_diff;
use crate::error::{EditError, EditResult, ExitCode};
use crate::fs::write_with_backup;
use crate::payload::{load_payload, PayloadSource};

/// Which content regions a selector may match in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Any,
    Main,
    Appendix,
}

impl Region {
    fn admits(self, in_appendix: bool) -> bool {
        match self {
            Region::Any => true,
            Region::Main => !in_appendix,
            Region::Appendix => in_appendix,
        }
    }
}

/// How the target entry of a comment is chosen.
#[derive(Debug, Clone)]
pub enum Selector {
    /// The single section whose title, explicit label or generated label
    /// matches the pattern.
    Section { pattern: Regex, region: Region },
    /// The text before the first section of the main region, or of the
    /// appendix when `in_appendix` is set.
    PreSection { in_appendix: bool },
}

#[derive(Debug, Clone)]
pub struct CommentOptions {
    pub dry_run: bool,
    pub backup: bool,
}

impl Default for CommentOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommentRequest {
    pub path: PathBuf,
    pub selector: Selector,
    pub payload: PayloadSource,
    pub options: CommentOptions,
}

#[derive(Debug)]
pub struct CommentOutcome {
    pub exit_code: ExitCode,
    pub changed: bool,
    pub reference: ContentReference,
    pub diff: Option<String>,
    pub result: String,
}

/// Resolve `selector` to exactly one key of the document's content map.
pub fn select_reference(doc: &Document, selector: &Selector) -> EditResult<ContentReference> {
    match selector {
        Selector::PreSection { in_appendix } => {
            let reference = ContentReference::pre_section(*in_appendix);
            if doc.content().contains_key(&reference) {
                Ok(reference)
            } else {
                Err(EditError::ReferenceNotFound { reference })
            }
        }
        Selector::Section { pattern, region } => {
            let matches: Vec<_> = doc
                .content()
                .sections()
                .filter(|section| region.admits(section.in_appendix))
                .filter(|section| {
                    pattern.is_match(&section.title)
                        || section.labels().any(|label| pattern.is_match(label))
                })
                .collect();

            match matches.as_slice() {
                [] => Err(EditError::NotFound),
                [section] => Ok(ContentReference::Section((*section).clone())),
                _ => Err(EditError::TooManyMatches {
                    max: 1,
                    actual: matches.len(),
                }),
            }
        }
    }
}

/// Insert a comment into a `.tex` file on disk.
///
/// The file is parsed, the comment prepended to the selected entry and the
/// document serialized back. Serialization adds a generated `\label{..}` after
/// every section heading.
pub fn apply_comment(request: CommentRequest) -> EditResult<CommentOutcome> {
    let content = std::fs::read_to_string(&request.path)?;
    let doc = parse_from_latex(&content)?;

    let reference = select_reference(&doc, &request.selector)?;
    debug!(%reference, path = %request.path.display(), "selected comment target");

    let payload = load_payload(request.payload)?;
    let updated = add_comment(&doc, &reference, &comment_lines(&payload))?;

    let mut result = to_latex(&updated);
    result.push('\n');

    let diff = build_unified_diff(&content, &result, request.path.to_string_lossy().as_ref());
    let changed = diff.is_some();

    if changed && !request.options.dry_run {
        write_with_backup(&request.path, &result, request.options.backup)?;
        info!(path = %request.path.display(), %reference, "wrote comment");
    }

    Ok(CommentOutcome {
        exit_code: ExitCode::Success,
        changed,
        reference,
        diff,
        result,
    })
}
