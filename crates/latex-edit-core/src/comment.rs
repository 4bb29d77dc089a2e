use latex_doc_model::markers;
use latex_doc_model::{ContentReference, Document};
use tracing::debug;

use crate::error::{EditError, EditResult};

/// Return a copy of `doc` with `lines` placed before the existing content of
/// `reference`. No other entry changes and the key set is preserved.
///
/// Lines that would open a `\section`, `\subsection` or `\subsubsection` are
/// rejected, since they would renumber every later section on the next parse.
pub fn add_comment(
    doc: &Document,
    reference: &ContentReference,
    lines: &[String],
) -> EditResult<Document> {
    if let Some(line) = lines
        .iter()
        .find(|line| markers::contains_sectioning_command(line))
    {
        return Err(EditError::StructuralHazard { line: line.clone() });
    }

    let content = doc
        .content()
        .with_prepended(reference, lines)
        .ok_or_else(|| EditError::ReferenceNotFound {
            reference: reference.clone(),
        })?;

    debug!(%reference, lines = lines.len(), "inserted comment");
    Ok(doc.with_content(content))
}

/// Split free text into document lines, dropping trailing newlines.
pub fn comment_lines(text: &str) -> Vec<String> {
    text.trim_end_matches(['\n', '\r'])
        .split('\n')
        .map(|line| line.trim_end().to_string())
        .collect()
}
