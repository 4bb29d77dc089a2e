//! Output formatters for latex-review commands.

use std::fmt::Write as _;
use std::path::PathBuf;

use latex_doc_model::{ContentReference, Document};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutlineFormat {
    #[default]
    Plain,
    Json,
}

/// Summary of a document's addressable content.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
    pub pre_matter_lines: usize,
    pub has_appendix: bool,
    pub bibliography_lines: usize,
    pub supporting_files: Vec<PathBuf>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct OutlineEntry {
    pub index: usize,
    pub reference: ContentReference,
    pub lines: usize,
}

impl Outline {
    pub fn from_document(doc: &Document) -> Self {
        let entries = doc
            .content()
            .iter()
            .enumerate()
            .map(|(index, (reference, lines))| OutlineEntry {
                index,
                reference: reference.clone(),
                lines: lines.len(),
            })
            .collect();

        Self {
            entries,
            pre_matter_lines: doc.pre_matter().len(),
            has_appendix: doc.content().has_appendix(),
            bibliography_lines: doc.bibliography().len(),
            supporting_files: doc.supporting_files().keys().cloned().collect(),
        }
    }

    pub fn section_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.reference.as_section().is_some())
            .count()
    }
}

/// Render `outline` as aligned text or pretty JSON.
pub fn render_outline(outline: &Outline, format: OutlineFormat) -> serde_json::Result<String> {
    match format {
        OutlineFormat::Json => serde_json::to_string_pretty(outline),
        OutlineFormat::Plain => Ok(render_plain(outline)),
    }
}

fn render_plain(outline: &Outline) -> String {
    let mut out = String::new();
    for entry in &outline.entries {
        let region = if entry.reference.in_appendix() {
            "appendix"
        } else {
            "main"
        };
        let _ = match &entry.reference {
            ContentReference::PreSection(_) => writeln!(
                out,
                "{:>3}  {region:<8}  pre-section  ({} lines)",
                entry.index, entry.lines
            ),
            ContentReference::Section(section) => writeln!(
                out,
                "{:>3}  {region:<8}  section      {}  [{}]  ({} lines)",
                entry.index,
                section.title,
                section.labels().collect::<Vec<_>>().join(", "),
                entry.lines
            ),
        };
    }

    let _ = write!(
        out,
        "{} entries, {} sections, appendix: {}, bibliography: {}, supporting files: {}",
        outline.entries.len(),
        outline.section_count(),
        yes_no(outline.has_appendix),
        yes_no(outline.bibliography_lines > 0),
        outline.supporting_files.len()
    );
    out
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
