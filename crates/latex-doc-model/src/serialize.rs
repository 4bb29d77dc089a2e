use crate::document::{ContentMap, Document};
use crate::markers;
use crate::reference::ContentReference;

/// Render `doc` back to LaTeX source, lines joined with `\n`.
///
/// Each section gets its generated `\label{..}` right after the title, so
/// comments can cross-reference any section even when it has no explicit
/// label.
pub fn to_latex(doc: &Document) -> String {
    to_latex_lines(doc).join("\n")
}

pub fn to_latex_lines(doc: &Document) -> Vec<String> {
    let mut out = Vec::new();

    out.extend_from_slice(doc.pre_matter());
    out.push(markers::BEGIN_DOCUMENT.to_string());
    out.extend_from_slice(doc.begin_document());
    out.push(markers::MAKETITLE.to_string());

    push_region(&mut out, doc.content(), false);
    if doc.content().has_appendix() {
        out.push(markers::APPENDIX.to_string());
        push_region(&mut out, doc.content(), true);
    }

    out.extend_from_slice(doc.bibliography());
    out.push(markers::END_DOCUMENT.to_string());
    out
}

fn push_region(out: &mut Vec<String>, content: &ContentMap, in_appendix: bool) {
    for (reference, lines) in content.region(in_appendix) {
        if let ContentReference::Section(section) = reference {
            out.push(markers::section(&section.title));
            out.push(markers::label(&section.generated_label));
        }
        out.extend_from_slice(lines);
    }
}
