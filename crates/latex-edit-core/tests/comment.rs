use latex_doc_model::{to_latex, ContentReference, SectionRef};
use latex_doc_parser::parse_from_latex;
use latex_edit_core::{add_comment, EditError};
use pretty_assertions::assert_eq;

const INTRO: &str = "\\documentclass{article}\n\\begin{document}\n\\maketitle\n\\section{Introduction}\nHello world.\n\\section{Results}\n\\label{sec:results}\nNumbers.\n\\appendix\nAppendix intro\n\\end{document}";

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn section(doc: &latex_doc_model::Document, title: &str) -> ContentReference {
    doc.content()
        .sections()
        .find(|section| section.title == title)
        .cloned()
        .map(ContentReference::from)
        .expect("section present")
}

#[test]
fn comment_lands_between_section_marker_and_first_line() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let reference = section(&doc, "Introduction");

    let updated = add_comment(&doc, &reference, &lines(&["\\textbf{typo here}"])).expect("insert");

    assert!(to_latex(&updated).contains(
        "\\section{Introduction}\n\\label{sec:genai:generated:label:0}\n\\textbf{typo here}\nHello world."
    ));
}

#[test]
fn only_the_target_entry_changes() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let reference = section(&doc, "Results");

    let updated = add_comment(&doc, &reference, &lines(&["note one", "note two"])).expect("insert");

    let before: Vec<_> = doc.content().keys().cloned().collect();
    let after: Vec<_> = updated.content().keys().cloned().collect();
    assert_eq!(before, after);

    for (key, original) in doc.content().iter() {
        let current = updated.content().get(key).expect("key kept");
        if key == &reference {
            assert_eq!(&current[..2], &lines(&["note one", "note two"])[..]);
            assert_eq!(&current[2..], original);
        } else {
            assert_eq!(current, original);
        }
    }
    assert_eq!(updated.pre_matter(), doc.pre_matter());
    assert_eq!(updated.bibliography(), doc.bibliography());
}

#[test]
fn comments_on_appendix_pre_section() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let updated = add_comment(&doc, &ContentReference::pre_section(true), &lines(&["see here"]))
        .expect("insert");

    assert!(to_latex(&updated).contains("\\appendix\nsee here\nAppendix intro\n"));
}

#[test]
fn sectioning_commands_are_rejected_without_touching_the_document() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let reference = section(&doc, "Introduction");

    for hazard in [
        "\\section{New}",
        "text \\subsection*{Inline}",
        "\\subsubsection{Deep}",
        "\\section*{Unnumbered}",
        "\\section[Short]{Long title}",
    ] {
        let err = add_comment(&doc, &reference, &lines(&["fine", hazard])).expect_err("hazard");
        match err {
            EditError::StructuralHazard { line } => assert_eq!(line, hazard),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(to_latex(&doc), to_latex(&parse_from_latex(INTRO).expect("parse")));
}

#[test]
fn similar_commands_are_not_hazards() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let reference = section(&doc, "Introduction");

    assert!(add_comment(&doc, &reference, &lines(&["\\sectionmark{x}"])).is_ok());
}

#[test]
fn unknown_reference_is_reported() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let missing = ContentReference::Section(SectionRef::new(false, 7, "Missing", None));

    let err = add_comment(&doc, &missing, &lines(&["x"])).expect_err("missing");
    assert!(err.to_string().contains("Missing"));

    let no_appendix = parse_from_latex(
        "\\documentclass{article}\n\\begin{document}\n\\maketitle\n\\end{document}",
    )
    .expect("parse");
    assert!(matches!(
        add_comment(&no_appendix, &ContentReference::pre_section(true), &lines(&["x"])),
        Err(EditError::ReferenceNotFound { .. })
    ));
}

#[test]
fn commented_document_still_round_trips() {
    let doc = parse_from_latex(INTRO).expect("parse");
    let reference = section(&doc, "Results");
    let updated = add_comment(&doc, &reference, &lines(&["remark"])).expect("insert");

    let serialized = to_latex(&updated);
    let reparsed = parse_from_latex(&serialized).expect("reparse");
    assert_eq!(reparsed.content(), updated.content());
}
