use std::fs;
use std::path::PathBuf;

use latex_edit_core::{
    apply_comment, CommentOptions, CommentRequest, EditError, ExitCode, PayloadSource, Region,
    Selector,
};
use regex::RegexBuilder;
use tempfile::TempDir;

const SOURCE: &str = "\\documentclass{article}\n\\begin{document}\n\\maketitle\nPreface\n\\section{Introduction}\n\\label{sec:intro}\nHello world.\n\\section{Method}\nSteps.\n\\end{document}\n";

fn fixture(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("paper.tex");
    fs::write(&path, contents).expect("write fixture");
    (dir, path)
}

fn section(pattern: &str) -> Selector {
    Selector::Section {
        pattern: RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("regex"),
        region: Region::Any,
    }
}

fn request(path: PathBuf, selector: Selector, text: &str) -> CommentRequest {
    CommentRequest {
        path,
        selector,
        payload: PayloadSource::Inline(text.to_string()),
        options: CommentOptions::default(),
    }
}

#[test]
fn writes_comment_and_keeps_backup() {
    let (_dir, path) = fixture(SOURCE);

    let outcome =
        apply_comment(request(path.clone(), section("sec:intro"), "\\textbf{typo here}"))
            .expect("apply");

    assert_eq!(outcome.exit_code, ExitCode::Success);
    let written = fs::read_to_string(&path).expect("read back");
    assert_eq!(written, outcome.result);
    assert!(written.ends_with("\\end{document}\n"));
    assert!(written.contains("\\label{sec:intro}\nHello world."));
    assert!(written.contains("\\label{sec:genai:generated:label:0}\n\\textbf{typo here}\n\\label{sec:intro}"));
    assert_eq!(
        fs::read_to_string(path.with_extension("bak")).expect("backup"),
        SOURCE
    );

    let diff = outcome.diff.expect("diff");
    assert!(diff.contains("+\\textbf{typo here}"));
}

#[test]
fn matches_generated_labels() {
    let (_dir, path) = fixture(SOURCE);
    let mut req = request(path.clone(), section("generated:label:1$"), "check steps\\n\\emph{again}");
    req.options.backup = false;

    let outcome = apply_comment(req).expect("apply");
    assert!(outcome.result.contains("\\section{Method}\n\\label{sec:genai:generated:label:1}\ncheck steps\n\\emph{again}\nSteps."));
    assert!(!path.with_extension("bak").exists());
}

#[test]
fn comments_on_main_pre_section() {
    let (_dir, path) = fixture(SOURCE);
    let mut req = request(path, Selector::PreSection { in_appendix: false }, "General remark");
    req.options.dry_run = true;

    let outcome = apply_comment(req).expect("apply");
    assert!(outcome.result.contains("\\maketitle\nGeneral remark\nPreface\n"));
}

#[test]
fn missing_and_ambiguous_patterns_map_to_exit_codes() {
    let (_dir, path) = fixture(SOURCE);

    let err = apply_comment(request(path.clone(), section("conclusion"), "x")).expect_err("none");
    assert!(matches!(err, EditError::NotFound));
    assert_eq!(err.exit_code(), ExitCode::NotFound);

    let err = apply_comment(request(path.clone(), section("o"), "x")).expect_err("many");
    assert_eq!(err.exit_code(), ExitCode::TooManyMatches);

    let err = apply_comment(request(path.clone(), Selector::PreSection { in_appendix: true }, "x"))
        .expect_err("no appendix");
    assert_eq!(err.exit_code(), ExitCode::NotFound);

    let err = apply_comment(request(path.clone(), section("method"), "\\section{Extra}"))
        .expect_err("hazard");
    assert_eq!(err.exit_code(), ExitCode::InvalidContent);

    assert_eq!(fs::read_to_string(&path).expect("unchanged"), SOURCE);
}

#[test]
fn unparseable_documents_are_reported() {
    let (_dir, path) = fixture("\\documentclass{article}\nno body\n");

    let err = apply_comment(request(path, section("x"), "x")).expect_err("parse");
    assert!(matches!(err, EditError::Parse(_)));
    assert_eq!(err.exit_code(), ExitCode::Parse);
}
