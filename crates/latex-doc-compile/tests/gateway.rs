#![cfg(unix)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use latex_doc_config::CompileStep;
use latex_doc_model::{to_latex, Document, DocumentParts, SupportingFiles};
use latex_doc_compile::{
    compile_document, compile_succeeded, CompileError, CompileGateway, LatexCompiler,
};
use pretty_assertions::assert_eq;

fn files(entries: &[(&str, &str)]) -> SupportingFiles {
    entries
        .iter()
        .map(|(path, contents)| (PathBuf::from(path), contents.as_bytes().to_vec()))
        .collect()
}

fn sh(script: &str) -> CompileStep {
    CompileStep::new(["sh", "-c", script])
}

#[test]
fn runs_steps_in_scratch_directory() {
    let compiler = LatexCompiler::new(vec![
        sh("echo built > out.txt; echo first"),
        CompileStep::new(["cat", "{main}"]),
        sh("ls"),
    ]);

    let results = compiler
        .compile(&files(&[("main.tex", "hello\n")]), Path::new("main.tex"))
        .expect("compile");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].stdout, "first");
    assert_eq!(results[1].command, vec!["cat".to_string(), "main.tex".to_string()]);
    assert_eq!(results[1].stdout, "hello");
    assert_eq!(results[2].stdout, "main.tex\nout.txt");
    assert_eq!(
        results[2].output_files.get(Path::new("out.txt")),
        Some(&b"built\n".to_vec())
    );
    assert!(compile_succeeded(&results));
}

#[test]
fn stops_at_first_failure() {
    let compiler = LatexCompiler::new(vec![
        sh("echo oops >&2; exit 3"),
        CompileStep::new(["true"]),
    ]);

    let results = compiler
        .compile(&BTreeMap::new(), Path::new("main.tex"))
        .expect("compile");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].returncode, 3);
    assert_eq!(results[0].stderr, "oops");
    assert!(!compile_succeeded(&results));
}

#[test]
fn tolerated_failures_continue() {
    let compiler = LatexCompiler::new(vec![
        CompileStep::new(["false"]).allowing_failure(),
        CompileStep::new(["true"]),
    ]);

    let results = compiler
        .compile(&BTreeMap::new(), Path::new("main.tex"))
        .expect("compile");

    assert_eq!(results.len(), 2);
    assert!(!results[0].succeeded());
    assert!(compile_succeeded(&results));
    assert!(!compile_succeeded(&[]));
}

#[test]
fn tolerated_failure_of_last_step_fails_the_build() {
    let compiler = LatexCompiler::new(vec![
        CompileStep::new(["true"]),
        CompileStep::new(["false"]).allowing_failure(),
    ]);

    let results = compiler
        .compile(&BTreeMap::new(), Path::new("main.tex"))
        .expect("compile");

    assert_eq!(results.len(), 2);
    assert!(!compile_succeeded(&results));
}

#[test]
fn supporting_files_keep_their_directories() {
    let compiler = LatexCompiler::new(vec![CompileStep::new(["cat", "figures/plot.tex"])]);
    let results = compiler
        .compile(
            &files(&[("main.tex", ""), ("figures/plot.tex", "plot")]),
            Path::new("main.tex"),
        )
        .expect("compile");

    assert_eq!(results[0].stdout, "plot");
}

#[test]
fn reports_transport_failures() {
    let missing = LatexCompiler::new(vec![CompileStep::new(["latex-review-no-such-binary"])]);
    assert!(matches!(
        missing.compile(&BTreeMap::new(), Path::new("main.tex")),
        Err(CompileError::Spawn { .. })
    ));

    let none = LatexCompiler::new(Vec::new());
    assert!(matches!(
        none.compile(&BTreeMap::new(), Path::new("main.tex")),
        Err(CompileError::NoSteps)
    ));

    let slow = LatexCompiler::new(vec![CompileStep::new(["sleep", "5"])])
        .with_timeout(Duration::from_millis(200));
    assert!(matches!(
        slow.compile(&BTreeMap::new(), Path::new("main.tex")),
        Err(CompileError::Timeout { .. })
    ));
}

fn sample_document() -> Document {
    let mut parts = DocumentParts::default();
    parts.pre_matter = vec!["\\documentclass{article}".to_string()];
    Document::from_parts(parts).with_supporting_files(files(&[("refs.bib", "@misc{x}")]))
}

#[test]
fn compile_document_serializes_main_file() {
    let doc = sample_document();
    let compiler = LatexCompiler::new(vec![CompileStep::new(["cat", "{main}", "refs.bib"])]);

    let results = compile_document(&compiler, &doc, Path::new("paper.tex")).expect("compile");

    assert_eq!(results[0].stdout, format!("{}\n@misc{{x}}", to_latex(&doc)));
}

#[test]
#[ignore = "requires a TeX installation"]
fn compiles_with_pdflatex() {
    let source = "\\documentclass{article}\n\\begin{document}\nHello\n\\end{document}\n";
    let compiler = LatexCompiler::new(vec![CompileStep::new([
        "pdflatex",
        "-interaction=nonstopmode",
        "{main}",
    ])]);

    let results = compiler
        .compile(&files(&[("main.tex", source)]), Path::new("main.tex"))
        .expect("compile");

    assert!(compile_succeeded(&results));
    assert!(results[0].output_files.contains_key(Path::new("main.pdf")));
}
