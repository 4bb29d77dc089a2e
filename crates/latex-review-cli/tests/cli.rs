use std::fs;
use std::path::{Path, PathBuf};

use latex_edit_core::ExitCode;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};

fn cargo_bin() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("latex-review").unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn setup_file(dir: &TempDir) -> PathBuf {
    let target = dir.path().join("paper.tex");
    fs::copy(fixture_path("paper.tex"), &target).unwrap();
    target
}

fn write_config(dir: &Path, steps: &str) -> PathBuf {
    let path = dir.join("review.toml");
    fs::write(
        &path,
        format!(
            "[compile]\ntimeout_secs = 30\n{steps}\n[genai]\napi_key_env = \"LATEX_REVIEW_CLI_TEST_KEY\"\n"
        ),
    )
    .unwrap();
    path
}

#[test]
fn outline_lists_sections() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);

    cargo_bin()
        .current_dir(temp_dir.path())
        .arg("outline")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Introduction"))
        .stdout(predicate::str::contains("sec:intro"))
        .stdout(predicate::str::contains("Proofs"));
}

#[test]
fn outline_json_is_machine_readable() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);

    cargo_bin()
        .current_dir(temp_dir.path())
        .arg("outline")
        .arg(&target)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"has_appendix\": true"))
        .stdout(predicate::str::contains("\"kind\": \"section\""));
}

#[test]
fn comment_dry_run_prints_diff() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let original = fs::read_to_string(&target).unwrap();

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("^results$")
        .arg("--with-string")
        .arg("Check the constant.")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("+Check the constant."));

    assert_eq!(fs::read_to_string(&target).unwrap(), original);
}

#[test]
fn comment_writes_file_and_backup() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let original = fs::read_to_string(&target).unwrap();

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("--pre-section")
        .arg("--appendix")
        .arg("--with-string")
        .arg("- appendix note\\n(second line)")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));

    let updated = fs::read_to_string(&target).unwrap();
    assert!(updated.contains("\\appendix\n- appendix note\n(second line)\n\\section{Proofs}"));
    assert_eq!(
        fs::read_to_string(target.with_extension("bak")).unwrap(),
        original
    );
}

#[test]
fn comment_reads_payload_file() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let payload = temp_dir.path().join("note.tex");
    fs::write(&payload, "\\emph{Cite the lemma.}\n").unwrap();

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("sec:intro")
        .arg("--with")
        .arg(&payload)
        .arg("--no-backup")
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let updated = fs::read_to_string(&target).unwrap();
    assert!(updated.contains("\\emph{Cite the lemma.}\n\\label{sec:intro}"));
    assert!(!target.with_extension("bak").exists());
}

#[test]
fn comment_not_found_lists_sections() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("^missing$")
        .arg("--with-string")
        .arg("text")
        .assert()
        .failure()
        .code(ExitCode::NotFound as i32)
        .stderr(predicate::str::contains("Candidate sections"))
        .stderr(predicate::str::contains("[appendix] Proofs"));
}

#[test]
fn comment_ambiguous_pattern_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("s")
        .arg("--with-string")
        .arg("text")
        .assert()
        .failure()
        .code(ExitCode::TooManyMatches as i32);
}

#[test]
fn comment_requires_payload() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("results")
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32)
        .stderr(predicate::str::contains("requires --with"));
}

#[test]
fn comment_refuses_new_sections() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("results")
        .arg("--with-string")
        .arg("\\subsection{Extra}")
        .assert()
        .failure()
        .code(ExitCode::InvalidContent as i32);
}

#[test]
fn malformed_document_reports_parse_error() {
    let temp_dir = tempdir().unwrap();
    let target = temp_dir.path().join("broken.tex");
    fs::write(
        &target,
        "\\documentclass{article}\n\\begin{document}\n\\section{A}\n\\end{document}\n",
    )
    .unwrap();

    cargo_bin()
        .arg("comment")
        .arg(&target)
        .arg("a")
        .arg("--with-string")
        .arg("text")
        .assert()
        .failure()
        .code(ExitCode::Parse as i32)
        .stderr(predicate::str::contains("\\maketitle"));
}

#[cfg(unix)]
#[test]
fn check_reports_build_status() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let passing = write_config(
        temp_dir.path(),
        "[[compile.steps]]\ncommand = [\"cat\", \"{main}\"]",
    );

    cargo_bin()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&passing)
        .arg("check")
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("$ cat paper.tex  (exit 0)"))
        .stdout(predicate::str::contains("Build succeeded"));

    let failing = write_config(
        temp_dir.path(),
        "[[compile.steps]]\ncommand = [\"sh\", \"-c\", \"echo '! Undefined control sequence.'; exit 1\"]",
    );

    cargo_bin()
        .current_dir(temp_dir.path())
        .arg("--config")
        .arg(&failing)
        .arg("check")
        .arg(&target)
        .assert()
        .code(latex_review_cli::BUILD_FAILED)
        .stderr(predicate::str::contains("! Undefined control sequence."));
}

#[cfg(unix)]
#[test]
fn guard_writes_review_block_to_output() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let original = fs::read_to_string(&target).unwrap();
    let output = temp_dir.path().join("reviewed.tex");
    let config = write_config(
        temp_dir.path(),
        "[[compile.steps]]\ncommand = [\"cat\", \"{main}\"]",
    );

    cargo_bin()
        .current_dir(temp_dir.path())
        .env("LATEX_REVIEW_CLI_TEST_KEY", "unused")
        .arg("--config")
        .arg(&config)
        .arg("guard")
        .arg(&target)
        .arg("results")
        .arg("--with-string")
        .arg("The bound needs a citation.")
        .arg("--label")
        .arg("results-review")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted after 1 attempt(s)"));

    let reviewed = fs::read_to_string(&output).unwrap();
    assert!(reviewed.contains("\\usepackage{color}"));
    assert!(reviewed.contains("\\typeout{START: results-review}"));
    assert!(reviewed.contains("        The bound needs a citation."));
    assert_eq!(fs::read_to_string(&target).unwrap(), original);
}

#[cfg(unix)]
#[test]
fn guard_output_builds_report_with_supporting_files() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    fs::write(temp_dir.path().join("refs.bib"), "@misc{key}").unwrap();
    let output = temp_dir.path().join("out").join("reviewed.tex");
    let config = write_config(
        temp_dir.path(),
        "[[compile.steps]]\ncommand = [\"sh\", \"-c\", \"cat {main} > {stem}.pdf\"]",
    );

    cargo_bin()
        .current_dir(temp_dir.path())
        .env("LATEX_REVIEW_CLI_TEST_KEY", "unused")
        .arg("--config")
        .arg(&config)
        .arg("guard")
        .arg(&target)
        .arg("results")
        .arg("--with-string")
        .arg("Cite the bound.")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("compiled successfully"));

    let out_dir = temp_dir.path().join("out");
    assert_eq!(
        fs::read_to_string(out_dir.join("refs.bib")).unwrap(),
        "@misc{key}"
    );
    let pdf = fs::read_to_string(out_dir.join("reviewed.pdf")).unwrap();
    assert!(pdf.contains("Cite the bound."));
    assert_eq!(pdf, fs::read_to_string(&output).unwrap());
}

#[cfg(unix)]
#[test]
fn guard_output_reports_failed_report_build() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let output = temp_dir.path().join("out").join("reviewed.tex");
    let config = write_config(
        temp_dir.path(),
        "[[compile.steps]]\ncommand = [\"sh\", \"-c\", \"test {main} = paper.tex || { echo '! Emergency stop.'; exit 1; }\"]",
    );

    cargo_bin()
        .current_dir(temp_dir.path())
        .env("LATEX_REVIEW_CLI_TEST_KEY", "unused")
        .arg("--config")
        .arg(&config)
        .arg("guard")
        .arg(&target)
        .arg("results")
        .arg("--with-string")
        .arg("Cite the bound.")
        .arg("--output")
        .arg(&output)
        .assert()
        .code(latex_review_cli::BUILD_FAILED)
        .stderr(predicate::str::contains("! Emergency stop."))
        .stderr(predicate::str::contains("did not compile"));

    assert!(output.exists());
}

#[cfg(unix)]
#[test]
fn guard_without_api_key_fails() {
    let temp_dir = tempdir().unwrap();
    let target = setup_file(&temp_dir);
    let config = write_config(
        temp_dir.path(),
        "[[compile.steps]]\ncommand = [\"cat\", \"{main}\"]",
    );

    cargo_bin()
        .current_dir(temp_dir.path())
        .env_remove("LATEX_REVIEW_CLI_TEST_KEY")
        .arg("--config")
        .arg(&config)
        .arg("guard")
        .arg(&target)
        .arg("results")
        .arg("--with-string")
        .arg("note")
        .assert()
        .failure()
        .stderr(predicate::str::contains("LATEX_REVIEW_CLI_TEST_KEY"));
}
