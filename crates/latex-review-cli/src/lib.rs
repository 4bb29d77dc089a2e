use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use latex_doc_compile::compile_succeeded;
use latex_doc_config::{Config, LoadOptions};
use latex_doc_format::{render_outline, Outline, OutlineFormat};
use latex_doc_model::{to_latex, Document};
use latex_doc_parser::parse_from_latex;
use latex_edit_core::diff::build_unified_diff;
use latex_edit_core::fs::write_with_backup;
use latex_edit_core::{
    apply_comment, load_payload, review_header, select_reference, CommentOptions,
    CommentOutcome, CommentRequest, EditError, PayloadSource, Region, Selector,
};
use latex_doc_utils::write_directory;
use latex_review_core::{LatexReview, LoadedDocument, ReviewError, ReviewRequest};
use regex::{Regex, RegexBuilder};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Exit code of `check` when the build fails.
pub const BUILD_FAILED: i32 = 7;

const LOG_TAIL_LINES: usize = 40;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Outline(args) => handle_outline(cli.config, args),
        Command::Comment(args) => Ok(handle_comment(args)),
        Command::Check(args) => handle_check(cli.config, args),
        Command::Guard(args) => handle_guard(cli.config, args),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn bootstrap(config_path: Option<PathBuf>) -> Result<LatexReview> {
    let mut options = LoadOptions::default();
    if let Some(path) = config_path {
        options = options.with_override_path(path);
    }
    Ok(LatexReview::bootstrap(Config::load(options)?))
}

fn handle_outline(config_path: Option<PathBuf>, args: OutlineArgs) -> Result<i32> {
    let engine = bootstrap(config_path)?;
    let loaded = match engine.load(&args.file) {
        Ok(loaded) => loaded,
        Err(err) => return report_review_error(err, None),
    };

    let format = match args.format.unwrap_or(OutlineFormatValue::Plain) {
        OutlineFormatValue::Plain => OutlineFormat::Plain,
        OutlineFormatValue::Json => OutlineFormat::Json,
    };
    emit(&render_outline(&Outline::from_document(&loaded.document), format)?)?;
    Ok(0)
}

fn handle_comment(args: CommentArgs) -> i32 {
    let selector = match build_selector(&args.target) {
        Ok(selector) => selector,
        Err(err) => return report_edit_error(&err, None),
    };
    let payload = match payload_source(&args.payload) {
        Ok(payload) => payload,
        Err(err) => return report_edit_error(&err, None),
    };

    let request = CommentRequest {
        path: args.file.clone(),
        selector,
        payload,
        options: CommentOptions {
            dry_run: args.dry_run,
            backup: !args.no_backup,
        },
    };

    match apply_comment(request) {
        Ok(outcome) => {
            if !args.quiet {
                print_comment_outcome(&args, &outcome);
            }
            outcome.exit_code as i32
        }
        Err(err) => {
            let document = fs::read_to_string(&args.file)
                .ok()
                .and_then(|text| parse_from_latex(&text).ok());
            report_edit_error(&err, document.as_ref())
        }
    }
}

fn print_comment_outcome(args: &CommentArgs, outcome: &CommentOutcome) {
    if let Some(diff) = &outcome.diff {
        print!("{diff}");
    }
    if args.dry_run {
        if outcome.diff.is_none() {
            println!("No changes (dry run)");
        }
    } else if outcome.changed {
        println!("Updated {} at {}", args.file.display(), outcome.reference);
    }
}

fn handle_check(config_path: Option<PathBuf>, args: CheckArgs) -> Result<i32> {
    let engine = bootstrap(config_path)?;
    let loaded = match engine.load(&args.file) {
        Ok(loaded) => loaded,
        Err(err) => return report_review_error(err, None),
    };

    let results = engine.check(&loaded)?;
    for result in &results {
        println!("$ {}  (exit {})", result.command_line(), result.returncode);
    }

    if compile_succeeded(&results) {
        println!("Build succeeded for {}", loaded.main_file.display());
        return Ok(0);
    }

    if let Some(last) = results.last() {
        print_log_tail(&last.stdout);
    }
    eprintln!("Build failed for {}", loaded.main_file.display());
    Ok(BUILD_FAILED)
}

fn handle_guard(config_path: Option<PathBuf>, args: GuardArgs) -> Result<i32> {
    let engine = bootstrap(config_path)?;
    let loaded = match engine.load(&args.file) {
        Ok(loaded) => loaded,
        Err(err) => return report_review_error(err, None),
    };

    let reference = match build_selector(&args.target)
        .and_then(|selector| select_reference(&loaded.document, &selector))
    {
        Ok(reference) => reference,
        Err(err) => return Ok(report_edit_error(&err, Some(&loaded.document))),
    };
    let body = match payload_source(&args.payload).and_then(load_payload) {
        Ok(body) => body,
        Err(err) => return Ok(report_edit_error(&err, None)),
    };

    let client = engine.genai_client()?;
    let request = ReviewRequest {
        header: review_header(&args.role, &args.task, &reference.to_string()),
        reference,
        label: args.label.clone(),
        body: body.trim_end().to_string(),
    };
    let outcome = match engine.review(&loaded, &client, vec![request]) {
        Ok(outcome) => outcome,
        Err(err) => return report_review_error(err, Some(&loaded.document)),
    };

    for report in &outcome.reports {
        if report.is_accepted() {
            println!(
                "Fragment for {} accepted after {} attempt(s)",
                report.reference, report.attempts
            );
        } else {
            warn!(reference = %report.reference, "inserted flagged fragment");
            eprintln!(
                "Fragment for {} still fails after {} attempt(s); inserted with a warning banner",
                report.reference, report.attempts
            );
        }
    }

    let main_path = loaded.dir.join(&loaded.main_file);
    let mut rendered = to_latex(&outcome.document);
    rendered.push('\n');

    if args.dry_run {
        let original = fs::read_to_string(&main_path)?;
        if let Some(diff) = build_unified_diff(&original, &rendered, &main_path.to_string_lossy()) {
            print!("{diff}");
        }
        return Ok(0);
    }

    let Some(output) = args.output else {
        if let Err(err) = write_with_backup(&main_path, &rendered, !args.no_backup) {
            return Ok(report_edit_error(&err, None));
        }
        println!("Wrote {}", main_path.display());
        return Ok(0);
    };

    if let Err(err) = write_with_backup(&output, &rendered, false) {
        return Ok(report_edit_error(&err, None));
    }
    let report = LoadedDocument {
        dir: output_dir(&output),
        main_file: output
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| loaded.main_file.clone()),
        document: outcome.document,
    };
    write_directory(report.document.supporting_files(), &report.dir)?;
    println!(
        "Wrote {} and {} supporting file(s)",
        output.display(),
        report.document.supporting_files().len()
    );

    build_report(&engine, &report)
}

/// Compile the written report and place the build products next to it.
fn build_report(engine: &LatexReview, report: &LoadedDocument) -> Result<i32> {
    let results = engine.check(report)?;
    let Some(last) = results.last() else {
        eprintln!("Report build ran no commands");
        return Ok(BUILD_FAILED);
    };
    write_directory(&last.output_files, &report.dir)?;

    if compile_succeeded(&results) {
        println!("Report {} compiled successfully", report.main_file.display());
        return Ok(0);
    }

    print_log_tail(&last.stdout);
    eprintln!("Report {} did not compile", report.main_file.display());
    Ok(BUILD_FAILED)
}

fn output_dir(output: &Path) -> PathBuf {
    output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn print_log_tail(stdout: &str) {
    let lines: Vec<&str> = stdout.lines().collect();
    for line in &lines[lines.len().saturating_sub(LOG_TAIL_LINES)..] {
        eprintln!("{line}");
    }
}

fn build_selector(target: &TargetArgs) -> Result<Selector, EditError> {
    match (&target.pattern, target.pre_section) {
        (Some(_), true) => Err(EditError::InvalidArguments(
            "PATTERN cannot be combined with --pre-section".to_string(),
        )),
        (None, true) => Ok(Selector::PreSection {
            in_appendix: target.appendix,
        }),
        (Some(pattern), false) => Ok(Selector::Section {
            pattern: build_regex(pattern, target.case_sensitive)?,
            region: match (target.appendix, target.main_only) {
                (true, _) => Region::Appendix,
                (false, true) => Region::Main,
                (false, false) => Region::Any,
            },
        }),
        (None, false) => Err(EditError::InvalidArguments(
            "a PATTERN is required unless --pre-section is given".to_string(),
        )),
    }
}

fn build_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, EditError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .size_limit(1024 * 100)
        .build()
        .map_err(|err| {
            EditError::InvalidArguments(format!("failed to compile pattern '{pattern}': {err}"))
        })
}

fn payload_source(payload: &PayloadArgs) -> Result<PayloadSource, EditError> {
    match (&payload.with, &payload.with_string) {
        (Some(_), Some(_)) => Err(EditError::InvalidArguments(
            "--with and --with-string cannot be used together".to_string(),
        )),
        (Some(path), None) if path == Path::new("-") => Ok(PayloadSource::Stdin),
        (Some(path), None) => Ok(PayloadSource::File(path.clone())),
        (None, Some(text)) => Ok(PayloadSource::Inline(text.clone())),
        (None, None) => Err(EditError::InvalidArguments(
            "requires --with or --with-string".to_string(),
        )),
    }
}

fn report_review_error(err: ReviewError, document: Option<&Document>) -> Result<i32> {
    match err {
        ReviewError::Edit(err) => Ok(report_edit_error(&err, document)),
        ReviewError::Parse(err) => Ok(report_edit_error(&EditError::Parse(err), document)),
        other => Err(other.into()),
    }
}

fn report_edit_error(err: &EditError, document: Option<&Document>) -> i32 {
    match err {
        EditError::NotFound => {
            eprintln!("No matching sections found.");
            if let Some(document) = document {
                print_candidates(document);
            }
        }
        EditError::TooManyMatches { actual, .. } => {
            eprintln!("Pattern matched {actual} sections; narrow it or use --appendix.");
            if let Some(document) = document {
                print_candidates(document);
            }
        }
        EditError::Parse(err) => eprintln!("Could not parse document: {err}"),
        other => eprintln!("{other}"),
    }
    err.exit_code() as i32
}

fn print_candidates(document: &Document) {
    let sections: Vec<_> = document.content().sections().collect();
    if sections.is_empty() {
        return;
    }
    eprintln!("Candidate sections:");
    for section in sections {
        let labels: Vec<&str> = section.labels().collect();
        let region = if section.in_appendix { "appendix" } else { "main" };
        eprintln!("  - [{region}] {} ({})", section.title, labels.join(", "));
    }
}

fn emit(content: &str) -> Result<()> {
    print!("{content}");
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Structural LaTeX reviewer",
    propagate_version = true
)]
struct Cli {
    /// Configuration file overriding the discovered ones
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the addressable content of a document
    Outline(OutlineArgs),
    /// Insert a comment in front of a section or pre-section
    Comment(CommentArgs),
    /// Compile the document as it is
    Check(CheckArgs),
    /// Compile-check a review fragment, repair it and insert it
    Guard(GuardArgs),
}

#[derive(Args)]
struct OutlineArgs {
    /// Main `.tex` file or the directory holding it
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Output format (plain or json)
    #[arg(long, value_enum)]
    format: Option<OutlineFormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutlineFormatValue {
    Plain,
    Json,
}

#[derive(Args)]
struct TargetArgs {
    /// Regex matched against section titles and labels (case-insensitive by default)
    #[arg(value_name = "PATTERN")]
    pattern: Option<String>,
    /// Only match sections of the appendix
    #[arg(long)]
    appendix: bool,
    /// Only match sections before the appendix
    #[arg(long = "main", conflicts_with = "appendix")]
    main_only: bool,
    /// Target the text before the first section instead of a section
    #[arg(long = "pre-section")]
    pre_section: bool,
    /// Treat pattern as case sensitive
    #[arg(short = 's', long = "case-sensitive")]
    case_sensitive: bool,
}

#[derive(Args)]
struct PayloadArgs {
    /// Read payload from file (use '-' for stdin)
    #[arg(long = "with", value_name = "PATH", allow_hyphen_values = true)]
    with: Option<PathBuf>,
    /// Inline payload with escape sequences (\\n, \\t, \\")
    #[arg(long = "with-string", value_name = "TEXT", allow_hyphen_values = true)]
    with_string: Option<String>,
}

#[derive(Args)]
struct CommentArgs {
    /// Path to the `.tex` file
    #[arg(value_name = "FILE")]
    file: PathBuf,
    #[command(flatten)]
    target: TargetArgs,
    #[command(flatten)]
    payload: PayloadArgs,
    /// Print diff without writing changes
    #[arg(long = "dry-run")]
    dry_run: bool,
    /// Disable backup creation
    #[arg(long = "no-backup")]
    no_backup: bool,
    /// Suppress informational output (diffs, success messages)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[derive(Args)]
struct CheckArgs {
    /// Main `.tex` file or the directory holding it
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Args)]
struct GuardArgs {
    /// Main `.tex` file or the directory holding it
    #[arg(value_name = "FILE")]
    file: PathBuf,
    #[command(flatten)]
    target: TargetArgs,
    #[command(flatten)]
    payload: PayloadArgs,
    /// Label printed by the block's `\typeout` markers
    #[arg(long, default_value = "review")]
    label: String,
    /// Reviewer role shown in the block header
    #[arg(long, default_value = "reviewer")]
    role: String,
    /// Review task shown in the block header
    #[arg(long, default_value = "comment")]
    task: String,
    /// Write the report, its supporting files and its build products next to
    /// PATH instead of updating the main file
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Print diff without writing changes
    #[arg(long = "dry-run", conflicts_with = "output")]
    dry_run: bool,
    /// Disable backup creation
    #[arg(long = "no-backup")]
    no_backup: bool,
}
