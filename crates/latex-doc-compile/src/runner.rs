use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use latex_doc_config::CompileStep;
use latex_doc_model::SupportingFiles;
use latex_doc_utils::{read_directory, write_directory};
use tempfile::Builder;
use tracing::{debug, warn};

use crate::error::{CompileError, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Outcome of one build command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    /// Process exit code, or `-1` when the process was ended by a signal.
    pub returncode: i32,
    /// Every file in the scratch directory after the command finished.
    pub output_files: SupportingFiles,
}

impl CommandResult {
    pub fn succeeded(&self) -> bool {
        self.returncode == 0
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

/// Substitute `{main}` with the main file path and `{stem}` with the same
/// path minus its extension.
pub fn expand_command(template: &[String], main_file: &Path) -> Vec<String> {
    let main = main_file.to_string_lossy();
    let stem = main_file.with_extension("");
    let stem = stem.to_string_lossy();
    template
        .iter()
        .map(|arg| arg.replace("{main}", &main).replace("{stem}", &stem))
        .collect()
}

/// Run `steps` in a fresh scratch directory holding only `files`.
pub fn run_steps(
    files: &SupportingFiles,
    steps: &[CompileStep],
    main_file: &Path,
    timeout: Option<Duration>,
) -> Result<Vec<CommandResult>> {
    if steps.is_empty() {
        return Err(CompileError::NoSteps);
    }

    let scratch = Builder::new().prefix("latex-review-compile").tempdir()?;
    write_directory(files, scratch.path())?;
    debug!(dir = %scratch.path().display(), files = files.len(), "populated scratch directory");

    let mut results = Vec::with_capacity(steps.len());
    for step in steps {
        let argv = expand_command(&step.command, main_file);
        let result = run_one(argv, scratch.path(), timeout)?;
        let stop = !result.succeeded() && !step.allow_failure;
        debug!(
            command = %result.command_line(),
            returncode = result.returncode,
            "compile step finished"
        );
        results.push(result);
        if stop {
            break;
        }
    }

    Ok(results)
}

fn run_one(argv: Vec<String>, cwd: &Path, timeout: Option<Duration>) -> Result<CommandResult> {
    let command_line = argv.join(" ");
    let Some((program, args)) = argv.split_first() else {
        return Err(CompileError::NoSteps);
    };

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CompileError::Spawn {
            command: command_line.clone(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait(&mut child, timeout)? {
        Some(status) => status,
        None => {
            child.kill()?;
            child.wait()?;
            return Err(CompileError::Timeout {
                command: command_line,
                timeout: timeout.unwrap_or_default(),
            });
        }
    };

    let stdout = collect(stdout)?;
    let stderr = collect(stderr)?;
    let returncode = status.code().unwrap_or(-1);

    if returncode == 0 && !stderr.is_empty() {
        warn!(command = %command_line, %stderr, "command exited with 0 but wrote to stderr");
    }

    Ok(CommandResult {
        command: argv,
        stdout,
        stderr,
        returncode,
        output_files: read_directory(cwd, |_| true)?,
    })
}

/// Wait for `child`, giving up after `timeout`. `None` means the deadline
/// passed.
fn wait(child: &mut Child, timeout: Option<Duration>) -> io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R>(pipe: Option<R>) -> Option<JoinHandle<io::Result<Vec<u8>>>>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            pipe.read_to_end(&mut buffer)?;
            Ok(buffer)
        })
    })
}

fn collect(reader: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let bytes = reader
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "output reader panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn expands_main_and_stem() {
        let template = strings(&["bibtex", "{stem}", "--in={main}"]);
        assert_eq!(
            expand_command(&template, &PathBuf::from("paper/main.tex")),
            strings(&["bibtex", "paper/main", "--in=paper/main.tex"])
        );
    }
}
