use std::io::{self, Read};
use std::path::PathBuf;

use crate::error::{EditError, EditResult};

/// Where the text of a comment comes from.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    File(PathBuf),
    Stdin,
    /// Command-line text. `\n` and `\t` not followed by a letter, and `\"`,
    /// are unescaped; any other backslash sequence (`\\`, `\textbf`) is
    /// kept as written.
    Inline(String),
}

pub fn load_payload(source: PayloadSource) -> EditResult<String> {
    let payload = match source {
        PayloadSource::File(path) => std::fs::read_to_string(&path).map_err(|err| {
            EditError::InvalidContent(format!(
                "failed to read payload file '{}': {err}",
                path.display()
            ))
        })?,
        PayloadSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(|err| {
                EditError::InvalidContent(format!("failed to read stdin payload: {err}"))
            })?;
            buffer
        }
        PayloadSource::Inline(raw) => parse_inline(&raw)?,
    };

    if payload.trim().is_empty() {
        return Err(EditError::InvalidContent("comment payload is empty".to_string()));
    }
    Ok(payload)
}

fn parse_inline(raw: &str) -> EditResult<String> {
    let mut chars = raw.chars().peekable();
    let mut output = String::with_capacity(raw.len());

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }

        let Some(&next) = chars.peek() else {
            return Err(EditError::InvalidContent(
                "unterminated escape sequence".to_string(),
            ));
        };

        let unescaped = match next {
            'n' if !continues_command(&mut chars.clone()) => '\n',
            't' if !continues_command(&mut chars.clone()) => '\t',
            '"' => '"',
            '\\' => {
                chars.next();
                output.push_str("\\\\");
                continue;
            }
            _ => {
                output.push('\\');
                continue;
            }
        };
        chars.next();
        output.push(unescaped);
    }

    Ok(output)
}

/// `\n` or `\t` followed by more letters is a command such as `\newline` or
/// `\textbf`, not an escape.
fn continues_command<I: Iterator<Item = char>>(chars: &mut I) -> bool {
    chars.next();
    chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_payload() {
        let parsed = parse_inline("Hello\\n1\\t2\\\"").unwrap();
        assert_eq!(parsed, "Hello\n1\t2\"");
    }

    #[test]
    fn keeps_latex_commands() {
        let parsed = parse_inline("\\textbf{typo}\\n\\noindent x \\\\").unwrap();
        assert_eq!(parsed, "\\textbf{typo}\n\\noindent x \\\\");
    }

    #[test]
    fn rejects_trailing_backslash() {
        let err = parse_inline("Hello\\").unwrap_err();
        assert!(matches!(err, EditError::InvalidContent(_)));
    }

    #[test]
    fn rejects_blank_payload() {
        let err = load_payload(PayloadSource::Inline("  \\n ".into())).unwrap_err();
        assert!(matches!(err, EditError::InvalidContent(_)));
    }
}
