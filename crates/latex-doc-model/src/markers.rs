//! The LaTeX vocabulary the parser recognises and the serializer emits.
//!
//! Detection functions expect lines that have already been trimmed.

pub const COMMENT_PREFIX: &str = "%";
pub const DOCUMENT_CLASS: &str = "\\documentclass";
pub const BEGIN_DOCUMENT: &str = "\\begin{document}";
pub const END_DOCUMENT: &str = "\\end{document}";
pub const MAKETITLE: &str = "\\maketitle";
pub const APPENDIX: &str = "\\appendix";
pub const SECTION: &str = "\\section";
pub const SUBSECTION: &str = "\\subsection";
pub const SUBSUBSECTION: &str = "\\subsubsection";
pub const LABEL: &str = "\\label";
pub const TYPEOUT: &str = "\\typeout";
pub const USE_PACKAGE: &str = "\\usepackage";

/// Line prefixes that open the bibliography block. The commented spellings
/// are kept because templates often ship the bibliography commented out.
pub const BIBLIOGRAPHY_PREFIXES: &[&str] = &[
    "\\bibliography",
    "\\begin{thebibliography}",
    "\\printbibliography",
    "%\\bibliography",
    "%\\begin{thebibliography}",
    "%\\printbibliography",
];

const SECTIONING_COMMANDS: &[&str] = &[SECTION, SUBSECTION, SUBSUBSECTION];

pub fn is_comment(line: &str) -> bool {
    line.starts_with(COMMENT_PREFIX)
}

pub fn is_document_class(line: &str) -> bool {
    line.starts_with(DOCUMENT_CLASS)
}

pub fn is_begin_document(line: &str) -> bool {
    line == BEGIN_DOCUMENT
}

pub fn is_maketitle(line: &str) -> bool {
    line == MAKETITLE
}

pub fn is_bibliography_start(line: &str) -> bool {
    BIBLIOGRAPHY_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

pub fn is_end_document(line: &str) -> bool {
    line == END_DOCUMENT
}

pub fn is_appendix(line: &str) -> bool {
    line == APPENDIX
}

/// Only `\section{..}` opens a section. Starred and short-title forms stay
/// body text of the surrounding entry.
pub fn is_section_start(line: &str) -> bool {
    line.strip_prefix(SECTION)
        .is_some_and(|rest| rest.starts_with('{'))
}

/// Subsection and subsubsection markers bound the explicit-label search.
pub fn is_subsection_start(line: &str) -> bool {
    line.starts_with(SUBSECTION) || line.starts_with(SUBSUBSECTION)
}

pub fn is_label(line: &str) -> bool {
    line.strip_prefix(LABEL)
        .is_some_and(|rest| rest.starts_with('{'))
}

/// Argument of a single-argument command spanning the whole line, i.e. the
/// text between the first `{` after `command` and the line's final `}`.
///
/// `command_argument("\\section", "\\section{Intro}") == Some("Intro")`.
pub fn command_argument<'a>(command: &str, line: &'a str) -> Option<&'a str> {
    line.strip_prefix(command)?
        .strip_prefix('{')?
        .strip_suffix('}')
}

/// First brace-balanced argument of `command`, ignoring anything after it.
pub fn first_argument<'a>(command: &str, line: &'a str) -> Option<&'a str> {
    let rest = line.strip_prefix(command)?.strip_prefix('{')?;
    let mut depth = 1usize;
    let mut escaped = false;

    for (idx, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..idx]);
                }
            }
            _ => {}
        }
    }

    None
}

/// True when `line` invokes `\section`, `\subsection` or `\subsubsection`
/// anywhere, starred or not.
pub fn contains_sectioning_command(line: &str) -> bool {
    SECTIONING_COMMANDS.iter().any(|command| {
        line.match_indices(command)
            .any(|(idx, _)| invokes(&line[idx..], command))
    })
}

/// Print every sectioning command in `text` literally, so that the result
/// can be inserted without opening a section.
pub fn escape_sectioning_commands(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('\\') {
        escaped.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        match SECTIONING_COMMANDS
            .iter()
            .find(|command| invokes(tail, command))
        {
            Some(command) => {
                escaped.push_str("\\textbackslash{}");
                escaped.push_str(&command[1..]);
                rest = &tail[command.len()..];
            }
            None => {
                escaped.push('\\');
                rest = &tail[1..];
            }
        }
    }
    escaped.push_str(rest);
    escaped
}

/// `text` starts with `command` and the command name ends there.
fn invokes(text: &str, command: &str) -> bool {
    text.strip_prefix(command)
        .is_some_and(|after| !after.starts_with(|ch: char| ch.is_ascii_alphabetic()))
}

pub fn section(title: &str) -> String {
    format!("{SECTION}{{{title}}}")
}

pub fn label(id: &str) -> String {
    format!("{LABEL}{{{id}}}")
}

pub fn typeout(message: &str) -> String {
    format!("{TYPEOUT}{{{message}}}")
}

pub fn use_package(package: &str) -> String {
    format!("{USE_PACKAGE}{{{package}}}")
}
