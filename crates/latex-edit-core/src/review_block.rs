//! Visible review blocks placed in front of the content they discuss.
//!
//! Blocks are bracketed by `\typeout{START: <label>}` and
//! `\typeout{END: <label>}` so their compiler output can be found in the log,
//! and render as tiny red text between two grey rules. The `color` package
//! must be loaded.

use latex_doc_model::markers;

const RULE: &str = "\\textcolor[RGB]{126,126,126}{\\rule{\\linewidth}{1pt}}";

/// Render `body` under `header` as a standalone block of LaTeX.
pub fn wrap_review_block(label: &str, header: &str, body: &str) -> String {
    [
        String::new(),
        String::new(),
        markers::typeout(&format!("START: {label}")),
        String::new(),
        RULE.to_string(),
        String::new(),
        "{\\tiny".to_string(),
        "    {\\color{red}".to_string(),
        format!("        {header}"),
        format!("        {body}"),
        "    }".to_string(),
        "}".to_string(),
        String::new(),
        RULE.to_string(),
        String::new(),
        markers::typeout(&format!("END: {label}")),
        String::new(),
        String::new(),
    ]
    .join("\n")
}

/// Header naming the reviewer, the task and what was shown to it.
pub fn review_header(role: &str, task: &str, reviewed: &str) -> String {
    format!(
        "\\textbf{{Role:}} \\emph{{{role}}} \\\\\
         \\textbf{{Task:}} \\emph{{{task}}} \\\\\
         \\textbf{{Content provided for review:}} \\emph{{{reviewed}}}\
         \\\\ \\\\"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_is_bracketed_by_typeout_markers() {
        let block = wrap_review_block("intro-review", "HEADER", "BODY");
        let lines: Vec<&str> = block.split('\n').collect();

        assert_eq!(lines[2], "\\typeout{START: intro-review}");
        assert_eq!(lines[lines.len() - 3], "\\typeout{END: intro-review}");
        assert!(block.contains("{\\color{red}\n        HEADER\n        BODY\n"));
        assert_eq!(block.matches(RULE).count(), 2);
    }

    #[test]
    fn header_lists_role_task_and_input() {
        let header = review_header("referee", "find typos", "Section 2");
        assert_eq!(
            header,
            "\\textbf{Role:} \\emph{referee} \\\\\\textbf{Task:} \\emph{find typos} \\\\\\textbf{Content provided for review:} \\emph{Section 2}\\\\ \\\\"
        );
    }
}
