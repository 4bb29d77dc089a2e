use similar::TextDiff;

/// Unified diff between two renderings of `path`, or `None` when identical.
pub fn build_unified_diff(original: &str, modified: &str, path: &str) -> Option<String> {
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original, modified);
    let header_old = format!("a/{path}");
    let header_new = format!("b/{path}");

    Some(
        diff.unified_diff()
            .header(&header_old, &header_new)
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_for_identical_content() {
        assert!(build_unified_diff("abc", "abc", "paper.tex").is_none());
    }

    #[test]
    fn produces_diff_for_changes() {
        let diff = build_unified_diff("\\section{A}\n", "\\section{A}\nnote\n", "paper.tex")
            .unwrap();
        assert!(diff.contains("a/paper.tex"));
        assert!(diff.contains("+note"));
    }
}
