/// One source line with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub text: String,
    /// One-based line number in the original input.
    pub number: usize,
}

impl LineRecord {
    pub fn new(text: impl Into<String>, number: usize) -> Self {
        Self {
            text: text.into(),
            number,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Split `text` on `\n` and strip per-line whitespace (including `\r`).
///
/// A trailing newline produces a final empty record, mirroring `str::split`.
pub fn split_lines(text: &str) -> Vec<LineRecord> {
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| LineRecord::new(line.trim(), idx + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_numbers_lines() {
        let lines = split_lines("  \\section{A}  \r\nbody\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LineRecord::new("\\section{A}", 1));
        assert_eq!(lines[1], LineRecord::new("body", 2));
        assert!(lines[2].is_blank());
    }
}
