use latex_extract::partition_repeated;

/// Log lines strictly between the first two lines containing `token`.
///
/// Empty when the token appears fewer than two times.
pub fn isolate_diagnostics(log: &str, token: &str) -> String {
    let lines: Vec<&str> = log.split('\n').collect();
    let split = partition_repeated(lines, |line| line.contains(token));

    match split.segments.as_slice() {
        [first, _, ..] => first.tail.join("\n"),
        _ => String::new(),
    }
}
