use latex_extract::{partition, partition_repeated, split_lines, LineRecord, Segment};
use pretty_assertions::assert_eq;

fn equals(target: i32) -> impl Fn(&i32) -> bool {
    move |x| *x == target
}

#[test]
fn should_split_at_each_detector_in_order() {
    // Given
    let xs: Vec<i32> = (1..=11).collect();
    let detectors = [equals(3), equals(6), equals(8), equals(10)];

    // When
    let result = partition(xs, &detectors);

    // Then
    assert_eq!(result.head, vec![1, 2]);
    assert_eq!(
        result.segments,
        vec![
            Segment { detector: 0, matched: 3, tail: vec![4, 5] },
            Segment { detector: 1, matched: 6, tail: vec![7] },
            Segment { detector: 2, matched: 8, tail: vec![9] },
            Segment { detector: 3, matched: 10, tail: vec![11] },
        ]
    );
}

#[test]
fn should_skip_detectors_that_never_match() {
    // Given
    let xs = vec![1, 2, 3, 4, 5, 6, 7, 9, 10, 11];
    let detectors = [equals(3), equals(6), equals(8), equals(10)];

    // When
    let result = partition(xs, &detectors);

    // Then
    assert_eq!(result.head, vec![1, 2]);
    assert_eq!(result.detectors(), vec![0, 1, 3]);
    assert_eq!(result.segments[1].tail, vec![7, 9]);
    assert_eq!(result.segments[2].tail, vec![11]);
}

#[test]
fn should_only_search_after_previous_match() {
    // Given: the second detector's only candidate precedes the first match
    let xs = vec![6, 1, 3, 4];
    let detectors = [equals(3), equals(6)];

    // When
    let result = partition(xs, &detectors);

    // Then
    assert_eq!(result.head, vec![6, 1]);
    assert_eq!(result.detectors(), vec![0]);
    assert_eq!(result.segments[0].tail, vec![4]);
}

#[test]
fn should_partition_lines_by_prefix() {
    let lines = split_lines("intro\n\\section{A}\na1\n\\section{B}");
    let result = partition_repeated(lines, |line: &LineRecord| line.text.starts_with("\\section"));

    assert_eq!(result.head, vec![LineRecord::new("intro", 1)]);
    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[0].matched.number, 2);
    assert_eq!(result.segments[0].tail, vec![LineRecord::new("a1", 3)]);
    assert!(result.segments[1].tail.is_empty());
}
