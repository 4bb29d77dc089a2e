/// A matched item and the items that follow it up to the next match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<T> {
    /// Index of the detector that produced this match.
    pub detector: usize,
    pub matched: T,
    pub tail: Vec<T>,
}

/// Result of partitioning a sequence: everything before the first match,
/// then one segment per match in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<T> {
    pub head: Vec<T>,
    pub segments: Vec<Segment<T>>,
}

impl<T> Partition<T> {
    /// Detector indices in match order.
    pub fn detectors(&self) -> Vec<usize> {
        self.segments.iter().map(|segment| segment.detector).collect()
    }

    fn push_unmatched(&mut self, item: T) {
        match self.segments.last_mut() {
            Some(segment) => segment.tail.push(item),
            None => self.head.push(item),
        }
    }
}

/// Partition `items` with `detectors` applied in their given order.
///
/// Detector `i` is searched for starting right after the match of the
/// previous detector. A detector that never matches in the remaining items is
/// skipped and the scan continues with the next detector from the same
/// position. Matched items appear only as `Segment::matched`.
pub fn partition<T, F>(items: Vec<T>, detectors: &[F]) -> Partition<T>
where
    F: Fn(&T) -> bool,
{
    let mut partition = Partition {
        head: Vec::new(),
        segments: Vec::new(),
    };

    let mut remaining: Vec<Option<T>> = items.into_iter().map(Some).collect();
    let mut cursor = 0usize;

    for (detector_idx, detector) in detectors.iter().enumerate() {
        let found = remaining[cursor..]
            .iter()
            .position(|item| item.as_ref().is_some_and(detector));

        let Some(offset) = found else {
            continue;
        };

        let match_idx = cursor + offset;
        for slot in &mut remaining[cursor..match_idx] {
            if let Some(item) = slot.take() {
                partition.push_unmatched(item);
            }
        }

        if let Some(matched) = remaining[match_idx].take() {
            partition.segments.push(Segment {
                detector: detector_idx,
                matched,
                tail: Vec::new(),
            });
        }
        cursor = match_idx + 1;
    }

    for slot in &mut remaining[cursor..] {
        if let Some(item) = slot.take() {
            partition.push_unmatched(item);
        }
    }

    partition
}

/// Partition `items` at every item accepted by `detector`.
pub fn partition_repeated<T, F>(items: Vec<T>, detector: F) -> Partition<T>
where
    F: Fn(&T) -> bool,
{
    let mut partition = Partition {
        head: Vec::new(),
        segments: Vec::new(),
    };

    for item in items {
        if detector(&item) {
            partition.segments.push(Segment {
                detector: 0,
                matched: item,
                tail: Vec::new(),
            });
        } else {
            partition.push_unmatched(item);
        }
    }

    partition
}

/// Split `items` around the first item accepted by `detector`.
pub fn split_at_first<T, F>(items: Vec<T>, detector: F) -> (Vec<T>, Option<T>, Vec<T>)
where
    F: Fn(&T) -> bool,
{
    let Some(idx) = items.iter().position(&detector) else {
        return (items, None, Vec::new());
    };

    let mut before = items;
    let mut after = before.split_off(idx);
    let matched = after.remove(0);
    (before, Some(matched), after)
}
