use std::fmt;

use latex_doc_model::ContentReference;
use tracing::debug;

/// Progress of one fragment through the repair loop.
///
/// `Unchecked -> Compiling -> Accepted`, or
/// `Compiling -> NeedsRepair -> RepairQuerying -> Compiling` until the attempt
/// budget runs out and `NeedsRepair -> Exhausted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GuardState {
    Unchecked,
    Compiling,
    NeedsRepair,
    RepairQuerying,
    Accepted,
    Exhausted,
}

impl GuardState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GuardState::Accepted | GuardState::Exhausted)
    }

    pub fn can_advance_to(self, next: GuardState) -> bool {
        use GuardState::*;
        matches!(
            (self, next),
            (Unchecked, Compiling)
                | (Compiling, Accepted)
                | (Compiling, NeedsRepair)
                | (NeedsRepair, RepairQuerying)
                | (NeedsRepair, Exhausted)
                | (RepairQuerying, Compiling)
        )
    }

    pub(crate) fn advance(self, next: GuardState, reference: &ContentReference) -> GuardState {
        debug_assert!(self.can_advance_to(next), "{self} -> {next}");
        debug!(%reference, from = %self, to = %next, "guard transition");
        next
    }
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuardState::Unchecked => "unchecked",
            GuardState::Compiling => "compiling",
            GuardState::NeedsRepair => "needs-repair",
            GuardState::RepairQuerying => "repair-querying",
            GuardState::Accepted => "accepted",
            GuardState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}
