//! Line-oriented segmentation used by the LaTeX structural parser.
//!
//! Nothing in this crate knows about LaTeX: callers provide the predicates
//! that recognise boundary lines.

mod line;
mod segment;

pub use line::{split_lines, LineRecord};
pub use segment::{partition, partition_repeated, split_at_first, Partition, Segment};
