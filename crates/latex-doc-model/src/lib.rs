//! In-memory model of a LaTeX document as seen by the review pipeline.
//!
//! A [`Document`] keeps the preamble, the block between `\begin{document}` and
//! `\maketitle`, an ordered [`ContentMap`] of main and appendix regions, and the
//! bibliography. Content entries are addressed with [`ContentReference`].

pub mod markers;

mod document;
mod reference;
mod serialize;

pub use document::{ContentMap, Document, DocumentParts, RegionContent, SupportingFiles};
pub use reference::{generated_label, ContentReference, PreSectionRef, SectionRef};
pub use serialize::{to_latex, to_latex_lines};
