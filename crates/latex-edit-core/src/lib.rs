pub mod comment;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fs;
pub mod payload;
pub mod review_block;

pub use comment::{add_comment, comment_lines};
pub use engine::{
    apply_comment, select_reference, CommentOptions, CommentOutcome, CommentRequest, Region,
    Selector,
};
pub use error::{EditError, EditResult, ExitCode};
pub use latex_doc_model::{ContentReference, Document};
pub use payload::{load_payload, PayloadSource};
pub use review_block::{review_header, wrap_review_block};
