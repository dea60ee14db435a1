mod engine;
mod model;
pub mod text;

pub use engine::{diff, diff_documents, flatten};
pub use model::{Change, DeltaNode, DiffResult, DiffSummary, PathSegment};
pub use text::{format_text_diff, multiline_changes};
