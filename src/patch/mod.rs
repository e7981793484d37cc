pub mod pipeline;
pub mod types;

pub use pipeline::PatchValidator;
pub use types::{PatchOpKind, PatchOperation, PatchRequest};
