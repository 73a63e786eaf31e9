mod document;
mod format;
mod summary;

pub use document::*;
pub use format::*;
pub use summary::*;
