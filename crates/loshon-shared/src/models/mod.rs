mod document;
mod search;

pub use document::*;
pub use search::*;
