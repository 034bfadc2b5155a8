pub mod document;
pub mod enums;
pub mod event;

pub use document::*;
pub use event::*;
