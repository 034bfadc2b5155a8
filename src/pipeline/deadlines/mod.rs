pub mod types;
pub mod parser;
pub mod dates;
pub mod materializer;

pub use types::*;
pub use parser::*;
pub use dates::*;
pub use materializer::*;
