pub mod extraction;
pub mod chunker;
pub mod inference;
pub mod deadlines;
pub mod progress;
pub mod processor;
