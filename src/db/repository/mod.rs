//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, re-exported here.

mod event;

pub use event::*;
