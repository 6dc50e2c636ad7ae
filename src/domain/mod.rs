//! Domain layer types and invariants.

pub mod changes;
pub mod content;
pub mod error;
pub mod types;
