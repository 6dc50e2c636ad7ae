//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod fixture;
pub(crate) mod lock;
pub mod memory;
pub mod telemetry;
pub mod transport;
