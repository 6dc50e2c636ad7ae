//! Application services layer: collaborator ports and link resolution.

pub mod error;
pub mod links;
pub mod ports;
