use std::error::Error as StdError;

use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    /// Process exit status: 2 for bad input or configuration, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_)
            | AppError::Infra(InfraError::Fixture { .. })
            | AppError::Infra(InfraError::Domain(_))
            | AppError::Infra(InfraError::Configuration { .. }) => 2,
            AppError::Infra(InfraError::Io(_))
            | AppError::Infra(InfraError::Telemetry(_))
            | AppError::Output(_) => 1,
        }
    }

    /// The error followed by each of its sources.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = self.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_input_exits_with_two() {
        let error = AppError::from(InfraError::fixture("missing object"));
        assert_eq!(error.exit_code(), 2);
        let io = std::io::Error::other("disk full");
        assert_eq!(AppError::from(InfraError::from(io)).exit_code(), 1);
    }

    #[test]
    fn chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "event.json");
        let error = AppError::from(InfraError::from(io));
        let chain = error.chain();
        assert_eq!(chain[0], "io error: event.json");
        assert!(chain.len() >= 2);
    }
}
