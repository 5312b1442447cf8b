//! Endpoint publication port

use thiserror::Error;

/// Failure to make the service reachable
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to prepare {endpoint}: {message}")]
    Setup { endpoint: String, message: String },
}

/// Registers the service with whatever makes it reachable to clients
pub trait ServicePublisher: Send {
    /// Publish the endpoint. Safe to call again after a failure.
    fn publish(&mut self) -> Result<(), PublishError>;

    /// Human-readable endpoint address
    fn endpoint(&self) -> String;
}
