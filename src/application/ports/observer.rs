//! Change observer port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::ObserverId;

/// Delivery failures for a single observer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    #[error("Observer is no longer connected")]
    Disconnected,

    #[error("Observer failed: {0}")]
    Failed(String),
}

/// Subscriber handle held by the registry.
///
/// `on_changed` carries no payload: the contract is "something changed,
/// re-get".
#[async_trait]
pub trait ChangeObserver: Send + Sync {
    fn id(&self) -> ObserverId;

    async fn on_changed(&self) -> Result<(), ObserverError>;
}
