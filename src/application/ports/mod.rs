//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod identity;
pub mod observer;
pub mod publisher;
pub mod telemetry;

// Re-export common types
pub use config::ConfigStore;
pub use identity::IdentityResolver;
pub use observer::{ChangeObserver, ObserverError};
pub use publisher::{PublishError, ServicePublisher};
pub use telemetry::{DataLevel, Telemetry, TelemetryEvent};
