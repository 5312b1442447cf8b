//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod daemon;
pub mod duration;
pub mod error;
pub mod history;
pub mod paste;
pub mod session;

// Re-export common types
pub use config::AppConfig;
pub use duration::Duration;
pub use error::*;
pub use history::{AccessHistory, AccessKind, AccessRecord};
pub use paste::{MimeType, PasteData, PasteRecord, RecordContent, Want};
pub use session::{Caller, ObserverId, SessionKey};
