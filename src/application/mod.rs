//! Application layer - Use cases and port interfaces
//!
//! Contains the clipboard service, its store and observer registry,
//! the service lifecycle and the trait definitions for external systems.

pub mod lifecycle;
pub mod observers;
pub mod ports;
pub mod service;
pub mod store;

pub use lifecycle::{LifecycleError, RetryPolicy, ServiceLifecycle};
pub use observers::{NotifyBatch, NotifyOutcome, ObserverRegistry};
pub use service::{DumpError, PasteboardService, ServiceOptions, DEFAULT_APP_NAME};
pub use store::{ClipboardStore, EntrySummary};
