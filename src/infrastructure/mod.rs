//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces:
//! the XDG config file, passwd/procfs identity lookup and
//! log-based telemetry.

pub mod config;
pub mod identity;
pub mod telemetry;

// Re-export adapters
pub use config::XdgConfigStore;
pub use identity::UnixIdentityResolver;
pub use telemetry::TracingTelemetry;
