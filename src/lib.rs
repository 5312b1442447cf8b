//! Pasteboard - per-user shared clipboard service
//!
//! A daemon keeps one clipboard per OS user and serves it to local client
//! processes over a Unix Domain Socket. Clients can set, get, test and
//! clear the clipboard, and subscribe to change notifications.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Clipboard payload model, session ids, config and errors
//! - **Application**: Store, observer registry, service, lifecycle and port traits
//! - **Infrastructure**: Adapters (XDG config, passwd/procfs identity, log telemetry)
//! - **IPC**: Wire protocol, request dispatcher and socket transport
//! - **Client**: Façade used by client processes
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod client;
pub mod domain;
pub mod infrastructure;
pub mod ipc;
