//! Service lifecycle state

mod state;

pub use state::{InvalidStateTransition, ServiceRunState, ServiceState};
