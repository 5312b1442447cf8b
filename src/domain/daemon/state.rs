//! Service run-state machine

use std::fmt;
use thiserror::Error;

/// Service states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceState {
    #[default]
    NotStarted,
    Running,
}

impl ServiceState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: ServiceState,
    pub action: String,
}

/// Tracks whether the service endpoint is published.
///
/// State machine:
///   NOT_STARTED -> RUNNING (mark_running, after the endpoint is published)
///   RUNNING -> NOT_STARTED (mark_stopped, on shutdown)
#[derive(Debug, Default)]
pub struct ServiceRunState {
    state: ServiceState,
}

impl ServiceRunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ServiceState::Running
    }

    pub fn mark_running(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != ServiceState::NotStarted {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "start".to_string(),
            });
        }
        self.state = ServiceState::Running;
        Ok(())
    }

    pub fn mark_stopped(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != ServiceState::Running {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "stop".to_string(),
            });
        }
        self.state = ServiceState::NotStarted;
        Ok(())
    }
}
