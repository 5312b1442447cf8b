//! Service lifecycle: endpoint publication with retry

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use super::ports::{ServicePublisher, Telemetry, TelemetryEvent};
use crate::domain::daemon::{ServiceRunState, ServiceState};
use crate::domain::duration::Duration;
use crate::domain::session::SessionKey;

/// How endpoint publication is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub const fn forever(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub const fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(Duration::default_init_retry())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not publish {endpoint} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },
}

/// Drives the `NotStarted -> Running -> NotStarted` transitions
pub struct ServiceLifecycle {
    state: ServiceRunState,
    policy: RetryPolicy,
    telemetry: Arc<dyn Telemetry>,
    own_session: SessionKey,
}

impl ServiceLifecycle {
    pub fn new(policy: RetryPolicy, telemetry: Arc<dyn Telemetry>, own_session: SessionKey) -> Self {
        Self {
            state: ServiceRunState::new(),
            policy,
            telemetry,
            own_session,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state.state()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Publish the endpoint, retrying on failure per the policy.
    /// Calling this while already running does nothing.
    pub async fn start<P>(&mut self, publisher: &mut P) -> Result<(), LifecycleError>
    where
        P: ServicePublisher + ?Sized,
    {
        if self.state.is_running() {
            info!("service is already running");
            return Ok(());
        }

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match publisher.publish() {
                Ok(()) => {
                    if let Err(e) = self.state.mark_running() {
                        warn!(error = %e, "unexpected state on start");
                    }
                    info!(endpoint = %publisher.endpoint(), attempts, "service started");
                    return Ok(());
                }
                Err(e) => {
                    let message = e.to_string();
                    self.telemetry.report(TelemetryEvent::InitializationFault {
                        session: self.own_session,
                        error: message.clone(),
                    });

                    if !self.policy.allows(attempts) {
                        error!(error = %message, attempts, "giving up on service init");
                        return Err(LifecycleError::RetriesExhausted {
                            endpoint: publisher.endpoint(),
                            attempts,
                            last_error: message,
                        });
                    }

                    error!(
                        error = %message,
                        "Init failed. Try again {} later.",
                        self.policy.interval
                    );
                    tokio::time::sleep(self.policy.interval.as_std()).await;
                }
            }
        }
    }

    /// Returns whether the service was running
    pub fn stop(&mut self) -> bool {
        match self.state.mark_stopped() {
            Ok(()) => {
                info!("service stopped");
                true
            }
            Err(_) => false,
        }
    }
}
