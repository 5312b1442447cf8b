//! Telemetry as structured log events

use tracing::{error, info};

use crate::application::ports::{Telemetry, TelemetryEvent};

/// Emits every event under the `pasteboard::telemetry` target.
/// Filter it like any other log target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl Telemetry for TracingTelemetry {
    fn report(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::InitializationFault { session, error } => {
                error!(target: "pasteboard::telemetry", %session, %error, "initialization fault");
            }
            TelemetryEvent::Behaviour { action, app_name } => {
                info!(target: "pasteboard::telemetry", %action, app = %app_name, "behaviour");
            }
            TelemetryEvent::TimeConsuming {
                action,
                data_size,
                level,
            } => {
                info!(
                    target: "pasteboard::telemetry",
                    %action,
                    data_size,
                    %level,
                    "time consuming"
                );
            }
        }
    }
}
