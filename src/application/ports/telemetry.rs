//! Telemetry port

use std::fmt;

use crate::domain::history::AccessKind;
use crate::domain::session::SessionKey;

/// Coarse payload size bucket used when reporting slow operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataLevel {
    Under100Kb,
    Under500Kb,
    Under1Mb,
    Under5Mb,
    Under10Mb,
    Under50Mb,
    Over50Mb,
}

impl DataLevel {
    pub fn from_size(bytes: usize) -> Self {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;
        match bytes {
            b if b < 100 * KB => Self::Under100Kb,
            b if b < 500 * KB => Self::Under500Kb,
            b if b < MB => Self::Under1Mb,
            b if b < 5 * MB => Self::Under5Mb,
            b if b < 10 * MB => Self::Under10Mb,
            b if b < 50 * MB => Self::Under50Mb,
            _ => Self::Over50Mb,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Under100Kb => "0-100KB",
            Self::Under500Kb => "100-500KB",
            Self::Under1Mb => "500KB-1MB",
            Self::Under5Mb => "1-5MB",
            Self::Under10Mb => "5-10MB",
            Self::Under50Mb => "10-50MB",
            Self::Over50Mb => ">50MB",
        }
    }
}

impl fmt::Display for DataLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget events emitted by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Endpoint publication failed and will be retried
    InitializationFault { session: SessionKey, error: String },
    /// A client read or wrote the clipboard
    Behaviour { action: AccessKind, app_name: String },
    /// Size profile of a clipboard access
    TimeConsuming {
        action: AccessKind,
        data_size: usize,
        level: DataLevel,
    },
}

/// Port for the telemetry collector. Reporting must not fail or block.
pub trait Telemetry: Send + Sync {
    fn report(&self, event: TelemetryEvent);
}
