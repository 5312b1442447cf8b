//! Pasteboard service: resolves callers and drives the store and registry

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::observers::ObserverRegistry;
use super::ports::{ChangeObserver, DataLevel, IdentityResolver, Telemetry, TelemetryEvent};
use super::store::ClipboardStore;
use crate::domain::config::DEFAULT_DUMP_UID_THRESHOLD;
use crate::domain::history::{AccessHistory, AccessKind, AccessRecord, DEFAULT_HISTORY_SIZE};
use crate::domain::paste::PasteData;
use crate::domain::session::{Caller, ObserverId, SessionKey};

/// App name shown when the resolver cannot name the caller
pub const DEFAULT_APP_NAME: &str = "com.pasteboard.default";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const DUMP_USAGE: &str = "\
usage:
  --copy-history   show the most recent clipboard accesses, newest first
  --data           show the stored clipboard of every session
  -h               show this help
";

/// Dump rejections
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    #[error("Caller uid {0} may not read diagnostics")]
    PermissionDenied(u32),

    #[error("Unknown dump option: {0}")]
    InvalidOption(String),
}

/// Tunables fixed at construction
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub history_size: usize,
    pub dump_uid_threshold: u32,
    /// Uid the daemon runs as; always allowed to dump
    pub own_uid: u32,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            dump_uid_threshold: DEFAULT_DUMP_UID_THRESHOLD,
            own_uid: nix::unistd::getuid().as_raw(),
        }
    }
}

/// The clipboard service shared by every connection.
///
/// A caller the identity resolver cannot map is treated as having no
/// clipboard: reads see nothing and writes are dropped.
pub struct PasteboardService {
    store: ClipboardStore,
    observers: ObserverRegistry,
    history: Mutex<AccessHistory>,
    identity: Arc<dyn IdentityResolver>,
    telemetry: Arc<dyn Telemetry>,
    options: ServiceOptions,
    unknown_callers: AtomicU64,
}

impl PasteboardService {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        telemetry: Arc<dyn Telemetry>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            store: ClipboardStore::new(),
            observers: ObserverRegistry::new(),
            history: Mutex::new(AccessHistory::new(options.history_size)),
            identity,
            telemetry,
            options,
            unknown_callers: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    /// Requests dropped because the caller had no session
    pub fn unknown_caller_count(&self) -> u64 {
        self.unknown_callers.load(Ordering::Relaxed)
    }

    fn session_for(&self, caller: &Caller, operation: &str) -> Option<SessionKey> {
        let session = self.identity.session_key(caller);
        if session.is_none() {
            self.unknown_callers.fetch_add(1, Ordering::Relaxed);
            warn!(uid = caller.uid, pid = ?caller.pid, operation, "unknown caller");
        }
        session
    }

    fn app_name(&self, caller: &Caller) -> String {
        self.identity
            .app_name(caller)
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string())
    }

    fn record_access(&self, caller: &Caller, kind: AccessKind, data_size: usize) {
        let app_name = self.app_name(caller);
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(AccessRecord {
                timestamp: format_timestamp(&Local::now()),
                app_name: app_name.clone(),
                kind,
            });
        self.telemetry.report(TelemetryEvent::Behaviour {
            action: kind,
            app_name,
        });
        self.telemetry.report(TelemetryEvent::TimeConsuming {
            action: kind,
            data_size,
            level: DataLevel::from_size(data_size),
        });
    }

    /// Replace the caller's clipboard, then notify its observers.
    /// Returns false if the caller has no session.
    pub fn set_paste_data(&self, caller: &Caller, data: PasteData) -> bool {
        let Some(session) = self.session_for(caller, "set") else {
            return false;
        };
        let data_size = data.data_size();
        let record_count = data.record_count();
        self.store.set(session, *caller, data);
        debug!(%session, record_count, data_size, "clipboard set");

        self.record_access(caller, AccessKind::Set, data_size);
        self.observers.notify(session);
        true
    }

    pub fn get_paste_data(&self, caller: &Caller) -> Option<PasteData> {
        let session = self.session_for(caller, "get")?;
        let data = self.store.get(session)?;
        self.record_access(caller, AccessKind::Get, data.data_size());
        Some(data)
    }

    pub fn has_paste_data(&self, caller: &Caller) -> bool {
        self.session_for(caller, "has")
            .is_some_and(|session| self.store.has(session))
    }

    /// Remove the caller's clipboard. Observers hear about it only if
    /// something was actually removed.
    pub fn clear(&self, caller: &Caller) -> bool {
        let Some(session) = self.session_for(caller, "clear") else {
            return false;
        };
        let removed = self.store.clear(session);
        if removed {
            debug!(%session, "clipboard cleared");
            self.observers.notify(session);
        }
        removed
    }

    pub fn add_observer(&self, caller: &Caller, observer: Arc<dyn ChangeObserver>) -> bool {
        self.session_for(caller, "add_observer")
            .is_some_and(|session| self.observers.add(session, observer))
    }

    /// Whether `id` is registered in the caller's session
    pub fn observer_id_taken(&self, caller: &Caller, id: ObserverId) -> bool {
        self.identity
            .session_key(caller)
            .is_some_and(|session| self.observers.contains(session, id))
    }

    pub fn remove_observer(&self, caller: &Caller, id: ObserverId) -> usize {
        self.session_for(caller, "remove_observer")
            .map_or(0, |session| self.observers.remove(session, id))
    }

    pub fn remove_all_observers(&self, caller: &Caller) -> usize {
        self.session_for(caller, "remove_all_observers")
            .map_or(0, |session| self.observers.remove_all(session))
    }

    pub fn observer_count(&self, caller: &Caller) -> usize {
        self.identity
            .session_key(caller)
            .map_or(0, |session| self.observers.observer_count(session))
    }

    /// Render diagnostics for `--copy-history` and `--data`
    pub fn dump(&self, caller: &Caller, args: &[String]) -> Result<String, DumpError> {
        if caller.uid > self.options.dump_uid_threshold && caller.uid != self.options.own_uid {
            return Err(DumpError::PermissionDenied(caller.uid));
        }

        if args.is_empty() {
            return Ok(DUMP_USAGE.to_string());
        }

        let mut out = String::new();
        for arg in args {
            match arg.as_str() {
                "-h" | "--help" => out.push_str(DUMP_USAGE),
                "--copy-history" => self.dump_history(&mut out),
                "--data" => self.dump_data(&mut out),
                other => return Err(DumpError::InvalidOption(other.to_string())),
            }
        }
        info!(uid = caller.uid, ?args, "dump served");
        Ok(out)
    }

    fn dump_history(&self, out: &mut String) {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if history.is_empty() {
            out.push_str("Access history fail! no data.\n");
            return;
        }
        let _ = writeln!(out, "Access history (last {}):", history.capacity());
        for record in history.newest_first() {
            let _ = writeln!(out, "{}", record);
        }
    }

    fn dump_data(&self, out: &mut String) {
        let entries = self.store.snapshot();
        if entries.is_empty() {
            out.push_str("No copy data.\n");
        }
        for entry in entries {
            let mime_types: Vec<&str> = entry.mime_types.iter().map(|m| m.as_str()).collect();
            let _ = writeln!(out, "Session: {}", entry.session);
            let _ = writeln!(out, "Owner: {}", self.app_name(&entry.owner));
            let _ = writeln!(out, "Timestamp: {}", format_timestamp(&entry.stored_at));
            let _ = writeln!(out, "Record Count: {}", entry.record_count);
            let _ = writeln!(out, "Mime types: {}", mime_types.join(", "));
            out.push('\n');
        }
        let _ = writeln!(out, "Unknown callers: {}", self.unknown_caller_count());
        let _ = writeln!(out, "Failed notifications: {}", self.observers.failure_count());
    }
}

fn format_timestamp(time: &DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}
