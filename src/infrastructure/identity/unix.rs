//! Identity resolution from the local user database and procfs

use std::path::PathBuf;

use nix::unistd::{Uid, User};
use tracing::debug;

use crate::application::ports::IdentityResolver;
use crate::domain::session::{Caller, SessionKey};

/// Maps uids to sessions through the passwd database.
///
/// A uid without an account is an unknown caller. With `uids_per_session`
/// above 1, consecutive uid ranges share one session.
#[derive(Debug, Clone)]
pub struct UnixIdentityResolver {
    uids_per_session: u32,
    proc_root: PathBuf,
}

impl UnixIdentityResolver {
    pub fn new(uids_per_session: u32) -> Self {
        Self {
            uids_per_session: uids_per_session.max(1),
            proc_root: PathBuf::from("/proc"),
        }
    }

    /// Read process names from another procfs mount
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    fn account(&self, uid: u32) -> Option<User> {
        match User::from_uid(Uid::from_raw(uid)) {
            Ok(user) => user,
            Err(e) => {
                debug!(uid, error = %e, "passwd lookup failed");
                None
            }
        }
    }

    fn process_name(&self, pid: i32) -> Option<String> {
        let comm = std::fs::read_to_string(self.proc_root.join(pid.to_string()).join("comm")).ok()?;
        let name = comm.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

impl Default for UnixIdentityResolver {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdentityResolver for UnixIdentityResolver {
    fn session_key(&self, caller: &Caller) -> Option<SessionKey> {
        self.account(caller.uid)?;
        Some(SessionKey::new(caller.uid / self.uids_per_session))
    }

    fn app_name(&self, caller: &Caller) -> Option<String> {
        caller
            .pid
            .and_then(|pid| self.process_name(pid))
            .or_else(|| self.account(caller.uid).map(|user| user.name))
    }
}
