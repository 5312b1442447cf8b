//! Caller identity port

use crate::domain::session::{Caller, SessionKey};

/// Resolves transport-level callers to clipboard sessions and app names.
///
/// Implementations must be cheap and non-blocking; they run on the request
/// path of every call.
pub trait IdentityResolver: Send + Sync {
    /// Session owning the caller's clipboard, or `None` if the caller
    /// cannot be mapped to a user.
    fn session_key(&self, caller: &Caller) -> Option<SessionKey>;

    /// Human-readable name of the calling application, if known.
    fn app_name(&self, caller: &Caller) -> Option<String>;
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for std::sync::Arc<T> {
    fn session_key(&self, caller: &Caller) -> Option<SessionKey> {
        self.as_ref().session_key(caller)
    }

    fn app_name(&self, caller: &Caller) -> Option<String> {
        self.as_ref().app_name(caller)
    }
}
