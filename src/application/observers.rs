//! Per-session observer registry and change fan-out

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::ports::{ChangeObserver, ObserverError};
use crate::domain::session::{ObserverId, SessionKey};

type ObserverSet = HashMap<ObserverId, Arc<dyn ChangeObserver>>;

/// Result of delivering one change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyOutcome {
    pub observer: ObserverId,
    pub result: Result<(), ObserverError>,
}

/// In-flight deliveries started by one `notify` call.
///
/// Dropping the batch leaves the deliveries running detached.
#[derive(Debug, Default)]
pub struct NotifyBatch {
    tasks: Vec<(ObserverId, JoinHandle<Result<(), ObserverError>>)>,
}

impl NotifyBatch {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every delivery to finish
    pub async fn join(self) -> Vec<NotifyOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (observer, task) in self.tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(ObserverError::Failed(e.to_string())),
            };
            outcomes.push(NotifyOutcome { observer, result });
        }
        outcomes
    }
}

/// Live change subscribers, grouped by session
#[derive(Default)]
pub struct ObserverRegistry {
    sets: Mutex<HashMap<SessionKey, ObserverSet>>,
    failures: Arc<AtomicU64>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionKey, ObserverSet>> {
        self.sets.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a handle. Returns false for an invalid id, or when the id
    /// is already held by a different handle of the session.
    /// Adding the same handle twice keeps a single registration.
    pub fn add(&self, session: SessionKey, observer: Arc<dyn ChangeObserver>) -> bool {
        let id = observer.id();
        if !id.is_valid() {
            return false;
        }
        let mut sets = self.lock();
        let set = sets.entry(session).or_default();
        if let Some(existing) = set.get(&id) {
            let same = std::ptr::eq(
                Arc::as_ptr(existing) as *const (),
                Arc::as_ptr(&observer) as *const (),
            );
            if !same {
                debug!(%session, observer = %id, "observer id already taken");
            }
            return same;
        }
        set.insert(id, observer);
        debug!(%session, observer = %id, "observer added");
        true
    }

    /// Unregister one handle. Returns how many were removed (0 or 1).
    pub fn remove(&self, session: SessionKey, id: ObserverId) -> usize {
        let mut sets = self.lock();
        let Some(set) = sets.get_mut(&session) else {
            return 0;
        };
        let removed = usize::from(set.remove(&id).is_some());
        if set.is_empty() {
            sets.remove(&session);
        }
        removed
    }

    /// Drop every handle of the session
    pub fn remove_all(&self, session: SessionKey) -> usize {
        self.lock().remove(&session).map_or(0, |set| set.len())
    }

    pub fn contains(&self, session: SessionKey, id: ObserverId) -> bool {
        self.lock().get(&session).is_some_and(|set| set.contains_key(&id))
    }

    pub fn observer_count(&self, session: SessionKey) -> usize {
        self.lock().get(&session).map_or(0, HashMap::len)
    }

    /// Deliveries that failed since startup
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Tell every observer of the session that its clipboard changed.
    ///
    /// Handles are copied out under the lock; each delivery then runs on its
    /// own task. Outside a tokio runtime nothing is delivered.
    pub fn notify(&self, session: SessionKey) -> NotifyBatch {
        let observers: Vec<Arc<dyn ChangeObserver>> = match self.lock().get(&session) {
            Some(set) => set.values().cloned().collect(),
            None => return NotifyBatch::default(),
        };

        let Ok(runtime) = Handle::try_current() else {
            warn!(%session, "no async runtime, change notification skipped");
            return NotifyBatch::default();
        };

        let tasks = observers
            .into_iter()
            .map(|observer| {
                let id = observer.id();
                let failures = Arc::clone(&self.failures);
                let task = runtime.spawn(async move {
                    let result = observer.on_changed().await;
                    if let Err(e) = &result {
                        failures.fetch_add(1, Ordering::Relaxed);
                        warn!(%session, observer = %id, error = %e, "change notification failed");
                    }
                    result
                });
                (id, task)
            })
            .collect();

        NotifyBatch { tasks }
    }
}
