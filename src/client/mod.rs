//! Client façade for the pasteboard daemon
//!
//! Connects lazily, caches the connection and reconnects once when the
//! daemon has gone away. Failures after that degrade to "nothing there".

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::error::RecordError;
use crate::domain::paste::{MimeType, PasteData, PasteRecord, Want};
use crate::domain::session::ObserverId;
use crate::ipc::{
    create_ipc_client, Connection, IpcClient, ProtocolError, Reply, Request, RequestCode,
    ServerEvent, SocketPath, Status,
};

/// Client-side change callback
#[async_trait]
pub trait PasteboardObserver: Send + Sync {
    async fn on_changed(&self);
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Pasteboard service unavailable at {endpoint}: {source}")]
    Unavailable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Service replied {status}{}", detail_suffix(.detail))]
    Status {
        status: Status,
        detail: Option<String>,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

struct Subscription {
    observer: Arc<dyn PasteboardObserver>,
    id: ObserverId,
    task: JoinHandle<()>,
}

fn same_observer(a: &Arc<dyn PasteboardObserver>, b: &Arc<dyn PasteboardObserver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Handle to the pasteboard service
pub struct PasteboardClient {
    ipc: Arc<dyn IpcClient>,
    connection: Mutex<Option<Connection>>,
    subscriptions: StdMutex<Vec<Subscription>>,
}

impl PasteboardClient {
    pub fn new(ipc: Arc<dyn IpcClient>) -> Self {
        Self {
            ipc,
            connection: Mutex::new(None),
            subscriptions: StdMutex::new(Vec::new()),
        }
    }

    /// Client for the daemon listening on `socket`
    pub fn with_socket(socket: SocketPath) -> Self {
        Self::new(create_ipc_client(socket))
    }

    pub fn endpoint(&self) -> String {
        self.ipc.endpoint()
    }

    async fn connect(&self) -> Result<Connection, ClientError> {
        self.ipc
            .connect()
            .await
            .map_err(|source| ClientError::Unavailable {
                endpoint: self.ipc.endpoint(),
                source,
            })
    }

    /// Send a request over the cached connection, reconnecting once on a
    /// transport failure.
    async fn call(&self, request: Request) -> Result<Reply, ClientError> {
        let mut cached = self.connection.lock().await;
        let mut retried = false;
        loop {
            let attempt = match cached.as_mut() {
                Some(connection) => connection.call(&request).await.map_err(ClientError::from),
                None => match self.connect().await {
                    Ok(connection) => cached
                        .insert(connection)
                        .call(&request)
                        .await
                        .map_err(ClientError::from),
                    Err(e) => Err(e),
                },
            };
            match attempt {
                Ok(reply) => return Ok(reply),
                Err(e) if !retried => {
                    debug!(error = %e, "redo connect to pasteboard service");
                    *cached = None;
                    retried = true;
                }
                Err(e) => {
                    *cached = None;
                    return Err(e);
                }
            }
        }
    }

    /// Like `call`, but a non-OK status is an error
    async fn call_ok(&self, request: Request) -> Result<Reply, ClientError> {
        let reply = self.call(request).await?;
        if reply.status.is_ok() {
            Ok(reply)
        } else {
            Err(ClientError::Status {
                status: reply.status,
                detail: reply.text,
            })
        }
    }

    pub async fn try_set_paste_data(&self, data: &PasteData) -> Result<(), ClientError> {
        let request = Request::new(RequestCode::SetPasteData).with_data(data)?;
        self.call_ok(request).await.map(|_| ())
    }

    pub async fn try_get_paste_data(&self) -> Result<Option<PasteData>, ClientError> {
        let reply = self.call(Request::new(RequestCode::GetPasteData)).await?;
        match reply.status {
            Status::Ok => Ok(reply.data),
            Status::InvalidValue => Ok(None),
            status => Err(ClientError::Status {
                status,
                detail: reply.text,
            }),
        }
    }

    pub async fn try_has_paste_data(&self) -> Result<bool, ClientError> {
        let reply = self.call_ok(Request::new(RequestCode::HasPasteData)).await?;
        Ok(reply.has.unwrap_or(false))
    }

    pub async fn try_clear(&self) -> Result<(), ClientError> {
        self.call_ok(Request::new(RequestCode::ClearAll)).await.map(|_| ())
    }

    /// Returns false if the service could not be reached
    pub async fn set_paste_data(&self, data: &PasteData) -> bool {
        match self.try_set_paste_data(data).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "set paste data failed");
                false
            }
        }
    }

    pub async fn get_paste_data(&self) -> Option<PasteData> {
        self.try_get_paste_data().await.unwrap_or_else(|e| {
            warn!(error = %e, "get paste data failed");
            None
        })
    }

    pub async fn has_paste_data(&self) -> bool {
        self.try_has_paste_data().await.unwrap_or_else(|e| {
            warn!(error = %e, "has paste data failed");
            false
        })
    }

    pub async fn clear(&self) {
        if let Err(e) = self.try_clear().await {
            warn!(error = %e, "clear failed");
        }
    }

    /// Diagnostic text. Errors are returned so callers can show why a
    /// dump was refused.
    pub async fn dump(&self, args: &[String]) -> Result<String, ClientError> {
        let request = Request::new(RequestCode::Dump).with_args(args.to_vec());
        let reply = self.call_ok(request).await?;
        Ok(reply.text.unwrap_or_default())
    }

    /// Subscribe `observer` to changes of this user's clipboard.
    ///
    /// Uses a dedicated connection. Whenever it drops, the subscription is
    /// re-established once; if that fails the observer is dropped and may be
    /// added again.
    pub async fn add_observer(&self, observer: Arc<dyn PasteboardObserver>) -> bool {
        let already = self
            .live_subscriptions()
            .iter()
            .any(|s| same_observer(&s.observer, &observer));
        if already {
            return true;
        }

        let id = ObserverId::new();
        let connection = match subscribe(self.ipc.as_ref(), id).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!(error = %e, "add observer failed");
                return false;
            }
        };

        let task = tokio::spawn(deliver_events(
            Arc::clone(&self.ipc),
            connection,
            id,
            Arc::clone(&observer),
        ));
        self.lock_subscriptions().push(Subscription { observer, id, task });
        true
    }

    /// Unsubscribe one observer, or every observer of this user when `None`
    pub async fn remove_observer(&self, observer: Option<&Arc<dyn PasteboardObserver>>) {
        let request = match observer {
            Some(observer) => {
                let removed = {
                    let mut subscriptions = self.lock_subscriptions();
                    subscriptions
                        .iter()
                        .position(|s| same_observer(&s.observer, observer))
                        .map(|index| subscriptions.remove(index))
                };
                let Some(subscription) = removed else {
                    return;
                };
                subscription.task.abort();
                Request::new(RequestCode::RemoveObserver).with_observer(subscription.id)
            }
            None => {
                for subscription in self.lock_subscriptions().drain(..) {
                    subscription.task.abort();
                }
                Request::new(RequestCode::RemoveAllObservers)
            }
        };

        if let Err(e) = self.call_ok(request).await {
            warn!(error = %e, "remove observer failed");
        }
    }

    pub fn observer_count(&self) -> usize {
        self.live_subscriptions().len()
    }

    /// Subscriptions whose delivery task is still running
    fn live_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        let mut subscriptions = self.lock_subscriptions();
        subscriptions.retain(|s| !s.task.is_finished());
        subscriptions
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn create_html_record(html: impl Into<String>) -> PasteRecord {
        PasteRecord::new_html(html)
    }

    pub fn create_plain_text_record(text: impl Into<String>) -> PasteRecord {
        PasteRecord::new_plain_text(text)
    }

    pub fn create_uri_record(uri: impl Into<String>) -> PasteRecord {
        PasteRecord::new_uri(uri)
    }

    pub fn create_want_record(want: Want) -> PasteRecord {
        PasteRecord::new_want(want)
    }

    pub fn create_custom_record(
        mime_type: MimeType,
        bytes: Vec<u8>,
    ) -> Result<PasteRecord, RecordError> {
        PasteRecord::new_custom(mime_type, bytes)
    }

    pub fn create_html_data(html: impl Into<String>) -> PasteData {
        PasteData::html(html)
    }

    pub fn create_plain_text_data(text: impl Into<String>) -> PasteData {
        PasteData::plain_text(text)
    }

    pub fn create_uri_data(uri: impl Into<String>) -> PasteData {
        PasteData::uri(uri)
    }

    pub fn create_want_data(want: Want) -> PasteData {
        PasteData::want(want)
    }
}

impl Drop for PasteboardClient {
    fn drop(&mut self) {
        for subscription in self.lock_subscriptions().drain(..) {
            subscription.task.abort();
        }
    }
}

async fn subscribe(ipc: &dyn IpcClient, id: ObserverId) -> Result<Connection, ClientError> {
    let mut connection = ipc
        .connect()
        .await
        .map_err(|source| ClientError::Unavailable {
            endpoint: ipc.endpoint(),
            source,
        })?;
    let reply = connection
        .call(&Request::new(RequestCode::AddObserver).with_observer(id))
        .await?;
    if !reply.status.is_ok() {
        return Err(ClientError::Status {
            status: reply.status,
            detail: reply.text,
        });
    }
    Ok(connection)
}

async fn deliver_events(
    ipc: Arc<dyn IpcClient>,
    mut connection: Connection,
    id: ObserverId,
    observer: Arc<dyn PasteboardObserver>,
) {
    loop {
        match connection.next_event().await {
            Ok(ServerEvent::Changed) => observer.on_changed().await,
            Err(e) => {
                debug!(observer = %id, error = %e, "subscription lost, resubscribing");
                match subscribe(ipc.as_ref(), id).await {
                    Ok(fresh) => connection = fresh,
                    Err(e) => {
                        warn!(observer = %id, error = %e, "observer dropped");
                        return;
                    }
                }
            }
        }
    }
}
