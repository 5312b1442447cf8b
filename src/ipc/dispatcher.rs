//! Routes decoded requests to the pasteboard service

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, trace};

use super::protocol::{Reply, Request, RequestCode, ServerEvent, ServerFrame, Status, INTERFACE_TOKEN};
use crate::application::ports::{ChangeObserver, ObserverError};
use crate::application::{DumpError, PasteboardService};
use crate::domain::paste::PasteData;
use crate::domain::session::{Caller, ObserverId};

/// Frames queued per connection before replies wait and events coalesce
pub const OUTBOUND_CAPACITY: usize = 16;

type Handler = fn(&PasteboardService, &mut CallContext, Request) -> Reply;

/// Per-connection state seen by handlers
pub struct CallContext {
    caller: Caller,
    outbound: mpsc::Sender<ServerFrame>,
    subscriptions: Vec<ObserverId>,
}

impl CallContext {
    /// `outbound` feeds the connection's writer; observers registered over
    /// this connection push their events through it.
    pub fn new(caller: Caller, outbound: mpsc::Sender<ServerFrame>) -> Self {
        Self {
            caller,
            outbound,
            subscriptions: Vec::new(),
        }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn subscriptions(&self) -> &[ObserverId] {
        &self.subscriptions
    }
}

/// Server-side stand-in for a client's observer
struct RemoteObserver {
    id: ObserverId,
    outbound: mpsc::Sender<ServerFrame>,
}

#[async_trait]
impl ChangeObserver for RemoteObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    /// Never waits on the connection. A full queue already holds a pending
    /// `changed` event, so this one is coalesced into it.
    async fn on_changed(&self) -> Result<(), ObserverError> {
        match self.outbound.try_send(ServerFrame::Event(ServerEvent::Changed)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                trace!(observer = %self.id, "outbound queue full, event coalesced");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(ObserverError::Disconnected),
        }
    }
}

/// Verifies the interface token and maps request codes to handlers
pub struct RequestDispatcher {
    service: Arc<PasteboardService>,
    handlers: HashMap<RequestCode, Handler>,
}

impl RequestDispatcher {
    pub fn new(service: Arc<PasteboardService>) -> Self {
        let mut handlers: HashMap<RequestCode, Handler> = HashMap::new();
        handlers.insert(RequestCode::GetPasteData, on_get);
        handlers.insert(RequestCode::HasPasteData, on_has);
        handlers.insert(RequestCode::SetPasteData, on_set);
        handlers.insert(RequestCode::ClearAll, on_clear);
        handlers.insert(RequestCode::AddObserver, on_add_observer);
        handlers.insert(RequestCode::RemoveObserver, on_remove_observer);
        handlers.insert(RequestCode::RemoveAllObservers, on_remove_all_observers);
        handlers.insert(RequestCode::Dump, on_dump);
        Self { service, handlers }
    }

    pub fn service(&self) -> &Arc<PasteboardService> {
        &self.service
    }

    /// Handle one request. A token mismatch is rejected before any state
    /// is touched; the transport closes the connection afterwards.
    pub fn dispatch(&self, ctx: &mut CallContext, request: Request) -> Reply {
        if request.token != INTERFACE_TOKEN {
            debug!(uid = ctx.caller.uid, "interface token mismatch");
            return Reply::status(Status::InterfaceMismatch);
        }

        let handler = RequestCode::from_code(request.code)
            .and_then(|code| self.handlers.get(&code));
        match handler {
            Some(handler) => handler(&self.service, ctx, request),
            None => {
                debug!(code = request.code, "unsupported request code");
                Reply::status(Status::NotSupported)
            }
        }
    }

    /// Drop every observer registered over a closed connection
    pub fn release(&self, ctx: &mut CallContext) {
        for id in ctx.subscriptions.drain(..) {
            self.service.remove_observer(&ctx.caller, id);
        }
    }
}

fn on_get(service: &PasteboardService, ctx: &mut CallContext, _request: Request) -> Reply {
    match service.get_paste_data(&ctx.caller) {
        Some(data) => Reply::ok().with_data(data),
        None => Reply::status(Status::InvalidValue),
    }
}

fn on_has(service: &PasteboardService, ctx: &mut CallContext, _request: Request) -> Reply {
    Reply::ok().with_has(service.has_paste_data(&ctx.caller))
}

fn on_set(service: &PasteboardService, ctx: &mut CallContext, request: Request) -> Reply {
    let Some(value) = request.data else {
        return Reply::status(Status::InvalidValue);
    };
    match serde_json::from_value::<PasteData>(value) {
        Ok(data) => {
            service.set_paste_data(&ctx.caller, data);
            Reply::ok()
        }
        Err(e) => {
            debug!(error = %e, "undecodable paste data");
            Reply::status(Status::InvalidValue)
        }
    }
}

fn on_clear(service: &PasteboardService, ctx: &mut CallContext, _request: Request) -> Reply {
    service.clear(&ctx.caller);
    Reply::ok()
}

fn on_add_observer(service: &PasteboardService, ctx: &mut CallContext, request: Request) -> Reply {
    let Some(id) = request.observer.filter(ObserverId::is_valid) else {
        return Reply::status(Status::InvalidValue);
    };
    if ctx.subscriptions.contains(&id) {
        return Reply::ok();
    }
    let observer = Arc::new(RemoteObserver {
        id,
        outbound: ctx.outbound.clone(),
    });
    if service.add_observer(&ctx.caller, observer) {
        ctx.subscriptions.push(id);
    } else if service.observer_id_taken(&ctx.caller, id) {
        debug!(uid = ctx.caller.uid, observer = %id, "observer id held by another connection");
        return Reply::status(Status::InvalidValue);
    }
    Reply::ok()
}

fn on_remove_observer(
    service: &PasteboardService,
    ctx: &mut CallContext,
    request: Request,
) -> Reply {
    let Some(id) = request.observer.filter(ObserverId::is_valid) else {
        return Reply::status(Status::InvalidValue);
    };
    service.remove_observer(&ctx.caller, id);
    ctx.subscriptions.retain(|s| *s != id);
    Reply::ok()
}

fn on_remove_all_observers(
    service: &PasteboardService,
    ctx: &mut CallContext,
    _request: Request,
) -> Reply {
    service.remove_all_observers(&ctx.caller);
    ctx.subscriptions.clear();
    Reply::ok()
}

fn on_dump(service: &PasteboardService, ctx: &mut CallContext, request: Request) -> Reply {
    match service.dump(&ctx.caller, &request.args) {
        Ok(text) => Reply::ok().with_text(text),
        Err(e @ DumpError::PermissionDenied(_)) => {
            Reply::status(Status::PermissionDenied).with_text(e.to_string())
        }
        Err(e @ DumpError::InvalidOption(_)) => {
            Reply::status(Status::InvalidOption).with_text(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{IdentityResolver, Telemetry, TelemetryEvent};
    use crate::application::ServiceOptions;
    use crate::domain::session::SessionKey;
    use serde_json::json;

    struct UidIdentity;

    impl IdentityResolver for UidIdentity {
        fn session_key(&self, caller: &Caller) -> Option<SessionKey> {
            Some(SessionKey::new(caller.uid))
        }

        fn app_name(&self, _caller: &Caller) -> Option<String> {
            None
        }
    }

    struct NullTelemetry;

    impl Telemetry for NullTelemetry {
        fn report(&self, _event: TelemetryEvent) {}
    }

    fn dispatcher() -> RequestDispatcher {
        RequestDispatcher::new(Arc::new(PasteboardService::new(
            Arc::new(UidIdentity),
            Arc::new(NullTelemetry),
            ServiceOptions {
                history_size: 10,
                dump_uid_threshold: 10_000,
                own_uid: 0,
            },
        )))
    }

    fn context(uid: u32) -> (CallContext, mpsc::Receiver<ServerFrame>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        (CallContext::new(Caller::new(uid, None), tx), rx)
    }

    #[test]
    fn token_mismatch_rejected_before_state() {
        let dispatcher = dispatcher();
        let (mut ctx, _rx) = context(7);
        let mut request = Request::new(RequestCode::SetPasteData)
            .with_data(&PasteData::plain_text("x"))
            .unwrap();
        request.token = "other.Interface".to_string();

        let reply = dispatcher.dispatch(&mut ctx, request);

        assert_eq!(reply.status, Status::InterfaceMismatch);
        assert!(!dispatcher.service().has_paste_data(ctx.caller()));
    }

    #[test]
    fn unknown_code_not_supported() {
        let dispatcher = dispatcher();
        let (mut ctx, _rx) = context(7);
        let mut request = Request::new(RequestCode::HasPasteData);
        request.code = 42;

        assert_eq!(dispatcher.dispatch(&mut ctx, request).status, Status::NotSupported);
    }

    #[test]
    fn set_get_has_clear() {
        let dispatcher = dispatcher();
        let (mut ctx, _rx) = context(7);
        let data = PasteData::html("<b>x</b>");

        let set = Request::new(RequestCode::SetPasteData).with_data(&data).unwrap();
        assert_eq!(dispatcher.dispatch(&mut ctx, set).status, Status::Ok);

        let has = dispatcher.dispatch(&mut ctx, Request::new(RequestCode::HasPasteData));
        assert_eq!(has.has, Some(true));

        let get = dispatcher.dispatch(&mut ctx, Request::new(RequestCode::GetPasteData));
        assert_eq!(get.data, Some(data));

        let clear = dispatcher.dispatch(&mut ctx, Request::new(RequestCode::ClearAll));
        assert_eq!(clear.status, Status::Ok);

        let get = dispatcher.dispatch(&mut ctx, Request::new(RequestCode::GetPasteData));
        assert_eq!(get.status, Status::InvalidValue);
    }

    #[test]
    fn undecodable_data_is_invalid_value() {
        let dispatcher = dispatcher();
        let (mut ctx, _rx) = context(7);
        let mut request = Request::new(RequestCode::SetPasteData);
        request.data = Some(json!({"records": [{"mime_type": "text/html", "content": 5}]}));

        assert_eq!(dispatcher.dispatch(&mut ctx, request).status, Status::InvalidValue);

        let missing = Request::new(RequestCode::SetPasteData);
        assert_eq!(dispatcher.dispatch(&mut ctx, missing).status, Status::InvalidValue);
        assert!(!dispatcher.service().has_paste_data(ctx.caller()));
    }

    #[test]
    fn observer_handle_required() {
        let dispatcher = dispatcher();
        let (mut ctx, _rx) = context(7);

        let add = dispatcher.dispatch(&mut ctx, Request::new(RequestCode::AddObserver));
        assert_eq!(add.status, Status::InvalidValue);

        let remove = Request::new(RequestCode::RemoveObserver).with_observer(ObserverId::nil());
        assert_eq!(dispatcher.dispatch(&mut ctx, remove).status, Status::InvalidValue);

        let remove_all = Request::new(RequestCode::RemoveAllObservers);
        assert_eq!(dispatcher.dispatch(&mut ctx, remove_all).status, Status::Ok);
    }

    #[tokio::test]
    async fn observer_receives_changed_event() {
        let dispatcher = dispatcher();
        let (mut ctx, mut rx) = context(7);
        let id = ObserverId::new();

        let add = Request::new(RequestCode::AddObserver).with_observer(id);
        assert_eq!(dispatcher.dispatch(&mut ctx, add).status, Status::Ok);
        assert_eq!(ctx.subscriptions(), &[id]);

        let set = Request::new(RequestCode::SetPasteData)
            .with_data(&PasteData::plain_text("hi"))
            .unwrap();
        dispatcher.dispatch(&mut ctx, set);

        let frame = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(frame, Some(ServerFrame::Event(ServerEvent::Changed)));
    }

    #[test]
    fn release_drops_connection_observers() {
        let dispatcher = dispatcher();
        let (mut ctx, _rx) = context(7);
        let add = Request::new(RequestCode::AddObserver).with_observer(ObserverId::new());
        dispatcher.dispatch(&mut ctx, add);
        assert_eq!(dispatcher.service().observer_count(ctx.caller()), 1);

        dispatcher.release(&mut ctx);

        assert_eq!(dispatcher.service().observer_count(ctx.caller()), 0);
        assert!(ctx.subscriptions().is_empty());
    }

    #[test]
    fn observer_id_belongs_to_first_connection() {
        let dispatcher = dispatcher();
        let (mut first, _rx1) = context(7);
        let (mut second, _rx2) = context(7);
        let id = ObserverId::new();
        let add = Request::new(RequestCode::AddObserver).with_observer(id);

        assert_eq!(dispatcher.dispatch(&mut first, add.clone()).status, Status::Ok);
        assert_eq!(dispatcher.dispatch(&mut first, add.clone()).status, Status::Ok);
        assert_eq!(
            dispatcher.dispatch(&mut second, add.clone()).status,
            Status::InvalidValue
        );
        assert!(second.subscriptions().is_empty());

        dispatcher.release(&mut second);
        assert_eq!(dispatcher.service().observer_count(first.caller()), 1);

        dispatcher.release(&mut first);
        assert_eq!(dispatcher.service().observer_count(first.caller()), 0);
        assert_eq!(dispatcher.dispatch(&mut second, add).status, Status::Ok);
        assert_eq!(second.subscriptions(), &[id]);
    }

    #[tokio::test]
    async fn unread_connection_does_not_stall_notifications() {
        let dispatcher = dispatcher();
        let (mut ctx, mut rx) = context(7);
        let add = Request::new(RequestCode::AddObserver).with_observer(ObserverId::new());
        dispatcher.dispatch(&mut ctx, add);

        for i in 0..200 {
            let set = Request::new(RequestCode::SetPasteData)
                .with_data(&PasteData::plain_text(format!("v{i}")))
                .unwrap();
            assert_eq!(dispatcher.dispatch(&mut ctx, set).status, Status::Ok);
        }

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let mut queued = 0;
        while let Ok(frame) = rx.try_recv() {
            assert_eq!(frame, ServerFrame::Event(ServerEvent::Changed));
            queued += 1;
        }
        assert_eq!(queued, OUTBOUND_CAPACITY);

        // nothing is left waiting to refill the queue
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(dispatcher.service().observer_count(ctx.caller()), 1);
    }

    #[tokio::test]
    async fn full_queue_coalesces_instead_of_waiting() {
        let (tx, _rx) = mpsc::channel(1);
        let observer = RemoteObserver {
            id: ObserverId::new(),
            outbound: tx,
        };

        for _ in 0..3 {
            let sent = tokio::time::timeout(
                std::time::Duration::from_secs(1),
                observer.on_changed(),
            )
            .await
            .expect("delivery waited on a full queue");
            assert_eq!(sent, Ok(()));
        }
    }

    #[tokio::test]
    async fn closed_connection_reports_disconnected() {
        let (tx, rx) = mpsc::channel(1);
        let observer = RemoteObserver {
            id: ObserverId::new(),
            outbound: tx,
        };
        drop(rx);

        assert_eq!(observer.on_changed().await, Err(ObserverError::Disconnected));
    }

    #[test]
    fn dump_statuses() {
        let dispatcher = dispatcher();
        let (mut denied, _rx) = context(20_000);
        let request = Request::new(RequestCode::Dump).with_args(vec!["--data".to_string()]);
        assert_eq!(
            dispatcher.dispatch(&mut denied, request.clone()).status,
            Status::PermissionDenied
        );

        let (mut ctx, _rx) = context(1000);
        let reply = dispatcher.dispatch(&mut ctx, request);
        assert_eq!(reply.status, Status::Ok);
        assert!(reply.text.unwrap().contains("No copy data."));

        let bad = Request::new(RequestCode::Dump).with_args(vec!["--nope".to_string()]);
        assert_eq!(dispatcher.dispatch(&mut ctx, bad).status, Status::InvalidOption);
    }
}
