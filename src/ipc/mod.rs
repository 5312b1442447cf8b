//! IPC between clients and the pasteboard daemon
//!
//! Newline-delimited JSON over a Unix Domain Socket. The server reads the
//! peer's uid/pid from the socket and hands every frame to the
//! [`RequestDispatcher`].

pub mod dispatcher;
pub mod protocol;
mod unix_socket;

pub use dispatcher::{CallContext, RequestDispatcher};
pub use protocol::{
    ProtocolError, Reply, Request, RequestCode, ServerEvent, Status, INTERFACE_TOKEN,
    MAX_FRAME_BYTES,
};
pub use unix_socket::{Connection, SocketPath, UnixSocketClient, UnixSocketServer};

use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::application::ports::ServicePublisher;

/// Trait for IPC servers that accept client connections
#[async_trait::async_trait]
pub trait IpcServer: ServicePublisher + Sync {
    /// Accept and serve connections until the task is aborted.
    /// Fails if the endpoint was never published.
    async fn run(&self, dispatcher: Arc<RequestDispatcher>) -> io::Result<()>;

    /// Remove the endpoint
    fn cleanup(&self);
}

/// Trait for IPC clients that open connections to the daemon
#[async_trait::async_trait]
pub trait IpcClient: Send + Sync {
    /// Check if the daemon appears to be running (endpoint exists)
    fn is_service_running(&self) -> bool;

    async fn connect(&self) -> io::Result<Connection>;

    fn endpoint(&self) -> String;
}

/// Create the IPC server for `socket`
pub fn create_ipc_server(socket: SocketPath) -> Box<dyn IpcServer> {
    Box::new(UnixSocketServer::new(socket))
}

/// Create the IPC client for `socket`
pub fn create_ipc_client(socket: SocketPath) -> Arc<dyn IpcClient> {
    Arc::new(UnixSocketClient::new(socket))
}

/// Run a published server on its own task
pub fn spawn_server(
    server: Arc<dyn IpcServer>,
    dispatcher: Arc<RequestDispatcher>,
) -> JoinHandle<io::Result<()>> {
    tokio::spawn(async move { server.run(dispatcher).await })
}
