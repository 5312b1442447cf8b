//! Unix Domain Socket transport

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::dispatcher::{CallContext, RequestDispatcher, OUTBOUND_CAPACITY};
use super::protocol::{
    read_frame, write_frame, ProtocolError, Reply, Request, ServerEvent, ServerFrame, Status,
};
use super::{IpcClient, IpcServer};
use crate::application::ports::{PublishError, ServicePublisher};
use crate::domain::session::Caller;

const SOCKET_NAME: &str = "pasteboard.sock";

/// Socket path resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join(SOCKET_NAME))
            .unwrap_or_else(|_| std::env::temp_dir().join(SOCKET_NAME));
        Self { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Configured path if any, else the runtime-dir default
    pub fn resolve(configured: Option<&str>) -> Self {
        configured.map_or_else(Self::new, Self::with_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Serves the pasteboard protocol on a Unix socket
pub struct UnixSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl UnixSocketServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    fn setup_error(&self, message: impl Into<String>) -> PublishError {
        PublishError::Setup {
            endpoint: self.endpoint(),
            message: message.into(),
        }
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.cleanup();
        }
    }
}

impl ServicePublisher for UnixSocketServer {
    fn publish(&mut self) -> Result<(), PublishError> {
        if let Some(parent) = self.socket_path.path().parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.setup_error(e.to_string()))?;
        }
        // Stale socket from a previous run
        self.socket_path
            .cleanup()
            .map_err(|e| self.setup_error(e.to_string()))?;

        let listener =
            UnixListener::bind(self.socket_path.path()).map_err(|source| PublishError::Bind {
                endpoint: self.endpoint(),
                source,
            })?;

        // Every local user talks to the same daemon; sessions are split by uid
        std::fs::set_permissions(self.socket_path.path(), std::fs::Permissions::from_mode(0o666))
            .map_err(|e| self.setup_error(e.to_string()))?;

        self.listener = Some(listener);
        Ok(())
    }

    fn endpoint(&self) -> String {
        self.socket_path.path().to_string_lossy().to_string()
    }
}

#[async_trait]
impl IpcServer for UnixSocketServer {
    async fn run(&self, dispatcher: Arc<RequestDispatcher>) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let dispatcher = Arc::clone(&dispatcher);
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, dispatcher).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    warn!(error = %e, "socket accept error");
                }
            }
        }
    }

    fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

/// Serve one client until it disconnects or presents the wrong token
async fn serve_connection(
    stream: UnixStream,
    dispatcher: Arc<RequestDispatcher>,
) -> Result<(), ProtocolError> {
    let cred = stream.peer_cred()?;
    let caller = Caller::new(cred.uid(), cred.pid());
    debug!(uid = caller.uid, pid = ?caller.pid, "client connected");

    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer_task = tokio::spawn(write_loop(writer, rx));

    let mut ctx = CallContext::new(caller, tx.clone());
    let mut reader = BufReader::new(reader);

    let result = loop {
        let reply = match read_frame(&mut reader).await {
            Ok(Some(line)) => match serde_json::from_str::<Request>(&line) {
                Ok(request) => dispatcher.dispatch(&mut ctx, request),
                Err(e) => {
                    debug!(error = %e, "undecodable request");
                    Reply::status(Status::InvalidValue)
                }
            },
            Ok(None) => break Ok(()),
            Err(ProtocolError::NotUtf8) => {
                debug!("request is not UTF-8");
                Reply::status(Status::InvalidValue)
            }
            Err(e) => {
                if matches!(e, ProtocolError::FrameTooLong) {
                    let _ = tx
                        .send(ServerFrame::Reply(Reply::status(Status::InvalidValue)))
                        .await;
                }
                break Err(e);
            }
        };
        let close = reply.status == Status::InterfaceMismatch;

        if tx.send(ServerFrame::Reply(reply)).await.is_err() || close {
            break Ok(());
        }
    };

    dispatcher.release(&mut ctx);
    drop(ctx);
    drop(tx);
    let _ = writer_task.await;
    debug!(uid = caller.uid, "client disconnected");
    result
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<ServerFrame>,
) -> Result<(), ProtocolError> {
    while let Some(frame) = rx.recv().await {
        write_frame(&mut writer, &frame).await?;
    }
    Ok(())
}

/// Client side of one socket connection
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    pub fn new(stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn next_frame(&mut self) -> Result<ServerFrame, ProtocolError> {
        let line = read_frame(&mut self.reader)
            .await?
            .ok_or(ProtocolError::ConnectionClosed)?;
        Ok(serde_json::from_str(&line)?)
    }

    /// Send a request and wait for its reply. Events arriving meanwhile
    /// are skipped.
    pub async fn call(&mut self, request: &Request) -> Result<Reply, ProtocolError> {
        write_frame(&mut self.writer, request).await?;
        loop {
            if let ServerFrame::Reply(reply) = self.next_frame().await? {
                return Ok(reply);
            }
        }
    }

    /// Wait for the next pushed event
    pub async fn next_event(&mut self) -> Result<ServerEvent, ProtocolError> {
        loop {
            if let ServerFrame::Event(event) = self.next_frame().await? {
                return Ok(event);
            }
        }
    }
}

/// Opens connections to the daemon socket
pub struct UnixSocketClient {
    socket_path: SocketPath,
}

impl UnixSocketClient {
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }
}

#[async_trait]
impl IpcClient for UnixSocketClient {
    fn is_service_running(&self) -> bool {
        self.socket_path.exists()
    }

    async fn connect(&self) -> io::Result<Connection> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        Ok(Connection::new(stream))
    }

    fn endpoint(&self) -> String {
        self.socket_path.path().to_string_lossy().to_string()
    }
}
