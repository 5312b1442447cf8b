//! Wire protocol: newline-delimited JSON frames
//!
//! Requests carry the interface token and a numeric request code. Replies
//! carry a status code plus an optional payload. Subscription connections
//! additionally receive `{"event":"changed"}` pushes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::paste::PasteData;
use crate::domain::session::ObserverId;

/// Token every request must present
pub const INTERFACE_TOKEN: &str = "pasteboard.IPasteboardService";

/// Longest accepted frame, newline excluded
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Operations the service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCode {
    GetPasteData = 0,
    HasPasteData = 1,
    SetPasteData = 2,
    ClearAll = 3,
    AddObserver = 4,
    RemoveObserver = 5,
    RemoveAllObservers = 6,
    Dump = 7,
}

impl RequestCode {
    pub const ALL: [RequestCode; 8] = [
        Self::GetPasteData,
        Self::HasPasteData,
        Self::SetPasteData,
        Self::ClearAll,
        Self::AddObserver,
        Self::RemoveObserver,
        Self::RemoveAllObservers,
        Self::Dump,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Reply status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Status {
    Ok = 0,
    InvalidValue = 1,
    InvalidOption = 2,
    NotSupported = 3,
    InterfaceMismatch = 4,
    PermissionDenied = 5,
}

impl Status {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidOption => "INVALID_OPTION",
            Self::NotSupported => "NOT_SUPPORTED",
            Self::InterfaceMismatch => "INTERFACE_MISMATCH",
            Self::PermissionDenied => "PERMISSION_DENIED",
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == Self::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for Status {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ok),
            1 => Ok(Self::InvalidValue),
            2 => Ok(Self::InvalidOption),
            3 => Ok(Self::NotSupported),
            4 => Ok(Self::InterfaceMismatch),
            5 => Ok(Self::PermissionDenied),
            other => Err(format!("unknown status code {}", other)),
        }
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status as i32
    }
}

/// Inbound call.
///
/// `data` stays raw JSON so a malformed payload is reported to the caller
/// as `INVALID_VALUE` instead of failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub token: String,
    pub code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer: Option<ObserverId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Request {
    pub fn new(code: RequestCode) -> Self {
        Self {
            token: INTERFACE_TOKEN.to_string(),
            code: code.code(),
            data: None,
            observer: None,
            args: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: &PasteData) -> Result<Self, ProtocolError> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    pub fn with_observer(mut self, id: ObserverId) -> Self {
        self.observer = Some(id);
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// Outcome of a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PasteData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Reply {
    pub fn status(status: Status) -> Self {
        Self {
            status,
            data: None,
            has: None,
            text: None,
        }
    }

    pub fn ok() -> Self {
        Self::status(Status::Ok)
    }

    pub fn with_data(mut self, data: PasteData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_has(mut self, has: bool) -> Self {
        self.has = Some(has);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Pushed to subscription connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    Changed,
}

/// Anything the server writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Event(ServerEvent),
    Reply(Reply),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Frame exceeds {} bytes", MAX_FRAME_BYTES)]
    FrameTooLong,

    #[error("Frame is not valid UTF-8")]
    NotUtf8,

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one frame. `Ok(None)` on a clean end of stream.
///
/// A frame that is not UTF-8 is consumed whole before `NotUtf8` is
/// returned, so the stream stays aligned on the next frame.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<String>, ProtocolError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let read = reader
        .take(MAX_FRAME_BYTES as u64 + 1)
        .read_until(b'\n', &mut line)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    if line.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLong);
    }
    String::from_utf8(line)
        .map(Some)
        .map_err(|_| ProtocolError::NotUtf8)
}

/// Serialize `frame` and write it followed by a newline
pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(frame)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}
