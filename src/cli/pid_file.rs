//! PID file guarding against two daemons on one socket

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use crate::ipc::SocketPath;

/// PID file kept next to the daemon socket
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    /// `<socket>.pid` beside the socket file
    pub fn for_socket(socket: &SocketPath) -> Self {
        Self::with_path(socket.path().with_extension("pid"))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// PID of a live daemon holding this file. A stale file is removed.
    pub fn is_running(&self) -> Option<u32> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let pid: u32 = contents.trim().parse().ok()?;

        match kill(Pid::from_raw(pid as i32), None) {
            Ok(()) => Some(pid),
            // Alive but owned by someone else
            Err(Errno::EPERM) => Some(pid),
            Err(_) => {
                let _ = fs::remove_file(&self.path);
                None
            }
        }
    }

    /// Acquire the PID file (fails if another daemon is running)
    pub fn acquire(&mut self) -> Result<(), PidFileError> {
        if let Some(pid) = self.is_running() {
            return Err(PidFileError::AlreadyRunning(pid));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PidFileError::WriteFailed(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(&self.path, process::id().to_string())
            .map_err(|e| PidFileError::WriteFailed(format!("{}: {}", self.path.display(), e)))?;
        self.owned = true;
        Ok(())
    }

    /// Release the PID file
    pub fn release(&mut self) -> Result<(), PidFileError> {
        if self.owned && self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| PidFileError::RemoveFailed(format!("{}: {}", self.path.display(), e)))?;
        }
        self.owned = false;
        Ok(())
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// PID file errors
#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another daemon is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lives_beside_socket() {
        let pid_file = PidFile::for_socket(&SocketPath::with_path("/run/user/1/pasteboard.sock"));
        assert_eq!(pid_file.path(), Path::new("/run/user/1/pasteboard.pid"));
    }

    #[test]
    fn is_running_returns_none_for_nonexistent_file() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = PidFile::with_path(dir.path().join("nonexistent.pid"));
        assert!(pid_file.is_running().is_none());
    }

    #[test]
    fn acquire_blocks_second_holder_and_release_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pb.pid");
        let mut first = PidFile::with_path(&path);
        first.acquire().unwrap();

        let mut second = PidFile::with_path(&path);
        assert!(matches!(
            second.acquire(),
            Err(PidFileError::AlreadyRunning(pid)) if pid == process::id()
        ));

        drop(second);
        assert!(path.exists());
        first.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn stale_file_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pb.pid");
        fs::write(&path, "999999999").unwrap();

        let mut pid_file = PidFile::with_path(&path);
        assert!(pid_file.is_running().is_none());
        pid_file.acquire().unwrap();
    }
}
