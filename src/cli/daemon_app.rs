//! Daemon app runner

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use crate::application::ports::{IdentityResolver, ServicePublisher, Telemetry};
use crate::application::{PasteboardService, ServiceLifecycle, ServiceOptions};
use crate::domain::session::{Caller, SessionKey};
use crate::infrastructure::{TracingTelemetry, UnixIdentityResolver};
use crate::ipc::{create_ipc_server, spawn_server, IpcServer, RequestDispatcher};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::args::DaemonOptions;
use super::pid_file::{PidFile, PidFileError};
use super::presenter::Presenter;
use super::signals::DaemonSignalHandler;

/// Run the pasteboard service until SIGINT/SIGTERM
pub async fn run_daemon(options: DaemonOptions) -> ExitCode {
    let presenter = Presenter::new();

    let mut pid_file = PidFile::for_socket(&options.socket);
    if let Err(e) = pid_file.acquire() {
        match e {
            PidFileError::AlreadyRunning(pid) => {
                presenter.error(&format!("Another daemon is already running (PID: {})", pid));
            }
            _ => presenter.error(&e.to_string()),
        }
        return ExitCode::from(EXIT_ERROR);
    }

    let mut signals = match DaemonSignalHandler::new() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let own = Caller::current();
    let identity = Arc::new(UnixIdentityResolver::new(options.uids_per_session));
    let telemetry: Arc<dyn Telemetry> = Arc::new(TracingTelemetry::new());
    let own_session = identity
        .session_key(&own)
        .unwrap_or_else(|| SessionKey::new(own.uid / options.uids_per_session.max(1)));

    let service = Arc::new(PasteboardService::new(
        identity,
        Arc::clone(&telemetry),
        ServiceOptions {
            history_size: options.history_size,
            dump_uid_threshold: options.dump_uid_threshold,
            own_uid: own.uid,
        },
    ));
    let mut lifecycle = ServiceLifecycle::new(options.retry, telemetry, own_session);
    let mut server = create_ipc_server(options.socket.clone());

    // Publication may keep retrying; stay responsive to signals meanwhile
    let started = tokio::select! {
        result = lifecycle.start(server.as_mut()) => result,
        signal = signals.recv() => {
            info!(signal = ?signal, "stopped before the service came up");
            presenter.daemon_status("Stopped");
            return ExitCode::from(EXIT_SUCCESS);
        }
    };
    if let Err(e) = started {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let server: Arc<dyn IpcServer> = Arc::from(server);
    let dispatcher = Arc::new(RequestDispatcher::new(service));
    let mut server_task = spawn_server(Arc::clone(&server), dispatcher);

    presenter.daemon_status("Running");
    presenter.info(&format!(
        "PID: {} | Socket: {} | SIGINT/SIGTERM: exit",
        std::process::id(),
        server.endpoint()
    ));

    let clean = tokio::select! {
        signal = signals.recv() => {
            info!(signal = signal.map(|s| s.name()), "shutting down");
            true
        }
        result = &mut server_task => {
            error!(?result, "server stopped unexpectedly");
            false
        }
    };

    server_task.abort();
    lifecycle.stop();
    server.cleanup();
    let _ = pid_file.release();
    presenter.daemon_status("Stopped");

    if clean {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}
