//! Pasteboard CLI entry point

use std::process::ExitCode;

use clap::Parser;

use pasteboard::cli::{
    app::{
        init_logging, load_merged_config, log_directive, EXIT_ERROR, EXIT_SUCCESS,
        EXIT_USAGE_ERROR,
    },
    args::{Cli, Commands},
    client_cmd,
    config_cmd::handle_config_command,
    daemon_app::run_daemon,
    presenter::Presenter,
    DaemonOptions,
};
use pasteboard::client::PasteboardClient;
use pasteboard::domain::config::AppConfig;
use pasteboard::domain::error::ConfigError;
use pasteboard::infrastructure::XdgConfigStore;
use pasteboard::ipc::SocketPath;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let cli_config = AppConfig {
        socket_path: cli.socket.clone(),
        ..Default::default()
    };

    // Merge config: defaults < file < env < cli
    let config = load_merged_config(cli_config).await;
    init_logging(&log_directive(&config, cli.verbose));

    let socket = SocketPath::resolve(config.socket_path.as_deref());
    let client = || PasteboardClient::with_socket(socket.clone());

    let result = match cli.command {
        Commands::Daemon => return run_daemon(DaemonOptions::from_config(&config)).await,
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            return match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::from(EXIT_SUCCESS),
                Err(e @ ConfigError::ValidationError { .. }) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_USAGE_ERROR)
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            };
        }
        Commands::Set(args) => client_cmd::handle_set(&client(), &args, &presenter)
            .await
            .map_err(|e| e.to_string()),
        Commands::Get => client_cmd::handle_get(&client(), &presenter)
            .await
            .map_err(|e| e.to_string()),
        Commands::Has => client_cmd::handle_has(&client(), &presenter)
            .await
            .map_err(|e| e.to_string()),
        Commands::Clear => client_cmd::handle_clear(&client(), &presenter)
            .await
            .map_err(|e| e.to_string()),
        Commands::Watch => client_cmd::handle_watch(&client(), &presenter)
            .await
            .map_err(|e| e.to_string()),
        Commands::Dump(args) => client_cmd::handle_dump(&client(), args, &presenter)
            .await
            .map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
