//! Shared CLI plumbing: exit codes, config layering and logging

use std::env;

use tracing_subscriber::EnvFilter;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::infrastructure::XdgConfigStore;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Socket path override
pub const ENV_SOCKET: &str = "PASTEBOARD_SOCKET";
/// Log filter override, same syntax as `log_level`
pub const ENV_LOG: &str = "PASTEBOARD_LOG";

/// Config from environment variables
pub fn env_config() -> AppConfig {
    AppConfig {
        socket_path: env::var(ENV_SOCKET).ok().filter(|s| !s.is_empty()),
        log_level: env::var(ENV_LOG).ok().filter(|s| !s.is_empty()),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();

    // Merge: defaults < file < env < cli
    store
        .load_over_defaults()
        .await
        .merge(env_config())
        .merge(cli_config)
}

/// Filter directive for the configured level, raised by `-v` flags
pub fn log_directive(config: &AppConfig, verbose: u8) -> String {
    match verbose {
        0 => config.log_level_or_default().to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global tracing subscriber. Logs go to stderr so stdout
/// stays clean for command output.
pub fn init_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_overrides_configured_level() {
        let config = AppConfig {
            log_level: Some("warn".to_string()),
            ..Default::default()
        };
        assert_eq!(log_directive(&config, 0), "warn");
        assert_eq!(log_directive(&config, 1), "debug");
        assert_eq!(log_directive(&config, 3), "trace");
    }

    #[test]
    fn default_level_is_info() {
        assert_eq!(log_directive(&AppConfig::empty(), 0), "info");
    }
}
