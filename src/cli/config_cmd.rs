//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::duration::Duration;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;
    presenter.output(&read_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        presenter.key_value(
            key,
            &read_value(&config, key).unwrap_or_else(|| NOT_SET.to_string()),
        );
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "socket_path" => config.socket_path.clone(),
        "init_retry_interval" => config.init_retry_interval.clone(),
        "init_max_attempts" => config.init_max_attempts.map(|n| n.to_string()),
        "history_size" => config.history_size.map(|n| n.to_string()),
        "dump_uid_threshold" => config.dump_uid_threshold.map(|n| n.to_string()),
        "uids_per_session" => config.uids_per_session.map(|n| n.to_string()),
        "log_level" => config.log_level.clone(),
        _ => None,
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "socket_path" => {
            if !value.starts_with('/') {
                return Err(invalid("Socket path must be absolute".to_string()));
            }
            config.socket_path = Some(value.to_string());
        }
        "init_retry_interval" => {
            let interval: Duration = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.init_retry_interval = Some(interval.to_string());
        }
        "init_max_attempts" => config.init_max_attempts = Some(parse_number(value, 0, &invalid)?),
        "history_size" => config.history_size = Some(parse_number(value, 1, &invalid)? as usize),
        "dump_uid_threshold" => config.dump_uid_threshold = Some(parse_number(value, 0, &invalid)?),
        "uids_per_session" => config.uids_per_session = Some(parse_number(value, 1, &invalid)?),
        "log_level" => {
            tracing_subscriber::EnvFilter::try_new(value)
                .map_err(|e| invalid(format!("Invalid log filter: {}", e)))?;
            config.log_level = Some(value.to_string());
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn parse_number(
    value: &str,
    min: u32,
    invalid: &dyn Fn(String) -> ConfigError,
) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(n) if n >= min => Ok(n),
        _ => Err(invalid(format!("Value must be an integer >= {}", min))),
    }
}
