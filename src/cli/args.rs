//! CLI argument definitions using Clap

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};

use crate::application::RetryPolicy;
use crate::domain::config::AppConfig;
use crate::domain::paste::{PasteData, Want};
use crate::ipc::SocketPath;

/// Pasteboard - per-user shared clipboard service
#[derive(Parser, Debug)]
#[command(name = "pasteboard")]
#[command(version)]
#[command(about = "Per-user shared clipboard service with change notifications")]
#[command(long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Socket path of the daemon
    #[arg(long, value_name = "PATH", global = true)]
    pub socket: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pasteboard service in the foreground
    Daemon,
    /// Replace the clipboard
    Set(SetArgs),
    /// Print the clipboard, one line per record
    Get,
    /// Print whether the clipboard holds data
    Has,
    /// Clear the clipboard
    Clear,
    /// Print a line for every clipboard change until interrupted
    Watch,
    /// Show service diagnostics
    Dump(DumpArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Payload for `set`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[command(group(ArgGroup::new("payload").required(true).args(["text", "html", "uri", "want"])))]
pub struct SetArgs {
    /// Plain text
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// HTML markup
    #[arg(long, value_name = "HTML")]
    pub html: Option<String>,

    /// URI
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Intent action
    #[arg(long, value_name = "ACTION")]
    pub want: Option<String>,

    /// Intent parameter (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param, requires = "want")]
    pub params: Vec<(String, String)>,
}

impl SetArgs {
    pub fn to_paste_data(&self) -> PasteData {
        if let Some(html) = &self.html {
            return PasteData::html(html.clone());
        }
        if let Some(uri) = &self.uri {
            return PasteData::uri(uri.clone());
        }
        if let Some(action) = &self.want {
            let want = self
                .params
                .iter()
                .fold(Want::new(action.clone()), |want, (k, v)| {
                    want.with_param(k.clone(), v.clone())
                });
            return PasteData::want(want);
        }
        PasteData::plain_text(self.text.clone().unwrap_or_default())
    }
}

/// Sections for `dump`
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
#[command(group(ArgGroup::new("section").required(true).multiple(true).args(["copy_history", "data"])))]
pub struct DumpArgs {
    /// Most recent clipboard accesses
    #[arg(long)]
    pub copy_history: bool,

    /// Stored clipboard of every session
    #[arg(long)]
    pub data: bool,
}

impl DumpArgs {
    pub fn to_wire_args(self) -> Vec<String> {
        let mut args = Vec::new();
        if self.copy_history {
            args.push("--copy-history".to_string());
        }
        if self.data {
            args.push("--data".to_string());
        }
        args
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parsed daemon options
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub socket: SocketPath,
    pub retry: RetryPolicy,
    pub history_size: usize,
    pub dump_uid_threshold: u32,
    pub uids_per_session: u32,
}

impl DaemonOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        let interval = config.init_retry_interval_or_default();
        let retry = match config.init_max_attempts {
            Some(max) if max > 0 => RetryPolicy::bounded(interval, max),
            _ => RetryPolicy::forever(interval),
        };
        Self {
            socket: SocketPath::resolve(config.socket_path.as_deref()),
            retry,
            history_size: config.history_size_or_default(),
            dump_uid_threshold: config.dump_uid_threshold_or_default(),
            uids_per_session: config.uids_per_session_or_default(),
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "socket_path",
    "init_retry_interval",
    "init_max_attempts",
    "history_size",
    "dump_uid_threshold",
    "uids_per_session",
    "log_level",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
