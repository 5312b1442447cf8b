//! Configuration value objects

mod app_config;

pub use app_config::{AppConfig, DEFAULT_DUMP_UID_THRESHOLD, DEFAULT_LOG_LEVEL};
