//! Configuration module for the Trayforge runtime.
//!
//! This module provides layered configuration loading (files, environment,
//! programmatic overrides) and validation for menu composition, the service
//! monitor, and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, MenuConfig, MonitorConfig, SpanEventConfig,
    TrayConfig,
};
pub use validation::validate_config;
