//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::TrayConfig;
use std::collections::HashSet;

/// Validates the entire configuration.
pub fn validate_config(config: &TrayConfig) -> ConfigResult<()> {
    validate_monitor_config(config)?;
    validate_menu_config(config)?;
    Ok(())
}

/// Validates service monitor settings.
fn validate_monitor_config(config: &TrayConfig) -> ConfigResult<()> {
    if config.monitor.poll_interval_secs == 0 {
        return Err(ConfigError::validation(
            "Monitor poll interval must be greater than 0",
        ));
    }
    Ok(())
}

/// Validates menu composition settings.
///
/// Only structural properties of the record list are checked here; individual
/// records are validated during composition, where a bad record is skipped
/// rather than rejected up front.
fn validate_menu_config(config: &TrayConfig) -> ConfigResult<()> {
    let mut seen_paths = HashSet::new();

    for record in &config.menu.items {
        let Some(record) = record.as_object() else {
            continue;
        };
        if record.get("type").and_then(|t| t.as_str()) != Some("module") {
            continue;
        }
        if let Some(path) = record.get("import_path").and_then(|p| p.as_str())
            && !path.is_empty()
            && !seen_paths.insert(path.to_string())
        {
            return Err(ConfigError::DuplicateModulePath(path.to_string()));
        }
    }
    Ok(())
}
