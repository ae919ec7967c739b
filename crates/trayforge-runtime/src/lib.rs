//! Trayforge Runtime - Orchestration layer for the Trayforge composition engine.
//!
//! This crate provides:
//! - Plugin catalog and registry (`PluginCatalog`, `PluginRegistry`)
//! - Configuration-driven menu composition (`Composer`, `Composition`)
//! - Background-service liveness monitoring (`ServiceMonitor`)
//! - Runtime orchestration (`TrayRuntime`)
//! - Configuration loading and logging setup
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use trayforge_runtime::{PluginCatalog, TrayRuntime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shell = build_host_shell();
//!     let catalog = PluginCatalog::new()
//!         .with("services.clock", clock_factory);
//!
//!     // Auto-loads trayforge.toml, composes the menu, starts the monitor,
//!     // and runs until Ctrl+C
//!     let mut runtime = TrayRuntime::new(shell, catalog);
//!     runtime.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Composition Without the Runtime
//!
//! The composer can be driven directly when the embedding application owns
//! its own lifecycle:
//!
//! ```ignore
//! use trayforge_core::parse_items;
//! use trayforge_runtime::Composer;
//!
//! let items = parse_items(&records);
//! let mut composer = Composer::new(shell.clone(), catalog);
//! let root = shell.root();
//! composer.compose(&items, &root);
//! let composition = composer.finish();
//! ```

pub mod catalog;
pub mod compose;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod registry;
pub mod runtime;

// Re-exports
pub use catalog::PluginCatalog;
pub use compose::{ComposeError, Composer, Composition, ErrorRecord};
pub use config::{ConfigError, ConfigLoader, ConfigResult, TrayConfig, load_config};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use monitor::{MonitorHandle, ServiceEntry, ServiceMonitor};
pub use registry::{PluginInstance, PluginRegistry, ResolveError};
pub use runtime::{RuntimeBuilder, TrayRuntime};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
