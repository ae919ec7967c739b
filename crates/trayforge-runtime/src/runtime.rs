//! Main runtime orchestration.
//!
//! The runtime ties the pieces together: it loads configuration, composes the
//! menu against the host shell, starts the service monitor when background
//! services exist, and waits for a shutdown signal before stopping the
//! monitor cooperatively.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use trayforge_runtime::TrayRuntime;
//!
//! // Simplest way - auto-loads config from current directory
//! let mut runtime = TrayRuntime::new(shell, catalog);
//! runtime.run().await?;
//!
//! // Custom configuration path
//! let mut runtime = TrayRuntime::builder(shell, catalog)
//!     .config_file("config/trayforge.toml")
//!     .build()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{debug, info, warn};

use trayforge_core::{HostShell, ScriptRunner, parse_items};

use crate::catalog::PluginCatalog;
use crate::compose::{Composer, Composition, ErrorRecord};
use crate::config::{ConfigLoader, ConfigResult, TrayConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::monitor::{MonitorHandle, ServiceMonitor};

/// The main Trayforge runtime.
///
/// # Simple Usage
///
/// ```rust,ignore
/// use trayforge_runtime::TrayRuntime;
///
/// // Auto-loads config from trayforge.toml in current directory
/// let mut runtime = TrayRuntime::new(shell, catalog);
///
/// // Compose, monitor, and wait for Ctrl+C
/// runtime.run().await?;
/// ```
pub struct TrayRuntime {
    /// The configuration.
    config: TrayConfig,
    /// The host shell the menu is composed against.
    shell: Arc<dyn HostShell>,
    /// Available plugin factories.
    catalog: PluginCatalog,
    /// Script runner override for action payloads.
    runner: Option<Arc<dyn ScriptRunner>>,
    /// The finished composition, retained after `compose`.
    composition: Option<Composition>,
    /// Handle to the running service monitor, if started.
    monitor: Option<MonitorHandle>,
}

impl TrayRuntime {
    /// Creates a new runtime with automatic configuration loading.
    ///
    /// This will:
    /// 1. Search for `trayforge.toml` / `trayforge.yaml` in the current directory
    /// 2. Initialize logging based on the configuration
    ///
    /// If no configuration file is found, default settings are used.
    pub fn new(shell: Arc<dyn HostShell>, catalog: PluginCatalog) -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                TrayConfig::default()
            });

        Self::from_config(&config, shell, catalog)
    }

    /// Creates a runtime builder for custom configuration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let mut runtime = TrayRuntime::builder(shell, catalog)
    ///     .config_file("config/trayforge.toml")
    ///     .profile("production")
    ///     .build()?;
    /// ```
    pub fn builder(shell: Arc<dyn HostShell>, catalog: PluginCatalog) -> RuntimeBuilder {
        RuntimeBuilder::new(shell, catalog)
    }

    /// Creates a new runtime from configuration.
    ///
    /// This initializes logging based on the configuration.
    pub fn from_config(
        config: &TrayConfig,
        shell: Arc<dyn HostShell>,
        catalog: PluginCatalog,
    ) -> Self {
        // Initialize logging from config (try_init won't panic if already initialized)
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            poll_interval_secs = config.monitor.poll_interval_secs,
            items = config.menu.items.len(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            shell,
            catalog,
            runner: None,
            composition: None,
            monitor: None,
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    /// Overrides the script runner used for action payloads.
    pub fn script_runner(mut self, runner: Arc<dyn ScriptRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Composes the configured menu items against the host shell's root and
    /// retains the result.
    ///
    /// Composing twice keeps the first composition; the menu is built once
    /// per process.
    pub fn compose(&mut self) {
        if self.composition.is_some() {
            warn!("Menu already composed, keeping the existing composition");
            return;
        }

        let items = parse_items(&self.config.menu.items);
        let mut composer = Composer::new(self.shell.clone(), self.catalog.clone());
        if let Some(runner) = self.runner.clone() {
            composer = composer.with_runner(runner);
        }
        let root = self.shell.root();
        composer.compose(&items, &root);
        self.composition = Some(composer.finish());
    }

    /// The finished composition, if `compose` has run.
    pub fn composition(&self) -> Option<&Composition> {
        self.composition.as_ref()
    }

    /// Composition failures recorded so far. Empty before `compose`.
    pub fn errors(&self) -> &[ErrorRecord] {
        self.composition
            .as_ref()
            .map_or(&[], |composition| composition.errors())
    }

    /// Starts the service monitor for the composed menu.
    ///
    /// A composition without background services needs no monitor; the call
    /// then does nothing.
    pub fn start_monitor(&mut self) -> RuntimeResult<()> {
        let composition = self.composition.as_ref().ok_or(RuntimeError::NotComposed)?;

        if self.monitor.is_some() {
            warn!("Service monitor is already running");
            return Ok(());
        }
        if composition.service_entries.is_empty() {
            debug!("No background services, monitor not started");
            return Ok(());
        }

        let monitor = ServiceMonitor::new(
            composition.service_entries.clone(),
            composition.registry.clone(),
        )
        .with_period(Duration::from_secs(self.config.monitor.poll_interval_secs));
        self.monitor = Some(monitor.start());
        Ok(())
    }

    /// Whether the service monitor is currently running.
    pub fn monitor_running(&self) -> bool {
        self.monitor.is_some()
    }

    /// Stops the service monitor and waits for the in-flight cycle to finish.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.monitor.take() {
            handle.stopped().await;
            info!("Service monitor stopped");
        }
    }

    /// Runs the runtime until a shutdown signal is received.
    ///
    /// Composes the menu (unless already composed), starts the monitor, waits
    /// for Ctrl+C or SIGTERM, then stops cooperatively.
    pub async fn run(&mut self) -> RuntimeResult<()> {
        self.compose();
        self.start_monitor()?;

        info!("Trayforge runtime is now running. Press Ctrl+C to stop.");
        Self::wait_for_shutdown().await;

        self.stop().await;
        Ok(())
    }

    /// Runs the runtime with a custom shutdown future.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.compose();
        self.start_monitor()?;

        shutdown.await;

        self.stop().await;
        Ok(())
    }

    /// Waits for shutdown signals (Ctrl+C or SIGTERM).
    async fn wait_for_shutdown() {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");

            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
            info!("Received Ctrl+C, shutting down");
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `TrayRuntime` with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// let mut runtime = TrayRuntime::builder(shell, catalog)
///     .config_file("config/trayforge.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    shell: Arc<dyn HostShell>,
    catalog: PluginCatalog,
    runner: Option<Arc<dyn ScriptRunner>>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new(shell: Arc<dyn HostShell>, catalog: PluginCatalog) -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            shell,
            catalog,
            runner: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: TrayConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides the script runner used for action payloads.
    pub fn script_runner(mut self, runner: Arc<dyn ScriptRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<TrayRuntime> {
        let config = self.config_loader.load()?;
        let mut runtime = TrayRuntime::from_config(&config, self.shell, self.catalog);
        runtime.runner = self.runner;
        Ok(runtime)
    }
}
