//! # Trayforge
//!
//! A configuration-driven tray-menu composition engine for Rust.
//!
//! ## Overview
//!
//! Trayforge builds a runtime action menu plus background-monitored plugin
//! modules entirely from a declarative configuration tree. The embedding
//! application supplies a host shell (the thing that renders containers,
//! actions, and indicators) and a catalog of plugin factories; Trayforge
//! interprets typed item descriptors into a live hierarchy, resolves and
//! instantiates plugins once per concrete type, wires them to each other
//! after composition, and keeps a per-service status indicator current
//! through an independent polling loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────┐    ┌───────────────────────────────────┐
//! │ TrayConfig   │───▶│ Composer │───▶│ HostShell (containers / actions / │
//! │ (menu.items) │    │          │    │            indicators)            │
//! └──────────────┘    └────┬─────┘    └───────────────────────────────────┘
//!                          │                            ▲
//!                   PluginRegistry ◀── ServiceMonitor ──┘
//! ```
//!
//! - **Descriptors**: typed records parsed tolerantly from configuration
//! - **Plugins**: capability-based units (`MenuContributor`,
//!   `BackgroundService`, `PeerReceiver`) resolved through a catalog
//! - **Composer**: order-preserving recursive walk, failures recorded
//!   per item and never fatal
//! - **Monitor**: a tokio task reflecting service liveness into indicators
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trayforge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shell = build_host_shell();
//!     let catalog = PluginCatalog::new()
//!         .with("services.clock", clock_factory);
//!
//!     let mut runtime = TrayRuntime::new(shell, catalog);
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use trayforge_core as core;
pub use trayforge_runtime as runtime;

/// Prelude module for convenient imports.
///
/// This module provides all commonly used types for embedding Trayforge:
///
/// ```rust,ignore
/// use trayforge::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use trayforge_runtime::{PluginCatalog, TrayRuntime};

    // Composition - for driving the engine directly
    pub use trayforge_runtime::{Composer, Composition, ErrorRecord};

    // Plugin system - for plugin authors
    pub use trayforge_core::{
        BackgroundService, Capabilities, MenuContributor, PeerReceiver, Plugin, PluginContext,
        PluginFactory, PluginMap,
    };

    // Host shell seam - for shell implementors
    pub use trayforge_core::{
        ActionNode, Container, ContainerRef, HostShell, Indicator, IndicatorRef, ServiceState,
    };

    // Descriptors and payloads
    pub use trayforge_core::{
        CallbackPayload, Invocable, ItemDescriptor, ScriptRunner, SourceType, parse_items,
    };

    // In-memory shell for tests and headless embedding
    pub use trayforge_core::MemoryShell;
}
