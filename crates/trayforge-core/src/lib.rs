//! # Trayforge Core
//!
//! Foundation layer of the Trayforge tray-menu composition engine.
//!
//! This crate defines the abstractions the runtime composes against; it has
//! no opinion about widget toolkits, configuration formats, or task runtimes.
//!
//! ## Architecture Layers
//!
//! - **Descriptor model**: typed, immutable menu item records parsed from
//!   configuration ([`ItemDescriptor`], [`parse_items`])
//! - **Plugin contract**: the base [`Plugin`] trait plus explicit capability
//!   traits ([`MenuContributor`], [`BackgroundService`], [`PeerReceiver`])
//! - **Host shell seam**: abstract containers, actions, and indicators the
//!   embedding application renders ([`HostShell`], [`Container`],
//!   [`Indicator`])
//! - **Payloads**: opaque deferred invocations bound to actions
//!   ([`Invocable`], [`ScriptPayload`], [`FilePayload`])
//! - **Memory shell**: a recording implementation for tests and headless
//!   embedders ([`MemoryShell`])
//!
//! ## Data flow
//!
//! ```text
//! configuration records ──▶ ItemDescriptor ──▶ composition (runtime crate)
//!                                                   │
//!                       HostShell / Container ◀─────┘──▶ Plugin instances
//! ```

pub mod descriptor;
pub mod error;
pub mod memory;
pub mod payload;
pub mod plugin;
pub mod shell;

pub use descriptor::{ItemDescriptor, SourceType, parse_items};
pub use error::{InvocationError, ShellError};
pub use memory::{MemoryContainer, MemoryIndicator, MemoryNode, MemoryShell};
pub use payload::{
    CallbackPayload, FilePayload, Invocable, ProcessRunner, ScriptPayload, ScriptRunner,
    expand_env_segments,
};
pub use plugin::{
    BackgroundService, BoxError, Capabilities, MenuContributor, PeerReceiver, Plugin,
    PluginContext, PluginFactory, PluginMap,
};
pub use shell::{
    ActionNode, Container, ContainerRef, HostShell, Indicator, IndicatorRef, ServiceState,
    WindowRef,
};
