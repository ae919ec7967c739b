//! Host shell abstraction.
//!
//! The composition engine never touches a real widget toolkit. It manipulates
//! abstract containers through the traits below; the embedding application
//! supplies an implementation backed by its actual tray menu (or uses
//! [`MemoryShell`](crate::memory::MemoryShell) for headless operation).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ShellError;
use crate::payload::Invocable;

/// Shared handle to a menu container.
pub type ContainerRef = Arc<dyn Container>;

/// Shared handle to a status indicator slot.
pub type IndicatorRef = Arc<dyn Indicator>;

/// Opaque reference to the host's root window, passed through to plugins.
pub type WindowRef = Arc<dyn Any + Send + Sync>;

/// A leaf menu entry bound to a deferred, side-effecting payload.
#[derive(Clone)]
pub struct ActionNode {
    pub title: String,
    pub tooltip: Option<String>,
    pub payload: Arc<dyn Invocable>,
}

impl fmt::Debug for ActionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionNode")
            .field("title", &self.title)
            .field("tooltip", &self.tooltip)
            .finish_non_exhaustive()
    }
}

/// Displayed state of a background service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// The plugin reports active background work.
    Running,
    /// The plugin is loaded but its background work is paused.
    Idle,
    /// The plugin is unreachable or exposes no liveness flag.
    Failed,
}

/// A displayable status marker owned by the shell.
///
/// Only the service monitor ever calls [`set_state`](Indicator::set_state),
/// so implementations need no synchronization beyond what their widget
/// toolkit requires.
pub trait Indicator: Send + Sync {
    fn set_state(&self, state: ServiceState);
}

/// An abstract menu container able to accept child nodes.
pub trait Container: Send + Sync {
    /// Appends a leaf action.
    fn add_action(&self, action: ActionNode) -> Result<(), ShellError>;

    /// Appends a separating node.
    fn add_separator(&self) -> Result<(), ShellError>;

    /// Creates a sub-container tagged as a submenu, attaches it to this
    /// container, and returns it for further composition.
    fn add_submenu(&self, title: &str) -> Result<ContainerRef, ShellError>;

    /// Appends a labelled status indicator slot.
    fn add_indicator(&self, label: &str) -> Result<IndicatorRef, ShellError>;

    /// Attaches a container previously created detached via
    /// [`HostShell::create_menu`].
    fn attach_menu(&self, menu: ContainerRef) -> Result<(), ShellError>;

    /// Upcast for shell implementations that need to recover their concrete
    /// container type (e.g. in [`attach_menu`](Container::attach_menu)).
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// The host application's side of the contract.
pub trait HostShell: Send + Sync {
    /// The top-level container all configured items are composed into.
    fn root(&self) -> ContainerRef;

    /// The root window reference handed to plugin factories.
    fn window(&self) -> WindowRef;

    /// Creates a detached menu container; the engine attaches it later via
    /// [`Container::attach_menu`].
    fn create_menu(&self, title: &str) -> ContainerRef;

    /// Asks the host to terminate the process and hide any visible indicator.
    /// Bound to the Exit action the engine appends after all configured items.
    fn request_exit(&self);
}
