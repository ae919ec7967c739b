//! Plugin contract.
//!
//! The original system probed plugin objects for optional methods at runtime;
//! here every optional behaviour is an explicit capability trait a plugin
//! opts into by overriding the corresponding accessor on [`Plugin`]:
//!
//! - [`MenuContributor`] — the plugin builds its own menu nodes.
//! - [`BackgroundService`] — the plugin reports a liveness flag that the
//!   service monitor mirrors into a status indicator.
//! - [`PeerReceiver`] — the plugin wants the complete set of loaded peers
//!   after composition finishes.
//!
//! A plugin that exposes no menu capability is treated as a background
//! service, matching the original's classification rule.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ShellError;
use crate::shell::{Container, ContainerRef, WindowRef};

/// Boxed error returned by plugin factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Complete mapping of plugin name to instance, broadcast to peer receivers.
pub type PluginMap = HashMap<String, Arc<dyn Plugin>>;

/// A loaded plugin instance.
pub trait Plugin: Send + Sync {
    /// The concrete type name of this plugin. The registry is keyed by this
    /// value, so two import paths yielding the same type collapse to one
    /// instance.
    fn name(&self) -> &str;

    /// Menu-contribution capability, if the plugin has one.
    fn menu(&self) -> Option<&dyn MenuContributor> {
        None
    }

    /// Background-service capability, if the plugin has one.
    fn service(&self) -> Option<&dyn BackgroundService> {
        None
    }

    /// Peer-reception capability, if the plugin has one.
    fn peers(&self) -> Option<&dyn PeerReceiver> {
        None
    }
}

/// A plugin that contributes nodes to the menu it was configured under.
pub trait MenuContributor: Send + Sync {
    /// Adds zero or more nodes to `target`. Called once during composition.
    fn build_menu(&self, target: &dyn Container) -> Result<(), ShellError>;
}

/// A plugin doing monitored background work.
pub trait BackgroundService: Send + Sync {
    /// The liveness flag polled by the service monitor.
    fn is_running(&self) -> bool;
}

/// A plugin interested in its peer instances.
pub trait PeerReceiver: Send + Sync {
    /// Receives the final, complete plugin map — exactly once, after the
    /// whole tree is composed.
    fn receive_peers(&self, peers: &PluginMap);
}

/// What the engine hands to a plugin factory: the host shell's root container
/// and root window, so the plugin can register its own UI if it wants.
#[derive(Clone)]
pub struct PluginContext {
    pub root: ContainerRef,
    pub window: WindowRef,
}

/// Factory function resolving an import path to a live plugin instance.
pub type PluginFactory = fn(&PluginContext) -> Result<Arc<dyn Plugin>, BoxError>;

/// Capabilities detected on a resolved instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The instance contributes menu nodes.
    pub menu: bool,
    /// The instance is monitored as a background service.
    pub service: bool,
    /// The instance receives the peer map after composition.
    pub peers: bool,
}

impl Capabilities {
    /// A resolved instance is a menu contributor if it exposes the menu
    /// capability; otherwise it is treated as a background service.
    pub fn detect(plugin: &dyn Plugin) -> Self {
        let menu = plugin.menu().is_some();
        Self {
            menu,
            service: !menu,
            peers: plugin.peers().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MenuOnly;

    impl Plugin for MenuOnly {
        fn name(&self) -> &str {
            "MenuOnly"
        }

        fn menu(&self) -> Option<&dyn MenuContributor> {
            Some(self)
        }
    }

    impl MenuContributor for MenuOnly {
        fn build_menu(&self, _target: &dyn Container) -> Result<(), ShellError> {
            Ok(())
        }
    }

    struct Bare;

    impl Plugin for Bare {
        fn name(&self) -> &str {
            "Bare"
        }
    }

    #[test]
    fn menu_capability_excludes_service() {
        let caps = Capabilities::detect(&MenuOnly);
        assert!(caps.menu);
        assert!(!caps.service);
        assert!(!caps.peers);
    }

    #[test]
    fn plugin_without_menu_is_a_service() {
        let caps = Capabilities::detect(&Bare);
        assert!(!caps.menu);
        assert!(caps.service);
    }
}
