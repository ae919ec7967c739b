//! Plugin registry.
//!
//! The registry owns every resolved plugin instance for the process lifetime.
//! Resolution is idempotent per concrete type name: resolving the same plugin
//! type again — even through a different import path — reuses the existing
//! instance instead of re-instantiating it. The registry is built once during
//! composition and only read afterwards (by peer wiring and the service
//! monitor).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use trayforge_core::{BoxError, Capabilities, Plugin, PluginContext, PluginFactory, PluginMap};

use crate::catalog::PluginCatalog;

/// Errors raised while resolving a module reference. Non-fatal to the overall
/// composition: the composer records them and continues with siblings.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No factory is registered for the import path (or its fromlist keys).
    #[error("No plugin registered for import path '{0}'")]
    UnknownPath(String),

    /// The factory ran but failed to produce an instance.
    #[error("Plugin factory for '{path}' failed: {source}")]
    Init {
        path: String,
        #[source]
        source: BoxError,
    },
}

/// One resolved plugin, as recorded by the registry.
#[derive(Clone)]
pub struct PluginInstance {
    /// Concrete type name, unique within the registry.
    pub name: String,
    /// Capabilities detected on first resolution.
    pub capabilities: Capabilities,
    /// The live instance. The registry keeps it alive; everyone else holds
    /// shared references.
    pub plugin: Arc<dyn Plugin>,
    /// Display label for the services submenu — the configured title, or the
    /// import path when untitled. `None` for menu contributors.
    pub service_title: Option<String>,
    /// Factory that produced the instance; lets repeat resolutions through
    /// the same factory skip re-instantiation entirely.
    factory: PluginFactory,
}

/// Process-lifetime set of resolved plugin instances, in resolution order.
#[derive(Default)]
pub struct PluginRegistry {
    instances: Vec<PluginInstance>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `import_path` to a plugin instance, instantiating at most
    /// once per concrete type name.
    ///
    /// Returns the instance entry plus a flag telling whether it was freshly
    /// instantiated by this call (`false` on reuse).
    pub fn resolve(
        &mut self,
        catalog: &PluginCatalog,
        ctx: &PluginContext,
        import_path: &str,
        from_list: &[String],
        title: Option<&str>,
    ) -> Result<(PluginInstance, bool), ResolveError> {
        let factory = catalog
            .lookup(import_path, from_list)
            .ok_or_else(|| ResolveError::UnknownPath(import_path.to_string()))?;

        // Same factory already resolved: skip instantiation outright.
        if let Some(existing) = self
            .instances
            .iter()
            .find(|instance| std::ptr::fn_addr_eq(instance.factory, factory))
        {
            debug!(plugin = %existing.name, module = import_path, "Reusing resolved plugin");
            return Ok((existing.clone(), false));
        }

        let plugin = factory(ctx).map_err(|source| ResolveError::Init {
            path: import_path.to_string(),
            source,
        })?;
        let name = plugin.name().to_string();

        // Distinct factories can still yield the same concrete type; the
        // registry is keyed by type name, so the first instance wins.
        if let Some(existing) = self.instances.iter().find(|i| i.name == name) {
            debug!(plugin = %name, module = import_path, "Plugin type already registered, reusing");
            return Ok((existing.clone(), false));
        }

        let capabilities = Capabilities::detect(plugin.as_ref());
        let service_title = capabilities
            .service
            .then(|| title.map_or_else(|| import_path.to_string(), str::to_string));

        let instance = PluginInstance {
            name: name.clone(),
            capabilities,
            plugin,
            service_title,
            factory,
        };
        self.instances.push(instance.clone());
        info!(plugin = %name, module = import_path, ?capabilities, "Module imported");
        Ok((instance, true))
    }

    /// Looks up an instance by concrete type name.
    pub fn get(&self, name: &str) -> Option<&PluginInstance> {
        self.instances.iter().find(|i| i.name == name)
    }

    /// All resolved instances, in resolution order.
    pub fn instances(&self) -> &[PluginInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Name → instance mapping, as delivered to peer receivers.
    pub fn plugin_map(&self) -> PluginMap {
        self.instances
            .iter()
            .map(|i| (i.name.clone(), i.plugin.clone()))
            .collect()
    }

    /// Broadcasts the complete plugin map to every instance that declares an
    /// interest in peers. Called exactly once, after composition finishes, so
    /// every receiver sees the final set.
    pub fn wire_peers(&self) {
        let map = self.plugin_map();
        for instance in &self.instances {
            if let Some(receiver) = instance.plugin.peers() {
                debug!(plugin = %instance.name, "Delivering peer module map");
                receiver.receive_peers(&map);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trayforge_core::{HostShell, MemoryShell, PeerReceiver};

    static INSTANTIATIONS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Plugin for Counted {
        fn name(&self) -> &str {
            "Counted"
        }
    }

    fn counted_factory(
        _ctx: &PluginContext,
    ) -> Result<Arc<dyn Plugin>, trayforge_core::BoxError> {
        INSTANTIATIONS.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Counted))
    }

    fn failing_factory(
        _ctx: &PluginContext,
    ) -> Result<Arc<dyn Plugin>, trayforge_core::BoxError> {
        Err("boom".into())
    }

    static PEERS_SEEN: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct PeerSpy;

    impl Plugin for PeerSpy {
        fn name(&self) -> &str {
            "PeerSpy"
        }

        fn peers(&self) -> Option<&dyn PeerReceiver> {
            Some(self)
        }
    }

    impl PeerReceiver for PeerSpy {
        fn receive_peers(&self, peers: &PluginMap) {
            let mut names: Vec<String> = peers.keys().cloned().collect();
            names.sort();
            *PEERS_SEEN.lock() = names;
        }
    }

    fn peer_spy_factory(
        _ctx: &PluginContext,
    ) -> Result<Arc<dyn Plugin>, trayforge_core::BoxError> {
        Ok(Arc::new(PeerSpy))
    }

    fn test_ctx() -> PluginContext {
        let shell = MemoryShell::new();
        PluginContext {
            root: shell.root(),
            window: shell.window(),
        }
    }

    #[test]
    fn two_import_paths_one_instance() {
        INSTANTIATIONS.store(0, Ordering::SeqCst);
        let catalog = PluginCatalog::new()
            .with("pkg.counted", counted_factory)
            .with("alias.counted", counted_factory);
        let ctx = test_ctx();
        let mut registry = PluginRegistry::new();

        let (_, fresh) = registry
            .resolve(&catalog, &ctx, "pkg.counted", &[], None)
            .unwrap();
        assert!(fresh);
        let (_, fresh) = registry
            .resolve(&catalog, &ctx, "alias.counted", &[], None)
            .unwrap();
        assert!(!fresh);

        assert_eq!(registry.len(), 1);
        assert_eq!(INSTANTIATIONS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_path_and_failing_factory_are_import_failures() {
        let catalog = PluginCatalog::new().with("pkg.broken", failing_factory);
        let ctx = test_ctx();
        let mut registry = PluginRegistry::new();

        assert!(matches!(
            registry.resolve(&catalog, &ctx, "pkg.missing", &[], None),
            Err(ResolveError::UnknownPath(_))
        ));
        assert!(matches!(
            registry.resolve(&catalog, &ctx, "pkg.broken", &[], None),
            Err(ResolveError::Init { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn service_title_falls_back_to_import_path() {
        let catalog = PluginCatalog::new().with("pkg.counted", counted_factory);
        let ctx = test_ctx();
        let mut registry = PluginRegistry::new();

        let (instance, _) = registry
            .resolve(&catalog, &ctx, "pkg.counted", &[], None)
            .unwrap();
        assert_eq!(instance.service_title.as_deref(), Some("pkg.counted"));
    }

    #[test]
    fn wire_peers_delivers_complete_map() {
        let catalog = PluginCatalog::new()
            .with("pkg.counted", counted_factory)
            .with("pkg.spy", peer_spy_factory);
        let ctx = test_ctx();
        let mut registry = PluginRegistry::new();

        registry
            .resolve(&catalog, &ctx, "pkg.spy", &[], None)
            .unwrap();
        registry
            .resolve(&catalog, &ctx, "pkg.counted", &[], None)
            .unwrap();
        registry.wire_peers();

        assert_eq!(PEERS_SEEN.lock().as_slice(), ["Counted", "PeerSpy"]);
    }
}
