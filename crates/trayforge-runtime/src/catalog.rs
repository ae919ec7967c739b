//! Plugin catalog.
//!
//! The original system imported modules dynamically by dotted path. Here the
//! embedding application registers each available plugin under a stable
//! import-path key; the catalog is explicitly constructed and explicitly
//! passed to the composer — there is no ambient global registry.

use std::collections::HashMap;

use trayforge_core::PluginFactory;

/// Mapping from import-path keys to plugin factories.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: HashMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `import_path`. A later registration for the
    /// same path replaces the earlier one.
    pub fn register(&mut self, import_path: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(import_path.into(), factory);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, import_path: impl Into<String>, factory: PluginFactory) -> Self {
        self.register(import_path, factory);
        self
    }

    /// Looks up a factory for a module reference.
    ///
    /// Tries the exact `import_path` first, then `import_path.<entry>` for
    /// each `from_list` entry — the catalog analogue of importing a submodule
    /// via a fromlist.
    pub fn lookup(&self, import_path: &str, from_list: &[String]) -> Option<PluginFactory> {
        if let Some(factory) = self.factories.get(import_path) {
            return Some(*factory);
        }
        from_list
            .iter()
            .find_map(|entry| self.factories.get(&format!("{import_path}.{entry}")).copied())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
