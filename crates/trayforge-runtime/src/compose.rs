//! Composition engine.
//!
//! [`Composer`] walks a sequence of item descriptors and a target container,
//! recursively producing menu nodes, resolving module references through the
//! [`PluginRegistry`], and collecting per-item failures without ever aborting
//! the walk. [`Composer::finish`] seals the result: the shared Services
//! submenu (if any background services were found) is attached exactly once,
//! followed by a trailing separator and the Exit action, peers are wired, and
//! the finished [`Composition`] is handed back.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use trayforge_core::{
    ActionNode, CallbackPayload, ContainerRef, FilePayload, HostShell, Invocable, ItemDescriptor,
    PluginContext, ProcessRunner, ScriptPayload, ScriptRunner, ShellError, SourceType,
};

use crate::catalog::PluginCatalog;
use crate::monitor::ServiceEntry;
use crate::registry::{PluginRegistry, ResolveError};

/// Title of the lazily created shared submenu holding service indicators.
const SERVICES_MENU_TITLE: &str = "Services";

/// Title of the engine-appended exit action.
const EXIT_TITLE: &str = "Exit";

/// Why a single item failed to compose. Never fatal to the walk.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// The referenced module could not be resolved or instantiated.
    #[error("Module import failed: {0}")]
    Import(#[from] ResolveError),

    /// The descriptor is structurally present but semantically invalid.
    #[error("Invalid item: {0}")]
    Validation(String),

    /// The shell (or a plugin) failed while attaching a node.
    #[error("Menu build failed: {0}")]
    MenuBuild(#[from] ShellError),
}

/// One accumulated composition failure, kept for post-hoc inspection.
#[derive(Debug)]
pub struct ErrorRecord {
    pub descriptor: ItemDescriptor,
    pub error: ComposeError,
}

/// Result of a finished composition.
pub struct Composition {
    /// The process-lifetime plugin set, frozen after composition.
    pub registry: Arc<PluginRegistry>,
    /// One entry per background-service plugin, consumed by the monitor.
    pub service_entries: Vec<ServiceEntry>,
    /// Every item that failed to compose, in walk order.
    pub errors: Vec<ErrorRecord>,
}

impl Composition {
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }
}

/// Recursive, order-preserving descriptor walker.
pub struct Composer {
    shell: Arc<dyn HostShell>,
    catalog: PluginCatalog,
    runner: Arc<dyn ScriptRunner>,
    registry: PluginRegistry,
    errors: Vec<ErrorRecord>,
    services_menu: Option<ContainerRef>,
    service_entries: Vec<ServiceEntry>,
}

impl Composer {
    pub fn new(shell: Arc<dyn HostShell>, catalog: PluginCatalog) -> Self {
        Self {
            shell,
            catalog,
            runner: Arc::new(ProcessRunner::shell()),
            registry: PluginRegistry::new(),
            errors: Vec::new(),
            services_menu: None,
            service_entries: Vec::new(),
        }
    }

    /// Replaces the script runner backing action payloads.
    pub fn with_runner(mut self, runner: Arc<dyn ScriptRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Composes `items` into `target`, sequentially and in order. A failing
    /// item is recorded and skipped; its siblings still compose.
    pub fn compose(&mut self, items: &[ItemDescriptor], target: &ContainerRef) {
        for item in items {
            if let Err(error) = self.compose_item(item, target) {
                warn!(kind = item.kind(), error = %error, "Menu item skipped");
                self.errors.push(ErrorRecord {
                    descriptor: item.clone(),
                    error,
                });
            }
        }
    }

    fn compose_item(
        &mut self,
        item: &ItemDescriptor,
        target: &ContainerRef,
    ) -> Result<(), ComposeError> {
        match item {
            ItemDescriptor::ModuleRef {
                import_path,
                from_list,
                title,
            } => self.add_module(import_path, from_list, title.as_deref(), target),
            ItemDescriptor::Action {
                title,
                source_type,
                command,
                tooltip,
            } => self.add_action(title, *source_type, command, tooltip.as_deref(), target),
            ItemDescriptor::Submenu { title, items } => self.add_submenu(title, items, target),
            ItemDescriptor::Separator => {
                target.add_separator()?;
                Ok(())
            }
        }
    }

    fn add_module(
        &mut self,
        import_path: &str,
        from_list: &[String],
        title: Option<&str>,
        target: &ContainerRef,
    ) -> Result<(), ComposeError> {
        let ctx = PluginContext {
            root: self.shell.root(),
            window: self.shell.window(),
        };
        let (instance, fresh) =
            self.registry
                .resolve(&self.catalog, &ctx, import_path, from_list, title)?;

        if instance.capabilities.menu {
            if let Some(contributor) = instance.plugin.menu() {
                // The plugin decides what, if anything, it adds.
                contributor.build_menu(target.as_ref())?;
            }
        } else if fresh {
            // First background service creates the shared submenu; it stays
            // detached until finish() attaches it after all configured items.
            let services = match self.services_menu.clone() {
                Some(menu) => menu,
                None => {
                    let menu = self.shell.create_menu(SERVICES_MENU_TITLE);
                    self.services_menu = Some(menu.clone());
                    menu
                }
            };
            if let Some(label) = instance.service_title.as_deref() {
                let indicator = services.add_indicator(label)?;
                self.service_entries.push(ServiceEntry {
                    plugin_name: instance.name.clone(),
                    indicator,
                });
            }
        }
        Ok(())
    }

    fn add_action(
        &mut self,
        title: &str,
        source_type: Option<SourceType>,
        command: &str,
        tooltip: Option<&str>,
        target: &ContainerRef,
    ) -> Result<(), ComposeError> {
        if title.trim().is_empty() {
            return Err(ComposeError::Validation("action title is blank".to_string()));
        }
        let Some(source_type) = source_type else {
            return Err(ComposeError::Validation(format!(
                "action '{title}' has an invalid sourcetype"
            )));
        };
        if command.trim().is_empty() {
            return Err(ComposeError::Validation(format!(
                "action '{title}' has an empty command"
            )));
        }

        let payload: Arc<dyn Invocable> = match source_type {
            SourceType::PythonCode => Arc::new(ScriptPayload::new(command, self.runner.clone())),
            SourceType::File => Arc::new(FilePayload::new(command, self.runner.clone())),
        };
        target.add_action(ActionNode {
            title: title.to_string(),
            tooltip: tooltip
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string),
            payload,
        })?;
        Ok(())
    }

    fn add_submenu(
        &mut self,
        title: &str,
        items: &[ItemDescriptor],
        target: &ContainerRef,
    ) -> Result<(), ComposeError> {
        if title.trim().is_empty() {
            return Err(ComposeError::Validation("menu title is blank".to_string()));
        }
        let submenu = target.add_submenu(title)?;
        self.compose(items, &submenu);
        Ok(())
    }

    /// Seals the composition: services submenu, trailing separator, exit
    /// action, peer wiring. Shell failures here are logged and skipped; the
    /// composition itself is always produced.
    pub fn finish(mut self) -> Composition {
        let root = self.shell.root();

        if let Some(menu) = self.services_menu.take() {
            if let Err(error) = root.attach_menu(menu) {
                warn!(error = %error, "Failed to attach services submenu");
            }
        }
        if let Err(error) = root.add_separator() {
            warn!(error = %error, "Failed to add trailing separator");
        }

        let shell = self.shell.clone();
        let exit = ActionNode {
            title: EXIT_TITLE.to_string(),
            tooltip: None,
            payload: Arc::new(CallbackPayload::new(move || {
                shell.request_exit();
                Ok(())
            })),
        };
        if let Err(error) = root.add_action(exit) {
            warn!(error = %error, "Failed to add exit action");
        }

        self.registry.wire_peers();

        info!(
            plugins = self.registry.len(),
            services = self.service_entries.len(),
            errors = self.errors.len(),
            "Menu composition finished"
        );
        Composition {
            registry: Arc::new(self.registry),
            service_entries: self.service_entries,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use trayforge_core::{
        BackgroundService, BoxError, Container, InvocationError, MemoryShell, MenuContributor,
        Plugin, parse_items,
    };

    struct NullRunner;

    impl ScriptRunner for NullRunner {
        fn run(&self, _source: &str) -> Result<(), InvocationError> {
            Ok(())
        }
    }

    struct Sleeper;

    impl Plugin for Sleeper {
        fn name(&self) -> &str {
            "Sleeper"
        }

        fn service(&self) -> Option<&dyn BackgroundService> {
            Some(self)
        }
    }

    impl BackgroundService for Sleeper {
        fn is_running(&self) -> bool {
            false
        }
    }

    fn sleeper_factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
        Ok(Arc::new(Sleeper))
    }

    struct Waker;

    impl Plugin for Waker {
        fn name(&self) -> &str {
            "Waker"
        }

        fn service(&self) -> Option<&dyn BackgroundService> {
            Some(self)
        }
    }

    impl BackgroundService for Waker {
        fn is_running(&self) -> bool {
            true
        }
    }

    fn waker_factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
        Ok(Arc::new(Waker))
    }

    struct Greeter;

    impl Plugin for Greeter {
        fn name(&self) -> &str {
            "Greeter"
        }

        fn menu(&self) -> Option<&dyn MenuContributor> {
            Some(self)
        }
    }

    impl MenuContributor for Greeter {
        fn build_menu(&self, target: &dyn Container) -> Result<(), ShellError> {
            target.add_action(ActionNode {
                title: "Say hello".to_string(),
                tooltip: None,
                payload: Arc::new(CallbackPayload::new(|| Ok(()))),
            })
        }
    }

    fn greeter_factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
        Ok(Arc::new(Greeter))
    }

    fn catalog() -> PluginCatalog {
        PluginCatalog::new()
            .with("services.sleeper", sleeper_factory)
            .with("services.waker", waker_factory)
            .with("ui.greeter", greeter_factory)
    }

    fn compose_records(records: &[serde_json::Value]) -> (Arc<MemoryShell>, Composition) {
        let shell = MemoryShell::new();
        let items = parse_items(records);
        let mut composer =
            Composer::new(shell.clone(), catalog()).with_runner(Arc::new(NullRunner));
        let root = shell.root();
        composer.compose(&items, &root);
        let composition = composer.finish();
        (shell, composition)
    }

    #[test]
    fn bad_module_never_halts_siblings() {
        let records = vec![
            serde_json::json!({"type": "module", "import_path": "does.not.exist"}),
            serde_json::json!({"type": "separator"}),
            serde_json::json!({"type": "action", "title": "Run", "sourcetype": "python_code", "command": "x = 1"}),
        ];
        let (shell, composition) = compose_records(&records);

        // One separator and one action from the items, plus the engine tail
        // (separator + Exit).
        assert_eq!(
            shell.root_container().kinds(),
            ["separator", "action:Run", "separator", "action:Exit"]
        );
        assert_eq!(composition.errors().len(), 1);
        assert!(matches!(
            composition.errors()[0].error,
            ComposeError::Import(ResolveError::UnknownPath(_))
        ));
    }

    #[test]
    fn blank_submenu_title_skips_children() {
        let records = vec![serde_json::json!({
            "type": "menu",
            "title": "   ",
            "items": [{"type": "separator"}, {"type": "separator"}],
        })];
        let (shell, composition) = compose_records(&records);

        assert_eq!(shell.root_container().kinds(), ["separator", "action:Exit"]);
        assert_eq!(composition.errors().len(), 1);
        assert!(matches!(
            composition.errors()[0].error,
            ComposeError::Validation(_)
        ));
    }

    #[test]
    fn nested_submenus_compose_recursively() {
        let records = vec![serde_json::json!({
            "type": "menu",
            "title": "Tools",
            "items": [
                {"type": "action", "title": "Inner", "sourcetype": "python_code", "command": "y"},
                {"type": "menu", "title": "Deeper", "items": [{"type": "separator"}]},
            ],
        })];
        let (shell, _) = compose_records(&records);

        let tools = shell.root_container().find_menu("Tools").unwrap();
        assert_eq!(tools.kinds(), ["action:Inner", "menu:Deeper"]);
        assert_eq!(tools.find_menu("Deeper").unwrap().kinds(), ["separator"]);
    }

    #[test]
    fn one_services_menu_regardless_of_service_count() {
        let records = vec![
            serde_json::json!({"type": "module", "import_path": "services.sleeper", "title": "Sleeper"}),
            serde_json::json!({"type": "module", "import_path": "services.waker"}),
        ];
        let (shell, composition) = compose_records(&records);

        let root = shell.root_container();
        let services: Vec<_> = root
            .kinds()
            .into_iter()
            .filter(|k| k == "menu:Services")
            .collect();
        assert_eq!(services.len(), 1);

        let menu = root.find_menu("Services").unwrap();
        assert_eq!(
            menu.kinds(),
            ["indicator:Sleeper", "indicator:services.waker"]
        );
        assert_eq!(composition.service_entries.len(), 2);
    }

    #[test]
    fn no_services_no_services_menu() {
        let records = vec![serde_json::json!({"type": "module", "import_path": "ui.greeter"})];
        let (shell, composition) = compose_records(&records);

        assert!(shell.root_container().find_menu("Services").is_none());
        assert!(composition.service_entries.is_empty());
        // The contributor added its own node to the target container.
        assert_eq!(
            shell.root_container().kinds(),
            ["action:Say hello", "separator", "action:Exit"]
        );
    }

    #[test]
    fn invalid_actions_are_recorded_not_added() {
        let records = vec![
            serde_json::json!({"type": "action", "title": "  ", "sourcetype": "file", "command": "/x"}),
            serde_json::json!({"type": "action", "title": "NoType", "sourcetype": "ruby", "command": "x"}),
            serde_json::json!({"type": "action", "title": "NoCmd", "sourcetype": "file", "command": "  "}),
        ];
        let (shell, composition) = compose_records(&records);

        assert_eq!(shell.root_container().kinds(), ["separator", "action:Exit"]);
        assert_eq!(composition.errors().len(), 3);
        assert!(composition
            .errors()
            .iter()
            .all(|r| matches!(r.error, ComposeError::Validation(_))));
    }

    #[test]
    fn blank_tooltip_is_dropped() {
        let records = vec![
            serde_json::json!({"type": "action", "title": "A", "sourcetype": "python_code", "command": "x", "tooltip": "  "}),
            serde_json::json!({"type": "action", "title": "B", "sourcetype": "python_code", "command": "x", "tooltip": "hover me"}),
        ];
        let (shell, _) = compose_records(&records);

        let root = shell.root_container();
        assert_eq!(root.find_action("A").unwrap().tooltip, None);
        assert_eq!(
            root.find_action("B").unwrap().tooltip.as_deref(),
            Some("hover me")
        );
    }

    #[test]
    fn composition_is_deterministic() {
        let records = vec![
            serde_json::json!({"type": "module", "import_path": "ui.greeter"}),
            serde_json::json!({"type": "separator"}),
            serde_json::json!({"type": "menu", "title": "Tools", "items": [
                {"type": "action", "title": "Run", "sourcetype": "python_code", "command": "x"},
            ]}),
            serde_json::json!({"type": "module", "import_path": "services.sleeper"}),
        ];

        let (first, _) = compose_records(&records);
        let (second, _) = compose_records(&records);
        assert_eq!(first.root_container().kinds(), second.root_container().kinds());
    }

    #[test]
    fn exit_action_requests_shell_exit() {
        let (shell, _) = compose_records(&[]);

        let exit = shell.root_container().find_action("Exit").unwrap();
        assert!(!shell.exit_requested());
        exit.payload.invoke().unwrap();
        assert!(shell.exit_requested());
    }

    #[test]
    fn script_actions_record_runner_invocations() {
        struct Recording(Mutex<Vec<String>>);

        impl ScriptRunner for Recording {
            fn run(&self, source: &str) -> Result<(), InvocationError> {
                self.0.lock().push(source.to_string());
                Ok(())
            }
        }

        let shell = MemoryShell::new();
        let runner = Arc::new(Recording(Mutex::new(Vec::new())));
        let items = parse_items(&[serde_json::json!({
            "type": "action", "title": "Go", "sourcetype": "python", "command": "do_it()",
        })]);
        let mut composer = Composer::new(shell.clone(), catalog()).with_runner(runner.clone());
        let root = shell.root();
        composer.compose(&items, &root);
        composer.finish();

        let action = shell.root_container().find_action("Go").unwrap();
        action.payload.invoke().unwrap();
        assert_eq!(runner.0.lock().as_slice(), ["do_it()"]);
    }
}
