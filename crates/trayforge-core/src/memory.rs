//! In-memory host shell.
//!
//! [`MemoryShell`] records the composed node tree without rendering anything.
//! It backs the test suite and is usable as-is by headless embedders that
//! only care about the composition result.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::ShellError;
use crate::shell::{
    ActionNode, Container, ContainerRef, HostShell, Indicator, IndicatorRef, ServiceState,
    WindowRef,
};

/// One recorded node in a [`MemoryContainer`].
#[derive(Clone)]
pub enum MemoryNode {
    Action(ActionNode),
    Separator,
    Menu(Arc<MemoryContainer>),
    Indicator(Arc<MemoryIndicator>),
}

/// Recording container.
#[derive(Default)]
pub struct MemoryContainer {
    title: Option<String>,
    nodes: Mutex<Vec<MemoryNode>>,
}

impl MemoryContainer {
    fn named(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            nodes: Mutex::new(Vec::new()),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Snapshot of the recorded children.
    pub fn nodes(&self) -> Vec<MemoryNode> {
        self.nodes.lock().clone()
    }

    /// Compact `kind:title` fingerprint of the children, for ordering and
    /// determinism assertions.
    pub fn kinds(&self) -> Vec<String> {
        self.nodes
            .lock()
            .iter()
            .map(|node| match node {
                MemoryNode::Action(action) => format!("action:{}", action.title),
                MemoryNode::Separator => "separator".to_string(),
                MemoryNode::Menu(menu) => {
                    format!("menu:{}", menu.title().unwrap_or_default())
                }
                MemoryNode::Indicator(indicator) => {
                    format!("indicator:{}", indicator.label())
                }
            })
            .collect()
    }

    /// First child submenu with the given title.
    pub fn find_menu(&self, title: &str) -> Option<Arc<MemoryContainer>> {
        self.nodes.lock().iter().find_map(|node| match node {
            MemoryNode::Menu(menu) if menu.title() == Some(title) => Some(menu.clone()),
            _ => None,
        })
    }

    /// All recorded indicators, in insertion order.
    pub fn indicators(&self) -> Vec<Arc<MemoryIndicator>> {
        self.nodes
            .lock()
            .iter()
            .filter_map(|node| match node {
                MemoryNode::Indicator(indicator) => Some(indicator.clone()),
                _ => None,
            })
            .collect()
    }

    /// First recorded action with the given title.
    pub fn find_action(&self, title: &str) -> Option<ActionNode> {
        self.nodes.lock().iter().find_map(|node| match node {
            MemoryNode::Action(action) if action.title == title => Some(action.clone()),
            _ => None,
        })
    }
}

impl Container for MemoryContainer {
    fn add_action(&self, action: ActionNode) -> Result<(), ShellError> {
        self.nodes.lock().push(MemoryNode::Action(action));
        Ok(())
    }

    fn add_separator(&self) -> Result<(), ShellError> {
        self.nodes.lock().push(MemoryNode::Separator);
        Ok(())
    }

    fn add_submenu(&self, title: &str) -> Result<ContainerRef, ShellError> {
        let menu = Arc::new(MemoryContainer::named(title));
        self.nodes.lock().push(MemoryNode::Menu(menu.clone()));
        Ok(menu)
    }

    fn add_indicator(&self, label: &str) -> Result<IndicatorRef, ShellError> {
        let indicator = Arc::new(MemoryIndicator::new(label));
        self.nodes
            .lock()
            .push(MemoryNode::Indicator(indicator.clone()));
        Ok(indicator)
    }

    fn attach_menu(&self, menu: ContainerRef) -> Result<(), ShellError> {
        let menu = menu
            .into_any()
            .downcast::<MemoryContainer>()
            .map_err(|_| ShellError::Rejected("foreign container type".to_string()))?;
        self.nodes.lock().push(MemoryNode::Menu(menu));
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Recording indicator slot.
pub struct MemoryIndicator {
    label: String,
    state: Mutex<Option<ServiceState>>,
}

impl MemoryIndicator {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            state: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The last state written by the monitor, or `None` before the first poll.
    pub fn state(&self) -> Option<ServiceState> {
        *self.state.lock()
    }
}

impl Indicator for MemoryIndicator {
    fn set_state(&self, state: ServiceState) {
        *self.state.lock() = Some(state);
    }
}

/// Headless host shell recording the composed hierarchy.
pub struct MemoryShell {
    root: Arc<MemoryContainer>,
    window: WindowRef,
    exit_requested: AtomicBool,
}

impl MemoryShell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            root: Arc::new(MemoryContainer::default()),
            window: Arc::new(()),
            exit_requested: AtomicBool::new(false),
        })
    }

    /// Concrete root container, for assertions on the recorded tree.
    pub fn root_container(&self) -> Arc<MemoryContainer> {
        self.root.clone()
    }

    /// Whether an Exit action has fired.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }
}

impl HostShell for MemoryShell {
    fn root(&self) -> ContainerRef {
        self.root.clone()
    }

    fn window(&self) -> WindowRef {
        self.window.clone()
    }

    fn create_menu(&self, title: &str) -> ContainerRef {
        Arc::new(MemoryContainer::named(title))
    }

    fn request_exit(&self) {
        self.exit_requested.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::CallbackPayload;

    #[test]
    fn records_nodes_in_order() {
        let shell = MemoryShell::new();
        let root = shell.root();

        root.add_action(ActionNode {
            title: "First".to_string(),
            tooltip: None,
            payload: Arc::new(CallbackPayload::new(|| Ok(()))),
        })
        .unwrap();
        root.add_separator().unwrap();
        let sub = root.add_submenu("Tools").unwrap();
        sub.add_separator().unwrap();

        assert_eq!(
            shell.root_container().kinds(),
            ["action:First", "separator", "menu:Tools"]
        );
        assert_eq!(
            shell.root_container().find_menu("Tools").unwrap().kinds(),
            ["separator"]
        );
    }

    #[test]
    fn detached_menu_attaches_once() {
        let shell = MemoryShell::new();
        let menu = shell.create_menu("Services");
        menu.add_indicator("clock").unwrap();

        shell.root().attach_menu(menu).unwrap();

        let services = shell.root_container().find_menu("Services").unwrap();
        assert_eq!(services.kinds(), ["indicator:clock"]);
    }

    #[test]
    fn indicator_keeps_last_state() {
        let shell = MemoryShell::new();
        let indicator = shell.root().add_indicator("svc").unwrap();
        assert_eq!(shell.root_container().indicators()[0].state(), None);

        indicator.set_state(ServiceState::Running);
        indicator.set_state(ServiceState::Idle);
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Idle)
        );
    }
}
