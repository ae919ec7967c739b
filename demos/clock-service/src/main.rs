//! Clock Service Demo
//!
//! A small demonstration of plugin authorship against the in-memory shell:
//! one background service whose liveness the monitor tracks, and one menu
//! contributor that adds its own actions during composition.
//!
//! The menu is described entirely by configuration records; the catalog maps
//! the import paths those records name onto the plugin factories below.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package clock-service
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::info;
use trayforge::core::{BoxError, InvocationError, ShellError};
use trayforge::prelude::*;
use trayforge::runtime::config::{MonitorConfig, TrayConfig};

// ============================================================================
// Plugins
// ============================================================================

/// Whether the clock is ticking. Flipped from main to drive indicator
/// transitions; a real service would own this state itself.
static CLOCK_TICKING: AtomicBool = AtomicBool::new(true);

/// A background service the monitor polls.
struct ClockService;

impl Plugin for ClockService {
    fn name(&self) -> &str {
        "ClockService"
    }

    fn service(&self) -> Option<&dyn BackgroundService> {
        Some(self)
    }
}

impl BackgroundService for ClockService {
    fn is_running(&self) -> bool {
        CLOCK_TICKING.load(Ordering::SeqCst)
    }
}

fn clock_factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
    Ok(Arc::new(ClockService))
}

/// A menu contributor that adds its own actions to the target container.
struct QuickLinks;

impl Plugin for QuickLinks {
    fn name(&self) -> &str {
        "QuickLinks"
    }

    fn menu(&self) -> Option<&dyn MenuContributor> {
        Some(self)
    }
}

impl MenuContributor for QuickLinks {
    fn build_menu(&self, target: &dyn Container) -> Result<(), ShellError> {
        target.add_action(ActionNode {
            title: "Show time".to_string(),
            tooltip: Some("Prints the current time".to_string()),
            payload: Arc::new(CallbackPayload::new(|| {
                info!("It is now... time to write more Rust");
                Ok(())
            })),
        })
    }
}

fn quick_links_factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
    Ok(Arc::new(QuickLinks))
}

/// Script runner that logs instead of spawning processes.
struct LoggingRunner;

impl ScriptRunner for LoggingRunner {
    fn run(&self, source: &str) -> Result<(), InvocationError> {
        info!(source, "Script invoked");
        Ok(())
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn demo_config() -> TrayConfig {
    let mut config = TrayConfig::default();
    config.monitor = MonitorConfig {
        poll_interval_secs: 1,
    };
    config.menu.items = vec![
        serde_json::json!({"type": "module", "import_path": "demo.links"}),
        serde_json::json!({"type": "separator"}),
        serde_json::json!({
            "type": "menu",
            "title": "Scripts",
            "items": [
                {"type": "action", "title": "Greet", "sourcetype": "python_code",
                 "command": "print('hello')", "tooltip": "Runs a snippet"},
            ],
        }),
        serde_json::json!({"type": "module", "import_path": "demo.clock", "title": "Clock"}),
        // Unknown plugin: recorded as an error, siblings still compose.
        serde_json::json!({"type": "module", "import_path": "demo.missing"}),
    ];
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let shell = MemoryShell::new();
    let catalog = PluginCatalog::new()
        .with("demo.clock", clock_factory)
        .with("demo.links", quick_links_factory);

    let mut runtime = TrayRuntime::from_config(&demo_config(), shell.clone(), catalog)
        .script_runner(Arc::new(LoggingRunner));

    runtime.compose();
    runtime.start_monitor()?;

    let root = shell.root_container();
    info!(tree = ?root.kinds(), "Composed menu");
    for record in runtime.errors() {
        info!(kind = record.descriptor.kind(), error = %record.error, "Skipped item");
    }

    // Fire the contributed action once.
    if let Some(action) = root.find_action("Show time") {
        action.payload.invoke()?;
    }

    let services = root
        .find_menu("Services")
        .ok_or("services submenu missing")?;
    let indicator = &services.indicators()[0];

    tokio::time::sleep(Duration::from_millis(1200)).await;
    info!(state = ?indicator.state(), "Clock ticking");

    CLOCK_TICKING.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(1200)).await;
    info!(state = ?indicator.state(), "Clock stopped");

    runtime.stop().await;
    Ok(())
}
