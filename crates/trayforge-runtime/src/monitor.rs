//! Background-service liveness monitor.
//!
//! The monitor owns the service entries produced by composition and
//! periodically reconciles each indicator with the liveness its plugin
//! reports. It runs as a single tokio task, woken by a fixed-period interval,
//! and stops cooperatively through a [`CancellationToken`]: a stop request
//! lets an in-flight poll complete and then ends the task before the next
//! tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use trayforge_core::{IndicatorRef, ServiceState};

use crate::registry::PluginRegistry;

/// Default poll period.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3);

/// One monitored service: the plugin it belongs to and the indicator
/// reflecting its state.
#[derive(Clone)]
pub struct ServiceEntry {
    pub plugin_name: String,
    pub indicator: IndicatorRef,
}

/// Periodic reconciler between service liveness and indicator state.
pub struct ServiceMonitor {
    entries: Vec<ServiceEntry>,
    registry: Arc<PluginRegistry>,
    period: Duration,
}

impl ServiceMonitor {
    pub fn new(entries: Vec<ServiceEntry>, registry: Arc<PluginRegistry>) -> Self {
        Self {
            entries,
            registry,
            period: DEFAULT_PERIOD,
        }
    }

    /// Overrides the poll period.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Reconciles every entry once. Each entry lands in exactly one state:
    /// a plugin that disappeared from the registry or lost its service
    /// capability is `Failed`; otherwise its reported liveness decides
    /// between `Running` and `Idle`.
    pub fn poll_once(&self) {
        for entry in &self.entries {
            let state = match self.registry.get(&entry.plugin_name) {
                None => ServiceState::Failed,
                Some(instance) => match instance.plugin.service() {
                    None => ServiceState::Failed,
                    Some(service) => {
                        if service.is_running() {
                            ServiceState::Running
                        } else {
                            ServiceState::Idle
                        }
                    }
                },
            };
            trace!(service = %entry.plugin_name, ?state, "Service polled");
            entry.indicator.set_state(state);
        }
    }

    /// Spawns the polling task. The first poll happens immediately, then one
    /// per period.
    pub fn start(self) -> MonitorHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        info!(
            services = self.entries.len(),
            period_ms = self.period.as_millis() as u64,
            "Service monitor started"
        );
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Service monitor stopping");
                        break;
                    }
                    _ = ticker.tick() => self.poll_once(),
                }
            }
        });
        MonitorHandle { token, task }
    }
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Requests a cooperative stop. Returns immediately; the task ends before
    /// its next tick.
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Stops the monitor and waits for the task to finish.
    pub async fn stopped(self) {
        self.token.cancel();
        // The task only ends through cancellation, so join errors reduce to
        // panics inside poll_once; surface nothing here.
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use trayforge_core::{
        BackgroundService, BoxError, HostShell, MemoryShell, Plugin, PluginContext,
    };

    use crate::catalog::PluginCatalog;

    struct Flagged(&'static AtomicBool);

    impl Plugin for Flagged {
        fn name(&self) -> &str {
            "Flagged"
        }

        fn service(&self) -> Option<&dyn BackgroundService> {
            Some(self)
        }
    }

    impl BackgroundService for Flagged {
        fn is_running(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct Menuless;

    impl Plugin for Menuless {
        fn name(&self) -> &str {
            "Menuless"
        }
    }

    // Tests run in parallel, so each takes its own flag and factory.
    fn fixture(
        factory: trayforge_core::PluginFactory,
    ) -> (Arc<MemoryShell>, Arc<PluginRegistry>, Vec<ServiceEntry>) {
        let shell = MemoryShell::new();
        let catalog = PluginCatalog::new().with("svc.flagged", factory);
        let ctx = PluginContext {
            root: shell.root(),
            window: shell.window(),
        };
        let mut registry = PluginRegistry::new();
        registry
            .resolve(&catalog, &ctx, "svc.flagged", &[], Some("Flag"))
            .unwrap();

        let indicator = shell.root().add_indicator("Flag").unwrap();
        let entries = vec![ServiceEntry {
            plugin_name: "Flagged".to_string(),
            indicator,
        }];
        (shell, Arc::new(registry), entries)
    }

    #[test]
    fn poll_reflects_liveness() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        fn factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
            Ok(Arc::new(Flagged(&FLAG)))
        }

        FLAG.store(true, Ordering::SeqCst);
        let (shell, registry, entries) = fixture(factory);
        let monitor = ServiceMonitor::new(entries, registry);

        monitor.poll_once();
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Running)
        );

        FLAG.store(false, Ordering::SeqCst);
        monitor.poll_once();
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Idle)
        );
    }

    #[test]
    fn unknown_plugin_is_failed() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        fn factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
            Ok(Arc::new(Flagged(&FLAG)))
        }

        let (shell, registry, _) = fixture(factory);
        let indicator = shell.root().add_indicator("Ghost").unwrap();
        let monitor = ServiceMonitor::new(
            vec![ServiceEntry {
                plugin_name: "Ghost".to_string(),
                indicator,
            }],
            registry,
        );

        monitor.poll_once();
        assert_eq!(
            shell.root_container().indicators()[1].state(),
            Some(ServiceState::Failed)
        );
    }

    #[test]
    fn serviceless_plugin_is_failed() {
        let shell = MemoryShell::new();
        let catalog = PluginCatalog::new().with("svc.menuless", |_ctx: &PluginContext| {
            Ok(Arc::new(Menuless) as Arc<dyn Plugin>)
        });
        let ctx = PluginContext {
            root: shell.root(),
            window: shell.window(),
        };
        let mut registry = PluginRegistry::new();
        registry
            .resolve(&catalog, &ctx, "svc.menuless", &[], None)
            .unwrap();

        let indicator = shell.root().add_indicator("Menuless").unwrap();
        let monitor = ServiceMonitor::new(
            vec![ServiceEntry {
                plugin_name: "Menuless".to_string(),
                indicator,
            }],
            Arc::new(registry),
        );

        monitor.poll_once();
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Failed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transition_lands_on_the_next_tick() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        fn factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
            Ok(Arc::new(Flagged(&FLAG)))
        }

        FLAG.store(true, Ordering::SeqCst);
        let (shell, registry, entries) = fixture(factory);
        let handle = ServiceMonitor::new(entries, registry)
            .with_period(Duration::from_secs(3))
            .start();

        // First tick fires immediately.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Running)
        );

        // Flip between ticks: the stale state holds until the next poll.
        FLAG.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Running)
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Idle)
        );

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_polls() {
        static FLAG: AtomicBool = AtomicBool::new(false);
        fn factory(_ctx: &PluginContext) -> Result<Arc<dyn Plugin>, BoxError> {
            Ok(Arc::new(Flagged(&FLAG)))
        }

        FLAG.store(true, Ordering::SeqCst);
        let (shell, registry, entries) = fixture(factory);
        let handle = ServiceMonitor::new(entries, registry)
            .with_period(Duration::from_secs(3))
            .start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Running)
        );

        handle.stopped().await;

        // Liveness changes after stop never reach the indicator.
        FLAG.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(
            shell.root_container().indicators()[0].state(),
            Some(ServiceState::Running)
        );
    }
}
