// Nexus Desktop - Host Lifecycle
// Backend startup before the UI is shown, backend teardown on every quit path

use crate::config::{Platform, RuntimeMode};
use crate::gateway::RequestGateway;
use crate::paths;
use crate::supervisor::{BackendSupervisor, StopOutcome};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long the readiness log waits for `/health` after a start
const READINESS_WINDOW: Duration = Duration::from_secs(30);

/// Backend availability after `on_ready`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Startup {
    Launched { pid: u32 },
    /// The UI still comes up; requests fail with `BackendUnreachable`
    Degraded { reason: String },
}

/// OS hooks that end the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuitTrigger {
    MainWindowClosing,
    AllWindowsClosed,
    BeforeQuit,
    Exit,
}

/// macOS apps stay alive in the dock after their last window closes
pub fn quits_when_windows_closed(platform: Platform) -> bool {
    platform != Platform::MacOs
}

pub struct HostLifecycle {
    supervisor: Arc<BackendSupervisor>,
    gateway: RequestGateway,
    mode: RuntimeMode,
    sidecar_root: PathBuf,
}

impl HostLifecycle {
    pub fn new(
        supervisor: Arc<BackendSupervisor>,
        gateway: RequestGateway,
        mode: RuntimeMode,
        sidecar_root: PathBuf,
    ) -> Self {
        Self {
            supervisor,
            gateway,
            mode,
            sidecar_root,
        }
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// Launch the backend. Failures are logged and reported as degraded, never fatal.
    pub async fn on_ready(&self) -> Startup {
        let descriptor = paths::resolve(self.mode, &self.sidecar_root);
        info!("[Lifecycle] Host ready ({:?}), launching backend", self.mode);

        match self.supervisor.start(descriptor).await {
            Ok(pid) => {
                let gateway = self.gateway.clone();
                tokio::spawn(async move {
                    if gateway.wait_for_health(READINESS_WINDOW).await {
                        info!("[Lifecycle] Backend is ready!");
                    } else {
                        warn!(
                            "[Lifecycle] Backend not healthy after {:?}",
                            READINESS_WINDOW
                        );
                    }
                });
                Startup::Launched { pid }
            }
            Err(e) => {
                error!("[Lifecycle] {}. Continuing without backend.", e);
                Startup::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Stop the backend. Every quit hook calls this; repeats are no-ops.
    pub async fn on_quit(&self, trigger: QuitTrigger) -> StopOutcome {
        let outcome = self.supervisor.stop().await;
        if outcome == StopOutcome::Terminated {
            info!("[Lifecycle] Backend shut down on {:?}", trigger);
        }
        outcome
    }
}
