// Nexus Desktop - Backend Process Supervisor
// Owns the backend process: spawn, output forwarding, exit detection, termination

use crate::error::{describe_code, SupervisorError};
use crate::logging::{DiagnosticSink, OutputStream};
use crate::paths::SidecarDescriptor;
use log::{error, info, warn};
use std::fmt;
use std::process::Stdio;
use std::sync::{Arc, Weak};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch, Mutex};

/// Supervisor lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Starting,
    Running { pid: u32 },
    Stopping,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Starting => write!(f, "starting"),
            SupervisorState::Running { pid } => write!(f, "running (PID: {})", pid),
            SupervisorState::Stopping => write!(f, "stopping"),
            SupervisorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How the last backend process ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitRecord {
    pub code: Option<i32>,
    /// `true` when the exit was requested through `stop()`
    pub requested: bool,
}

/// Result of a `stop()` call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// This call terminated the process
    Terminated,
    /// Nothing was running, or another caller already stopped it
    AlreadyStopped,
}

/// The live process. The exit watcher task owns the `Child` and only a weak
/// reference to the supervisor, so dropping the supervisor drops `terminate`,
/// which makes the watcher kill the process.
struct SidecarHandle {
    pid: u32,
    terminate: oneshot::Sender<()>,
}

struct Inner {
    state: SupervisorState,
    handle: Option<SidecarHandle>,
    last_exit: Option<ExitRecord>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SupervisorState>,
}

impl Shared {
    fn transition(&self, inner: &mut Inner, next: SupervisorState) {
        inner.state = next;
        self.state_tx.send_replace(next);
    }
}

/// Single owner of the backend process. All transitions run under one lock.
pub struct BackendSupervisor {
    shared: Arc<Shared>,
    sink: Arc<dyn DiagnosticSink>,
}

impl BackendSupervisor {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        let (state_tx, _) = watch::channel(SupervisorState::Idle);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: SupervisorState::Idle,
                    handle: None,
                    last_exit: None,
                }),
                state_tx,
            }),
            sink,
        }
    }

    pub async fn state(&self) -> SupervisorState {
        self.shared.inner.lock().await.state
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.shared.state_tx.subscribe()
    }

    pub async fn last_exit(&self) -> Option<ExitRecord> {
        self.shared.inner.lock().await.last_exit
    }

    /// Launch the backend. Only valid while idle; returns the PID.
    pub async fn start(&self, descriptor: SidecarDescriptor) -> Result<u32, SupervisorError> {
        let mut inner = self.shared.inner.lock().await;
        if inner.state != SupervisorState::Idle {
            return Err(SupervisorError::AlreadyActive(inner.state));
        }
        self.shared.transition(&mut inner, SupervisorState::Starting);

        info!("[Service] Starting backend...");
        info!("[Service] Program: {:?}", descriptor.program);
        info!("[Service] Args: {:?}", descriptor.args);
        if let Some(dir) = &descriptor.working_dir {
            info!("[Service] Working dir: {:?}", dir);
        }

        let mut child = match build_command(&descriptor).spawn() {
            Ok(child) => child,
            Err(source) => {
                self.shared.transition(&mut inner, SupervisorState::Idle);
                return Err(SupervisorError::LaunchFailure {
                    program: descriptor.program,
                    source,
                });
            }
        };

        let pid = child.id().unwrap_or_default();
        info!("[Service] Backend started with PID: {}", pid);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, Arc::clone(&self.sink)));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, Arc::clone(&self.sink)));
        }

        // The watcher blocks on the lock until this transition is complete
        let (terminate, terminate_rx) = oneshot::channel();
        tokio::spawn(watch_exit(Arc::downgrade(&self.shared), child, terminate_rx));

        inner.handle = Some(SidecarHandle { pid, terminate });
        self.shared
            .transition(&mut inner, SupervisorState::Running { pid });
        Ok(pid)
    }

    /// Terminate the backend. Safe to call any number of times from any state,
    /// and safe to cancel: the exit watcher completes the transition to `Stopped`.
    pub async fn stop(&self) -> StopOutcome {
        {
            let mut inner = self.shared.inner.lock().await;
            let state = inner.state;
            match state {
                SupervisorState::Running { .. } | SupervisorState::Starting => {}
                SupervisorState::Stopping => {
                    drop(inner);
                    self.wait_until_stopped().await;
                    return StopOutcome::AlreadyStopped;
                }
                SupervisorState::Idle | SupervisorState::Stopped => {
                    return StopOutcome::AlreadyStopped;
                }
            }
            self.shared.transition(&mut inner, SupervisorState::Stopping);
            if let Some(handle) = inner.handle.take() {
                info!("[Service] Stopping backend (PID: {})...", handle.pid);
                // The watcher may have just seen a natural exit; it records the code either way
                let _ = handle.terminate.send(());
            } else {
                // no watcher left to finish the transition
                self.shared.transition(&mut inner, SupervisorState::Stopped);
            }
        }

        self.wait_until_stopped().await;
        info!("[Service] Backend stopped.");
        StopOutcome::Terminated
    }

    async fn wait_until_stopped(&self) {
        let mut rx = self.subscribe();
        let _ = rx
            .wait_for(|state| matches!(state, SupervisorState::Stopped))
            .await;
    }
}

fn build_command(descriptor: &SidecarDescriptor) -> Command {
    let mut cmd = Command::new(&descriptor.program);
    cmd.args(&descriptor.args)
        .envs(&descriptor.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &descriptor.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// Push each line of one backend pipe into the sink until the pipe closes
async fn forward_lines<R>(pipe: R, stream: OutputStream, sink: Arc<dyn DiagnosticSink>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => sink.line(stream, &line),
            Ok(None) => break,
            Err(e) => {
                warn!("[Service] Failed to read backend {:?}: {}", stream, e);
                break;
            }
        }
    }
}

/// Own the child until it exits, either on its own or because `stop()` asked,
/// then record the exit and move the supervisor to `Stopped`.
async fn watch_exit(shared: Weak<Shared>, mut child: Child, terminate: oneshot::Receiver<()>) {
    let code = tokio::select! {
        status = child.wait() => status.ok().and_then(|status| status.code()),
        _ = terminate => {
            if let Err(e) = child.start_kill() {
                warn!("[Service] Failed to signal backend: {}", e);
            }
            match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    error!("[Service] Failed to reap backend: {}", e);
                    None
                }
            }
        }
    };

    // Supervisor dropped: the process is gone and nobody is left to tell
    let Some(shared) = shared.upgrade() else {
        return;
    };

    let mut inner = shared.inner.lock().await;
    let requested = match inner.state {
        SupervisorState::Running { .. } => {
            warn!("[Service] {}", SupervisorError::UnexpectedExit { code });
            false
        }
        SupervisorState::Stopping => {
            info!("[Service] Backend exited ({})", describe_code(&code));
            true
        }
        _ => return,
    };
    inner.handle = None;
    inner.last_exit = Some(ExitRecord { code, requested });
    shared.transition(&mut inner, SupervisorState::Stopped);
}
