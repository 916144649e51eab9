// Nexus Desktop - Logging
// Host diagnostics go through the `log` facade; the desktop shell installs the sink

/// Log targets for backend output lines
pub const BACKEND_OUT_TARGET: &str = "backend-out";
pub const BACKEND_ERR_TARGET: &str = "backend-err";

/// Log file stem inside the platform log directory
#[cfg(feature = "desktop")]
const LOG_FILE_NAME: &str = "nexus-desktop";

/// Which backend pipe a line came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives every line the backend writes, in order within each stream
pub trait DiagnosticSink: Send + Sync + 'static {
    fn line(&self, stream: OutputStream, line: &str);
}

/// Forwards backend output into the host log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn line(&self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => log::info!(target: BACKEND_OUT_TARGET, "{}", line),
            OutputStream::Stderr => log::error!(target: BACKEND_ERR_TARGET, "{}", line),
        }
    }
}

/// Stdout plus a rolling file in the app log dir. Nothing is forwarded to the
/// webview: host logs carry filesystem paths.
#[cfg(feature = "desktop")]
pub fn plugin<R: tauri::Runtime>(level: log::LevelFilter) -> tauri::plugin::TauriPlugin<R> {
    use tauri_plugin_log::{Target, TargetKind};

    tauri_plugin_log::Builder::default()
        .level(level)
        .clear_targets()
        .target(Target::new(TargetKind::Stdout))
        .target(Target::new(TargetKind::LogDir {
            file_name: Some(LOG_FILE_NAME.into()),
        }))
        .build()
}
