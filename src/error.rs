// Nexus Desktop - Error Types

use crate::supervisor::SupervisorState;
use std::path::PathBuf;
use thiserror::Error;

/// Backend process lifecycle failures
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The OS refused to spawn the backend (missing executable, permission denied)
    #[error("Failed to launch backend at {}: {}", .program.display(), .source)]
    LaunchFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A start was attempted while a backend is already owned
    #[error("Backend cannot be started while {0}")]
    AlreadyActive(SupervisorState),

    #[error("Backend exited unexpectedly ({})", describe_code(.code))]
    UnexpectedExit { code: Option<i32> },
}

/// Failures of a UI-initiated backend request
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Invalid endpoint `{0}`: expected a relative path starting with '/'")]
    InvalidEndpoint(String),

    #[error("Backend unreachable: {0}")]
    BackendUnreachable(#[source] reqwest::Error),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

pub(crate) fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}
