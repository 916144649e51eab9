// Nexus Desktop - Backend Path Resolution
// Computes how to launch the backend for the current runtime mode

use crate::config::{Platform, RuntimeMode};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything needed to launch the backend process once
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SidecarDescriptor {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// `None` keeps the host's working directory
    pub working_dir: Option<PathBuf>,
    /// Added on top of the inherited host environment
    pub env: BTreeMap<String, String>,
}

/// Resolve the backend launch for this platform.
///
/// `root` is the repository root in development and the bundle's resource
/// directory when packaged. No filesystem access happens here; a missing
/// program surfaces as a launch failure.
pub fn resolve(mode: RuntimeMode, root: &Path) -> SidecarDescriptor {
    resolve_for(mode, Platform::current(), root)
}

pub fn resolve_for(mode: RuntimeMode, platform: Platform, root: &Path) -> SidecarDescriptor {
    let backend_dir = root.join("backend");

    match mode {
        RuntimeMode::Development => {
            let python = match platform {
                Platform::Windows => backend_dir.join(".venv").join("Scripts").join("python.exe"),
                Platform::MacOs | Platform::Linux => {
                    backend_dir.join(".venv").join("bin").join("python")
                }
            };
            let script = backend_dir.join("main.py");

            let mut env = BTreeMap::new();
            env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());

            SidecarDescriptor {
                program: python,
                args: vec![script.into_os_string()],
                working_dir: Some(backend_dir),
                env,
            }
        }
        RuntimeMode::Packaged => {
            let binary = match platform {
                Platform::Windows => "main.exe",
                Platform::MacOs | Platform::Linux => "main",
            };

            SidecarDescriptor {
                program: backend_dir.join(binary),
                args: Vec::new(),
                working_dir: None,
                env: BTreeMap::new(),
            }
        }
    }
}
