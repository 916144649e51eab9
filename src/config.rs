// Nexus Desktop - Host Configuration
// Runtime mode, platform and the loopback contract shared with the backend

use anyhow::{anyhow, Context};
use log::LevelFilter;
use std::path::PathBuf;

/// Backend loopback contract (the backend binds exactly this address)
pub const BACKEND_HOST: &str = "127.0.0.1";
pub const BACKEND_PORT: u16 = 8000;

/// Environment overrides
pub mod env_keys {
    pub const RUNTIME_MODE: &str = "NEXUS_RUNTIME_MODE";
    pub const PROJECT_ROOT: &str = "NEXUS_PROJECT_ROOT";
    pub const LOG_LEVEL: &str = "NEXUS_LOG";
}

/// `http://127.0.0.1:8000`
pub fn backend_origin() -> String {
    format!("http://{}:{}", BACKEND_HOST, BACKEND_PORT)
}

/// How the host was launched. Fixed for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Packaged,
}

impl RuntimeMode {
    /// Debug builds run against the backend sources, release builds against the bundled binary
    pub fn detect() -> Self {
        if cfg!(debug_assertions) {
            RuntimeMode::Development
        } else {
            RuntimeMode::Packaged
        }
    }

    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "packaged" | "production" => Ok(RuntimeMode::Packaged),
            other => Err(anyhow!("unknown runtime mode `{}`", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }
}

/// Host settings resolved once at startup
#[derive(Clone, Debug)]
pub struct HostConfig {
    pub mode: RuntimeMode,
    pub platform: Platform,
    /// Repository root holding `backend/`, used in development mode only
    pub project_root: PathBuf,
    pub log_level: LevelFilter,
}

impl HostConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup(env_keys::RUNTIME_MODE) {
            Some(value) => RuntimeMode::parse(&value)
                .with_context(|| format!("invalid {}", env_keys::RUNTIME_MODE))?,
            None => RuntimeMode::detect(),
        };

        let project_root = lookup(env_keys::PROJECT_ROOT)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));

        let log_level = match lookup(env_keys::LOG_LEVEL) {
            Some(value) => value
                .trim()
                .parse::<LevelFilter>()
                .with_context(|| format!("invalid {} value `{}`", env_keys::LOG_LEVEL, value))?,
            None => LevelFilter::Info,
        };

        Ok(Self {
            mode,
            platform: Platform::current(),
            project_root,
            log_level,
        })
    }
}
