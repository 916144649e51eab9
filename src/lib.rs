// Nexus Desktop - host process core
// Backend sidecar supervision and the request bridge used by the webview

pub mod bridge;
pub mod config;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod paths;
pub mod supervisor;

#[cfg(feature = "desktop")]
pub mod desktop;

pub use bridge::Bridge;
pub use config::{HostConfig, Platform, RuntimeMode};
pub use error::{RequestError, SupervisorError};
pub use gateway::{HttpMethod, RequestDescriptor, RequestGateway};
pub use lifecycle::{HostLifecycle, QuitTrigger, Startup};
pub use paths::SidecarDescriptor;
pub use supervisor::{BackendSupervisor, StopOutcome, SupervisorState};
