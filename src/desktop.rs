// Nexus Desktop - Tauri v2 shell
// Wires the lifecycle, the UI bridge commands and the window together

use crate::bridge::Bridge;
use crate::config::{HostConfig, RuntimeMode};
use crate::gateway::{RequestDescriptor, RequestGateway};
use crate::lifecycle::{quits_when_windows_closed, HostLifecycle, QuitTrigger};
use crate::logging::{self, LogSink};
use crate::supervisor::BackendSupervisor;
use anyhow::Context;
use log::info;
use serde_json::Value;
use std::sync::Arc;
use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, Manager, RunEvent, State, WebviewUrl, WebviewWindowBuilder};

const MAIN_WINDOW: &str = "main";

/// Forward a backend request from the UI
#[tauri::command]
async fn api_request(
    bridge: State<'_, Bridge>,
    request: RequestDescriptor,
) -> Result<Value, String> {
    bridge.request(request).await.map_err(|e| e.to_string())
}

/// Application version
#[tauri::command]
async fn app_get_version(bridge: State<'_, Bridge>) -> Result<String, String> {
    Ok(bridge.version().to_string())
}

fn present_main_window(app: &AppHandle, mode: RuntimeMode) -> tauri::Result<()> {
    if let Some(window) = app.get_webview_window(MAIN_WINDOW) {
        return window.show();
    }

    let builder = WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::App("index.html".into()))
        .title("Nexus")
        .inner_size(1400.0, 900.0)
        .min_inner_size(1200.0, 700.0)
        // shown once the page has loaded
        .visible(false);

    #[cfg(target_os = "macos")]
    let builder = builder
        .title_bar_style(tauri::TitleBarStyle::Overlay)
        .hidden_title(true);

    let window = builder.build()?;

    #[cfg(debug_assertions)]
    {
        if mode == RuntimeMode::Development {
            window.open_devtools();
        }
    }
    #[cfg(not(debug_assertions))]
    let _ = (window, mode);

    Ok(())
}

fn shutdown(app: &AppHandle, trigger: QuitTrigger) {
    if let Some(lifecycle) = app.try_state::<HostLifecycle>() {
        tauri::async_runtime::block_on(lifecycle.on_quit(trigger));
    }
}

pub fn run() -> anyhow::Result<()> {
    let config = HostConfig::from_env().context("Failed to load host configuration")?;
    let supervisor = Arc::new(BackendSupervisor::new(Arc::new(LogSink)));
    let platform = config.platform;

    let app = tauri::Builder::default()
        .plugin(logging::plugin(config.log_level))
        .setup(move |app| {
            let sidecar_root = match config.mode {
                RuntimeMode::Development => config.project_root.clone(),
                RuntimeMode::Packaged => app.path().resource_dir()?,
            };

            let version = app.package_info().version.to_string();
            info!("[Tauri] Nexus {} starting in {:?} mode", version, config.mode);
            app.manage(Bridge::new(RequestGateway::new(), version));

            let lifecycle =
                HostLifecycle::new(supervisor, RequestGateway::new(), config.mode, sidecar_root);
            // degraded startup still presents the UI
            tauri::async_runtime::block_on(lifecycle.on_ready());
            app.manage(lifecycle);

            present_main_window(app.handle(), config.mode)?;
            Ok(())
        })
        .on_page_load(|webview, payload| {
            if matches!(payload.event(), PageLoadEvent::Finished) {
                if let Err(e) = webview.window().show() {
                    log::error!("[Tauri] Failed to show window: {}", e);
                }
            }
        })
        .on_window_event(|window, event| {
            if let tauri::WindowEvent::CloseRequested { .. } = event {
                if window.label() == MAIN_WINDOW {
                    info!("[Tauri] Window close requested, shutting down backend...");
                    shutdown(window.app_handle(), QuitTrigger::MainWindowClosing);
                }
            }
        })
        .invoke_handler(tauri::generate_handler![api_request, app_get_version])
        .build(tauri::generate_context!())
        .context("Failed to build the Tauri application")?;

    app.run(move |app_handle, event| match event {
        RunEvent::ExitRequested { code: None, api, .. } => {
            shutdown(app_handle, QuitTrigger::AllWindowsClosed);
            if !quits_when_windows_closed(platform) {
                api.prevent_exit();
            }
        }
        RunEvent::ExitRequested { .. } => shutdown(app_handle, QuitTrigger::BeforeQuit),
        RunEvent::Exit => shutdown(app_handle, QuitTrigger::Exit),
        #[cfg(target_os = "macos")]
        RunEvent::Reopen {
            has_visible_windows: false,
            ..
        } => {
            // The backend stays down; requests fail until the app is relaunched
            let mode = app_handle.state::<HostLifecycle>().mode();
            if let Err(e) = present_main_window(app_handle, mode) {
                log::error!("[Tauri] Failed to reopen window: {}", e);
            }
        }
        _ => {}
    });

    Ok(())
}
