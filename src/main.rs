// Nexus Desktop - Tauri v2
// Main entry point

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
    if let Err(e) = nexus_desktop::desktop::run() {
        eprintln!("[Tauri] Fatal: {:#}", e);
        std::process::exit(1);
    }
}
