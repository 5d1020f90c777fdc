// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use skiff::config::ShellConfig;
use skiff::error::SkiffError;
use skiff::logger::initialize as LoggerInitialize;
use skiff::renderer::headless_factory;
use skiff::supervisor::Supervisor;

use shell_core::event_loop::EventLoop;
use shell_core::window::WindowManager;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::mpsc;

use log::{debug, info};

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), SkiffError> {
    let config_path = std::env::var_os("SKIFF_CONFIG").map(PathBuf::from);
    let config = ShellConfig::load(config_path.as_deref())?;

    let log_dir = config.log_dir();
    create_dir_all(&log_dir).map_err(|e| SkiffError::Skiff {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Skiff shell starting");
    info!("Log directory: {}", log_dir.display());

    let event_loop =
        EventLoop::new().map_err(|e| SkiffError::core("Failed to build event loop", e))?;
    event_loop
        .start()
        .map_err(|e| SkiffError::core("Failed to start event loop", e))?;

    let windows = WindowManager::new(event_loop.clone(), headless_factory());
    let window = windows
        .create_window(config.window_options(0))
        .map_err(|e| SkiffError::core("Failed to create main window", e))?;

    window.set_message_hook(|source| {
        debug!("Unhandled bridge message: {source}");
        false
    });

    windows.show_window(0);
    info!("Main window ready: {:?}", config.title);

    // Exit flows: window exit hook and Ctrl-C both funnel through the
    // supervisor, which delivers on the event loop; the main thread
    // parks on the channel until then.
    let supervisor = Supervisor::new(event_loop.clone());
    let (exit_tx, exit_rx) = mpsc::channel();
    supervisor.set_exit_callback(move |code| {
        let _ = exit_tx.send(code);
    });

    {
        let supervisor = supervisor.clone();
        window.set_exit_hook(move |code| supervisor.exit(code));
    }

    supervisor.listen_for_signals()?;

    let code = exit_rx.recv().unwrap_or(0);
    info!("Shutting down with code {code}");

    windows.destroy();
    event_loop.stop();

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
