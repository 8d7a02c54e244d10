use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use booklights_lib::refresh::scheduler::spawn_refresh_timer;
use booklights_lib::refresh::watcher::NoteWatcher;
use booklights_lib::{FsVault, HighlightService, Settings, TextSurface, ViewState};

/// Show random book highlights from a markdown vault
#[derive(Debug, Parser)]
#[command(name = "booklights", version, about)]
struct Cli {
    /// Vault directory to scan
    vault: PathBuf,

    /// Settings file (defaults to <VAULT>/.booklights/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh once, print, and exit
    #[arg(long)]
    once: bool,

    /// Write the default settings file and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("booklights: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Settings::default_path(&cli.vault));

    if cli.write_default_config {
        Settings::default().save(&config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    let settings = Settings::load(&config_path)?;
    let vault = FsVault::new(&cli.vault)?;
    let watch_root = vault.folder_path(settings.folder_prefix());
    let surface = Arc::new(TextSurface::new(io::stdout()));
    let service = Arc::new(
        HighlightService::new(Arc::new(vault), settings.clone()).with_surface(surface),
    );

    if cli.once {
        service.refresh();
        return match service.state() {
            ViewState::Failed { message } => Err(message),
            _ => Ok(()),
        };
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    runtime.block_on(async move {
        let initial = Arc::clone(&service);
        if let Err(e) = tokio::task::spawn_blocking(move || initial.refresh()).await {
            log::error!("Initial refresh failed: {}", e);
        }

        let mut timer = None;
        let mut _watcher = None;
        if settings.auto_refresh {
            timer = spawn_refresh_timer(
                Arc::clone(&service),
                Duration::from_secs(settings.refresh_interval_seconds),
            );

            let trigger = service.refresh_trigger();
            match NoteWatcher::start(&watch_root, move |_paths| trigger()) {
                Ok(w) => _watcher = Some(w),
                Err(e) => log::warn!("Live updates disabled: {}", e),
            }
        }

        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
        }

        if let Some(timer) = timer {
            timer.abort();
        }
        log::info!("Shutting down");
    });

    Ok(())
}
