mod app;
mod countdown_font;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use showdown_core::{
    catalog::{CustomLegendStore, CustomLegendWatcher},
    config::{self, AppConfig},
    settings::{settings_path, SettingsStore},
    LegendCatalog,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    if let Err(err) = config::ensure_default_config() {
        warn!(?err, "Could not write default configuration");
    }
    let config = AppConfig::load()?;
    info!(data_dir = %config.data_dir.display(), "Configuration loaded");

    let settings_file = settings_path(&config.data_dir);
    let settings = SettingsStore::open(&settings_file).unwrap_or_else(|err| {
        warn!(?err, "Settings unreadable; using defaults");
        SettingsStore::with_defaults(&settings_file)
    });

    let legends_file = CustomLegendStore::default_path(&config.data_dir);
    let custom_legends = CustomLegendStore::open(&legends_file).unwrap_or_else(|err| {
        warn!(?err, "Custom legends unreadable; starting empty");
        CustomLegendStore::empty(&legends_file)
    });
    let catalog = LegendCatalog::with_builtin(custom_legends.legends());

    let (legend_tx, legend_rx) = mpsc::channel(8);
    let watcher = match CustomLegendWatcher::spawn(&legends_file, legend_tx) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            warn!(?err, "Custom legend file will not be watched");
            None
        }
    };

    let mut app = app::ShowdownApp::new(config, catalog, custom_legends, settings);
    if let Some(watcher) = watcher {
        app.attach_legend_watch(watcher, legend_rx);
    }
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("showdown.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout belongs to the terminal UI, so only the file layer is installed.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
