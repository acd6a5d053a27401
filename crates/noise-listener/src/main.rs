//! Noise-Listener: logs taps and records sustained noise from a microphone.

mod app;
mod cli;
mod config;
mod error;
mod worker_sink;

pub(crate) use {
    app::App,
    cli::Cli,
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use clap::Parser;
use noise_listener_core::devices;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "noise_listener=info,noise_listener_core=info";

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    if cli.list_devices {
        match devices::list_input_devices() {
            Ok(names) => {
                for (index, name) in names.iter().enumerate() {
                    let marker = if devices::is_input_like(name) { " *" } else { "" };
                    println!("Device {}: {}{}", index, name, marker);
                }
            }
            Err(e) => {
                error!("Failed to list input devices: {:?}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };
    config.apply_cli(&cli);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(App::new(config).run()) {
        error!(error = ?e, "App error");
        std::process::exit(1);
    }
}
