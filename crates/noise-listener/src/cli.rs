use std::path::PathBuf;

use clap::Parser;

/// Listen on a microphone, log taps, and record sustained noise to WAV.
#[derive(Debug, Parser)]
#[command(name = "noise-listener", version, about)]
pub struct Cli {
    /// Configuration file (default: platform config directory).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print available input devices and exit.
    #[arg(long)]
    pub list_devices: bool,

    /// Input device name, overriding the config file.
    #[arg(short, long, value_name = "NAME")]
    pub device: Option<String>,

    /// Directory for recorded episodes, overriding the config file.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Adapt the noise threshold to the environment.
    #[arg(long)]
    pub auto_adjust: bool,
}
