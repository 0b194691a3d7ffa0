// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser)]
#[command(name = "qr-scanner")]
#[command(about = "Scan QR codes and barcodes from a webcam")]
#[command(version = qr_scanner::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the live camera feed (default)
    Scan,

    /// List available cameras
    List,

    /// Decode the codes in a still image
    Decode {
        /// Image file to scan
        image: PathBuf,

        /// Write the annotated image here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qr_scanner=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Scan) => cli::run_scan(),
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Decode { image, output }) => cli::decode_image(&image, output.as_deref()),
    }
}
