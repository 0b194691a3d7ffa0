// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the scanner
//!
//! This module provides command-line functionality for:
//! - Scanning the live camera feed
//! - Listing available cameras
//! - Decoding codes in a still image

use qr_scanner::app::overlay;
use qr_scanner::app::scanner::{self, ScanOutcome, StopReason};
use qr_scanner::app::url_dispatch::SystemBrowser;
use qr_scanner::backends::camera::V4l2FrameSource;
use qr_scanner::backends::camera::v4l2_utils::enumerate_cameras;
use qr_scanner::errors::{AppError, AppResult};
use qr_scanner::terminal::TerminalDisplay;
use qr_scanner::{CodeDetector, ScannerConfig};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Run the live scanner until the camera stops or the user exits
pub fn run_scan() -> ExitCode {
    let config = match ScannerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Unexpected error: {}", e);
            return ExitCode::from(1);
        }
    };

    // Set up Ctrl+C handler
    let interrupt = Arc::new(AtomicBool::new(false));
    let interrupt_clone = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        interrupt_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl+C handler");
    }

    let device_index = config.device_index as usize;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        scanner::run(
            || V4l2FrameSource::open(device_index, config.frame_width, config.frame_height),
            || TerminalDisplay::open(&config.window_title),
            SystemBrowser,
            &config,
            interrupt,
        )
    }));

    let outcome = result.unwrap_or_else(|payload| ScanOutcome {
        reason: StopReason::Failed(AppError::Other(panic_message(payload.as_ref()))),
        frames: 0,
    });
    report_outcome(&outcome);
    ExitCode::from(outcome.exit_code())
}

/// Print the console line for how the session ended
fn report_outcome(outcome: &ScanOutcome) {
    info!(frames = outcome.frames, reason = ?outcome.reason, "Scan finished");
    match &outcome.reason {
        StopReason::DeviceUnavailable(_) => eprintln!("Error: Could not open webcam."),
        StopReason::CameraLost(_) => eprintln!("Error: Failed to capture frame from camera."),
        StopReason::UserQuit => {}
        StopReason::Interrupted => println!("Exiting..."),
        StopReason::Failed(e) => eprintln!("Unexpected error: {}", e),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}

/// List all available cameras
pub fn list_cameras() -> ExitCode {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return ExitCode::SUCCESS;
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {} ({})", camera.index, camera.name, camera.path);
        if !camera.formats.is_empty() {
            println!("      Formats: {}", camera.formats.join(", "));
        }
    }
    println!();
    println!("Formats marked * can be scanned. Set device_index in the config to choose a camera.");

    ExitCode::SUCCESS
}

/// Decode every code in a still image and optionally save the annotated copy
pub fn decode_image(image_path: &Path, output: Option<&Path>) -> ExitCode {
    match decode_image_inner(image_path, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn decode_image_inner(image_path: &Path, output: Option<&Path>) -> AppResult<()> {
    let config = ScannerConfig::load()?;
    let frame = image::open(image_path)?.to_rgb8();

    let symbols = CodeDetector::new(config.scanline_step).detect(&frame);
    if symbols.is_empty() {
        println!("No codes found.");
    }
    for symbol in &symbols {
        println!("{}", symbol.label());
    }

    if let Some(output) = output {
        let annotated = overlay::annotate(frame, &symbols);
        annotated.save(output)?;
        println!("Annotated image saved: {}", output.display());
    }

    Ok(())
}
