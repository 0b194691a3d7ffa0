// SPDX-License-Identifier: GPL-3.0-only

//! Live scanning loop
//!
//! One iteration pulls a frame, decodes symbols, opens URL payloads, draws
//! the overlay, shows the result and polls the keyboard for about a
//! millisecond. Everything runs sequentially on the calling thread.
//!
//! The loop has two states. It is running from the moment the frame source
//! opens until one of these stops it:
//!
//! - a frame read fails ([`StopReason::CameraLost`])
//! - `q` is pressed ([`StopReason::UserQuit`])
//! - Ctrl+C, as a key or as SIGINT ([`StopReason::Interrupted`])
//! - any other error ([`StopReason::Failed`])
//!
//! Every stop path releases the frame source exactly once and closes the
//! display before [`run`] returns.

use crate::app::frame_processor::CodeDetector;
use crate::app::overlay;
use crate::app::snapshot;
use crate::app::url_dispatch::{UrlDispatcher, UrlOpener};
use crate::backends::camera::{FrameSource, SourceGuard};
use crate::config::ScannerConfig;
use crate::constants::KEY_POLL_TIMEOUT;
use crate::errors::{AppError, AppResult, CameraError, CameraResult};
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Hint shown in the status line until something more useful replaces it
pub const IDLE_STATUS: &str = "Press 'q' to exit. | 'p' snapshot";

/// Separator between notices sharing the status line
const NOTICE_SEPARATOR: &str = " | ";

/// Keys the loop reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Quit,
    Interrupt,
    Snapshot,
    Other,
}

/// Where annotated frames are shown
pub trait DisplaySurface {
    /// Present a frame with a one-line status message
    fn show(&mut self, frame: &RgbImage, status: &str) -> AppResult<()>;

    /// Wait up to `timeout` for a key press
    fn poll_key(&mut self, timeout: Duration) -> AppResult<Option<KeyPress>>;

    /// Tear the surface down. Must be safe to call more than once.
    fn close(&mut self);
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The frame source could not be opened; the loop never started
    DeviceUnavailable(CameraError),
    /// A frame read failed, treated as end of stream
    CameraLost(CameraError),
    /// `q` was pressed
    UserQuit,
    /// Ctrl+C or SIGINT
    Interrupted,
    /// Unexpected error inside the loop
    Failed(AppError),
}

impl StopReason {
    /// Process exit status for this stop
    ///
    /// Losing the camera is end of stream, not an error, so it exits 0 like a
    /// normal quit.
    pub fn exit_code(&self) -> u8 {
        match self {
            StopReason::DeviceUnavailable(_) | StopReason::Failed(_) => 1,
            StopReason::CameraLost(_) | StopReason::UserQuit | StopReason::Interrupted => 0,
        }
    }
}

/// Result of a scanning session
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub reason: StopReason,
    /// Frames read successfully
    pub frames: u64,
}

impl ScanOutcome {
    pub fn exit_code(&self) -> u8 {
        self.reason.exit_code()
    }
}

/// Per-session state of the loop
pub struct Scanner<O> {
    detector: CodeDetector,
    dispatcher: UrlDispatcher<O>,
    snapshot_dir: PathBuf,
    interrupt: Arc<AtomicBool>,
    status: String,
    frames: u64,
}

impl<O: UrlOpener> Scanner<O> {
    pub fn new(config: &ScannerConfig, opener: O, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            detector: CodeDetector::new(config.scanline_step),
            dispatcher: UrlDispatcher::new(opener, config.open_urls, config.dedupe_urls),
            snapshot_dir: config.snapshot_directory(),
            interrupt,
            status: IDLE_STATUS.to_string(),
            frames: 0,
        }
    }

    /// Run until something stops the loop
    pub fn run_loop<S: FrameSource, D: DisplaySurface>(
        &mut self,
        source: &mut SourceGuard<S>,
        display: &mut D,
    ) -> StopReason {
        loop {
            match self.step(source, display) {
                Ok(None) => {}
                Ok(Some(reason)) => return reason,
                Err(err) => {
                    error!(error = %err, frames = self.frames, "Scanner loop failed");
                    return StopReason::Failed(err);
                }
            }
        }
    }

    /// One acquire, detect, dispatch, annotate, show, poll iteration
    fn step<S: FrameSource, D: DisplaySurface>(
        &mut self,
        source: &mut SourceGuard<S>,
        display: &mut D,
    ) -> AppResult<Option<StopReason>> {
        if self.interrupt.load(Ordering::SeqCst) {
            return Ok(Some(StopReason::Interrupted));
        }

        let frame = match source.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, frames = self.frames, "Frame read failed");
                return Ok(Some(StopReason::CameraLost(err)));
            }
        };
        self.frames += 1;

        let symbols = self.detector.detect(&frame);
        if !symbols.is_empty() {
            debug!(frame = self.frames, count = symbols.len(), "Symbols decoded");
        }

        // Every URL opened this frame gets its notice
        let notices = self.dispatcher.dispatch(&symbols);
        if !notices.is_empty() {
            self.status = notices.join(NOTICE_SEPARATOR);
        }

        let annotated = overlay::annotate(frame, &symbols);
        display.show(&annotated, &self.status)?;

        match display.poll_key(KEY_POLL_TIMEOUT)? {
            Some(KeyPress::Quit) => Ok(Some(StopReason::UserQuit)),
            Some(KeyPress::Interrupt) => Ok(Some(StopReason::Interrupted)),
            Some(KeyPress::Snapshot) => {
                self.status = match snapshot::save_snapshot(&annotated, &self.snapshot_dir) {
                    Ok(path) => format!("Saved: {}", path.display()),
                    Err(err) => {
                        error!(error = %err, "Failed to save snapshot");
                        format!("Error: {}", err)
                    }
                };
                Ok(None)
            }
            Some(KeyPress::Other) | None => Ok(None),
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Open the frame source, run the loop and clean up
///
/// `open_source` is called first; if it fails the display is never created
/// and the outcome is [`StopReason::DeviceUnavailable`].
pub fn run<S, D, O>(
    open_source: impl FnOnce() -> CameraResult<S>,
    open_display: impl FnOnce() -> AppResult<D>,
    opener: O,
    config: &ScannerConfig,
    interrupt: Arc<AtomicBool>,
) -> ScanOutcome
where
    S: FrameSource,
    D: DisplaySurface,
    O: UrlOpener,
{
    let mut source = match open_source() {
        Ok(source) => SourceGuard::new(source),
        Err(err) => {
            error!(error = %err, device_index = config.device_index, "Could not open camera");
            return ScanOutcome {
                reason: StopReason::DeviceUnavailable(err),
                frames: 0,
            };
        }
    };

    let mut display = match open_display() {
        Ok(display) => display,
        Err(err) => {
            source.release();
            return ScanOutcome {
                reason: StopReason::Failed(err),
                frames: 0,
            };
        }
    };

    info!(device_index = config.device_index, "Scanner running");
    let mut scanner = Scanner::new(config, opener, interrupt);
    let reason = scanner.run_loop(&mut source, &mut display);

    source.release();
    display.close();

    info!(reason = ?reason, frames = scanner.frames(), "Scanner stopped");
    ScanOutcome {
        reason,
        frames: scanner.frames(),
    }
}
