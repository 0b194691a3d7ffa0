// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scanning loop, driven by in-memory devices

use image::{Rgb, RgbImage};
use qr_scanner::app::scanner::{self, DisplaySurface, IDLE_STATUS, KeyPress, StopReason};
use qr_scanner::app::url_dispatch::UrlOpener;
use qr_scanner::backends::camera::FrameSource;
use qr_scanner::errors::{AppError, AppResult, CameraError, CameraResult};
use qr_scanner::ScannerConfig;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Serves a fixed list of frames, then fails like an unplugged camera
struct ScriptedSource {
    frames: VecDeque<RgbImage>,
    releases: Rc<Cell<u32>>,
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self) -> CameraResult<RgbImage> {
        self.frames.pop_front().ok_or(CameraError::Disconnected)
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

#[derive(Default, Clone)]
struct DisplayLog {
    shown: Rc<RefCell<Vec<(RgbImage, String)>>>,
    closes: Rc<Cell<u32>>,
}

struct ScriptedDisplay {
    log: DisplayLog,
    keys: VecDeque<KeyPress>,
    fail_show: bool,
}

impl DisplaySurface for ScriptedDisplay {
    fn show(&mut self, frame: &RgbImage, status: &str) -> AppResult<()> {
        if self.fail_show {
            return Err(AppError::Display("window vanished".to_string()));
        }
        self.log
            .shown
            .borrow_mut()
            .push((frame.clone(), status.to_string()));
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> AppResult<Option<KeyPress>> {
        Ok(self.keys.pop_front())
    }

    fn close(&mut self) {
        self.log.closes.set(self.log.closes.get() + 1);
    }
}

#[derive(Default, Clone)]
struct RecordingOpener {
    opened: Rc<RefCell<Vec<String>>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&mut self, url: &str) -> std::io::Result<()> {
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

struct Harness {
    config: ScannerConfig,
    releases: Rc<Cell<u32>>,
    log: DisplayLog,
    opener: RecordingOpener,
    _dir: tempfile::TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ScannerConfig {
            snapshot_dir: Some(dir.path().join("snapshots")),
            ..ScannerConfig::default()
        };
        Self {
            config,
            releases: Rc::new(Cell::new(0)),
            log: DisplayLog::default(),
            opener: RecordingOpener::default(),
            _dir: dir,
        }
    }

    fn run(
        &self,
        frames: Vec<RgbImage>,
        keys: Vec<KeyPress>,
        fail_show: bool,
        interrupted: bool,
    ) -> scanner::ScanOutcome {
        let source = ScriptedSource {
            frames: frames.into(),
            releases: self.releases.clone(),
        };
        let display = ScriptedDisplay {
            log: self.log.clone(),
            keys: keys.into(),
            fail_show,
        };
        scanner::run(
            || Ok(source),
            || Ok(display),
            self.opener.clone(),
            &self.config,
            Arc::new(AtomicBool::new(interrupted)),
        )
    }
}

fn blank(n: usize) -> Vec<RgbImage> {
    vec![RgbImage::from_pixel(64, 48, Rgb([255, 255, 255])); n]
}

/// White frame with an EAN-8 barcode for `digits` drawn across it
fn ean8_frame(digits: &str) -> RgbImage {
    const L: [[u8; 4]; 10] = [
        [3, 2, 1, 1],
        [2, 2, 2, 1],
        [2, 1, 2, 2],
        [1, 4, 1, 1],
        [1, 1, 3, 2],
        [1, 2, 3, 1],
        [1, 1, 1, 4],
        [1, 3, 1, 2],
        [1, 2, 1, 3],
        [3, 1, 1, 2],
    ];
    let digits: Vec<usize> = digits.bytes().map(|b| (b - b'0') as usize).collect();

    let mut modules = vec![true, false, true];
    for (half, first_dark) in [(&digits[..4], false), (&digits[4..], true)] {
        if first_dark {
            modules.extend([false, true, false, true, false]);
        }
        for &d in half {
            for (k, &w) in L[d].iter().enumerate() {
                let dark = (k % 2 == 0) == first_dark;
                modules.extend(std::iter::repeat_n(dark, w as usize));
            }
        }
    }
    modules.extend([true, false, true]);
    assert_eq!(modules.len(), 67);

    let (module_px, quiet, label_room) = (3u32, 10u32, 40u32);
    let width = (modules.len() as u32 + 2 * quiet) * module_px;
    RgbImage::from_fn(width, label_room + 40, |x, y| {
        let m = (x / module_px) as i64 - quiet as i64;
        let bar = y >= label_room && m >= 0 && (m as usize) < modules.len() && modules[m as usize];
        if bar { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
    })
}

/// White frame with one QR code per payload, side by side
fn qr_frame(payloads: &[&str]) -> RgbImage {
    let (module_px, quiet) = (5u32, 4u32);
    let codes: Vec<_> = payloads
        .iter()
        .map(|p| qrcode::QrCode::new(p.as_bytes()).unwrap())
        .collect();
    let cell = codes
        .iter()
        .map(|c| (c.width() as u32 + 2 * quiet) * module_px)
        .max()
        .unwrap();

    let mut frame = RgbImage::from_pixel(cell * codes.len() as u32, cell, Rgb([255, 255, 255]));
    for (slot, code) in codes.iter().enumerate() {
        let modules = code.width() as u32;
        let colors = code.to_colors();
        for (i, color) in colors.iter().enumerate() {
            if *color != qrcode::Color::Dark {
                continue;
            }
            let mx = i as u32 % modules + quiet;
            let my = i as u32 / modules + quiet;
            for dy in 0..module_px {
                for dx in 0..module_px {
                    let x = slot as u32 * cell + mx * module_px + dx;
                    frame.put_pixel(x, my * module_px + dy, Rgb([0, 0, 0]));
                }
            }
        }
    }
    frame
}

#[test]
fn test_open_failure_never_enters_loop() {
    let harness = Harness::new();
    let display_created = Cell::new(false);

    let outcome = scanner::run(
        || -> CameraResult<ScriptedSource> {
            Err(CameraError::InitializationFailed("no /dev/video0".to_string()))
        },
        || -> AppResult<ScriptedDisplay> {
            display_created.set(true);
            Err(AppError::Display("unreachable".to_string()))
        },
        harness.opener.clone(),
        &harness.config,
        Arc::new(AtomicBool::new(false)),
    );

    assert_eq!(outcome.exit_code(), 1);
    assert!(matches!(outcome.reason, StopReason::DeviceUnavailable(_)));
    assert_eq!(outcome.frames, 0);
    assert!(!display_created.get());
}

#[test]
fn test_read_failure_releases_once() {
    let harness = Harness::new();
    let outcome = harness.run(blank(3), Vec::new(), false, false);

    assert_eq!(
        outcome.reason,
        StopReason::CameraLost(CameraError::Disconnected)
    );
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.frames, 3);
    assert_eq!(harness.releases.get(), 1);
    assert_eq!(harness.log.closes.get(), 1);
    assert_eq!(harness.log.shown.borrow().len(), 3);
}

#[test]
fn test_quit_key_stops_cleanly() {
    let harness = Harness::new();
    let outcome = harness.run(
        blank(5),
        vec![KeyPress::Other, KeyPress::Quit],
        false,
        false,
    );

    assert_eq!(outcome.reason, StopReason::UserQuit);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.frames, 2);
    assert_eq!(harness.releases.get(), 1);
    assert_eq!(harness.log.closes.get(), 1);
}

#[test]
fn test_ctrl_c_key_interrupts() {
    let harness = Harness::new();
    let outcome = harness.run(blank(5), vec![KeyPress::Interrupt], false, false);

    assert_eq!(outcome.reason, StopReason::Interrupted);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(harness.releases.get(), 1);
}

#[test]
fn test_interrupt_signal_stops_before_next_read() {
    let harness = Harness::new();
    let outcome = harness.run(blank(5), Vec::new(), false, true);

    assert_eq!(outcome.reason, StopReason::Interrupted);
    assert_eq!(outcome.frames, 0);
    assert_eq!(harness.releases.get(), 1);
    assert_eq!(harness.log.closes.get(), 1);
}

#[test]
fn test_display_error_fails_with_status_one() {
    let harness = Harness::new();
    let outcome = harness.run(blank(5), Vec::new(), true, false);

    assert!(matches!(outcome.reason, StopReason::Failed(AppError::Display(_))));
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(harness.releases.get(), 1);
    assert_eq!(harness.log.closes.get(), 1);
}

#[test]
fn test_display_open_failure_releases_source() {
    let harness = Harness::new();
    let releases = harness.releases.clone();

    let outcome = scanner::run(
        || {
            Ok(ScriptedSource {
                frames: blank(1).into(),
                releases,
            })
        },
        || -> AppResult<ScriptedDisplay> { Err(AppError::Display("no tty".to_string())) },
        harness.opener.clone(),
        &harness.config,
        Arc::new(AtomicBool::new(false)),
    );

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.frames, 0);
    assert_eq!(harness.releases.get(), 1);
}

#[test]
fn test_frames_without_codes_are_shown_unchanged() {
    let harness = Harness::new();
    let mut frame = RgbImage::from_pixel(64, 48, Rgb([200, 210, 220]));
    frame.put_pixel(5, 5, Rgb([1, 2, 3]));

    harness.run(vec![frame.clone(); 2], Vec::new(), false, false);

    let shown = harness.log.shown.borrow();
    assert_eq!(shown.len(), 2);
    for (image, status) in shown.iter() {
        assert_eq!(image, &frame);
        assert_eq!(status, IDLE_STATUS);
    }
    assert!(harness.opener.opened.borrow().is_empty());
}

#[test]
fn test_barcode_is_annotated_but_not_opened() {
    let harness = Harness::new();
    let frame = ean8_frame("96385074");

    harness.run(vec![frame.clone()], Vec::new(), false, false);

    let shown = harness.log.shown.borrow();
    assert_eq!(shown.len(), 1);
    assert_ne!(shown[0].0, frame, "overlay should be drawn on the frame");
    assert!(harness.opener.opened.borrow().is_empty());
}

#[test]
fn test_snapshot_key_saves_annotated_frame() {
    let harness = Harness::new();
    harness.run(blank(2), vec![KeyPress::Snapshot], false, false);

    let dir = harness.config.snapshot_directory();
    let saved: Vec<_> = std::fs::read_dir(&dir).unwrap().flatten().collect();
    assert_eq!(saved.len(), 1);
    let name = saved[0].file_name().to_string_lossy().to_string();
    assert!(name.starts_with("SCAN_") && name.ends_with(".png"));

    // The status line reports the save from the next frame on
    let shown = harness.log.shown.borrow();
    assert!(shown[1].1.starts_with("Saved: "));
}

#[test]
fn test_url_code_opened_on_every_frame() {
    let harness = Harness::new();
    let frame = qr_frame(&["https://example.com"]);

    let outcome = harness.run(vec![frame; 3], Vec::new(), false, false);

    assert_eq!(outcome.frames, 3);
    assert_eq!(
        *harness.opener.opened.borrow(),
        vec!["https://example.com"; 3]
    );
    for (_, status) in harness.log.shown.borrow().iter() {
        assert_eq!(status, "Opening URL: https://example.com");
    }
}

#[test]
fn test_every_url_in_frame_is_announced() {
    let harness = Harness::new();
    let frame = qr_frame(&["https://a.example", "https://b.example"]);

    harness.run(vec![frame], Vec::new(), false, false);

    let mut opened = harness.opener.opened.borrow().clone();
    opened.sort();
    assert_eq!(opened, vec!["https://a.example", "https://b.example"]);

    let shown = harness.log.shown.borrow();
    let status = &shown[0].1;
    assert!(status.contains("Opening URL: https://a.example"), "{}", status);
    assert!(status.contains("Opening URL: https://b.example"), "{}", status);
}

#[test]
fn test_ftp_code_is_not_opened() {
    let harness = Harness::new();
    harness.run(vec![qr_frame(&["ftp://example.com"])], Vec::new(), false, false);

    assert!(harness.opener.opened.borrow().is_empty());
    assert_eq!(harness.log.shown.borrow()[0].1, IDLE_STATUS);
}
