// SPDX-License-Identifier: MPL-2.0

//! QR Scanner - live QR code and barcode scanning from a V4L2 camera
//!
//! Frames are captured from a webcam, searched for QR codes and EAN
//! barcodes, annotated with outlines and labels, and shown in the terminal.
//! URL payloads are opened in the system browser.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Detection, overlay, URL dispatch and the scanning loop
//! - [`backends`]: Camera capture abstraction
//! - [`terminal`]: Terminal display surface
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let frame = image::open("code.png")?.to_rgb8();
//! for symbol in qr_scanner::CodeDetector::default().detect(&frame) {
//!     println!("{}", symbol.label());
//! }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::frame_processor::{CodeDetector, DecodedSymbol, SymbolType};
pub use app::{ScanOutcome, StopReason};
pub use config::ScannerConfig;
pub use errors::{AppError, AppResult, CameraError};
