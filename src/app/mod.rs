// SPDX-License-Identifier: MPL-2.0

//! Scanner application logic
//!
//! # Architecture
//!
//! - `frame_processor`: QR and EAN detection, decoded symbol types
//! - `overlay`: Outlines and labels drawn onto frames
//! - `url_dispatch`: Opening URL payloads in the browser
//! - `scanner`: The capture loop and its stop reasons
//! - `snapshot`: Saving annotated frames
//!
//! # Main Types
//!
//! - `Scanner`: Loop state (detector, dispatcher, status line)
//! - `DisplaySurface`: Where annotated frames are shown
//! - `StopReason`: Why the loop ended, and the exit status that follows

pub mod frame_processor;
pub mod overlay;
pub mod scanner;
pub mod snapshot;
pub mod url_dispatch;

pub use scanner::{DisplaySurface, KeyPress, ScanOutcome, Scanner, StopReason};
pub use url_dispatch::{SystemBrowser, UrlDispatcher, UrlOpener};
