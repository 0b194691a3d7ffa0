// SPDX-License-Identifier: MPL-2.0

//! Frame processor module
//!
//! Turns a captured frame into the list of symbols visible in it.
//! Currently implements QR code and EAN barcode detection.

pub mod tasks;
pub mod types;

pub use tasks::{CodeDetector, EanDetector, QrDetector};
pub use types::{BoundingRect, DecodedSymbol, PixelPoint, SymbolType, payload_to_text};
