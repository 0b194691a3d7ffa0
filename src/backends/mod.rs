// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  App Layer                   │
//! └────────────────────┬────────────────────────┘
//!                      │ FrameSource
//! ┌────────────────────┴────────────────────────┐
//! │              Camera Backend                  │
//! │                  (V4L2)                      │
//! └─────────────────────────────────────────────┘
//! ```

pub mod camera;
