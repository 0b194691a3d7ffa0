// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 device discovery
//!
//! Used by the `list` subcommand to show which `/dev/video*` indices can be
//! passed to the scanner.

use super::types::{CameraDevice, PixelFormat};
use tracing::debug;
use v4l::capability::Flags;
use v4l::prelude::*;
use v4l::video::Capture;

/// List every V4L2 node that can capture video
pub fn enumerate_cameras() -> Vec<CameraDevice> {
    let mut cameras: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .filter_map(|node| {
            let index = node.index();
            let path = node.path().to_string_lossy().to_string();
            let device = Device::new(index).ok()?;
            let caps = device.query_caps().ok()?;

            // Metadata nodes share the card name but cannot stream frames
            if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
                debug!(path = %path, "Skipping non-capture node");
                return None;
            }

            let formats = device
                .enum_formats()
                .map(|descs| descs.iter().map(|d| fourcc_label(&d.fourcc.repr)).collect::<Vec<_>>())
                .unwrap_or_default();

            Some(CameraDevice {
                index,
                name: node.name().unwrap_or(caps.card),
                path,
                formats,
            })
        })
        .collect();

    cameras.sort_by_key(|camera| camera.index);
    debug!(count = cameras.len(), "Enumerated V4L2 capture devices");
    cameras
}

/// Printable fourcc, marking formats the scanner can decode
pub fn fourcc_label(code: &[u8; 4]) -> String {
    let text = String::from_utf8_lossy(code).trim_end().to_string();
    if PixelFormat::from_fourcc(code).is_some() {
        format!("{}*", text)
    } else {
        text
    }
}
