// SPDX-License-Identifier: GPL-3.0-only

//! Saving annotated frames to disk

use crate::errors::AppResult;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name for a snapshot taken now, e.g. `SCAN_20240131_093000.png`
pub fn snapshot_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("SCAN_{}.png", timestamp)
}

/// Write `frame` as PNG into `dir`, creating the directory if needed
///
/// Two snapshots within the same second get a numeric suffix instead of
/// overwriting each other.
pub fn save_snapshot(frame: &RgbImage, dir: &Path) -> AppResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let path = unique_path(dir, &snapshot_file_name());
    frame.save_with_format(&path, image::ImageFormat::Png)?;

    info!(path = %path.display(), "Snapshot saved");
    Ok(path)
}

fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = file_name.trim_end_matches(".png");
    (1..)
        .map(|n| dir.join(format!("{}_{}.png", stem, n)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
