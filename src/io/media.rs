// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading.
//!
//! This module handles decoding photo files and producing the bounded
//! display copy shown on the edit canvas.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// A decoded photo in RGBA form, ready for texture upload.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            pixels: image.into_raw(),
        }
    }
}

/// Decode an image file at its native resolution.
pub fn decode_rgba(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).with_context(|| format!("Failed to decode image {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Resolve a photo source against the data directory.
pub fn resolve_source(base_dir: &Path, source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Downscale so that the longest edge is at most `max_edge`, keeping the
/// aspect ratio. Images already within bounds are returned unchanged.
pub fn display_copy(image: RgbaImage, max_edge: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest <= max_edge || max_edge == 0 {
        return image;
    }
    let scale = max_edge as f64 / longest as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    image::imageops::resize(&image, new_width, new_height, FilterType::Triangle)
}
