// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Hex colour strings as stored on annotation records.

/// Default annotation colour (red).
pub const DEFAULT_COLOR: &str = "#ff0000";

/// Swatch offered by the annotate tool bar.
pub const SWATCH: [&str; 8] = [
    "#ff0000", // Red
    "#0000ff", // Blue
    "#ffff00", // Yellow
    "#000000", // Black
    "#00ff00", // Green
    "#ff8800", // Orange
    "#ff00ff", // Magenta
    "#ffffff", // White
];

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into straight (non-premultiplied) RGBA.
pub fn parse_hex(color: &str) -> Option<[u8; 4]> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let r = channel(&hex[0..2])?;
            let g = channel(&hex[2..4])?;
            let b = channel(&hex[4..6])?;
            let a = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some([r, g, b, a])
        }
        _ => None,
    }
}

/// Convert to an egui colour for swatch buttons.
pub fn to_color32(color: &str) -> egui::Color32 {
    let [r, g, b, a] = parse_hex(color).unwrap_or([255, 0, 0, 255]);
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}
