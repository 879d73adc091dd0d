// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label text rasterization.
//!
//! Glyph coverage from `ab_glyph` is blended source-over into a premultiplied
//! `tiny_skia` pixmap.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Name of the egui bundled proportional font used when no font is configured.
const BUNDLED_FONT: &str = "Ubuntu-Light";

/// Load the font bundled with egui.
pub fn bundled_font() -> Result<FontArc> {
    let definitions = egui::FontDefinitions::default();
    let data = definitions
        .font_data
        .get(BUNDLED_FONT)
        .ok_or_else(|| anyhow!("Bundled font {} is not available", BUNDLED_FONT))?;
    FontArc::try_from_vec(data.font.to_vec()).map_err(|e| anyhow!("Invalid bundled font: {}", e))
}

/// Load a TrueType/OpenType font from disk.
pub fn load_font(path: &Path) -> Result<FontArc> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    FontArc::try_from_vec(bytes).map_err(|e| anyhow!("Invalid font {}: {}", path.display(), e))
}

/// Pixel scale for a CSS-style font size (em height in pixels).
fn em_scale(font: &FontArc, font_size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units_per_em) if units_per_em > 0.0 => {
            PxScale::from(font_size * font.height_unscaled() / units_per_em)
        }
        _ => PxScale::from(font_size),
    }
}

/// Draw a single line of text with its left/baseline origin at
/// (`origin_x`, `origin_y`).
pub fn draw_text(
    pixmap: &mut Pixmap,
    font: &FontArc,
    text: &str,
    font_size: f32,
    origin_x: f32,
    origin_y: f32,
    color: [u8; 4],
) {
    if font_size <= 0.0 || !font_size.is_finite() {
        return;
    }
    let scale = em_scale(font, font_size);
    let scaled = font.as_scaled(scale);
    let width = pixmap.width() as i64;
    let height = pixmap.height() as i64;

    let mut cursor_x = origin_x;
    let mut last: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(cursor_x, origin_y));
        cursor_x += scaled.h_advance(id);
        last = Some(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            // Whitespace has no outline
            continue;
        };
        let bounds = outlined.px_bounds();
        let base_x = bounds.min.x as i64;
        let base_y = bounds.min.y as i64;

        let pixels = pixmap.pixels_mut();
        outlined.draw(|gx, gy, coverage| {
            let x = base_x + gx as i64;
            let y = base_y + gy as i64;
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let index = (y * width + x) as usize;
            pixels[index] = blend_over(pixels[index], color, coverage);
        });
    }
}

/// Source-over blend of a straight-alpha colour at `coverage` onto a
/// premultiplied destination pixel.
fn blend_over(dst: PremultipliedColorU8, color: [u8; 4], coverage: f32) -> PremultipliedColorU8 {
    let alpha = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return dst;
    }
    let inv = 1.0 - alpha;
    let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * inv).round().clamp(0.0, 255.0) as u8;

    let r = mix(color[0], dst.red());
    let g = mix(color[1], dst.green());
    let b = mix(color[2], dst.blue());
    let a = (255.0 * alpha + dst.alpha() as f32 * inv).round().clamp(0.0, 255.0) as u8;

    PremultipliedColorU8::from_rgba(r.min(a), g.min(a), b.min(a), a).unwrap_or(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_font_loads() {
        let font = bundled_font().unwrap();
        assert!(font.glyph_id('L') != GlyphId(0));
    }

    #[test]
    fn test_whitespace_draws_nothing() {
        let font = bundled_font().unwrap();
        let mut pixmap = Pixmap::new(100, 50).unwrap();
        draw_text(&mut pixmap, &font, "   ", 24.0, 10.0, 30.0, [0, 0, 0, 255]);
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_text_sits_on_baseline() {
        let font = bundled_font().unwrap();
        let mut pixmap = Pixmap::new(200, 100).unwrap();
        draw_text(&mut pixmap, &font, "HH", 32.0, 20.0, 60.0, [0, 0, 0, 255]);

        let mut min_x = u32::MAX;
        let mut max_y = 0;
        let mut painted = 0;
        for y in 0..100 {
            for x in 0..200 {
                if let Some(px) = pixmap.pixel(x, y) {
                    if px.alpha() > 128 {
                        painted += 1;
                        min_x = min_x.min(x);
                        max_y = max_y.max(y);
                    }
                }
            }
        }

        assert!(painted > 0);
        // Capital H has no descender, so ink stays above the baseline
        assert!(max_y <= 61);
        assert!(min_x >= 19);
    }

    #[test]
    fn test_blend_full_coverage_replaces() {
        let dst = PremultipliedColorU8::from_rgba(0, 0, 0, 0).unwrap();
        let out = blend_over(dst, [255, 0, 0, 255], 1.0);
        assert_eq!((out.red(), out.green(), out.blue(), out.alpha()), (255, 0, 0, 255));
    }
}
