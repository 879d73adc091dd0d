// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation renderer.
//!
//! Replays an ordered annotation list onto a raster of any size. The same
//! renderer draws the live edit-canvas overlay and the native-resolution
//! export, so both outputs agree pixel for pixel up to scale.

pub mod text;

use crate::models::annotation::{Annotation, Label, Stroke};
use crate::util::color;
use crate::util::geometry::{ScaleTransform, Size};
use ab_glyph::FontArc;
use anyhow::{anyhow, Result};
use image::RgbaImage;
use std::path::Path;
use tiny_skia::{ColorU8, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Transform};

/// Draws strokes and labels onto pixmaps.
#[derive(Clone)]
pub struct Renderer {
    font: FontArc,
}

impl Renderer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Renderer using the configured font, or the bundled font when none is
    /// configured or the configured one cannot be loaded.
    pub fn from_font_path(font_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = font_path {
            match text::load_font(path) {
                Ok(font) => return Ok(Self::new(font)),
                Err(e) => log::warn!("{:#}; falling back to the bundled font", e),
            }
        }
        Ok(Self::new(text::bundled_font()?))
    }

    /// Draw `annotations` in order over the current contents of `target`.
    pub fn render(&self, target: &mut Pixmap, annotations: &[Annotation]) {
        for annotation in annotations {
            match annotation {
                Annotation::Stroke(stroke) => self.draw_stroke(target, stroke),
                Annotation::Label(label) => self.draw_label(target, label),
            }
        }
    }

    /// Draw `annotations` after mapping them through `transform`.
    pub fn render_with(&self, target: &mut Pixmap, annotations: &[Annotation], transform: &ScaleTransform) {
        if transform.is_identity() {
            self.render(target, annotations);
            return;
        }
        for annotation in annotations {
            match transform.apply_annotation(annotation) {
                Annotation::Stroke(stroke) => self.draw_stroke(target, &stroke),
                Annotation::Label(label) => self.draw_label(target, &label),
            }
        }
    }

    fn draw_stroke(&self, target: &mut Pixmap, stroke: &Stroke) {
        // A tap without a drag covers no pixels
        if !stroke.is_drawable() {
            return;
        }
        let Some([r, g, b, a]) = color::parse_hex(&stroke.color) else {
            log::warn!("Skipping stroke with unreadable colour {:?}", stroke.color);
            return;
        };

        let mut builder = PathBuilder::new();
        let first = stroke.points[0];
        builder.move_to(first.x as f32, first.y as f32);
        for point in &stroke.points[1..] {
            builder.line_to(point.x as f32, point.y as f32);
        }
        let Some(path) = builder.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        let line = tiny_skia::Stroke {
            width: stroke.width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            ..tiny_skia::Stroke::default()
        };

        target.stroke_path(&path, &paint, &line, Transform::identity(), None);
    }

    fn draw_label(&self, target: &mut Pixmap, label: &Label) {
        let Some(rgba) = color::parse_hex(&label.color) else {
            log::warn!("Skipping label {:?} with unreadable colour {:?}", label.id, label.color);
            return;
        };
        text::draw_text(
            target,
            &self.font,
            &label.text,
            label.font_size as f32,
            label.anchor.x as f32,
            label.anchor.y as f32,
            rgba,
        );
    }
}

/// Transparent pixmap covering `size`.
pub fn new_pixmap(size: Size) -> Result<Pixmap> {
    let (width, height) = size.to_pixels();
    Pixmap::new(width, height).ok_or_else(|| anyhow!("Cannot allocate a {}x{} raster", width, height))
}

/// Copy an RGBA image into a premultiplied pixmap of the same size.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| anyhow!("Cannot allocate a {}x{} raster", image.width(), image.height()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Copy a premultiplied pixmap out as a straight-alpha RGBA image.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Point;

    fn renderer() -> Renderer {
        Renderer::from_font_path(None).unwrap()
    }

    fn stroke(points: &[(f64, f64)], color: &str, width: f64) -> Annotation {
        Annotation::Stroke(Stroke {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            color: color.to_string(),
            width,
        })
    }

    fn label(x: f64, y: f64, text: &str, size: f64) -> Annotation {
        Annotation::Label(Label {
            id: "l".to_string(),
            anchor: Point::new(x, y),
            text: text.to_string(),
            font_size: size,
            color: "#0000ff".to_string(),
        })
    }

    /// Number of pixels in column `x` whose alpha exceeds half.
    fn solid_run(pixmap: &Pixmap, x: u32) -> u32 {
        (0..pixmap.height())
            .filter(|&y| pixmap.pixel(x, y).map(|p| p.alpha() > 127).unwrap_or(false))
            .count() as u32
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = renderer();
        let list = vec![
            stroke(&[(10.0, 10.0), (80.0, 40.0), (30.0, 90.0), (10.0, 10.0)], "#ff0000", 6.0),
            label(20.0, 60.0, "Leak", 18.0),
        ];

        let mut first = new_pixmap(Size::new(120.0, 100.0)).unwrap();
        let mut second = new_pixmap(Size::new(120.0, 100.0)).unwrap();
        r.render(&mut first, &list);
        r.render(&mut second, &list);

        assert_eq!(first.data(), second.data());
        assert!(first.pixels().iter().any(|p| p.alpha() > 0));
    }

    #[test]
    fn test_single_point_stroke_draws_nothing() {
        let r = renderer();
        let mut pixmap = new_pixmap(Size::new(50.0, 50.0)).unwrap();
        r.render(&mut pixmap, &[stroke(&[(25.0, 25.0)], "#ff0000", 20.0)]);

        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }

    #[test]
    fn test_identity_transform_matches_plain_render() {
        let r = renderer();
        let list = vec![
            stroke(&[(5.0, 5.0), (60.0, 30.0)], "#00ff00", 4.0),
            label(10.0, 40.0, "Crack", 14.0),
        ];
        let size = Size::new(80.0, 60.0);

        let mut plain = new_pixmap(size).unwrap();
        let mut transformed = new_pixmap(size).unwrap();
        r.render(&mut plain, &list);
        r.render_with(&mut transformed, &list, &ScaleTransform::between(size, size));

        assert_eq!(plain.data(), transformed.data());
    }

    #[test]
    fn test_stroke_width_scales_by_max_factor() {
        let r = renderer();
        // Horizontal stroke, 5 units wide in a 400x300 edit space
        let list = vec![stroke(&[(50.0, 150.0), (200.0, 150.0), (350.0, 150.0)], "#ff0000", 5.0)];
        let transform = ScaleTransform::between(Size::new(400.0, 300.0), Size::new(1600.0, 1200.0));

        let mut native = new_pixmap(Size::new(1600.0, 1200.0)).unwrap();
        r.render_with(&mut native, &list, &transform);

        let run = solid_run(&native, 800);
        assert!((19..=21).contains(&run), "rendered width {}", run);
        // Centred on y = 600
        assert!(native.pixel(800, 600).unwrap().alpha() == 255);
    }

    #[test]
    fn test_round_caps() {
        let r = renderer();
        let mut pixmap = new_pixmap(Size::new(100.0, 100.0)).unwrap();
        r.render(&mut pixmap, &[stroke(&[(30.0, 50.0), (70.0, 50.0)], "#000000", 20.0)]);

        // Round caps extend past the end points by half the width
        assert!(pixmap.pixel(25, 50).unwrap().alpha() > 0);
        assert!(pixmap.pixel(75, 50).unwrap().alpha() > 0);
        // ...but not into the corners of a square cap
        assert_eq!(pixmap.pixel(21, 41).unwrap().alpha(), 0);
    }

    #[test]
    fn test_later_entries_draw_on_top() {
        let r = renderer();
        let list = vec![
            stroke(&[(0.0, 10.0), (40.0, 10.0)], "#ff0000", 8.0),
            stroke(&[(20.0, 0.0), (20.0, 20.0)], "#0000ff", 8.0),
        ];
        let mut pixmap = new_pixmap(Size::new(40.0, 20.0)).unwrap();
        r.render(&mut pixmap, &list);

        let crossing = pixmap.pixel(20, 10).unwrap();
        assert_eq!(crossing.blue(), 255);
        assert_eq!(crossing.red(), 0);
    }

    #[test]
    fn test_render_keeps_background() {
        let r = renderer();
        let background = RgbaImage::from_pixel(20, 20, image::Rgba([10, 200, 30, 255]));
        let mut pixmap = pixmap_from_rgba(&background).unwrap();
        r.render(&mut pixmap, &[stroke(&[(0.0, 2.0), (20.0, 2.0)], "#ff0000", 4.0)]);

        let out = pixmap_to_rgba(&pixmap);
        assert_eq!(out.get_pixel(10, 15).0, [10, 200, 30, 255]);
        assert_eq!(out.get_pixel(10, 2).0[0], 255);
    }

    #[test]
    fn test_label_anchor_is_baseline_origin() {
        let r = renderer();
        let mut pixmap = new_pixmap(Size::new(200.0, 120.0)).unwrap();
        r.render(&mut pixmap, &[label(40.0, 80.0, "HI", 30.0)]);

        let painted: Vec<(u32, u32)> = (0..120)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| pixmap.pixel(x, y).unwrap().alpha() > 127)
            .collect();

        assert!(!painted.is_empty());
        assert!(painted.iter().all(|&(x, y)| x >= 39 && y <= 81));
        // Text extends up from the baseline, not centred on the anchor
        assert!(painted.iter().any(|&(_, y)| y < 65));
    }
}
