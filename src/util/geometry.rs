// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module defines the extent of an annotation coordinate space and the
//! scale transform that moves a whole annotation list between raster sizes
//! (edit canvas, native photo resolution).

use crate::models::annotation::{Annotation, Label, Point, Stroke};
use serde::{Deserialize, Serialize};

/// Extent of a coordinate space, in that space's units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size of a raster in pixels.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }

    /// A size is known when both sides are finite and strictly positive.
    pub fn is_known(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Pixel dimensions of a raster covering this size, at least 1x1.
    pub fn to_pixels(&self) -> (u32, u32) {
        let w = if self.width.is_finite() { self.width.round().max(1.0) } else { 1.0 };
        let h = if self.height.is_finite() { self.height.round().max(1.0) } else { 1.0 };
        (w as u32, h as u32)
    }
}

/// Maps points from a source space onto a target space.
///
/// x and y scale independently; stroke widths and font sizes scale by the
/// larger of the two factors so line weight stays uniform under aspect skew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for ScaleTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ScaleTransform {
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Transform from `source` to `target`.
    ///
    /// Falls back to the identity when either size is unknown (image not yet
    /// laid out, zero-sized box) rather than producing NaN or infinite scales.
    pub fn between(source: Size, target: Size) -> Self {
        if !source.is_known() || !target.is_known() {
            return Self::identity();
        }
        Self {
            scale_x: target.width / source.width,
            scale_y: target.height / source.height,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.scale_x == 1.0 && self.scale_y == 1.0
    }

    /// Factor applied to stroke widths and font sizes.
    pub fn thickness(&self) -> f64 {
        self.scale_x.max(self.scale_y)
    }

    pub fn inverse(&self) -> Self {
        if self.is_identity() || self.scale_x == 0.0 || self.scale_y == 0.0 {
            return Self::identity();
        }
        Self {
            scale_x: 1.0 / self.scale_x,
            scale_y: 1.0 / self.scale_y,
        }
    }

    pub fn apply_point(&self, point: Point) -> Point {
        Point {
            x: point.x * self.scale_x,
            y: point.y * self.scale_y,
        }
    }

    pub fn apply_length(&self, length: f64) -> f64 {
        length * self.thickness()
    }

    pub fn apply_stroke(&self, stroke: &Stroke) -> Stroke {
        Stroke {
            points: stroke.points.iter().map(|p| self.apply_point(*p)).collect(),
            color: stroke.color.clone(),
            width: self.apply_length(stroke.width),
        }
    }

    pub fn apply_label(&self, label: &Label) -> Label {
        Label {
            id: label.id.clone(),
            anchor: self.apply_point(label.anchor),
            text: label.text.clone(),
            font_size: self.apply_length(label.font_size),
            color: label.color.clone(),
        }
    }

    pub fn apply_annotation(&self, annotation: &Annotation) -> Annotation {
        match annotation {
            Annotation::Stroke(stroke) => Annotation::Stroke(self.apply_stroke(stroke)),
            Annotation::Label(label) => Annotation::Label(self.apply_label(label)),
        }
    }

    /// Map a whole annotation list, preserving order.
    pub fn apply_all(&self, annotations: &[Annotation]) -> Vec<Annotation> {
        annotations.iter().map(|a| self.apply_annotation(a)).collect()
    }
}

/// Convert a screen position into a point relative to the top-left corner
/// of the element's bounding box.
pub fn normalize_pointer(screen_x: f64, screen_y: f64, box_left: f64, box_top: f64) -> Point {
    Point {
        x: screen_x - box_left,
        y: screen_y - box_top,
    }
}

/// Space a persisted list is rendered from, given the photo's native size.
///
/// Lists saved without a recorded space were drawn over the photo at its
/// own resolution.
pub fn resolve_authoring_space(stored: Option<Size>, native: Size) -> Size {
    stored.filter(Size::is_known).unwrap_or(native)
}

/// Largest box with the image's aspect ratio that fits inside `available`.
pub fn fit_within(image: Size, available: Size) -> Size {
    if !image.is_known() || !available.is_known() {
        return Size::new(0.0, 0.0);
    }
    let img_aspect = image.width / image.height;
    let available_aspect = available.width / available.height;

    if img_aspect > available_aspect {
        // Image is wider - fit to width
        Size::new(available.width, available.width / img_aspect)
    } else {
        // Image is taller - fit to height
        Size::new(available.height * img_aspect, available.height)
    }
}
