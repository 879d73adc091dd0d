// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the in-memory strokes and labels drawn over a photo,
//! and the persisted record shape they are saved as on the photo.

use crate::util::color;
use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Font size used when a persisted text record carries none.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// A 2D point in a photo's annotation coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One freehand drawing gesture.
///
/// Persisted as the `data` payload of a `drawing` record, so the width is
/// named `size` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub color: String,
    #[serde(rename = "size")]
    pub width: f64,
}

impl Stroke {
    /// Start a stroke at a single point.
    pub fn new(start: Point, color: String, width: f64) -> Self {
        Self {
            points: vec![start],
            color,
            width,
        }
    }

    /// Add a point to the stroke.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// A stroke needs at least two points to cover any pixels.
    pub fn is_drawable(&self) -> bool {
        self.points.len() >= 2
    }
}

/// One text label anchored at its left/baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub id: String,
    pub anchor: Point,
    pub text: String,
    pub font_size: f64,
    pub color: String,
}

/// A committed annotation, in render order.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    Stroke(Stroke),
    Label(Label),
}

/// Persisted annotation record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationRecord {
    Drawing {
        id: String,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
        color: String,
        data: Stroke,
    },
    Text {
        id: String,
        x: f64,
        y: f64,
        #[serde(default)]
        text: String,
        #[serde(rename = "fontSize", default = "default_font_size")]
        font_size: f64,
        color: String,
    },
    /// Reserved kind; readable but never authored by this editor.
    Arrow {
        id: String,
        x: f64,
        y: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        color: String,
    },
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

impl AnnotationRecord {
    pub fn id(&self) -> &str {
        match self {
            AnnotationRecord::Drawing { id, .. }
            | AnnotationRecord::Text { id, .. }
            | AnnotationRecord::Arrow { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationRecord::Drawing { .. } => "drawing",
            AnnotationRecord::Text { .. } => "text",
            AnnotationRecord::Arrow { .. } => "arrow",
        }
    }

    /// Record for a committed stroke at position `index` among the strokes.
    pub fn from_stroke(index: usize, stroke: &Stroke) -> Self {
        AnnotationRecord::Drawing {
            id: format!("path-{}", index),
            x: 0.0,
            y: 0.0,
            color: stroke.color.clone(),
            data: stroke.clone(),
        }
    }

    pub fn from_label(label: &Label) -> Self {
        AnnotationRecord::Text {
            id: label.id.clone(),
            x: label.anchor.x,
            y: label.anchor.y,
            text: label.text.clone(),
            font_size: label.font_size,
            color: label.color.clone(),
        }
    }

    /// Validate the record and turn it into a renderable annotation.
    pub fn to_annotation(&self) -> Result<Annotation> {
        match self {
            AnnotationRecord::Drawing { data, .. } => {
                if data.points.is_empty() {
                    bail!("drawing has no points");
                }
                if !data.points.iter().all(Point::is_finite) {
                    bail!("drawing has non-finite coordinates");
                }
                if !(data.width.is_finite() && data.width > 0.0) {
                    bail!("drawing width {} is not positive", data.width);
                }
                if color::parse_hex(&data.color).is_none() {
                    bail!("unreadable colour {:?}", data.color);
                }
                Ok(Annotation::Stroke(data.clone()))
            }
            AnnotationRecord::Text {
                id,
                x,
                y,
                text,
                font_size,
                color: text_color,
            } => {
                let anchor = Point::new(*x, *y);
                if !anchor.is_finite() {
                    bail!("label anchor is not finite");
                }
                if text.trim().is_empty() {
                    bail!("label text is blank");
                }
                if !(font_size.is_finite() && *font_size > 0.0) {
                    bail!("label font size {} is not positive", font_size);
                }
                if color::parse_hex(text_color).is_none() {
                    bail!("unreadable colour {:?}", text_color);
                }
                Ok(Annotation::Label(Label {
                    id: id.clone(),
                    anchor,
                    text: text.clone(),
                    font_size: *font_size,
                    color: text_color.clone(),
                }))
            }
            AnnotationRecord::Arrow { .. } => bail!("arrow annotations are not supported"),
        }
    }
}

/// Deserialize an optional record list, dropping entries that do not parse
/// instead of rejecting the whole document.
pub fn deserialize_records_lenient<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<AnnotationRecord>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping malformed annotation record {}: {}", index, e);
                    None
                }
            })
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_record_wire_shape() {
        let stroke = Stroke {
            points: vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
            color: "#ff0000".to_string(),
            width: 5.0,
        };
        let json = serde_json::to_value(AnnotationRecord::from_stroke(0, &stroke)).unwrap();

        assert_eq!(json["type"], "drawing");
        assert_eq!(json["id"], "path-0");
        assert_eq!(json["color"], "#ff0000");
        assert_eq!(json["data"]["size"], 5.0);
        assert_eq!(json["data"]["points"][1]["y"], 4.0);
    }

    #[test]
    fn test_text_record_reads_camel_case() {
        let json = r##"{"id":"1700000000000","type":"text","x":50,"y":60,
            "text":"Leak","fontSize":24,"color":"#0000ff"}"##;
        let record: AnnotationRecord = serde_json::from_str(json).unwrap();

        match record.to_annotation().unwrap() {
            Annotation::Label(label) => {
                assert_eq!(label.anchor, Point::new(50.0, 60.0));
                assert_eq!(label.font_size, 24.0);
                assert_eq!(label.text, "Leak");
            }
            other => panic!("expected a label, got {:?}", other),
        }
    }

    #[test]
    fn test_text_record_without_font_size_defaults() {
        let json = r##"{"id":"t","type":"text","x":0,"y":0,"text":"A","color":"#000"}"##;
        let record: AnnotationRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(record, AnnotationRecord::Text { font_size, .. } if font_size == DEFAULT_FONT_SIZE));
    }

    #[test]
    fn test_invalid_records_rejected() {
        let empty = AnnotationRecord::Drawing {
            id: "path-0".to_string(),
            x: 0.0,
            y: 0.0,
            color: "#ff0000".to_string(),
            data: Stroke {
                points: vec![],
                color: "#ff0000".to_string(),
                width: 5.0,
            },
        };
        assert!(empty.to_annotation().is_err());

        let blank = AnnotationRecord::Text {
            id: "t".to_string(),
            x: 0.0,
            y: 0.0,
            text: "   ".to_string(),
            font_size: 16.0,
            color: "#ff0000".to_string(),
        };
        assert!(blank.to_annotation().is_err());

        let arrow = AnnotationRecord::Arrow {
            id: "a".to_string(),
            x: 0.0,
            y: 0.0,
            width: Some(10.0),
            height: None,
            color: "#ff0000".to_string(),
        };
        assert!(arrow.to_annotation().is_err());
    }

    #[test]
    fn test_lenient_list_skips_bad_entries() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_records_lenient")]
            annotations: Option<Vec<AnnotationRecord>>,
        }

        let json = r##"{"annotations":[
            {"id":"path-0","type":"drawing","color":"#f00","data":{"points":[{"x":1,"y":1}],"color":"#f00","size":3}},
            {"id":"bad","type":"drawing","color":"#f00"},
            {"id":"x","type":"sticker","x":1,"y":1,"color":"#f00"},
            {"id":"t","type":"text","x":5,"y":5,"text":"Crack","fontSize":16,"color":"#000"}
        ]}"##;
        let holder: Holder = serde_json::from_str(json).unwrap();
        let records = holder.annotations.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind(), "drawing");
        assert_eq!(records[1].id(), "t");
    }

    #[test]
    fn test_missing_list_is_none() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default, deserialize_with = "deserialize_records_lenient")]
            annotations: Option<Vec<AnnotationRecord>>,
        }

        let holder: Holder = serde_json::from_str("{}").unwrap();
        assert!(holder.annotations.is_none());
    }
}
