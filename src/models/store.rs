// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory annotation list for one photo.
//!
//! The store holds the committed strokes and labels of an annotate session
//! plus at most one in-progress stroke. It converts to and from the persisted
//! record list attached to the photo.

use super::annotation::{Annotation, AnnotationRecord, Label, Point, Stroke};

/// What a call to [`AnnotationStore::undo`] removed.
#[derive(Debug, Clone, PartialEq)]
pub enum Undone {
    Stroke(Stroke),
    Label(Label),
    Nothing,
}

/// Committed strokes and labels, plus the stroke currently being drawn.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    strokes: Vec<Stroke>,
    labels: Vec<Label>,
    /// Stroke being drawn by the current gesture, if any.
    current: Option<Stroke>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents from persisted records.
    ///
    /// Records that fail validation are skipped individually. Returns the
    /// number of skipped records.
    pub fn load(&mut self, records: &[AnnotationRecord]) -> usize {
        self.strokes.clear();
        self.labels.clear();
        self.current = None;

        let mut skipped = 0;
        for record in records {
            match record.to_annotation() {
                Ok(Annotation::Stroke(stroke)) => self.strokes.push(stroke),
                Ok(Annotation::Label(label)) => self.labels.push(label),
                Err(e) => {
                    log::warn!("Skipping {} annotation {:?}: {}", record.kind(), record.id(), e);
                    skipped += 1;
                }
            }
        }

        log::info!(
            "Loaded {} strokes and {} labels ({} skipped)",
            self.strokes.len(),
            self.labels.len(),
            skipped
        );
        skipped
    }

    /// Open a new in-progress stroke. An already open stroke is discarded.
    pub fn begin_stroke(&mut self, point: Point, color: &str, width: f64) {
        if self.current.is_some() {
            log::debug!("Discarding unfinished stroke");
        }
        self.current = Some(Stroke::new(point, color.to_string(), width));
    }

    /// Append a point to the in-progress stroke, if one is open.
    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(ref mut stroke) = self.current {
            stroke.add_point(point);
        }
    }

    /// Commit the in-progress stroke. The slot is cleared either way.
    pub fn commit_stroke(&mut self) {
        if let Some(stroke) = self.current.take() {
            if !stroke.points.is_empty() {
                self.strokes.push(stroke);
            }
        }
    }

    /// Drop the in-progress stroke without committing it.
    pub fn discard_stroke(&mut self) {
        self.current = None;
    }

    /// Add a label. Blank text is rejected and returns `None`.
    pub fn add_label(&mut self, point: Point, text: &str, font_size: f64, color: &str) -> Option<&Label> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.labels.push(Label {
            id: uuid::Uuid::new_v4().to_string(),
            anchor: point,
            text: text.to_string(),
            font_size,
            color: color.to_string(),
        });
        self.labels.last()
    }

    /// Remove the last stroke, or the last label once no strokes remain.
    pub fn undo(&mut self) -> Undone {
        if let Some(stroke) = self.strokes.pop() {
            Undone::Stroke(stroke)
        } else if let Some(label) = self.labels.pop() {
            Undone::Label(label)
        } else {
            Undone::Nothing
        }
    }

    /// Remove everything, including the in-progress stroke.
    pub fn clear_all(&mut self) {
        self.strokes.clear();
        self.labels.clear();
        self.current = None;
    }

    /// Persisted form: all strokes, then all labels.
    pub fn to_records(&self) -> Vec<AnnotationRecord> {
        self.strokes
            .iter()
            .enumerate()
            .map(|(index, stroke)| AnnotationRecord::from_stroke(index, stroke))
            .chain(self.labels.iter().map(AnnotationRecord::from_label))
            .collect()
    }

    /// Committed annotations in persisted (and render) order.
    pub fn annotations(&self) -> Vec<Annotation> {
        self.strokes
            .iter()
            .cloned()
            .map(Annotation::Stroke)
            .chain(self.labels.iter().cloned().map(Annotation::Label))
            .collect()
    }

    /// Committed annotations with the in-progress stroke on top, for the
    /// live preview.
    pub fn annotations_with_preview(&self) -> Vec<Annotation> {
        let mut list = self.annotations();
        if let Some(ref stroke) = self.current {
            list.push(Annotation::Stroke(stroke.clone()));
        }
        list
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn in_progress(&self) -> Option<&Stroke> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.labels.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.is_empty()
    }
}
