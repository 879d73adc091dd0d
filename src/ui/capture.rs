// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive capture surface.
//!
//! Turns pointer, touch and text-prompt events into store mutations. The
//! surface is independent of egui: the canvas widget translates egui
//! responses into [`CaptureEvent`]s and uploads [`CaptureSurface::preview`]
//! as an overlay texture.
//!
//! Records stay in the authoring space: the stored size of a saved list, the
//! photo's native size for a list saved without one, or else the display box
//! a new list is first drawn in. Pointer input is mapped back into that
//! space, so resizing the window never rescales what has already been drawn.

use crate::config::{ToolDefaults, FONT_SIZE_RANGE, STROKE_WIDTH_RANGE};
use crate::io::export::ExportSnapshot;
use crate::models::annotation::{AnnotationRecord, Point};
use crate::models::store::{AnnotationStore, Undone};
use crate::render::{self, Renderer};
use crate::util::color;
use crate::util::geometry::{normalize_pointer, resolve_authoring_space, ScaleTransform, Size};
use anyhow::Result;
use std::path::PathBuf;
use tiny_skia::Pixmap;

/// Which gesture the surface captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Draw,
    Label,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Drawing,
    AwaitingText { anchor: Point, text: String },
}

/// Pointer position in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { x: f64, y: f64 },
    /// All active touches; only the first is used.
    Touch(Vec<(f64, f64)>),
}

impl PointerInput {
    fn position(&self) -> Option<(f64, f64)> {
        match self {
            PointerInput::Mouse { x, y } => Some((*x, *y)),
            PointerInput::Touch(touches) => touches.first().copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    PointerDown(PointerInput),
    PointerMove(PointerInput),
    PointerUp,
    PointerLeave,
    Click(PointerInput),
    TextChanged(String),
    ConfirmText,
    CancelText,
    Resize(Size),
}

/// Current colour, stroke width and font size.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSettings {
    color: String,
    stroke_width: f64,
    font_size: f64,
    swatch: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self::from_defaults(&ToolDefaults::default())
    }
}

impl ToolSettings {
    pub fn from_defaults(defaults: &ToolDefaults) -> Self {
        let mut tools = Self {
            color: color::DEFAULT_COLOR.to_string(),
            stroke_width: 5.0,
            font_size: 16.0,
            swatch: defaults.swatch.clone(),
        };
        tools.set_color(&defaults.color);
        tools.set_stroke_width(defaults.stroke_width);
        tools.set_font_size(defaults.font_size);
        tools
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn swatch(&self) -> &[String] {
        &self.swatch
    }

    /// Unreadable colours are ignored.
    pub fn set_color(&mut self, value: &str) {
        if color::parse_hex(value).is_some() {
            self.color = value.to_string();
        }
    }

    pub fn set_stroke_width(&mut self, value: f64) {
        if value.is_finite() {
            self.stroke_width = value.clamp(STROKE_WIDTH_RANGE.0, STROKE_WIDTH_RANGE.1);
        }
    }

    pub fn set_font_size(&mut self, value: f64) {
        if value.is_finite() {
            self.font_size = value.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        }
    }
}

/// Annotate session state for one photo.
pub struct CaptureSurface {
    store: AnnotationStore,
    tools: ToolSettings,
    mode: Mode,
    state: CaptureState,
    authoring_space: Option<Size>,
    /// Loaded list has no stored space; it takes the photo's native size.
    awaiting_native: bool,
    display_box: Size,
    box_origin: (f64, f64),
    enabled: bool,
    dirty: bool,
}

impl CaptureSurface {
    pub fn new(tools: ToolSettings) -> Self {
        Self {
            store: AnnotationStore::new(),
            tools,
            mode: Mode::Draw,
            state: CaptureState::Idle,
            authoring_space: None,
            awaiting_native: false,
            display_box: Size::new(0.0, 0.0),
            box_origin: (0.0, 0.0),
            enabled: true,
            dirty: true,
        }
    }

    /// Start a session on a persisted list. Returns the number of records
    /// that could not be loaded.
    pub fn open(&mut self, records: &[AnnotationRecord], space: Option<Size>) -> usize {
        let skipped = self.store.load(records);
        self.authoring_space = space.filter(Size::is_known);
        self.awaiting_native = self.authoring_space.is_none() && !self.store.is_empty();
        self.state = CaptureState::Idle;
        self.enabled = true;
        self.dirty = true;
        log::info!(
            "Opened annotate session: {} strokes, {} labels",
            self.store.strokes().len(),
            self.store.labels().len()
        );
        skipped
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn tools(&self) -> &ToolSettings {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolSettings {
        &mut self.tools
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch modes, abandoning any gesture or pending label.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        match self.state {
            CaptureState::Drawing => {
                self.store.discard_stroke();
                self.dirty = true;
            }
            CaptureState::AwaitingText { .. } | CaptureState::Idle => {}
        }
        self.state = CaptureState::Idle;
        self.mode = mode;
    }

    /// Native size of the decoded photo. Settles the authoring space of a
    /// loaded list that was saved without one.
    pub fn set_native_size(&mut self, native: Size) {
        if !self.awaiting_native || !native.is_known() {
            return;
        }
        self.authoring_space = Some(resolve_authoring_space(self.authoring_space, native));
        self.awaiting_native = false;
        self.dirty = true;
    }

    /// Screen position of the display box's top-left corner.
    pub fn set_box_origin(&mut self, left: f64, top: f64) {
        self.box_origin = (left, top);
    }

    /// While disabled, all input except resizing is ignored. An open stroke
    /// is committed first.
    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled && self.state == CaptureState::Drawing {
            self.store.commit_stroke();
            self.state = CaptureState::Idle;
            self.dirty = true;
        }
        self.enabled = enabled;
    }

    /// Feed one event. Returns true when the overlay needs redrawing.
    pub fn handle(&mut self, event: CaptureEvent) -> bool {
        if let CaptureEvent::Resize(size) = event {
            self.resize(size);
            return self.dirty;
        }
        if !self.enabled {
            return false;
        }

        match (event, self.mode) {
            (CaptureEvent::PointerDown(input), Mode::Draw) => {
                if self.state != CaptureState::Idle {
                    return false;
                }
                let Some(point) = self.to_authoring(&input) else {
                    return false;
                };
                let width = self.display_to_authoring().apply_length(self.tools.stroke_width);
                self.store.begin_stroke(point, &self.tools.color, width);
                self.state = CaptureState::Drawing;
                self.dirty = true;
            }
            (CaptureEvent::PointerMove(input), _) => {
                if self.state != CaptureState::Drawing {
                    return false;
                }
                let Some(point) = self.to_authoring(&input) else {
                    return false;
                };
                self.store.extend_stroke(point);
                self.dirty = true;
            }
            (CaptureEvent::PointerUp, _) | (CaptureEvent::PointerLeave, _) => {
                if self.state != CaptureState::Drawing {
                    return false;
                }
                self.store.commit_stroke();
                self.state = CaptureState::Idle;
                self.dirty = true;
            }
            (CaptureEvent::Click(input), Mode::Label) => {
                let Some(anchor) = self.to_authoring(&input) else {
                    return false;
                };
                let text = match &mut self.state {
                    CaptureState::AwaitingText { text, .. } => std::mem::take(text),
                    _ => String::new(),
                };
                self.state = CaptureState::AwaitingText { anchor, text };
            }
            (CaptureEvent::TextChanged(value), _) => {
                if let CaptureState::AwaitingText { text, .. } = &mut self.state {
                    *text = value;
                }
            }
            (CaptureEvent::ConfirmText, _) => return self.confirm_text(),
            (CaptureEvent::CancelText, _) => {
                if matches!(self.state, CaptureState::AwaitingText { .. }) {
                    self.state = CaptureState::Idle;
                }
            }
            _ => return false,
        }
        self.dirty
    }

    fn confirm_text(&mut self) -> bool {
        let CaptureState::AwaitingText { anchor, text } = &self.state else {
            return false;
        };
        // Blank text keeps the prompt open
        if text.trim().is_empty() {
            return false;
        }
        let (anchor, text) = (*anchor, text.clone());
        let font_size = self.display_to_authoring().apply_length(self.tools.font_size);
        self.store.add_label(anchor, &text, font_size, &self.tools.color);
        self.state = CaptureState::Idle;
        self.dirty = true;
        true
    }

    fn resize(&mut self, size: Size) {
        if size == self.display_box {
            return;
        }
        self.display_box = size;
        if self.authoring_space.is_none() && !self.awaiting_native && size.is_known() {
            self.authoring_space = Some(size);
        }
        self.dirty = true;
    }

    /// Authoring space to the current display box.
    fn authoring_to_display(&self) -> ScaleTransform {
        match self.authoring_space {
            Some(space) => ScaleTransform::between(space, self.display_box),
            None => ScaleTransform::identity(),
        }
    }

    fn display_to_authoring(&self) -> ScaleTransform {
        self.authoring_to_display().inverse()
    }

    fn to_authoring(&self, input: &PointerInput) -> Option<Point> {
        let (x, y) = input.position()?;
        let local = normalize_pointer(x, y, self.box_origin.0, self.box_origin.1);
        Some(self.display_to_authoring().apply_point(local))
    }

    /// Text of the pending label, if the prompt is open.
    pub fn pending_text(&self) -> Option<&str> {
        match &self.state {
            CaptureState::AwaitingText { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.pending_text().is_some_and(|t| !t.trim().is_empty())
    }

    pub fn undo(&mut self) -> Undone {
        if !self.enabled || self.state == CaptureState::Drawing {
            return Undone::Nothing;
        }
        let undone = self.store.undo();
        if undone != Undone::Nothing {
            self.dirty = true;
        }
        undone
    }

    pub fn clear_all(&mut self) {
        if !self.enabled {
            return;
        }
        self.store.clear_all();
        self.state = CaptureState::Idle;
        self.dirty = true;
    }

    /// Persistable form of the session's list.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.store.to_records()
    }

    pub fn authoring_space(&self) -> Option<Size> {
        self.authoring_space
    }

    /// Owned copy of the committed list for a background export.
    pub fn snapshot(&self, image_path: PathBuf, file_name: String) -> ExportSnapshot {
        ExportSnapshot {
            image_path,
            file_name,
            annotations: self.store.annotations(),
            authoring_space: self.authoring_space,
        }
    }

    /// Returns and clears the redraw flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Overlay for the current display box: committed content plus the
    /// stroke being drawn.
    pub fn preview(&self, renderer: &Renderer) -> Result<Pixmap> {
        let mut pixmap = render::new_pixmap(self.display_box)?;
        renderer.render_with(&mut pixmap, &self.store.annotations_with_preview(), &self.authoring_to_display());
        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Annotation;

    fn mouse(x: f64, y: f64) -> PointerInput {
        PointerInput::Mouse { x, y }
    }

    fn surface() -> CaptureSurface {
        let mut surface = CaptureSurface::new(ToolSettings::default());
        surface.open(&[], None);
        surface.handle(CaptureEvent::Resize(Size::new(400.0, 300.0)));
        surface
    }

    fn draw(surface: &mut CaptureSurface, points: &[(f64, f64)]) {
        surface.handle(CaptureEvent::PointerDown(mouse(points[0].0, points[0].1)));
        for &(x, y) in &points[1..] {
            surface.handle(CaptureEvent::PointerMove(mouse(x, y)));
        }
        surface.handle(CaptureEvent::PointerUp);
    }

    fn label(surface: &mut CaptureSurface, x: f64, y: f64, text: &str) {
        surface.set_mode(Mode::Label);
        surface.handle(CaptureEvent::Click(mouse(x, y)));
        surface.handle(CaptureEvent::TextChanged(text.into()));
        surface.handle(CaptureEvent::ConfirmText);
    }

    #[test]
    fn test_draw_gesture() {
        let mut surface = surface();
        surface.handle(CaptureEvent::PointerDown(mouse(10.0, 10.0)));
        assert_eq!(*surface.state(), CaptureState::Drawing);
        surface.handle(CaptureEvent::PointerMove(mouse(20.0, 10.0)));
        assert_eq!(surface.store().in_progress().unwrap().points.len(), 2);
        assert!(surface.store().strokes().is_empty());

        surface.handle(CaptureEvent::PointerLeave);
        assert_eq!(*surface.state(), CaptureState::Idle);
        assert_eq!(surface.store().strokes().len(), 1);
        assert_eq!(surface.store().strokes()[0].width, 5.0);
        assert_eq!(surface.store().strokes()[0].color, "#ff0000");
    }

    #[test]
    fn test_pointer_normalized_to_box_origin() {
        let mut surface = surface();
        surface.set_box_origin(100.0, 50.0);
        draw(&mut surface, &[(110.0, 60.0), (150.0, 90.0)]);

        let points = &surface.store().strokes()[0].points;
        assert_eq!(points[0], Point::new(10.0, 10.0));
        assert_eq!(points[1], Point::new(50.0, 40.0));
    }

    #[test]
    fn test_first_touch_wins() {
        let mut surface = surface();
        surface.handle(CaptureEvent::PointerDown(PointerInput::Touch(vec![(5.0, 6.0), (90.0, 90.0)])));
        surface.handle(CaptureEvent::PointerMove(PointerInput::Touch(vec![])));
        surface.handle(CaptureEvent::PointerMove(PointerInput::Touch(vec![(7.0, 8.0)])));
        surface.handle(CaptureEvent::PointerUp);

        let points = &surface.store().strokes()[0].points;
        assert_eq!(points, &vec![Point::new(5.0, 6.0), Point::new(7.0, 8.0)]);
    }

    #[test]
    fn test_empty_touch_does_not_start_stroke() {
        let mut surface = surface();
        surface.handle(CaptureEvent::PointerDown(PointerInput::Touch(vec![])));
        assert_eq!(*surface.state(), CaptureState::Idle);
    }

    #[test]
    fn test_label_prompt() {
        let mut surface = surface();
        surface.set_mode(Mode::Label);
        surface.handle(CaptureEvent::Click(mouse(50.0, 50.0)));
        assert_eq!(surface.pending_text(), Some(""));
        assert!(!surface.can_confirm());

        // Blank confirm keeps the prompt open
        surface.handle(CaptureEvent::TextChanged("   ".into()));
        assert!(!surface.handle(CaptureEvent::ConfirmText));
        assert!(matches!(surface.state(), CaptureState::AwaitingText { .. }));

        surface.handle(CaptureEvent::TextChanged(" Leak ".into()));
        assert!(surface.can_confirm());
        assert!(surface.handle(CaptureEvent::ConfirmText));
        assert_eq!(*surface.state(), CaptureState::Idle);
        assert_eq!(surface.store().labels()[0].text, "Leak");
        assert_eq!(surface.store().labels()[0].anchor, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_cancel_text_discards() {
        let mut surface = surface();
        surface.set_mode(Mode::Label);
        surface.handle(CaptureEvent::Click(mouse(50.0, 50.0)));
        surface.handle(CaptureEvent::TextChanged("Crack".into()));
        surface.handle(CaptureEvent::CancelText);

        assert_eq!(*surface.state(), CaptureState::Idle);
        assert!(surface.store().is_empty());
    }

    #[test]
    fn test_pointer_down_ignored_in_label_mode() {
        let mut surface = surface();
        surface.set_mode(Mode::Label);
        surface.handle(CaptureEvent::PointerDown(mouse(1.0, 1.0)));
        assert_eq!(*surface.state(), CaptureState::Idle);
        assert!(surface.store().in_progress().is_none());
    }

    #[test]
    fn test_mode_switch_discards_gesture() {
        let mut surface = surface();
        surface.handle(CaptureEvent::PointerDown(mouse(1.0, 1.0)));
        surface.handle(CaptureEvent::PointerMove(mouse(9.0, 9.0)));
        surface.set_mode(Mode::Label);

        assert_eq!(*surface.state(), CaptureState::Idle);
        assert!(surface.store().is_empty());
        assert!(surface.store().in_progress().is_none());

        surface.handle(CaptureEvent::Click(mouse(5.0, 5.0)));
        surface.set_mode(Mode::Draw);
        assert_eq!(surface.pending_text(), None);
        assert!(surface.store().is_empty());
    }

    #[test]
    fn test_tool_settings_clamped() {
        let mut tools = ToolSettings::default();
        tools.set_stroke_width(0.0);
        assert_eq!(tools.stroke_width(), 1.0);
        tools.set_stroke_width(99.0);
        assert_eq!(tools.stroke_width(), 20.0);
        tools.set_font_size(4.0);
        assert_eq!(tools.font_size(), 12.0);
        tools.set_font_size(100.0);
        assert_eq!(tools.font_size(), 48.0);
        tools.set_color("blue");
        assert_eq!(tools.color(), "#ff0000");
        tools.set_color("#0000ff");
        assert_eq!(tools.color(), "#0000ff");
        assert_eq!(tools.swatch().len(), 8);
    }

    #[test]
    fn test_undo_and_clear() {
        let mut surface = surface();
        draw(&mut surface, &[(1.0, 1.0), (5.0, 5.0)]);
        label(&mut surface, 10.0, 10.0, "A");

        assert!(matches!(surface.undo(), Undone::Stroke(_)));
        assert!(matches!(surface.undo(), Undone::Label(_)));
        assert_eq!(surface.undo(), Undone::Nothing);

        label(&mut surface, 10.0, 10.0, "B");
        surface.clear_all();
        assert!(surface.records().is_empty());
    }

    #[test]
    fn test_resize_keeps_records_and_maps_input() {
        let mut surface = surface();
        draw(&mut surface, &[(100.0, 100.0), (200.0, 100.0)]);
        let before = surface.records();

        surface.handle(CaptureEvent::Resize(Size::new(800.0, 600.0)));
        assert_eq!(surface.records(), before);
        assert_eq!(surface.authoring_space(), Some(Size::new(400.0, 300.0)));

        // Drawn at twice the size, lands at the same place in authoring space
        draw(&mut surface, &[(200.0, 200.0), (400.0, 200.0)]);
        let second = &surface.store().strokes()[1];
        assert_eq!(second.points[0], Point::new(100.0, 100.0));
        assert_eq!(second.points[1], Point::new(200.0, 100.0));
        assert_eq!(second.width, 2.5);
    }

    #[test]
    fn test_open_uses_stored_space() {
        let mut surface = CaptureSurface::new(ToolSettings::default());
        surface.open(&[], Some(Size::new(1000.0, 750.0)));
        surface.handle(CaptureEvent::Resize(Size::new(400.0, 300.0)));
        assert_eq!(surface.authoring_space(), Some(Size::new(1000.0, 750.0)));

        draw(&mut surface, &[(40.0, 30.0), (80.0, 30.0)]);
        assert_eq!(surface.store().strokes()[0].points[0], Point::new(100.0, 75.0));
    }

    #[test]
    fn test_list_without_space_takes_native_size() {
        let mut seed = AnnotationStore::new();
        seed.begin_stroke(Point::new(10.0, 150.0), "#ff0000", 5.0);
        seed.extend_stroke(Point::new(390.0, 150.0));
        seed.commit_stroke();

        let mut surface = CaptureSurface::new(ToolSettings::default());
        surface.open(&seed.to_records(), None);
        surface.handle(CaptureEvent::Resize(Size::new(400.0, 300.0)));
        assert_eq!(surface.authoring_space(), None);

        surface.set_native_size(Size::new(1600.0, 1200.0));
        surface.handle(CaptureEvent::Resize(Size::new(800.0, 600.0)));
        assert_eq!(surface.authoring_space(), Some(Size::new(1600.0, 1200.0)));

        // Input on the 800x600 box lands in native coordinates
        draw(&mut surface, &[(100.0, 100.0), (200.0, 100.0)]);
        assert_eq!(surface.store().strokes()[1].points[0], Point::new(200.0, 200.0));
    }

    #[test]
    fn test_native_size_ignored_for_new_and_stored_lists() {
        let mut surface = surface();
        surface.set_native_size(Size::new(1600.0, 1200.0));
        assert_eq!(surface.authoring_space(), Some(Size::new(400.0, 300.0)));

        let mut surface = CaptureSurface::new(ToolSettings::default());
        surface.open(&[], Some(Size::new(1000.0, 750.0)));
        surface.set_native_size(Size::new(1600.0, 1200.0));
        assert_eq!(surface.authoring_space(), Some(Size::new(1000.0, 750.0)));
    }

    #[test]
    fn test_disabled_ignores_input() {
        let mut surface = surface();
        surface.set_enabled(false);
        draw(&mut surface, &[(1.0, 1.0), (5.0, 5.0)]);
        label(&mut surface, 10.0, 10.0, "A");
        assert!(surface.store().is_empty());

        surface.set_enabled(true);
        surface.set_mode(Mode::Draw);
        draw(&mut surface, &[(1.0, 1.0), (5.0, 5.0)]);
        assert_eq!(surface.store().strokes().len(), 1);
    }

    #[test]
    fn test_disabling_commits_open_stroke() {
        let mut surface = surface();
        surface.handle(CaptureEvent::PointerDown(mouse(1.0, 1.0)));
        surface.handle(CaptureEvent::PointerMove(mouse(9.0, 9.0)));
        surface.set_enabled(false);

        assert_eq!(*surface.state(), CaptureState::Idle);
        assert_eq!(surface.store().strokes().len(), 1);
    }

    #[test]
    fn test_preview_shows_open_stroke_without_committing() {
        let renderer = Renderer::from_font_path(None).unwrap();
        let mut surface = surface();
        surface.handle(CaptureEvent::PointerDown(mouse(10.0, 150.0)));
        surface.handle(CaptureEvent::PointerMove(mouse(390.0, 150.0)));
        assert!(surface.take_dirty());
        assert!(!surface.take_dirty());

        let pixmap = surface.preview(&renderer).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (400, 300));
        assert!(pixmap.pixel(200, 150).unwrap().alpha() > 0);
        assert!(surface.store().strokes().is_empty());
        assert_eq!(*surface.state(), CaptureState::Drawing);
    }

    #[test]
    fn test_snapshot_is_owned_copy() {
        let mut surface = surface();
        label(&mut surface, 10.0, 10.0, "A");
        let snapshot = surface.snapshot(PathBuf::from("a.jpg"), "a.jpg".into());
        surface.clear_all();

        assert_eq!(snapshot.annotations.len(), 1);
        assert!(matches!(snapshot.annotations[0], Annotation::Label(_)));
        assert_eq!(snapshot.authoring_space, Some(Size::new(400.0, 300.0)));
    }
}
