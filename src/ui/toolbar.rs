// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotate tool bar and label text prompt.
//!
//! This module provides the tool bar of the annotate session: mode
//! selection, colour swatch, stroke width and font size sliders, and the
//! session commands (undo, clear, download, save, cancel).

use crate::config::{FONT_SIZE_RANGE, STROKE_WIDTH_RANGE};
use crate::ui::capture::{CaptureEvent, CaptureSurface, Mode};
use crate::util::color;

/// Session command picked on the tool bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    Undo,
    ClearAll,
    Download,
    Save,
    Cancel,
}

/// Display the tool bar. Tool settings are applied to the surface directly.
pub fn show(ui: &mut egui::Ui, surface: &mut CaptureSurface, exporting: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let mode = surface.mode();
        if ui.selectable_label(mode == Mode::Draw, "✏ Draw").clicked() {
            surface.set_mode(Mode::Draw);
        }
        if ui.selectable_label(mode == Mode::Label, "🅰 Text").clicked() {
            surface.set_mode(Mode::Label);
        }

        ui.separator();

        let swatch = surface.tools().swatch().to_vec();
        for hex in &swatch {
            let selected = surface.tools().color() == hex;
            let fill = color::to_color32(hex);
            let stroke = if selected {
                egui::Stroke::new(2.0, ui.visuals().strong_text_color())
            } else {
                egui::Stroke::new(1.0, egui::Color32::from_gray(90))
            };
            let button = egui::Button::new("").fill(fill).stroke(stroke).min_size(egui::vec2(18.0, 18.0));
            if ui.add(button).on_hover_text(hex.as_str()).clicked() {
                surface.tools_mut().set_color(hex);
            }
        }

        ui.separator();

        match surface.mode() {
            Mode::Draw => {
                let mut width = surface.tools().stroke_width();
                let slider = egui::Slider::new(&mut width, STROKE_WIDTH_RANGE.0..=STROKE_WIDTH_RANGE.1)
                    .step_by(1.0)
                    .text("Width");
                if ui.add(slider).changed() {
                    surface.tools_mut().set_stroke_width(width);
                }
            }
            Mode::Label => {
                let mut size = surface.tools().font_size();
                let slider = egui::Slider::new(&mut size, FONT_SIZE_RANGE.0..=FONT_SIZE_RANGE.1)
                    .step_by(1.0)
                    .text("Font size");
                if ui.add(slider).changed() {
                    surface.tools_mut().set_font_size(size);
                }
            }
        }

        ui.separator();

        let editable = surface.is_enabled();
        if ui
            .add_enabled(editable && surface.store().can_undo(), egui::Button::new("⟲ Undo"))
            .clicked()
        {
            action = ToolbarAction::Undo;
        }
        if ui
            .add_enabled(editable && !surface.store().is_empty(), egui::Button::new("🗑 Clear"))
            .clicked()
        {
            action = ToolbarAction::ClearAll;
        }

        ui.separator();

        let download_label = if exporting { "Exporting..." } else { "⬇ Download" };
        if ui.add_enabled(!exporting, egui::Button::new(download_label)).clicked() {
            action = ToolbarAction::Download;
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.add_enabled(!exporting, egui::Button::new("Save")).clicked() {
                action = ToolbarAction::Save;
            }
            if ui.button("Cancel").clicked() {
                action = ToolbarAction::Cancel;
            }
        });
    });

    ui.horizontal(|ui| {
        let hint = match surface.mode() {
            Mode::Draw => "Drag on the photo to draw",
            Mode::Label => "Click on the photo to place a label",
        };
        ui.label(egui::RichText::new(hint).italics().weak());
    });

    action
}

/// Floating text prompt shown while a label is awaiting its text.
pub fn show_text_prompt(ctx: &egui::Context, surface: &mut CaptureSurface) {
    let Some(current) = surface.pending_text().map(str::to_string) else {
        return;
    };

    let mut text = current.clone();
    let mut confirm = false;
    let mut cancel = false;

    egui::Window::new("Label text")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 80.0))
        .show(ctx, |ui| {
            let response = ui.add(egui::TextEdit::singleline(&mut text).hint_text("Enter text"));
            response.request_focus();
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                confirm = true;
            }

            ui.horizontal(|ui| {
                let can_confirm = !text.trim().is_empty();
                if ui.add_enabled(can_confirm, egui::Button::new("Add")).clicked() {
                    confirm = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

    if text != current {
        surface.handle(CaptureEvent::TextChanged(text));
    }
    if cancel || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        surface.handle(CaptureEvent::CancelText);
    } else if confirm {
        surface.handle(CaptureEvent::ConfirmText);
    }
}
