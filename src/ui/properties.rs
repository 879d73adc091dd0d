// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Issue details panel.
//!
//! This module provides the side panel of the annotate session for editing
//! the issue's title, description, location, type, priority and assignee,
//! plus a read-only summary of the photo's annotations.

use crate::models::project::{IssueDetails, IssueType, Priority};
use crate::ui::capture::CaptureSurface;

/// Display the details panel. Returns true when a field was edited.
pub fn show(
    ui: &mut egui::Ui,
    details: &mut IssueDetails,
    assignees: &[String],
    surface: &CaptureSurface,
    file_name: &str,
) -> bool {
    let mut changed = false;

    ui.heading("Issue");
    ui.separator();

    egui::Grid::new("issue_details").num_columns(2).spacing([8.0, 6.0]).show(ui, |ui| {
        ui.label("Title:");
        changed |= ui.text_edit_singleline(&mut details.title).changed();
        ui.end_row();

        ui.label("Location:");
        changed |= ui.text_edit_singleline(&mut details.location).changed();
        ui.end_row();

        ui.label("Type:");
        egui::ComboBox::from_id_source("issue_type")
            .selected_text(details.issue_type.as_str())
            .show_ui(ui, |ui| {
                for value in [IssueType::Issue, IssueType::Information] {
                    changed |= ui.selectable_value(&mut details.issue_type, value, value.as_str()).changed();
                }
            });
        ui.end_row();

        ui.label("Priority:");
        egui::ComboBox::from_id_source("issue_priority")
            .selected_text(details.priority.as_str())
            .show_ui(ui, |ui| {
                for value in Priority::ALL {
                    changed |= ui.selectable_value(&mut details.priority, value, value.as_str()).changed();
                }
            });
        ui.end_row();

        ui.label("Assigned to:");
        ui.horizontal(|ui| {
            changed |= ui.text_edit_singleline(&mut details.assigned_to).changed();
            if !assignees.is_empty() {
                ui.menu_button("▾", |ui| {
                    for name in assignees {
                        if ui.button(name.as_str()).clicked() {
                            details.assigned_to = name.clone();
                            changed = true;
                            ui.close_menu();
                        }
                    }
                });
            }
        });
        ui.end_row();
    });

    ui.label("Description:");
    changed |= ui
        .add(egui::TextEdit::multiline(&mut details.description).desired_rows(4).desired_width(f32::INFINITY))
        .changed();

    ui.add_space(12.0);
    ui.heading("Photo");
    ui.separator();
    ui.label(file_name);

    let store = surface.store();
    ui.label(format!("{} strokes, {} labels", store.strokes().len(), store.labels().len()));
    if let Some(space) = surface.authoring_space() {
        ui.label(egui::RichText::new(format!("Drawn at {:.0}×{:.0}", space.width, space.height)).weak());
    }

    egui::ScrollArea::vertical().max_height(160.0).show(ui, |ui| {
        for label in store.labels() {
            ui.horizontal(|ui| {
                ui.colored_label(crate::util::color::to_color32(&label.color), "■");
                ui.label(label.text.as_str());
            });
        }
    });

    changed
}
