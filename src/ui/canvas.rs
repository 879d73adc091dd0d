// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Edit canvas for the annotate session.
//!
//! This module lays the photo out letterboxed in the available space, turns
//! egui pointer responses into capture events, and shows the rendered
//! annotation overlay on top of the photo.

use crate::render::Renderer;
use crate::ui::capture::{CaptureEvent, CaptureState, CaptureSurface, PointerInput};
use crate::util::geometry::{fit_within, ScaleTransform, Size};

/// Textures shown by the canvas.
#[derive(Default)]
pub struct CanvasTextures {
    pub photo: Option<egui::TextureHandle>,
    /// Size of the decoded photo, before the display copy was made.
    pub photo_size: Option<(u32, u32)>,
    pub overlay: Option<egui::TextureHandle>,
}

/// Display the canvas area and route pointer input to the capture surface.
pub fn show(
    ui: &mut egui::Ui,
    surface: &mut CaptureSurface,
    textures: &mut CanvasTextures,
    renderer: &Renderer,
    loading_message: Option<&str>,
) {
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some((img_width, img_height))) = (&textures.photo, textures.photo_size) else {
            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.spinner();
                    ui.add_space(10.0);
                    ui.label(
                        egui::RichText::new(loading_message.unwrap_or("Loading image..."))
                            .size(16.0)
                            .color(egui::Color32::from_gray(200)),
                    );
                });
            });
            return;
        };

        let available = ui.available_size();
        let display = fit_within(
            Size::from_pixels(img_width, img_height),
            Size::new(available.x as f64, available.y as f64),
        );
        let display_width = display.width as f32;
        let display_height = display.height as f32;

        // Center the image
        let x_offset = (available.x - display_width) / 2.0;
        let y_offset = (available.y - display_height) / 2.0;

        let image_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(display_width, display_height),
        );
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        surface.set_box_origin(image_rect.min.x as f64, image_rect.min.y as f64);
        surface.handle(CaptureEvent::Resize(Size::new(display_width as f64, display_height as f64)));

        ui.painter().image(texture.id(), image_rect, uv, egui::Color32::WHITE);

        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        route_pointer(ui, &response, image_rect, surface);

        if surface.take_dirty() || textures.overlay.is_none() {
            upload_overlay(ui.ctx(), surface, textures, renderer);
        }
        if let Some(overlay) = &textures.overlay {
            ui.painter().image(overlay.id(), image_rect, uv, egui::Color32::WHITE);
        }

        // Pending label anchor
        if let CaptureState::AwaitingText { anchor, .. } = surface.state() {
            let to_screen = ScaleTransform::between(surface.authoring_space().unwrap_or(display), display);
            let local = to_screen.apply_point(*anchor);
            let marker = image_rect.min + egui::vec2(local.x as f32, local.y as f32);
            ui.painter().circle_stroke(marker, 4.0, egui::Stroke::new(1.5, egui::Color32::WHITE));
        }

        if !surface.is_enabled() {
            ui.painter().rect_filled(image_rect, 0.0, egui::Color32::from_black_alpha(96));
        }
    });
}

/// Translate one frame of egui pointer state into capture events.
fn route_pointer(ui: &egui::Ui, response: &egui::Response, image_rect: egui::Rect, surface: &mut CaptureSurface) {
    let mouse = |pos: egui::Pos2| PointerInput::Mouse {
        x: pos.x as f64,
        y: pos.y as f64,
    };

    if response.drag_started() {
        // Start where the button went down, not where the drag threshold was crossed
        if let Some(origin) = ui.input(|i| i.pointer.press_origin()) {
            surface.handle(CaptureEvent::PointerDown(mouse(origin)));
        }
    }
    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            if image_rect.contains(pos) {
                surface.handle(CaptureEvent::PointerMove(mouse(pos)));
            } else {
                surface.handle(CaptureEvent::PointerLeave);
            }
        }
    }
    if response.drag_stopped() {
        surface.handle(CaptureEvent::PointerUp);
    }
    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            surface.handle(CaptureEvent::Click(mouse(pos)));
        }
    }
}

fn upload_overlay(ctx: &egui::Context, surface: &CaptureSurface, textures: &mut CanvasTextures, renderer: &Renderer) {
    let pixmap = match surface.preview(renderer) {
        Ok(pixmap) => pixmap,
        Err(e) => {
            log::error!("Failed to render annotation overlay: {:#}", e);
            return;
        }
    };
    let size = [pixmap.width() as usize, pixmap.height() as usize];
    let image = egui::ColorImage::from_rgba_premultiplied(size, pixmap.data());
    match &mut textures.overlay {
        Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
        None => textures.overlay = Some(ctx.load_texture("annotation_overlay", image, egui::TextureOptions::LINEAR)),
    }
}
