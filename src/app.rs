// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait: browsing projects, issues and photos in the data
//! directory, and running one annotate session at a time.

use crate::config::{self, AppConfig};
use crate::io::export::{self, ExportSnapshot};
use crate::io::media::{self, LoadedImage};
use crate::io::serialization;
use crate::io::storage::{self, DocumentStore, FileStore};
use crate::models::project::{IssueDetails, Project};
use crate::models::store::Undone;
use crate::render::Renderer;
use crate::ui::canvas::{self, CanvasTextures};
use crate::ui::capture::{CaptureEvent, CaptureSurface, ToolSettings};
use crate::ui::{properties, toolbar};
use crate::util::geometry::Size;
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

/// Result of background image loading operation.
struct LoadedPhoto {
    photo_id: String,
    /// Native size of the photo file.
    native: (u32, u32),
    display: LoadedImage,
}

/// An open annotate session on one photo.
struct Session {
    project_id: String,
    issue_id: String,
    photo_id: String,
    file_name: String,
    image_path: PathBuf,
    surface: CaptureSurface,
    details: IssueDetails,
    details_edited: bool,
    textures: CanvasTextures,
}

/// Main application state.
pub struct SnagmarkApp {
    store: FileStore,
    config: AppConfig,
    renderer: Renderer,

    projects: Vec<Project>,
    selected_project: Option<String>,
    selected_issue: Option<String>,

    session: Option<Session>,

    /// Receiver for background image loading
    image_loader: Option<Receiver<Result<LoadedPhoto>>>,

    /// Receiver for a running download export
    export_job: Option<Receiver<Result<PathBuf>>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last outcome shown in the status bar
    status: Option<String>,
}

impl SnagmarkApp {
    /// Create the application on a data directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let handle = config::load_config(data_dir);
        handle.log_usage();
        let renderer = Renderer::from_font_path(handle.config.font.path.as_deref())?;
        let store = FileStore::open(data_dir)?;

        let mut app = Self {
            store,
            config: handle.config,
            renderer,
            projects: Vec::new(),
            selected_project: None,
            selected_issue: None,
            session: None,
            image_loader: None,
            export_job: None,
            loading_message: None,
            status: None,
        };
        app.reload_projects();
        Ok(app)
    }

    fn reload_projects(&mut self) {
        match self.store.projects() {
            Ok(projects) => {
                log::info!("Loaded {} projects from {}", projects.len(), self.store.dir().display());
                self.projects = projects;
            }
            Err(e) => self.report_error("Failed to load projects", &e),
        }
        if let Some(id) = &self.selected_project {
            if !self.projects.iter().any(|p| &p.id == id) {
                self.selected_project = None;
                self.selected_issue = None;
            }
        }
    }

    fn report_error(&mut self, what: &str, e: &anyhow::Error) {
        log::error!("{}: {:#}", what, e);
        self.status = Some(format!("{}: {}", what, e));
    }

    fn open_data_dir(&mut self, dir: PathBuf) {
        if self.session.is_some() {
            self.status = Some("Close the annotate session first".to_string());
            return;
        }
        match SnagmarkApp::new(&dir) {
            Ok(app) => {
                *self = app;
                self.status = Some(format!("Opened {}", dir.display()));
            }
            Err(e) => self.report_error("Failed to open data directory", &e),
        }
    }

    fn current_project(&self) -> Option<&Project> {
        let id = self.selected_project.as_ref()?;
        self.projects.iter().find(|p| &p.id == id)
    }

    /// Open an annotate session on a photo and start decoding it.
    fn open_session(&mut self, project_id: &str, issue_id: &str, photo_id: &str) {
        let Some(project) = self.projects.iter().find(|p| p.id == project_id) else {
            return;
        };
        let Some(issue) = project.issue(issue_id) else {
            return;
        };
        let Some(photo) = issue.photo(photo_id) else {
            return;
        };

        let mut surface = CaptureSurface::new(ToolSettings::from_defaults(&self.config.tools));
        let skipped = surface.open(photo.records(), photo.annotation_space);
        if skipped > 0 {
            self.status = Some(format!("{} saved annotations could not be read and were left out", skipped));
        }

        let image_path = media::resolve_source(self.store.dir(), &photo.source);
        self.session = Some(Session {
            project_id: project_id.to_string(),
            issue_id: issue_id.to_string(),
            photo_id: photo_id.to_string(),
            file_name: photo.file_name.clone(),
            image_path: image_path.clone(),
            surface,
            details: IssueDetails::from_issue(issue),
            details_edited: false,
            textures: CanvasTextures::default(),
        });

        self.load_photo(photo_id.to_string(), image_path);
    }

    /// Decode the photo and make the display copy (asynchronously).
    fn load_photo(&mut self, photo_id: String, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());
        let max_edge = self.config.export.display_max_edge;

        std::thread::spawn(move || {
            let result = media::decode_rgba(&path).map(|image| {
                let native = image.dimensions();
                let display = media::display_copy(image, max_edge);
                log::info!(
                    "Loaded image: {} ({}x{}, shown at {}x{})",
                    path.display(),
                    native.0,
                    native.1,
                    display.width(),
                    display.height()
                );
                LoadedPhoto {
                    photo_id,
                    native,
                    display: LoadedImage::from_rgba(display),
                }
            });
            let _ = sender.send(result);
        });
    }

    fn poll_image_loader(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.image_loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.image_loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => {
                let Some(session) = self.session.as_mut().filter(|s| s.photo_id == loaded.photo_id) else {
                    return;
                };
                let size = [loaded.display.width as usize, loaded.display.height as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &loaded.display.pixels);
                let texture = ctx.load_texture("photo", color_image, egui::TextureOptions::LINEAR);
                session.textures.photo = Some(texture);
                session.textures.photo_size = Some(loaded.native);
                session.surface.set_native_size(Size::from_pixels(loaded.native.0, loaded.native.1));
            }
            Err(e) => {
                self.report_error("Failed to load image", &e);
                self.session = None;
            }
        }
    }

    fn poll_export(&mut self) {
        let Some(receiver) = &self.export_job else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.export_job = None;
        if let Some(session) = &mut self.session {
            session.surface.set_enabled(true);
        }
        match result {
            Ok(path) => self.status = Some(format!("Downloaded {}", path.display())),
            Err(e) => self.report_error("Download failed", &e),
        }
    }

    /// Export the session's photo on a background thread.
    fn start_download(&mut self) {
        if self.export_job.is_some() {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JPEG", &["jpg", "jpeg"])
            .set_file_name(export::download_file_name(&session.file_name))
            .save_file()
        else {
            return;
        };

        session.surface.set_enabled(false);
        let snapshot: ExportSnapshot = session
            .surface
            .snapshot(session.image_path.clone(), session.file_name.clone());
        let renderer = self.renderer.clone();
        let quality = self.config.export.jpeg_quality;

        let (sender, receiver) = channel();
        self.export_job = Some(receiver);
        self.status = Some("Exporting...".to_string());

        std::thread::spawn(move || {
            let result = export::export_snapshot(&snapshot, &renderer, quality).and_then(|encoded| {
                std::fs::write(&path, encoded.bytes).map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
                Ok(path)
            });
            let _ = sender.send(result);
        });
    }

    /// Write the session's annotations and issue details back, then close it.
    fn save_session(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let details = session.details_edited.then_some(&session.details);
        let result = storage::save_photo_annotations(
            &mut self.store,
            &session.project_id,
            &session.issue_id,
            &session.photo_id,
            session.surface.records(),
            session.surface.authoring_space(),
            details,
        );
        match result {
            Ok(_) => {
                self.status = Some(format!("Saved {}", session.file_name));
                self.session = None;
                self.reload_projects();
            }
            Err(e) => self.report_error("Save failed", &e),
        }
    }

    fn cancel_session(&mut self) {
        if let Some(session) = self.session.take() {
            log::info!("Discarded annotate session on photo {}", session.photo_id);
        }
        self.image_loader = None;
        self.loading_message = None;
    }

    fn import_project(&mut self, path: PathBuf) {
        let result = serialization::import_project(&path).and_then(|project| {
            self.store.save_project(&project)?;
            Ok(project)
        });
        match result {
            Ok(project) => {
                self.status = Some(format!("Imported project {}", project.name));
                self.selected_project = Some(project.id);
                self.reload_projects();
            }
            Err(e) => self.report_error("Import failed", &e),
        }
    }

    fn export_project(&mut self, path: PathBuf) {
        let Some(project) = self.current_project() else {
            return;
        };
        match serialization::export_project(project, &path) {
            Ok(()) => {
                log::info!("Exported project to {}", path.display());
                self.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => self.report_error("Export failed", &e),
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Data Folder...").clicked() {
                        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                            self.open_data_dir(dir);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Import Project...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Project", &["yaml", "yml", "json"])
                            .pick_file()
                        {
                            self.import_project(path);
                        }
                        ui.close_menu();
                    }
                    let has_project = self.current_project().is_some();
                    if ui.add_enabled(has_project, egui::Button::new("Export Project...")).clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("YAML", &["yaml", "yml"])
                            .add_filter("JSON", &["json"])
                            .set_file_name("project.yaml")
                            .save_file()
                        {
                            self.export_project(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }

    /// Project, issue and photo pickers shown when no session is open.
    fn show_browser(&mut self, ctx: &egui::Context) {
        let mut open: Option<(String, String, String)> = None;
        let mut select_issue: Option<String> = None;

        egui::SidePanel::left("projects").default_width(220.0).show(ctx, |ui| {
            ui.heading("Projects");
            ui.separator();
            if self.projects.is_empty() {
                ui.label(egui::RichText::new("No projects in this folder").weak());
            }
            for project in &self.projects {
                let selected = self.selected_project.as_deref() == Some(project.id.as_str());
                if ui.selectable_label(selected, project.name.as_str()).clicked() {
                    self.selected_project = Some(project.id.clone());
                    self.selected_issue = None;
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(project) = self.current_project() else {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new("Select a project to begin annotating")
                            .color(egui::Color32::from_gray(180)),
                    );
                });
                return;
            };

            ui.heading(project.name.as_str());
            ui.label(egui::RichText::new(format!("{} · {}", project.client, project.audit_date)).weak());
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                for issue in project.ordered_issues() {
                    let selected = self.selected_issue.as_deref() == Some(issue.id.as_str());
                    let title = format!("#{} {} [{}]", issue.order, issue.title, issue.priority.as_str());
                    if ui.selectable_label(selected, title).clicked() {
                        select_issue = Some(issue.id.clone());
                    }
                    if !selected {
                        continue;
                    }
                    ui.indent(&issue.id, |ui| {
                        if issue.photos.is_empty() {
                            ui.label(egui::RichText::new("No photos").weak());
                        }
                        for photo in issue.ordered_photos() {
                            ui.horizontal(|ui| {
                                let count = photo.records().len();
                                ui.label(format!("{} ({} annotations)", photo.file_name, count));
                                if ui.button("Annotate").clicked() {
                                    open = Some((project.id.clone(), issue.id.clone(), photo.id.clone()));
                                }
                            });
                        }
                    });
                }
            });
        });

        if select_issue.is_some() {
            self.selected_issue = select_issue;
        }

        if let Some((project_id, issue_id, photo_id)) = open {
            self.open_session(&project_id, &issue_id, &photo_id);
        }
    }

    fn show_session(&mut self, ctx: &egui::Context) {
        let exporting = self.export_job.is_some();
        let assignees: Vec<String> = self
            .current_project()
            .map(|p| p.assignees().into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        let Some(session) = &mut self.session else {
            return;
        };

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &mut session.surface, exporting))
            .inner;

        egui::SidePanel::right("properties").default_width(260.0).show(ctx, |ui| {
            if properties::show(ui, &mut session.details, &assignees, &session.surface, &session.file_name) {
                session.details_edited = true;
            }
        });

        toolbar::show_text_prompt(ctx, &mut session.surface);

        // Handle keyboard events
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z)) {
            log_undo(session.surface.undo());
        }
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            session.surface.handle(CaptureEvent::CancelText);
        }

        let loading = self.loading_message.as_deref();
        let renderer = &self.renderer;
        egui::CentralPanel::default().show(ctx, |ui| {
            canvas::show(ui, &mut session.surface, &mut session.textures, renderer, loading);
        });

        match toolbar_action {
            toolbar::ToolbarAction::Undo => log_undo(session.surface.undo()),
            toolbar::ToolbarAction::ClearAll => {
                session.surface.clear_all();
                log::info!("Cleared all annotations");
            }
            toolbar::ToolbarAction::Download => self.start_download(),
            toolbar::ToolbarAction::Save => self.save_session(),
            toolbar::ToolbarAction::Cancel => self.cancel_session(),
            toolbar::ToolbarAction::None => {}
        }
    }
}

fn log_undo(undone: Undone) {
    match undone {
        Undone::Stroke(stroke) => log::info!("Undo stroke ({} points)", stroke.points.len()),
        Undone::Label(label) => log::info!("Undo label {:?}", label.text),
        Undone::Nothing => {}
    }
}

impl eframe::App for SnagmarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_image_loader(ctx);
        self.poll_export();

        // Keep polling while background work runs
        if self.loading_message.is_some() || self.export_job.is_some() {
            ctx.request_repaint();
        }

        self.show_menu(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(self.store.dir().display().to_string()).weak());
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status.as_str());
                }
            });
        });

        if self.session.is_some() {
            self.show_session(ctx);
        } else {
            self.show_browser(ctx);
        }
    }
}
