// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export compositor.
//!
//! Flattens a photo and its annotations into one raster at the photo's
//! native resolution, for download or for embedding in a report. Both uses
//! scale annotations from the recorded authoring space.

use super::media;
use crate::models::annotation::Annotation;
use crate::models::project::{Issue, Photo, Project, Settings};
use crate::models::store::AnnotationStore;
use crate::render::{self, Renderer};
use crate::util::geometry::{resolve_authoring_space, ScaleTransform, Size};
use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Owned copy of everything needed to export one photo, taken before the
/// export starts so that later edits cannot race with it.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub image_path: PathBuf,
    pub file_name: String,
    pub annotations: Vec<Annotation>,
    pub authoring_space: Option<Size>,
}

/// An encoded flattened image.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Draw `annotations` over `photo` at the photo's own resolution.
///
/// Annotations are mapped from `authoring_space` to the photo size; a list
/// without one is taken as drawn at the photo's own size.
pub fn flatten(
    photo: &RgbaImage,
    annotations: &[Annotation],
    authoring_space: Option<Size>,
    renderer: &Renderer,
) -> Result<RgbaImage> {
    let native = Size::from_pixels(photo.width(), photo.height());
    let transform = ScaleTransform::between(resolve_authoring_space(authoring_space, native), native);

    let mut pixmap = render::pixmap_from_rgba(photo)?;
    renderer.render_with(&mut pixmap, annotations, &transform);
    Ok(render::pixmap_to_rgba(&pixmap))
}

/// Encode as JPEG. Transparency is dropped.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality.clamp(1, 100));
    encoder.encode_image(&rgb).context("Failed to encode JPEG")?;
    Ok(bytes)
}

/// File name offered for a downloaded annotated photo.
pub fn download_file_name(file_name: &str) -> String {
    let base = match file_name.trim() {
        "" => "image.png",
        name => name,
    };
    let jpeg = Path::new(base).with_extension("jpg");
    format!("annotated-{}", jpeg.to_string_lossy())
}

/// Validated annotations of a persisted photo; malformed records are skipped.
pub fn photo_annotations(photo: &Photo) -> Vec<Annotation> {
    let mut store = AnnotationStore::new();
    store.load(photo.records());
    store.annotations()
}

/// Snapshot of a persisted photo for export.
pub fn snapshot_photo(photo: &Photo, base_dir: &Path) -> ExportSnapshot {
    ExportSnapshot {
        image_path: media::resolve_source(base_dir, &photo.source),
        file_name: photo.file_name.clone(),
        annotations: photo_annotations(photo),
        authoring_space: photo.annotation_space,
    }
}

/// Decode, flatten and encode a snapshot.
pub fn export_snapshot(snapshot: &ExportSnapshot, renderer: &Renderer, quality: u8) -> Result<EncodedImage> {
    let photo = media::decode_rgba(&snapshot.image_path)?;
    let flattened = flatten(&photo, &snapshot.annotations, snapshot.authoring_space, renderer)?;
    let bytes = encode_jpeg(&flattened, quality)?;
    log::info!(
        "Exported {} ({}x{}, {} annotations)",
        snapshot.file_name,
        flattened.width(),
        flattened.height(),
        snapshot.annotations.len()
    );
    Ok(EncodedImage {
        bytes,
        width: flattened.width(),
        height: flattened.height(),
    })
}

/// Flattened JPEG of a persisted photo.
pub fn export_photo(photo: &Photo, base_dir: &Path, renderer: &Renderer, quality: u8) -> Result<Vec<u8>> {
    let snapshot = snapshot_photo(photo, base_dir);
    Ok(export_snapshot(&snapshot, renderer, quality)?.bytes)
}

/// Which issues a report covers.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    pub assignee: Option<String>,
    pub include_completed: bool,
    pub include_pending: bool,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self {
            assignee: None,
            include_completed: true,
            include_pending: true,
        }
    }
}

impl ReportFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        let assignee_ok = match &self.assignee {
            Some(name) => issue.assigned_to == *name,
            None => true,
        };
        let status_ok = (self.include_completed && issue.completed) || (self.include_pending && !issue.completed);
        assignee_ok && status_ok
    }

    /// Matching issues in display order.
    pub fn issues<'a>(&self, project: &'a Project) -> Vec<&'a Issue> {
        project
            .ordered_issues()
            .into_iter()
            .filter(|issue| self.matches(issue))
            .collect()
    }
}

/// Image for one report row: a flattened raster, or the details to print in
/// its place when the photo could not be produced.
#[derive(Debug, Clone)]
pub enum ReportImage {
    Raster(EncodedImage),
    TextOnly { lines: Vec<String> },
}

/// One photo row of a report.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub issue_id: String,
    pub photo_id: String,
    pub title: String,
    pub image: ReportImage,
}

/// Text details for a photo row.
pub fn photo_details(issue: &Issue, photo: &Photo) -> Vec<String> {
    let status = if issue.completed { "Completed" } else { "Pending" };
    let mut lines = vec![
        format!("Photo #{}: {}", photo.order, photo.file_name),
        format!("Type: {} | Priority: {}", issue.issue_type.as_str(), issue.priority.as_str()),
        format!("Status: {}", status),
    ];
    if !issue.location.is_empty() {
        lines.push(format!("Location: {}", issue.location));
    }
    if !issue.assigned_to.is_empty() {
        lines.push(format!("Assigned To: {}", issue.assigned_to));
    }
    if issue.signed_off {
        lines.push(format!("Signed Off: {}", issue.sign_off_date.as_deref().unwrap_or("-")));
        if let Some(notes) = &issue.sign_off_notes {
            lines.push(format!("Notes: {}", notes));
        }
        if let Some(evidence) = &issue.sign_off_photo {
            lines.push(format!("Evidence photo: {}", evidence.file_name));
        }
    }
    lines
}

/// Flatten one photo for a report. Failures degrade to text-only details.
pub fn flatten_for_report(
    issue: &Issue,
    photo: &Photo,
    base_dir: &Path,
    settings: &Settings,
    renderer: &Renderer,
    quality: u8,
) -> ReportEntry {
    let title = format!("{} #{}: {}", settings.issue_label, issue.order, issue.title);
    let snapshot = snapshot_photo(photo, base_dir);

    let image = match export_snapshot(&snapshot, renderer, quality) {
        Ok(encoded) => ReportImage::Raster(encoded),
        Err(e) => {
            log::error!("Photo {} of issue {} left out of report: {:#}", photo.id, issue.id, e);
            ReportImage::TextOnly {
                lines: photo_details(issue, photo),
            }
        }
    };

    ReportEntry {
        issue_id: issue.id.clone(),
        photo_id: photo.id.clone(),
        title,
        image,
    }
}

/// Flatten every photo of every matching issue, in display order.
pub fn flatten_project(
    project: &Project,
    filter: &ReportFilter,
    base_dir: &Path,
    settings: &Settings,
    renderer: &Renderer,
    quality: u8,
) -> Vec<ReportEntry> {
    let mut entries = Vec::new();
    for issue in filter.issues(project) {
        for photo in issue.ordered_photos() {
            entries.push(flatten_for_report(issue, photo, base_dir, settings, renderer, quality));
        }
    }
    log::info!("Flattened {} photos for project {}", entries.len(), project.id);
    entries
}
