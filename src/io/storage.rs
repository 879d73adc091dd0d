// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Persistence store for project and settings documents.
//!
//! Documents are addressed by key and always written whole. The file store
//! keeps one JSON document per key in the data directory.

use crate::models::annotation::AnnotationRecord;
use crate::models::project::{IssueDetails, Project, Settings};
use crate::util::geometry::Size;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

const PROJECTS_KEY: &str = "audit_projects";
const SETTINGS_KEY: &str = "audit_settings";

/// Durable storage for project and settings documents.
pub trait DocumentStore {
    fn projects(&self) -> Result<Vec<Project>>;

    /// Insert a project, or replace the stored project with the same id.
    fn save_project(&mut self, project: &Project) -> Result<()>;

    fn settings(&self) -> Result<Settings>;

    fn save_settings(&mut self, settings: &Settings) -> Result<()>;

    fn project(&self, project_id: &str) -> Result<Option<Project>> {
        Ok(self.projects()?.into_iter().find(|p| p.id == project_id))
    }
}

/// JSON documents in a directory, one file per key.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a data directory, creating it and a default settings document
    /// when missing.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        let mut store = Self { dir: dir.to_path_buf() };
        if !store.key_path(SETTINGS_KEY).exists() {
            store.save_settings(&Settings::default())?;
            log::info!("Wrote default settings to {}", store.key_path(SETTINGS_KEY).display());
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn read_key(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(data))
    }

    /// Write through a temporary file so a failed write never truncates the
    /// previous document.
    fn write_key(&self, key: &str, data: &str) -> Result<()> {
        let path = self.key_path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

impl DocumentStore for FileStore {
    fn projects(&self) -> Result<Vec<Project>> {
        match self.read_key(PROJECTS_KEY)? {
            Some(data) => serde_json::from_str(&data).context("Failed to parse project documents"),
            None => Ok(Vec::new()),
        }
    }

    fn save_project(&mut self, project: &Project) -> Result<()> {
        let mut projects = self.projects()?;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        self.write_key(PROJECTS_KEY, &serde_json::to_string(&projects)?)?;
        log::info!("Saved project {} ({} projects stored)", project.id, projects.len());
        Ok(())
    }

    fn settings(&self) -> Result<Settings> {
        match self.read_key(SETTINGS_KEY)? {
            Some(data) => serde_json::from_str(&data).context("Failed to parse settings document"),
            None => Ok(Settings::default()),
        }
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        self.write_key(SETTINGS_KEY, &serde_json::to_string(settings)?)
    }
}

/// Replace one photo's annotation list (and optionally the edited issue
/// details) and write the project back whole.
///
/// The stored project is re-read first so that edits to other photos made
/// since the session opened are kept; the photo itself is last-writer-wins.
pub fn save_photo_annotations(
    store: &mut dyn DocumentStore,
    project_id: &str,
    issue_id: &str,
    photo_id: &str,
    records: Vec<AnnotationRecord>,
    space: Option<Size>,
    details: Option<&IssueDetails>,
) -> Result<Project> {
    let mut project = store
        .project(project_id)?
        .ok_or_else(|| anyhow!("Project {} not found", project_id))?;
    let count = records.len();
    project.photo_mut(issue_id, photo_id)?.replace_annotations(records, space);
    if let (Some(details), Some(issue)) = (details, project.issue_mut(issue_id)) {
        details.apply_to(issue);
    }
    store.save_project(&project)?;
    log::info!("Saved {} annotations on photo {}", count, photo_id);
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Point;
    use crate::models::project::{Issue, IssueType, Photo, Priority, ProjectStatus};
    use crate::models::store::AnnotationStore;

    fn temp_store(name: &str) -> FileStore {
        let dir = std::env::temp_dir().join(format!("snagmark-store-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        FileStore::open(&dir).unwrap()
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.into(),
            name: "Site".into(),
            reference_code: String::new(),
            audit_date: String::new(),
            location: String::new(),
            client: String::new(),
            auditor_name: String::new(),
            created_at: String::new(),
            status: ProjectStatus::Draft,
            issues: vec![Issue {
                id: "i1".into(),
                title: "Leak".into(),
                description: String::new(),
                issue_type: IssueType::Issue,
                priority: Priority::Medium,
                location: String::new(),
                assigned_to: String::new(),
                completed: false,
                signed_off: false,
                sign_off_date: None,
                sign_off_by: None,
                sign_off_notes: None,
                sign_off_photo: None,
                order: 1,
                photos: vec![
                    Photo::new("a".into(), "a.jpg".into(), "a.jpg".into(), 1, String::new()),
                    Photo::new("b".into(), "b.jpg".into(), "b.jpg".into(), 2, String::new()),
                ],
            }],
        }
    }

    #[test]
    fn test_empty_store() {
        let store = temp_store("empty");
        assert!(store.projects().unwrap().is_empty());
        assert_eq!(store.settings().unwrap(), Settings::default());
        assert!(store.project("p1").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_by_id() {
        let mut store = temp_store("replace");
        store.save_project(&project("p1")).unwrap();
        store.save_project(&project("p2")).unwrap();

        let mut renamed = project("p1");
        renamed.name = "Renamed".into();
        store.save_project(&renamed).unwrap();

        let projects = store.projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(store.project("p1").unwrap().unwrap().name, "Renamed");
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut store = temp_store("settings");
        let mut settings = Settings::default();
        settings.company_name = "Acme Audits".into();
        store.save_settings(&settings).unwrap();

        assert_eq!(store.settings().unwrap(), settings);

        // Reopening keeps the saved document
        let reopened = FileStore::open(store.dir()).unwrap();
        assert_eq!(reopened.settings().unwrap(), settings);
    }

    #[test]
    fn test_open_writes_default_settings() {
        let store = temp_store("defaults");
        let data = std::fs::read_to_string(store.dir().join("audit_settings.json")).unwrap();
        let written: Settings = serde_json::from_str(&data).unwrap();
        assert_eq!(written, Settings::default());
    }

    #[test]
    fn test_save_photo_annotations_replaces_whole_list() {
        let mut store = temp_store("annotations");
        store.save_project(&project("p1")).unwrap();

        let mut session = AnnotationStore::new();
        session.add_label(Point::new(50.0, 50.0), "Leak", 16.0, "#ff0000");
        save_photo_annotations(&mut store, "p1", "i1", "b", session.to_records(), Some(Size::new(400.0, 300.0)), None)
            .unwrap();

        session.clear_all();
        session.add_label(Point::new(10.0, 10.0), "Crack", 16.0, "#000000");
        session.add_label(Point::new(20.0, 20.0), "Rust", 16.0, "#000000");
        let details = IssueDetails {
            title: "Roof leak".into(),
            ..IssueDetails::default()
        };
        let space = Some(Size::new(400.0, 300.0));
        save_photo_annotations(&mut store, "p1", "i1", "b", session.to_records(), space, Some(&details)).unwrap();

        let saved = store.project("p1").unwrap().unwrap();
        let photo = saved.issues[0].photo("b").unwrap();
        assert_eq!(photo.records().len(), 2);
        assert_eq!(photo.annotation_space, Some(Size::new(400.0, 300.0)));
        assert!(saved.issues[0].photo("a").unwrap().records().is_empty());
        assert_eq!(saved.issues[0].title, "Roof leak");
    }

    #[test]
    fn test_save_photo_annotations_unknown_photo() {
        let mut store = temp_store("unknown");
        store.save_project(&project("p1")).unwrap();

        assert!(save_photo_annotations(&mut store, "p1", "i1", "zz", Vec::new(), None, None).is_err());
        assert!(save_photo_annotations(&mut store, "p9", "i1", "a", Vec::new(), None, None).is_err());
    }
}
