// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Audit document model.
//!
//! A project holds ordered issues, an issue holds ordered photos, and each
//! photo carries its persisted annotation list. Field names follow the
//! camelCase document format.

use super::annotation::{deserialize_records_lenient, AnnotationRecord};
use crate::util::geometry::Size;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    #[default]
    Issue,
    Information,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Issue => "issue",
            IssueType::Information => "information",
        }
    }
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// A photo attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    /// Path of the display image, absolute or relative to the data directory.
    #[serde(alias = "url")]
    pub source: String,
    pub file_name: String,
    pub order: u32,
    #[serde(
        default,
        deserialize_with = "deserialize_records_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub annotations: Option<Vec<AnnotationRecord>>,
    /// Edit-space size the annotation list was authored in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_space: Option<Size>,
    pub upload_date: String,
}

impl Photo {
    pub fn new(id: String, source: String, file_name: String, order: u32, upload_date: String) -> Self {
        Self {
            id,
            source,
            file_name,
            order,
            annotations: Some(Vec::new()),
            annotation_space: None,
            upload_date,
        }
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        self.annotations.as_deref().unwrap_or(&[])
    }

    /// Whole-list replacement of the annotations.
    pub fn replace_annotations(&mut self, records: Vec<AnnotationRecord>, space: Option<Size>) {
        self.annotations = Some(records);
        self.annotation_space = space.filter(Size::is_known);
    }
}

/// Evidence photo attached to a sign-off, independent of the issue photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOffPhoto {
    pub id: String,
    #[serde(alias = "url")]
    pub source: String,
    pub file_name: String,
    pub upload_date: String,
}

/// One audit finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub signed_off: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_off_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_off_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_off_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_off_photo: Option<SignOffPhoto>,
    pub order: u32,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Issue {
    pub fn photo(&self, photo_id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    /// Photos sorted by display order.
    pub fn ordered_photos(&self) -> Vec<&Photo> {
        let mut photos: Vec<&Photo> = self.photos.iter().collect();
        photos.sort_by_key(|p| p.order);
        photos
    }
}

/// Editable issue fields shown next to the annotate canvas.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IssueDetails {
    pub title: String,
    pub description: String,
    pub location: String,
    pub issue_type: IssueType,
    pub priority: Priority,
    pub assigned_to: String,
}

impl IssueDetails {
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            title: issue.title.clone(),
            description: issue.description.clone(),
            location: issue.location.clone(),
            issue_type: issue.issue_type,
            priority: issue.priority,
            assigned_to: issue.assigned_to.clone(),
        }
    }

    pub fn apply_to(&self, issue: &mut Issue) {
        issue.title = self.title.clone();
        issue.description = self.description.clone();
        issue.location = self.location.clone();
        issue.issue_type = self.issue_type;
        issue.priority = self.priority;
        issue.assigned_to = self.assigned_to.clone();
    }
}

/// Complete project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub reference_code: String,
    #[serde(default)]
    pub audit_date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub auditor_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Project {
    pub fn issue(&self, issue_id: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == issue_id)
    }

    pub fn issue_mut(&mut self, issue_id: &str) -> Option<&mut Issue> {
        self.issues.iter_mut().find(|i| i.id == issue_id)
    }

    /// Issues sorted by display order.
    pub fn ordered_issues(&self) -> Vec<&Issue> {
        let mut issues: Vec<&Issue> = self.issues.iter().collect();
        issues.sort_by_key(|i| i.order);
        issues
    }

    pub fn photo_mut(&mut self, issue_id: &str, photo_id: &str) -> Result<&mut Photo> {
        let project_id = self.id.clone();
        let issue = self
            .issue_mut(issue_id)
            .ok_or_else(|| anyhow!("Issue {} not found in project {}", issue_id, project_id))?;
        issue
            .photos
            .iter_mut()
            .find(|p| p.id == photo_id)
            .ok_or_else(|| anyhow!("Photo {} not found in issue {}", photo_id, issue_id))
    }

    /// Distinct non-empty assignees, in first-seen order.
    pub fn assignees(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for issue in &self.issues {
            let name = issue.assigned_to.as_str();
            if !name.is_empty() && !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

/// Report and labelling settings, stored as a separate document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    pub prepared_for_label: String,
    pub assigned_to_label: String,
    pub issue_label: String,
    pub issues_label: String,
    pub report_footer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: "Site Audit Manager".to_string(),
            company_logo: None,
            prepared_for_label: "Prepared For".to_string(),
            assigned_to_label: "Assigned To".to_string(),
            issue_label: "Issue".to_string(),
            issues_label: "Issues".to_string(),
            report_footer: "Professional Audit Report".to_string(),
        }
    }
}
