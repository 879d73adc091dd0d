// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Headless command line.
//!
//! Without a subcommand the desktop app starts. The subcommands flatten
//! annotated photos straight from the data directory:
//!
//!   snagmark export --data-dir site/ --project p1 --issue i1 --photo ph1
//!   snagmark flatten --data-dir site/ --project p1 --output-dir out/ --exclude-completed

use crate::config::{self, ConfigHandle};
use crate::io::export::{self, ReportFilter, ReportImage};
use crate::io::storage::{DocumentStore, FileStore};
use crate::models::project::Project;
use crate::render::Renderer;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Site audit photo annotator.
#[derive(Parser, Debug)]
#[command(name = "snagmark", version, about = "Annotate site audit photos and export them flattened")]
pub struct CliArgs {
    /// Directory holding the project store, config and photos.
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write one photo with its annotations drawn in, as JPEG.
    Export {
        #[arg(long)]
        project: String,
        #[arg(long)]
        issue: String,
        #[arg(long)]
        photo: String,
        /// Defaults to annotated-<file name> in the current directory.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// JPEG quality (1-100). Defaults to the configured quality.
        #[arg(short, long, value_name = "1-100")]
        quality: Option<u8>,
    },
    /// Write every photo of a project flattened, as a report would embed them.
    Flatten {
        #[arg(long)]
        project: String,
        #[arg(long, value_name = "DIR")]
        output_dir: PathBuf,
        /// Only issues assigned to this person.
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        exclude_completed: bool,
        #[arg(long)]
        exclude_pending: bool,
    },
}

/// Run a subcommand and return the process exit code.
/// `0` = every photo written, `1` = an error or any text-only fallback.
pub fn run(data_dir: &Path, command: Command) -> ExitCode {
    let handle = config::load_config(data_dir);
    handle.log_usage();

    let result = match command {
        Command::Export {
            project,
            issue,
            photo,
            output,
            quality,
        } => run_export(data_dir, &handle, &project, &issue, &photo, output, quality),
        Command::Flatten {
            project,
            output_dir,
            assignee,
            exclude_completed,
            exclude_pending,
        } => {
            let filter = ReportFilter {
                assignee,
                include_completed: !exclude_completed,
                include_pending: !exclude_pending,
            };
            run_flatten(data_dir, &handle, &project, &output_dir, &filter)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_project(data_dir: &Path, project_id: &str) -> Result<(FileStore, Project)> {
    let store = FileStore::open(data_dir)?;
    let project = store
        .project(project_id)?
        .ok_or_else(|| anyhow!("Project {} not found in {}", project_id, data_dir.display()))?;
    Ok((store, project))
}

fn run_export(
    data_dir: &Path,
    handle: &ConfigHandle,
    project_id: &str,
    issue_id: &str,
    photo_id: &str,
    output: Option<PathBuf>,
    quality: Option<u8>,
) -> Result<bool> {
    let (_, project) = open_project(data_dir, project_id)?;
    let photo = project
        .issue(issue_id)
        .and_then(|issue| issue.photo(photo_id))
        .ok_or_else(|| anyhow!("Photo {} not found on issue {}", photo_id, issue_id))?;

    let renderer = Renderer::from_font_path(handle.config.font.path.as_deref())?;
    let quality = quality.unwrap_or(handle.config.export.jpeg_quality);
    let bytes = export::export_photo(photo, data_dir, &renderer, quality)?;

    let output = output.unwrap_or_else(|| PathBuf::from(export::download_file_name(&photo.file_name)));
    std::fs::write(&output, bytes).with_context(|| format!("Failed to write {}", output.display()))?;
    println!("{}", output.display());
    Ok(true)
}

fn run_flatten(
    data_dir: &Path,
    handle: &ConfigHandle,
    project_id: &str,
    output_dir: &Path,
    filter: &ReportFilter,
) -> Result<bool> {
    let (store, project) = open_project(data_dir, project_id)?;
    let settings = store.settings()?;
    let renderer = Renderer::from_font_path(handle.config.font.path.as_deref())?;
    std::fs::create_dir_all(output_dir).with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let entries = export::flatten_project(
        &project,
        filter,
        data_dir,
        &settings,
        &renderer,
        handle.config.export.jpeg_quality,
    );

    let mut all_raster = true;
    for entry in &entries {
        match &entry.image {
            ReportImage::Raster(encoded) => {
                let path = output_dir.join(format!("{}-{}.jpg", entry.issue_id, entry.photo_id));
                std::fs::write(&path, &encoded.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{} -> {}", entry.title, path.display());
            }
            ReportImage::TextOnly { lines } => {
                all_raster = false;
                println!("{} (image unavailable)", entry.title);
                for line in lines {
                    println!("    {}", line);
                }
            }
        }
    }
    Ok(all_raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_gui() {
        let args = CliArgs::try_parse_from(["snagmark"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_parse_export() {
        let args = CliArgs::try_parse_from([
            "snagmark", "export", "--data-dir", "site", "--project", "p1", "--issue", "i1", "--photo", "ph1", "-q", "90",
        ])
        .unwrap();
        assert_eq!(args.data_dir, PathBuf::from("site"));
        match args.command {
            Some(Command::Export { photo, quality, output, .. }) => {
                assert_eq!(photo, "ph1");
                assert_eq!(quality, Some(90));
                assert!(output.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_flatten_filters() {
        let args = CliArgs::try_parse_from([
            "snagmark",
            "flatten",
            "--project",
            "p1",
            "--output-dir",
            "out",
            "--assignee",
            "Ana",
            "--exclude-completed",
        ])
        .unwrap();
        match args.command {
            Some(Command::Flatten {
                assignee,
                exclude_completed,
                exclude_pending,
                ..
            }) => {
                assert_eq!(assignee.as_deref(), Some("Ana"));
                assert!(exclude_completed);
                assert!(!exclude_pending);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_export_requires_ids() {
        assert!(CliArgs::try_parse_from(["snagmark", "export", "--project", "p1"]).is_err());
    }

    #[test]
    fn test_missing_project_fails() {
        let dir = std::env::temp_dir().join(format!("snagmark-cli-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let err = open_project(&dir, "nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
