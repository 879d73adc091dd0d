// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Loaded once from `annotate.yaml`, `annotate.yml` or `annotate.json` in the
//! data directory. Every section has defaults, and out-of-range values are
//! clamped with a warning rather than rejected.

use crate::io::export::DEFAULT_JPEG_QUALITY;
use crate::util::color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Candidate config file names, searched in order.
const CONFIG_FILENAMES: &[&str] = &["annotate.yaml", "annotate.yml", "annotate.json"];

/// Stroke width range offered by the tool bar.
pub const STROKE_WIDTH_RANGE: (f64, f64) = (1.0, 20.0);

/// Label font size range offered by the tool bar.
pub const FONT_SIZE_RANGE: (f64, f64) = (12.0, 48.0);

/// Defaults for the annotate tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDefaults {
    pub color: String,
    pub stroke_width: f64,
    pub font_size: f64,
    pub swatch: Vec<String>,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            color: color::DEFAULT_COLOR.to_string(),
            stroke_width: 5.0,
            font_size: 16.0,
            swatch: color::SWATCH.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ToolDefaults {
    fn sanitize(&mut self, warnings: &mut Vec<String>) {
        self.swatch.retain(|c| {
            let ok = color::parse_hex(c).is_some();
            if !ok {
                warnings.push(format!("Dropping unreadable swatch colour {:?}", c));
            }
            ok
        });
        if self.swatch.is_empty() {
            self.swatch = Self::default().swatch;
        }
        if color::parse_hex(&self.color).is_none() {
            warnings.push(format!("Unreadable default colour {:?}; using {}", self.color, color::DEFAULT_COLOR));
            self.color = color::DEFAULT_COLOR.to_string();
        }
        self.stroke_width = clamp_with_warning("stroke_width", self.stroke_width, STROKE_WIDTH_RANGE, warnings);
        self.font_size = clamp_with_warning("font_size", self.font_size, FONT_SIZE_RANGE, warnings);
    }
}

/// Export and display settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// JPEG quality for flattened exports (1-100).
    pub jpeg_quality: u8,
    /// Longest edge of the display copy uploaded to the edit canvas.
    pub display_max_edge: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            display_max_edge: 2048,
        }
    }
}

/// Label font.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TrueType/OpenType file; the bundled font is used when unset.
    pub path: Option<PathBuf>,
}

/// Complete configuration file structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tools: ToolDefaults,
    pub export: ExportConfig,
    pub font: FontConfig,
}

impl AppConfig {
    pub fn sanitize(mut self, warnings: &mut Vec<String>) -> Self {
        self.tools.sanitize(warnings);
        if !(1..=100).contains(&self.export.jpeg_quality) {
            warnings.push(format!(
                "jpeg_quality {} out of range; using {}",
                self.export.jpeg_quality, DEFAULT_JPEG_QUALITY
            ));
            self.export.jpeg_quality = DEFAULT_JPEG_QUALITY;
        }
        if self.export.display_max_edge < 64 {
            warnings.push(format!("display_max_edge {} too small; using 64", self.export.display_max_edge));
            self.export.display_max_edge = 64;
        }
        self
    }
}

/// Loaded configuration with its source path and any warnings.
pub struct ConfigHandle {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl ConfigHandle {
    /// Log the source and warnings.
    pub fn log_usage(&self) {
        match &self.source {
            Some(source) => log::info!("Loaded config from {}", source.display()),
            None => log::info!("Using built-in config defaults"),
        }
        for warning in &self.warnings {
            log::warn!("Config warning: {}", warning);
        }
    }
}

/// Load the configuration from `data_dir`, falling back to defaults.
pub fn load_config(data_dir: &Path) -> ConfigHandle {
    let mut warnings = Vec::new();

    for name in CONFIG_FILENAMES {
        let candidate = data_dir.join(name);
        if !candidate.is_file() {
            continue;
        }

        let contents = match fs::read_to_string(&candidate) {
            Ok(contents) => contents,
            Err(err) => {
                warnings.push(format!("Failed to read config {}: {}", candidate.display(), err));
                continue;
            }
        };

        let parsed = if name.ends_with(".json") {
            serde_json::from_str::<AppConfig>(&contents).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<AppConfig>(&contents).map_err(|e| e.to_string())
        };

        match parsed {
            Ok(config) => {
                let config = config.sanitize(&mut warnings);
                return ConfigHandle {
                    config,
                    source: Some(candidate),
                    warnings,
                };
            }
            Err(err) => warnings.push(format!("Failed to parse config {}: {}", candidate.display(), err)),
        }
    }

    ConfigHandle {
        config: AppConfig::default(),
        source: None,
        warnings,
    }
}

fn clamp_with_warning(name: &str, value: f64, (min, max): (f64, f64), warnings: &mut Vec<String>) -> f64 {
    if value.is_finite() && (min..=max).contains(&value) {
        return value;
    }
    let clamped = if value.is_finite() { value.clamp(min, max) } else { min };
    warnings.push(format!("{} {} outside {}-{}; using {}", name, value, min, max, clamped));
    clamped
}
