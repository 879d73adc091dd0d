// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Snagmark - site audit photo markup
//!
//! A cross-platform desktop application for drawing freehand strokes and
//! text labels over site audit photos, with native-resolution export.

mod app;
mod cli;
mod config;
mod io;
mod models;
mod render;
mod ui;
mod util;

use anyhow::Result;
use app::SnagmarkApp;
use clap::Parser;
use cli::CliArgs;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = CliArgs::parse();
    if let Some(command) = args.command {
        return cli::run(&args.data_dir, command);
    }

    match run_gui(args.data_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_gui(data_dir: std::path::PathBuf) -> Result<()> {
    let app = SnagmarkApp::new(&data_dir)?;

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Snagmark - Site Audit Photo Markup"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native("Snagmark", options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
