// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the annotate session.

pub mod canvas;
pub mod capture;
pub mod properties;
pub mod toolbar;
