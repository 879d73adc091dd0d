// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: annotations, the per-photo annotation store and the audit
//! document they are saved into.

pub mod annotation;
pub mod project;
pub mod store;
