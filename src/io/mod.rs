// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for photos, project documents and flattened exports.

pub mod export;
pub mod media;
pub mod serialization;
pub mod storage;
