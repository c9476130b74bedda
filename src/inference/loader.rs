// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GGUF model discovery

use std::path::{Path, PathBuf};

pub const MODEL_EXTENSION: &str = "gguf";

/// Lists `*.gguf` files directly inside `dir`, in directory order
///
/// Directory order is whatever the filesystem reports; it is not sorted.
/// A missing or unreadable directory yields an empty list.
pub fn discover_models(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_model_extension(path))
        .collect()
}

/// First model file found in `dir`
pub fn find_model(dir: &Path) -> Option<PathBuf> {
    discover_models(dir).into_iter().next()
}

fn has_model_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext == MODEL_EXTENSION)
}
