// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locate the file the instance is launched with.

use std::path::{Component, Path};

/// Path of `entry_file` relative to `workspace`, using `/` separators.
///
/// A root-level file wins; otherwise the first nested match in sorted order
/// outside `.git`. Falls back to `entry_file` itself when nothing matches, so
/// the launch fails visibly inside the instance.
pub fn detect(workspace: &Path, entry_file: &str) -> String {
    if workspace.join(entry_file).is_file() {
        return entry_file.to_string();
    }

    let root = glob::Pattern::escape(&workspace.display().to_string());
    let pattern = format!("{}/**/{}", root, entry_file);
    let mut matches: Vec<String> = match glob::glob(&pattern) {
        Ok(paths) => paths
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .filter_map(|p| p.strip_prefix(workspace).ok().map(Path::to_path_buf))
            .filter(|rel| !rel.components().any(|c| c == Component::Normal(".git".as_ref())))
            .map(|rel| to_slash(&rel))
            .collect(),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid entry-point pattern");
            Vec::new()
        }
    };
    matches.sort();

    match matches.into_iter().next() {
        Some(found) => found,
        None => {
            tracing::debug!(workspace = %workspace.display(), entry_file, "no entry point found");
            entry_file.to_string()
        }
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[path = "entrypoint_tests.rs"]
mod tests;
