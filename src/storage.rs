// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for generated icon files

use crate::errors::{AppError, AppResult};
use crate::pipelines::icon::IconFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Output directory for a batch
///
/// Icons land next to the assets directory, not inside it:
/// `project/assets` with folder `Generated Icons` gives
/// `project/Generated Icons`.
pub fn resolve_output_dir(assets_dir: &Path, folder_name: &str) -> PathBuf {
    let project_root = assets_dir.parent().unwrap_or(assets_dir);
    project_root.join(folder_name)
}

/// File name `{base} {job}.{ext}`
pub fn icon_file_name(base_name: &str, job_id: &str, format: IconFormat) -> String {
    format!("{} {}.{}", base_name, job_id, format.extension())
}

/// Create `path` and any missing parents
pub async fn ensure_directory(path: &Path) -> AppResult<()> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        AppError::Storage(format!(
            "Failed to create directory {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = %path.display(), "Output directory ready");
    Ok(())
}

/// Write `data` to `path` as one complete file
///
/// The bytes go to a temporary sibling first and are renamed into place, so
/// an interrupted run never leaves a truncated icon behind.
pub async fn write_file(path: &Path, data: &[u8]) -> AppResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_path = parent.join(format!(".icon-{}.tmp", uuid::Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&temp_path, data).await {
        remove_temp(&temp_path).await;
        return Err(AppError::Storage(format!(
            "Failed to write {}: {}",
            temp_path.display(),
            e
        )));
    }

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        remove_temp(&temp_path).await;
        return Err(AppError::Storage(format!(
            "Failed to move icon into place at {}: {}",
            path.display(),
            e
        )));
    }

    debug!(path = %path.display(), bytes = data.len(), "File written");
    Ok(())
}

async fn remove_temp(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
    }
}

/// Icon files in `dir`, sorted by name
///
/// Only files with one of the known icon extensions are listed; temporary
/// files from interrupted writes are skipped.
pub async fn list_icons(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut icons = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let known = path
            .extension()
            .map(|ext| {
                IconFormat::ALL
                    .iter()
                    .any(|f| ext.to_string_lossy().eq_ignore_ascii_case(f.extension()))
            })
            .unwrap_or(false);
        if known {
            icons.push(path);
        }
    }

    icons.sort();
    Ok(icons)
}
