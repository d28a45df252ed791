//! Write-once JSON cache, one document per video identifier.
//!
//! A cache write failure never changes the outcome of a run: callers log it
//! and keep the in-memory result.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::fetch::ExtractionResult;

pub const DEFAULT_CACHE_DIR: &str = "transcript-cache";

/// Cache file path for a video, with an optional method suffix
/// (`<video_id>[_<suffix>].json`).
pub fn cache_path(dir: &Path, video_id: &str, suffix: Option<&str>) -> PathBuf {
    let file_name = match suffix {
        Some(suffix) => format!("{video_id}_{suffix}.json"),
        None => format!("{video_id}.json"),
    };
    dir.join(file_name)
}

/// Persist a result document, creating the cache directory if needed.
/// Overwrites any previous document for the same video.
pub fn store(dir: &Path, result: &ExtractionResult, suffix: Option<&str>) -> Result<PathBuf> {
    fs_err::create_dir_all(dir)
        .with_context(|| format!("failed to create cache directory {}", dir.display()))?;

    let path = cache_path(dir, &result.video_id, suffix);
    let content = serde_json::to_string_pretty(result).context("failed to serialize result")?;
    fs_err::write(&path, content)
        .with_context(|| format!("failed to write cache file {}", path.display()))?;

    Ok(path)
}

/// Read a cached result document back.
pub fn load(path: &Path) -> Result<ExtractionResult> {
    let content = fs_err::read_to_string(path)
        .with_context(|| format!("failed to read cache file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid cache document {}", path.display()))
}
