use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::http_fetch::{fetch_to_file, FetchError};

pub use crate::shared::http_fetch::ProgressFn;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Resolve a model file by name, checking local copies before downloading.
///
/// Resolution order:
/// 1. `models_dir` (user-supplied directory, e.g. `--models-dir`)
/// 2. User cache directory (platform-specific)
/// 3. Download from URL into the cache
pub fn resolve(
    name: &str,
    url: &str,
    models_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url, models_dir, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    models_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(dir) = models_dir {
        let local = dir.join(name);
        if local.is_file() {
            log::debug!("Using model {}", local.display());
            return Ok(local);
        }
        log::warn!("{name} not found in {}, falling back to cache", dir.display());
    }

    let cached_path = cache_dir.join(name);
    if cached_path.is_file() {
        log::debug!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {name} to {}", cache_dir.display());
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceTally/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceTally/models/` or `~/.cache/FaceTally/models/`
/// - Windows: `%LOCALAPPDATA%/FaceTally/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceTally").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceTally").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let client = reqwest::blocking::Client::new();
    fetch_to_file(&client, url, dest, progress.as_ref())?;
    Ok(())
}
