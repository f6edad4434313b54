use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

use crate::shared::http_fetch::{fetch_to_file, FetchError};
use crate::video::domain::video_downloader::VideoDownloader;

/// Upper bound on a single video download, body included.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hex digits of the URL digest kept in file names.
const URL_HASH_LEN: usize = 8;
const DEFAULT_STEM: &str = "video";
const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to create {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads videos over HTTP(S) with a blocking `reqwest` client.
///
/// Each URL maps to its own file name, so a file already present at the
/// final path was downloaded from the same URL and is reused.
pub struct HttpVideoDownloader {
    client: reqwest::blocking::Client,
}

impl HttpVideoDownloader {
    pub fn new() -> Result<Self, DownloadError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(DownloadError::Client)?;
        Ok(Self { client })
    }
}

impl VideoDownloader for HttpVideoDownloader {
    fn download(
        &self,
        url: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        fs::create_dir_all(dest_dir).map_err(|e| DownloadError::Dir {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let dest = dest_dir.join(video_file_name(url));
        if fs::metadata(&dest).map(|m| m.len() > 0).unwrap_or(false) {
            log::info!("Reusing downloaded video {}", dest.display());
            return Ok(dest);
        }

        log::info!("Downloading {url}");
        fetch_to_file(&self.client, url, &dest, None).map_err(DownloadError::from)?;
        Ok(dest)
    }
}

/// Local file name for a video URL: `<stem>_<hash>.<ext>`.
///
/// The stem and extension come from the percent-decoded last path segment,
/// with anything outside `[A-Za-z0-9._-]` replaced by `_`. The hash is taken
/// over the whole URL, query included, so distinct URLs never share a file.
/// Missing parts fall back to `video` and `mp4`.
pub fn video_file_name(url: &str) -> String {
    let url = url.trim();
    let segment = Url::parse(url)
        .ok()
        .and_then(|parsed| last_segment(&parsed))
        .unwrap_or_default();
    let sanitized = sanitize(&segment);
    let trimmed = sanitized.trim_matches('.');

    let (stem, ext) = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext),
        _ => (trimmed, DEFAULT_EXTENSION),
    };
    let stem = if stem.is_empty() { DEFAULT_STEM } else { stem };

    format!("{stem}_{}.{}", url_hash(url), ext.to_ascii_lowercase())
}

fn last_segment(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn url_hash(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    digest[..URL_HASH_LEN].to_string()
}
