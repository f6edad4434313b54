use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

const CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("download failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Streams `url` into `<dest>.part` and renames it to `dest` once complete.
///
/// Non-2xx responses are errors. The partial file is removed on any failure.
/// Returns the number of bytes written.
pub fn fetch_to_file(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    progress: Option<&ProgressFn>,
) -> Result<u64, FetchError> {
    let temp_path = part_path(dest);
    let result = stream(client, url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// `clip.mp4` -> `clip.mp4.part`.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn stream(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<&ProgressFn>,
) -> Result<u64, FetchError> {
    let write_err = |path: &Path, e: std::io::Error| FetchError::Write {
        path: path.to_path_buf(),
        source: e,
    };

    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(|e| write_err(temp_path, e))?;

    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|e| write_err(temp_path, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| write_err(temp_path, e))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| write_err(temp_path, e))?;
    drop(file);

    log::debug!("Downloaded {downloaded}/{total} bytes from {url}");
    fs::rename(temp_path, dest).map_err(|e| write_err(dest, e))?;
    Ok(downloaded)
}
