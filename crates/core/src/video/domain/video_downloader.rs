use std::path::{Path, PathBuf};

/// Fetches a remote video into a local directory.
pub trait VideoDownloader: Send {
    /// Downloads `url` into `dest_dir` and returns the local file path.
    fn download(&self, url: &str, dest_dir: &Path)
        -> Result<PathBuf, Box<dyn std::error::Error>>;
}
