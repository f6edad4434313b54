use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a face crop as an image file.
pub trait ImageWriter: Send {
    /// Writes a frame to `path`, optionally resizing it to `size` first.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
