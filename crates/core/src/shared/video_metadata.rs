use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported frame count; 0 when the container does not say.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Approximate number of frames that will be sampled at the given interval.
    pub fn sampled_frames(&self, interval: usize) -> usize {
        if interval == 0 {
            return 0;
        }
        self.total_frames.div_ceil(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: 1280,
            height: 720,
            fps: 30.0,
            total_frames,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/clip.mp4")),
        }
    }

    #[test]
    fn test_sampled_frames_rounds_up() {
        // Frames 0, 10, 20 are sampled out of 25.
        assert_eq!(meta(25).sampled_frames(10), 3);
    }

    #[test]
    fn test_sampled_frames_exact_multiple() {
        assert_eq!(meta(30).sampled_frames(10), 3);
    }

    #[test]
    fn test_sampled_frames_unknown_total() {
        assert_eq!(meta(0).sampled_frames(10), 0);
    }

    #[test]
    fn test_sampled_frames_zero_interval() {
        assert_eq!(meta(100).sampled_frames(0), 0);
    }
}
