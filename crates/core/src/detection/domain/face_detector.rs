use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// A face found in one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub region: Region,
    pub confidence: f64,
}

/// Domain interface for face detection.
///
/// `&mut self` because inference sessions need mutable access to run.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
