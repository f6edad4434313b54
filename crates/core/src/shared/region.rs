/// An axis-aligned face box in frame pixel coordinates.
///
/// Constructed through [`Region::from_corners`] the box is always clamped to
/// the frame it was detected in, so crops never index out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a region from float corner coordinates, clamped to `frame_w` × `frame_h`.
    ///
    /// Corners are truncated toward zero, the same way a detector bbox is
    /// cast to integers before slicing a frame.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, frame_w: u32, frame_h: u32) -> Self {
        let fw = frame_w as i32;
        let fh = frame_h as i32;
        let left = (x1 as i32).clamp(0, fw);
        let top = (y1 as i32).clamp(0, fh);
        let right = (x2 as i32).clamp(0, fw);
        let bottom = (y2 as i32).clamp(0, fh);
        Self {
            x: left,
            y: top,
            width: (right - left).max(0),
            height: (bottom - top).max(0),
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn iou(&self, other: &Region) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = (self.x + self.width).min(other.x + other.width);
        let iy2 = (self.y + self.height).min(other.y + other.height);

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let union = self.area() as f64 + other.area() as f64 - inter;
        inter / union
    }
}
