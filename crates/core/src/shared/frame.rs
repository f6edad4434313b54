use ndarray::ArrayView3;

use crate::shared::region::Region;

/// A decoded video frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens in the readers; everything downstream
/// treats a frame as `height × width × channels` bytes.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `region` (clamped to this frame) into a new frame.
    ///
    /// The crop keeps this frame's index so log lines can point at the
    /// source frame.
    pub fn crop(&self, region: &Region) -> Frame {
        let fw = self.width as i32;
        let fh = self.height as i32;
        let x1 = region.x.clamp(0, fw);
        let y1 = region.y.clamp(0, fh);
        let x2 = (region.x + region.width).clamp(x1, fw);
        let y2 = (region.y + region.height).clamp(y1, fh);
        self.copy_rect(x1 as usize, y1 as usize, x2 as usize, y2 as usize)
    }

    /// Square crop centered on `region` with side `max(width, height)`,
    /// clamped to the frame. Thumbnails of square crops resize without
    /// distorting the face.
    pub fn square_crop(&self, region: &Region) -> Frame {
        let cx = region.x + region.width / 2;
        let cy = region.y + region.height / 2;
        let half = region.width.max(region.height) / 2;
        self.crop(&Region::new(cx - half, cy - half, half * 2, half * 2))
    }

    fn copy_rect(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> Frame {
        let channels = self.channels as usize;
        let stride = self.width as usize * channels;
        let row_len = (x2 - x1) * channels;

        let mut data = Vec::with_capacity(row_len * (y2 - y1));
        for row in y1..y2 {
            let start = row * stride + x1 * channels;
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        )
    }
}
