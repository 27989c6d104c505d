// THEORY:
// The `MotionMask` is the first analytical stage. It compares two frames pixel by
// pixel and keeps only a single bit of information per location: did this pixel
// change by more than the threshold or not.
//
// Key principles:
// 1.  **Memoryless**: the mask depends on exactly two frames. There is no smoothing,
//     no background model, no history. Temporal state lives in the pipeline.
// 2.  **Inverted polarity**: motion is stored as `0` ("black") and stillness as `255`.
//     The boundary tracer then treats `0` as foreground with one equality test, and
//     the mask can be shown directly as a grey image with motion drawn dark.
// 3.  **Integer threshold**: `(|dR| + |dG| + |dB|) / 3 > t` is evaluated as
//     `|dR| + |dG| + |dB| > 3t`, which is exact and keeps the comparison strict.

use crate::core_modules::error::BlinkError;
use crate::core_modules::frame::Frame;
use image::GrayImage;

pub const MOTION: u8 = 0;
pub const STILL: u8 = 255;

/// A width x height grid of `MOTION` / `STILL` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MotionMask {
    /// Differences `current` against `previous`. Frames must share dimensions;
    /// their channel layouts may differ.
    pub fn from_frames(current: &Frame, previous: &Frame, threshold: u32) -> Result<Self, BlinkError> {
        if current.dimensions() != previous.dimensions() {
            return Err(BlinkError::DimensionMismatch {
                expected: previous.dimensions(),
                found: current.dimensions(),
            });
        }

        let (width, height) = current.dimensions();
        let num_pixels = width as usize * height as usize;
        let limit = threshold.saturating_mul(3);

        let data = (0..num_pixels)
            .map(|i| {
                let [r1, g1, b1] = current.rgb_at(i);
                let [r2, g2, b2] = previous.rgb_at(i);
                let sum = r1.abs_diff(r2) as u32 + g1.abs_diff(g2) as u32 + b1.abs_diff(b2) as u32;
                if sum > limit { MOTION } else { STILL }
            })
            .collect();

        Ok(Self { width, height, data })
    }

    /// Wraps an existing byte grid. Any non-zero byte is treated as still.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self { width, height, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reads a mask value; anything outside the grid reads as `STILL`.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> u8 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return STILL;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn is_motion(&self, x: i64, y: i64) -> bool {
        self.get(x, y) == MOTION
    }

    pub fn motion_pixels(&self) -> usize {
        self.data.iter().filter(|&&v| v == MOTION).count()
    }

    pub fn is_still(&self) -> bool {
        self.data.iter().all(|&v| v != MOTION)
    }

    pub fn to_gray_image(&self) -> GrayImage {
        // Length is checked at construction, so this cannot fail.
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.data[y as usize * self.width as usize + x as usize]])
        })
    }

    /// Expands the mask into opaque grey RGBA, the layout a host canvas expects.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|&v| [v, v, v, 255]).collect()
    }
}
