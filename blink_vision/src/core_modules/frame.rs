// THEORY:
// The `Frame` is the raw input of the engine: one row-major, 8-bit-per-channel image
// in RGB or RGBA. It is a "dumb" data container like the rest of the low-level types.
// It validates its own shape once, at construction, so every later stage can index
// the buffer without re-checking lengths. Only the R, G and B bytes are ever read;
// alpha is carried along untouched.

use crate::core_modules::error::BlinkError;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Byte layout of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> u8 {
        match self {
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }

    pub fn from_channels(channels: u8) -> Result<Self, BlinkError> {
        match channels {
            3 => Ok(PixelLayout::Rgb),
            4 => Ok(PixelLayout::Rgba),
            other => Err(BlinkError::UnsupportedChannels(other)),
        }
    }
}

/// An immutable video frame owned by the pipeline once handed over.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self, BlinkError> {
        let channels = layout.channels();
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(BlinkError::InvalidFrame {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// Builds a frame of a single flat colour. Mostly useful for synthetic input.
    pub fn filled(width: u32, height: u32, layout: PixelLayout, rgb: [u8; 3]) -> Self {
        let mut px = rgb.to_vec();
        if layout == PixelLayout::Rgba {
            px.push(255);
        }
        let data = px.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            layout,
            data,
        }
    }

    /// Converts any decoded image; grey and 16-bit formats are narrowed to RGBA8.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb.into(),
            other => other.into_rgba8().into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The R, G, B bytes of the pixel at linear index `i` (row-major).
    #[inline]
    pub fn rgb_at(&self, i: usize) -> [u8; 3] {
        let start = i * self.layout.channels() as usize;
        [self.data[start], self.data[start + 1], self.data[start + 2]]
    }

    /// Overwrites the RGB bytes of one pixel, leaving alpha as it was.
    pub fn set_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let start = (y as usize * self.width as usize + x as usize) * self.layout.channels() as usize;
        self.data[start..start + 3].copy_from_slice(&rgb);
    }

    /// Paints an inclusive rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x1: u32, y1: u32, x2: u32, y2: u32, rgb: [u8; 3]) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x2 = x2.min(self.width - 1);
        let y2 = y2.min(self.height - 1);
        for y in y1..=y2 {
            for x in x1..=x2 {
                self.set_rgb(x, y, rgb);
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            layout: PixelLayout::Rgb,
            data: image.into_raw(),
        }
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            layout: PixelLayout::Rgba,
            data: image.into_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffers() {
        let err = Frame::new(4, 4, PixelLayout::Rgba, vec![0; 60]).unwrap_err();
        assert_eq!(
            err,
            BlinkError::InvalidFrame {
                width: 4,
                height: 4,
                channels: 4,
                expected: 64,
                actual: 60
            }
        );
    }

    #[test]
    fn only_three_or_four_channels_are_supported() {
        assert_eq!(PixelLayout::from_channels(4), Ok(PixelLayout::Rgba));
        assert_eq!(PixelLayout::from_channels(1), Err(BlinkError::UnsupportedChannels(1)));
    }

    #[test]
    fn rgb_reads_skip_alpha() {
        let mut frame = Frame::filled(3, 2, PixelLayout::Rgba, [10, 20, 30]);
        frame.set_rgb(2, 1, [1, 2, 3]);
        assert_eq!(frame.rgb_at(5), [1, 2, 3]);
        assert_eq!(frame.as_bytes()[5 * 4 + 3], 255);
        assert_eq!(frame.rgb_at(0), [10, 20, 30]);
    }

    #[test]
    fn fill_rect_is_inclusive_and_clipped() {
        let mut frame = Frame::filled(5, 5, PixelLayout::Rgb, [0, 0, 0]);
        frame.fill_rect(3, 3, 10, 10, [9, 9, 9]);
        assert_eq!(frame.rgb_at(3 * 5 + 3), [9, 9, 9]);
        assert_eq!(frame.rgb_at(4 * 5 + 4), [9, 9, 9]);
        assert_eq!(frame.rgb_at(2 * 5 + 2), [0, 0, 0]);
    }

    #[test]
    fn converts_from_image_buffers() {
        let rgba = RgbaImage::from_pixel(6, 4, image::Rgba([5, 6, 7, 0]));
        let frame: Frame = rgba.into();
        assert_eq!(frame.dimensions(), (6, 4));
        assert_eq!(frame.layout(), PixelLayout::Rgba);

        let grey = DynamicImage::new_luma8(2, 2);
        let frame = Frame::from_dynamic(grey);
        assert_eq!(frame.layout(), PixelLayout::Rgba);
        assert_eq!(frame.as_bytes().len(), 16);
    }
}
