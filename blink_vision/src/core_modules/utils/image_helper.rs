// Image file I/O at the edge of the engine: decode frames from disk and write
// motion masks out as PNG for inspection. Nothing in the detection path uses it.

pub mod image_helper {
    use crate::core_modules::frame::Frame;
    use crate::core_modules::motion_mask::MotionMask;
    use image::ImageEncoder;
    use std::path::Path;

    /// Writes the mask as an 8-bit greyscale PNG, motion drawn black.
    pub fn save_mask(path: impl AsRef<Path>, mask: &MotionMask) -> Result<(), image::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(mask.as_bytes(), mask.width(), mask.height(), image::ExtendedColorType::L8)?;

        Ok(())
    }

    /// Writes a frame as PNG in its own layout.
    pub fn save_frame(path: impl AsRef<Path>, frame: &Frame) -> Result<(), image::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);
        let color = match frame.layout() {
            crate::core_modules::frame::PixelLayout::Rgb => image::ExtendedColorType::Rgb8,
            crate::core_modules::frame::PixelLayout::Rgba => image::ExtendedColorType::Rgba8,
        };

        encoder.write_image(frame.as_bytes(), frame.width(), frame.height(), color)?;

        Ok(())
    }

    /// Decodes any format the `image` crate understands into a frame.
    pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame, image::ImageError> {
        Ok(Frame::from_dynamic(image::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use crate::core_modules::frame::{Frame, PixelLayout};
    use crate::core_modules::motion_mask::MotionMask;

    #[test]
    fn mask_png_keeps_dimensions_and_polarity() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("mask.png");

        let base = Frame::filled(40, 30, PixelLayout::Rgba, [200, 200, 200]);
        let mut moved = base.clone();
        moved.fill_rect(5, 5, 9, 9, [0, 0, 0]);
        let mask = MotionMask::from_frames(&moved, &base, 20).unwrap();

        save_mask(&path, &mask).expect("Error Saving File.");

        let decoded = image::open(&path).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (40, 30));
        assert_eq!(decoded.get_pixel(5, 5).0, [0]);
        assert_eq!(decoded.get_pixel(0, 0).0, [255]);
    }

    #[test]
    fn frames_survive_a_png_round_trip() {
        let dir = tempfile::tempdir().expect("Error creating temp dir.");
        let path = dir.path().join("frame.png");

        let mut frame = Frame::filled(12, 8, PixelLayout::Rgb, [10, 20, 30]);
        frame.fill_rect(2, 2, 4, 4, [250, 0, 0]);
        save_frame(&path, &frame).expect("Error Saving File.");

        let loaded = load_frame(&path).unwrap();
        assert_eq!(loaded, frame);
    }

    #[test]
    fn missing_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_frame(dir.path().join("absent.png")).is_err());
    }
}
