//! Pixel frame types

use crate::CameraError;
use std::path::Path;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Raw RGBA frame extracted from the drawing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFrame {
    /// RGBA pixel data (width * height * 4)
    data: Vec<u8>,
    /// Frame width
    width: u32,
    /// Frame height
    height: u32,
    /// Frame sequence number
    pub sequence: u64,
}

impl PixelFrame {
    /// Create a frame from raw RGBA data, checking the buffer length
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, CameraError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(CameraError::Format(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence: 0,
        })
    }

    /// Create a frame without checking the buffer length.
    ///
    /// Consumers must tolerate a mismatched buffer; the classifier reports it
    /// as a malformed frame.
    pub fn from_raw_unchecked(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            sequence: 0,
        }
    }

    /// Empty frame (0x0)
    pub fn empty() -> Self {
        Self::from_raw_unchecked(Vec::new(), 0, 0)
    }

    /// Convert a decoded image to RGBA
    pub fn from_image(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_raw_unchecked(rgba.into_raw(), width, height)
    }

    /// Load a frame from an image file (PNG, JPEG, ...)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let img = image::open(path)?;
        Ok(Self::from_image(&img))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True if either dimension is zero or there is no pixel data
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Whether the buffer length matches the dimensions
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * BYTES_PER_PIXEL
    }

    /// Same dimensions as `other`
    pub fn same_size(&self, other: &PixelFrame) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Get RGBA pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.data.get(idx..idx + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Set RGB at (x, y); alpha is forced opaque
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        if let Some(px) = self.data.get_mut(idx..idx + BYTES_PER_PIXEL) {
            px[..3].copy_from_slice(&rgb);
            px[3] = 255;
        }
    }

    /// Consume the frame, returning the raw buffer
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(PixelFrame::new(vec![0; 10], 2, 2).is_err());
        assert!(PixelFrame::new(vec![0; 16], 2, 2).is_ok());
    }

    #[test]
    fn test_get_and_put_pixel() {
        let mut frame = PixelFrame::new(vec![0; 4 * 4 * 4], 4, 4).unwrap();
        frame.put_pixel(1, 2, [10, 20, 30]);
        assert_eq!(frame.get_pixel(1, 2), Some([10, 20, 30, 255]));
        assert_eq!(frame.get_pixel(4, 0), None);
    }

    #[test]
    fn test_from_image() {
        let img = image::RgbImage::from_pixel(3, 2, image::Rgb([1, 2, 3]));
        let frame = PixelFrame::from_image(&image::DynamicImage::ImageRgb8(img));
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert!(frame.is_well_formed());
        assert_eq!(frame.get_pixel(2, 1), Some([1, 2, 3, 255]));
    }

    #[test]
    fn test_empty() {
        assert!(PixelFrame::empty().is_empty());
        assert!(PixelFrame::empty().is_well_formed());
    }

    proptest::proptest! {
        #[test]
        fn prop_new_accepts_only_exact_length(w in 0u32..32, h in 0u32..32, extra in 0usize..8) {
            let exact = w as usize * h as usize * BYTES_PER_PIXEL;
            proptest::prop_assert!(PixelFrame::new(vec![0; exact], w, h).is_ok());
            if extra > 0 {
                proptest::prop_assert!(PixelFrame::new(vec![0; exact + extra], w, h).is_err());
            }
        }
    }
}
