//! Hidden drawing surface used for pixel extraction

use crate::frame::{PixelFrame, BYTES_PER_PIXEL};
use crate::CameraError;

/// Off-screen RGBA surface the video feed is drawn into
#[derive(Debug, Clone, Default)]
pub struct DrawingSurface {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl DrawingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Match the surface to the video dimensions, clearing it when they change
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.buffer = vec![0; width as usize * height as usize * BYTES_PER_PIXEL];
    }

    /// Draw `frame` scaled to fill the surface (nearest neighbour)
    pub fn draw_frame(&mut self, frame: &PixelFrame) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Draw("surface has zero size".into()));
        }
        if frame.is_empty() || !frame.is_well_formed() {
            return Err(CameraError::Draw(format!(
                "source frame {}x{} is not drawable",
                frame.width(),
                frame.height()
            )));
        }

        if frame.width() == self.width && frame.height() == self.height {
            self.buffer.copy_from_slice(frame.data());
            return Ok(());
        }

        let x_ratio = frame.width() as f32 / self.width as f32;
        let y_ratio = frame.height() as f32 / self.height as f32;
        let src = frame.data();

        for y in 0..self.height {
            let src_y = ((y as f32 * y_ratio) as u32).min(frame.height() - 1);
            for x in 0..self.width {
                let src_x = ((x as f32 * x_ratio) as u32).min(frame.width() - 1);
                let s = (src_y as usize * frame.width() as usize + src_x as usize) * BYTES_PER_PIXEL;
                let d = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
                self.buffer[d..d + BYTES_PER_PIXEL].copy_from_slice(&src[s..s + BYTES_PER_PIXEL]);
            }
        }
        Ok(())
    }

    /// Read back the full surface as a pixel frame
    pub fn image_data(&self) -> Result<PixelFrame, CameraError> {
        PixelFrame::new(self.buffer.clone(), self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::solid;

    #[test]
    fn test_draw_same_size() {
        let mut surface = DrawingSurface::new();
        surface.resize(8, 8);
        surface.draw_frame(&solid(8, 8, [9, 8, 7])).unwrap();
        let out = surface.image_data().unwrap();
        assert_eq!(out.get_pixel(7, 7), Some([9, 8, 7, 255]));
    }

    #[test]
    fn test_draw_scaled() {
        let mut surface = DrawingSurface::new();
        surface.resize(4, 4);
        surface.draw_frame(&solid(16, 12, [50, 60, 70])).unwrap();
        let out = surface.image_data().unwrap();
        assert_eq!(out.width(), 4);
        assert_eq!(out.get_pixel(3, 3), Some([50, 60, 70, 255]));
    }

    #[test]
    fn test_zero_sized_surface_errors() {
        let mut surface = DrawingSurface::new();
        assert!(surface.draw_frame(&solid(2, 2, [0, 0, 0])).is_err());
    }
}
