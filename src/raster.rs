//! Raster content backing an overlay.

use crate::Result;
use std::sync::Arc;

/// Decoded RGBA8 pixel data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Creates a raster image, validating the buffer length against the
    /// dimensions (4 bytes per pixel).
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(format!(
                "pixel buffer is {} bytes, expected {} for {}x{} RGBA8",
                pixels.len(),
                expected,
                width,
                height
            )
            .into());
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
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

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Tagged raster variant. Static images are uploaded to the GPU once and
/// never touched again; streaming rasters (video frames, canvas buffers)
/// refresh their texture content in place on every prepare cycle.
#[derive(Debug, Clone)]
pub enum Raster {
    Static(RasterImage),
    Streaming(RasterImage),
}

impl Raster {
    /// Current pixel content, regardless of variant
    pub fn image(&self) -> &RasterImage {
        match self {
            Raster::Static(image) => image,
            Raster::Streaming(image) => image,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Raster::Streaming(_))
    }

    /// Replaces the content of a streaming raster with a new frame.
    ///
    /// Frame dimensions must match the current ones; a size change is a
    /// raster replacement, not a frame update, and goes through the
    /// source's `update_image` instead.
    pub fn update_frame(&mut self, frame: RasterImage) -> Result<()> {
        match self {
            Raster::Streaming(image) => {
                if frame.dimensions() != image.dimensions() {
                    return Err(format!(
                        "streaming frame is {:?}, expected {:?}",
                        frame.dimensions(),
                        image.dimensions()
                    )
                    .into());
                }
                *image = frame;
                Ok(())
            }
            Raster::Static(_) => Err("static rasters cannot be updated in place".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> RasterImage {
        RasterImage::new(w, h, vec![0u8; (w * h * 4) as usize]).unwrap()
    }

    #[test]
    fn test_pixel_buffer_length_validated() {
        assert!(RasterImage::new(2, 2, vec![0u8; 16]).is_ok());
        assert!(RasterImage::new(2, 2, vec![0u8; 15]).is_err());
    }

    #[test]
    fn test_update_frame_same_size() {
        let mut raster = Raster::Streaming(image(4, 4));
        assert!(raster.update_frame(image(4, 4)).is_ok());
        assert!(raster.update_frame(image(4, 2)).is_err());
    }

    #[test]
    fn test_update_frame_rejected_for_static() {
        let mut raster = Raster::Static(image(4, 4));
        assert!(raster.update_frame(image(4, 4)).is_err());
        assert!(!raster.is_streaming());
    }
}
