//! Per-overlay GPU resource lifecycle.

use super::{BufferHandle, Renderer, TextureHandle};
use crate::geometry::QuadGeometry;
use crate::raster::Raster;

/// Owns the lazily created vertex buffer and texture for one overlay.
///
/// At most one of each is alive at a time. The texture persists across
/// geometry rebuilds and only has its content refreshed; the buffer is
/// destroyed through [`OverlayResources::invalidate_buffer`] whenever the
/// quad changes and recreated on next use.
#[derive(Debug, Default)]
pub struct OverlayResources {
    texture: Option<TextureHandle>,
    texture_size: Option<(u32, u32)>,
    buffer: Option<BufferHandle>,
}

impl OverlayResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    /// Creates the vertex buffer from `quad` if none exists.
    ///
    /// A stale buffer must already have been cleared through
    /// [`invalidate_buffer`](Self::invalidate_buffer); a live buffer is
    /// never silently replaced.
    pub fn ensure_buffer(&mut self, renderer: &mut dyn Renderer, quad: &QuadGeometry) -> BufferHandle {
        if let Some(buffer) = self.buffer {
            return buffer;
        }
        let buffer = renderer.create_buffer(quad);
        self.buffer = Some(buffer);
        buffer
    }

    /// Creates or refreshes the texture for `raster`.
    ///
    /// The first call creates the texture with a full upload. Afterwards a
    /// dimension change forces a full re-upload, a streaming raster gets a
    /// partial in-place content update, and a static raster is left
    /// untouched.
    pub fn ensure_texture(&mut self, renderer: &mut dyn Renderer, raster: &Raster) -> TextureHandle {
        let image = raster.image();
        match self.texture {
            None => {
                let texture = renderer.create_texture(image);
                self.texture = Some(texture);
                self.texture_size = Some(image.dimensions());
                texture
            }
            Some(texture) => {
                if self.texture_size != Some(image.dimensions()) {
                    renderer.upload_full(texture, image);
                    self.texture_size = Some(image.dimensions());
                } else if raster.is_streaming() {
                    renderer.upload_partial(texture, image);
                }
                texture
            }
        }
    }

    /// Destroys the vertex buffer, if any, and clears the owning reference
    /// so [`ensure_buffer`](Self::ensure_buffer) recreates it on next use.
    /// The texture is not touched; only geometry is coordinate-dependent.
    pub fn invalidate_buffer(&mut self, renderer: &mut dyn Renderer) {
        if let Some(buffer) = self.buffer.take() {
            renderer.destroy_buffer(buffer);
        }
    }

    /// Destroys both resources; used when the overlay is removed
    pub fn release(&mut self, renderer: &mut dyn Renderer) {
        self.invalidate_buffer(renderer);
        if let Some(texture) = self.texture.take() {
            renderer.destroy_texture(texture);
        }
        self.texture_size = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::{Point, TileCoord};
    use crate::geometry::build_quad;
    use crate::raster::RasterImage;

    #[derive(Default)]
    struct CountingRenderer {
        next: u64,
        created_textures: usize,
        full_uploads: usize,
        partial_uploads: usize,
        created_buffers: usize,
        destroyed_buffers: usize,
        destroyed_textures: usize,
    }

    impl Renderer for CountingRenderer {
        fn create_texture(&mut self, _image: &RasterImage) -> TextureHandle {
            self.next += 1;
            self.created_textures += 1;
            TextureHandle::from_raw(self.next)
        }

        fn upload_full(&mut self, _texture: TextureHandle, _image: &RasterImage) {
            self.full_uploads += 1;
        }

        fn upload_partial(&mut self, _texture: TextureHandle, _image: &RasterImage) {
            self.partial_uploads += 1;
        }

        fn create_buffer(&mut self, _quad: &QuadGeometry) -> BufferHandle {
            self.next += 1;
            self.created_buffers += 1;
            BufferHandle::from_raw(self.next)
        }

        fn destroy_buffer(&mut self, _buffer: BufferHandle) {
            self.destroyed_buffers += 1;
        }

        fn destroy_texture(&mut self, _texture: TextureHandle) {
            self.destroyed_textures += 1;
        }
    }

    fn quad() -> QuadGeometry {
        let corners = [
            Point::new(0.2, 0.2),
            Point::new(0.3, 0.2),
            Point::new(0.3, 0.3),
            Point::new(0.2, 0.3),
        ];
        build_quad(&corners, TileCoord::new(0, 0, 0))
    }

    fn static_raster(w: u32, h: u32) -> Raster {
        Raster::Static(RasterImage::new(w, h, vec![0u8; (w * h * 4) as usize]).unwrap())
    }

    fn streaming_raster(w: u32, h: u32) -> Raster {
        Raster::Streaming(RasterImage::new(w, h, vec![0u8; (w * h * 4) as usize]).unwrap())
    }

    #[test]
    fn test_texture_created_once_for_static_raster() {
        let mut renderer = CountingRenderer::default();
        let mut resources = OverlayResources::new();
        let raster = static_raster(8, 8);

        let first = resources.ensure_texture(&mut renderer, &raster);
        for _ in 0..5 {
            assert_eq!(resources.ensure_texture(&mut renderer, &raster), first);
        }

        assert_eq!(renderer.created_textures, 1);
        assert_eq!(renderer.full_uploads, 0);
        assert_eq!(renderer.partial_uploads, 0);
    }

    #[test]
    fn test_streaming_raster_updates_in_place() {
        let mut renderer = CountingRenderer::default();
        let mut resources = OverlayResources::new();
        let raster = streaming_raster(8, 8);

        resources.ensure_texture(&mut renderer, &raster);
        resources.ensure_texture(&mut renderer, &raster);
        resources.ensure_texture(&mut renderer, &raster);

        assert_eq!(renderer.created_textures, 1);
        assert_eq!(renderer.full_uploads, 0);
        assert_eq!(renderer.partial_uploads, 2);
    }

    #[test]
    fn test_resize_forces_full_upload() {
        let mut renderer = CountingRenderer::default();
        let mut resources = OverlayResources::new();

        let handle = resources.ensure_texture(&mut renderer, &static_raster(8, 8));
        let resized = resources.ensure_texture(&mut renderer, &static_raster(16, 16));

        assert_eq!(handle, resized);
        assert_eq!(renderer.created_textures, 1);
        assert_eq!(renderer.full_uploads, 1);
    }

    #[test]
    fn test_buffer_invalidation_cycle() {
        let mut renderer = CountingRenderer::default();
        let mut resources = OverlayResources::new();
        let quad = quad();

        let first = resources.ensure_buffer(&mut renderer, &quad);
        assert_eq!(resources.ensure_buffer(&mut renderer, &quad), first);
        assert_eq!(renderer.created_buffers, 1);

        resources.invalidate_buffer(&mut renderer);
        assert_eq!(renderer.destroyed_buffers, 1);
        assert!(resources.buffer().is_none());

        let second = resources.ensure_buffer(&mut renderer, &quad);
        assert_ne!(first, second);
        assert_eq!(renderer.created_buffers, 2);
    }

    #[test]
    fn test_invalidate_buffer_keeps_texture() {
        let mut renderer = CountingRenderer::default();
        let mut resources = OverlayResources::new();

        resources.ensure_texture(&mut renderer, &static_raster(8, 8));
        resources.ensure_buffer(&mut renderer, &quad());
        resources.invalidate_buffer(&mut renderer);

        assert!(resources.texture().is_some());
        assert_eq!(renderer.destroyed_textures, 0);
    }

    #[test]
    fn test_release_destroys_everything() {
        let mut renderer = CountingRenderer::default();
        let mut resources = OverlayResources::new();

        resources.ensure_texture(&mut renderer, &static_raster(8, 8));
        resources.ensure_buffer(&mut renderer, &quad());
        resources.release(&mut renderer);

        assert!(resources.texture().is_none());
        assert!(resources.buffer().is_none());
        assert_eq!(renderer.destroyed_buffers, 1);
        assert_eq!(renderer.destroyed_textures, 1);
    }
}
