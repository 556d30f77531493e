//! Graphics-API-agnostic rendering capability consumed by the overlay core.

pub mod resources;
#[cfg(feature = "render")]
pub mod wgpu;

pub use resources::OverlayResources;

use crate::geometry::QuadGeometry;
use crate::raster::RasterImage;

/// Opaque id for a texture owned by a [`Renderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Opaque id for a vertex buffer owned by a [`Renderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Minimal GPU capability interface.
///
/// The overlay core drives resource lifetimes exclusively through this
/// trait so it stays independent of any particular graphics API. Textures
/// are expected to be sampled with clamp-to-edge wrap and linear filtering.
pub trait Renderer {
    /// Creates a texture and uploads `image` in full
    fn create_texture(&mut self, image: &RasterImage) -> TextureHandle;

    /// Re-uploads `image` in full; the backing texture may be reallocated
    /// under the same handle when the dimensions changed
    fn upload_full(&mut self, texture: TextureHandle, image: &RasterImage);

    /// Updates existing texture content in place; dimensions are unchanged
    fn upload_partial(&mut self, texture: TextureHandle, image: &RasterImage);

    /// Creates a vertex buffer holding the quad geometry
    fn create_buffer(&mut self, quad: &QuadGeometry) -> BufferHandle;

    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn destroy_texture(&mut self, texture: TextureHandle);
}
