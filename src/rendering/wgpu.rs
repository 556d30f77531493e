//! wgpu implementation of the [`Renderer`] capability.

use std::collections::HashMap;

use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, Queue, Sampler, Texture, TextureView};

use super::{BufferHandle, Renderer, TextureHandle};
use crate::geometry::QuadGeometry;
use crate::raster::RasterImage;

struct TextureEntry {
    texture: Texture,
    view: TextureView,
    size: (u32, u32),
}

/// GPU resource backend built on a wgpu device/queue pair.
///
/// Handles stay stable across reallocation: a full upload with changed
/// dimensions recreates the texture under the same handle, so callers never
/// need to rebind ids they already handed out to tiles.
pub struct WgpuRenderer {
    device: Device,
    queue: Queue,
    sampler: Sampler,
    textures: HashMap<TextureHandle, TextureEntry>,
    buffers: HashMap<BufferHandle, Buffer>,
    next_id: u64,
}

impl WgpuRenderer {
    pub fn new(device: Device, queue: Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("overtile linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            lod_min_clamp: 0.0,
            lod_max_clamp: f32::MAX,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });

        Self {
            device,
            queue,
            sampler,
            textures: HashMap::new(),
            buffers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Shared clamp-to-edge linear sampler for overlay textures
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// View over the texture behind `handle`, for bind group assembly
    pub fn texture_view(&self, handle: TextureHandle) -> Option<&TextureView> {
        self.textures.get(&handle).map(|entry| &entry.view)
    }

    /// Vertex buffer behind `handle`, for draw call assembly
    pub fn vertex_buffer(&self, handle: BufferHandle) -> Option<&Buffer> {
        self.buffers.get(&handle)
    }

    fn alloc_texture(&self, image: &RasterImage) -> TextureEntry {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("overtile overlay texture"),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.write_pixels(&texture, image);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        TextureEntry {
            texture,
            view,
            size: image.dimensions(),
        }
    }

    fn write_pixels(&self, texture: &Texture, image: &RasterImage) {
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * image.width()),
                rows_per_image: Some(image.height()),
            },
            wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
        );
    }
}

impl Renderer for WgpuRenderer {
    fn create_texture(&mut self, image: &RasterImage) -> TextureHandle {
        self.next_id += 1;
        let handle = TextureHandle::from_raw(self.next_id);
        let entry = self.alloc_texture(image);
        self.textures.insert(handle, entry);
        handle
    }

    fn upload_full(&mut self, texture: TextureHandle, image: &RasterImage) {
        match self.textures.get(&texture) {
            Some(entry) if entry.size == image.dimensions() => {
                self.write_pixels(&entry.texture, image);
            }
            Some(_) => {
                // Dimensions changed; reallocate under the same handle.
                let entry = self.alloc_texture(image);
                if let Some(old) = self.textures.insert(texture, entry) {
                    old.texture.destroy();
                }
            }
            None => {
                log::warn!("upload_full for unknown texture handle {:?}", texture);
            }
        }
    }

    fn upload_partial(&mut self, texture: TextureHandle, image: &RasterImage) {
        if let Some(entry) = self.textures.get(&texture) {
            self.write_pixels(&entry.texture, image);
        } else {
            log::warn!("upload_partial for unknown texture handle {:?}", texture);
        }
    }

    fn create_buffer(&mut self, quad: &QuadGeometry) -> BufferHandle {
        self.next_id += 1;
        let handle = BufferHandle::from_raw(self.next_id);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("overtile quad vertices"),
                contents: quad.as_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.buffers.insert(handle, buffer);
        handle
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = self.buffers.remove(&buffer) {
            buffer.destroy();
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if let Some(entry) = self.textures.remove(&texture) {
            entry.texture.destroy();
        }
    }
}
