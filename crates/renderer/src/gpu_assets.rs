//! GPU-resident asset storage.
//!
//! Registered meshes and textures live on the GPU for the renderer's
//! lifetime: vertex and index buffers in device-local memory, texture images
//! with full mip chains plus a sampler and per-swapchain-image descriptor
//! sets. Uploads go through the blocking staging path, so by the time an ID
//! is referenced in a frame its resources are complete.
//!
//! Texture descriptor sets belong to the resize-atomic group's pool; after
//! swapchain recreation [`GpuAssets::rebuild_descriptor_sets`] re-allocates
//! and re-writes them against the new group. Mesh buffers and texture images
//! are extent-independent and survive recreation untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use ash::vk;
use tracing::info;

use glint_assets::{IndexData, MeshData, MeshId, TextureData, TextureId};
use glint_rhi::buffer::{Buffer, MemoryIntent};
use glint_rhi::descriptor::{self, update_descriptor_sets};
use glint_rhi::device::Device;
use glint_rhi::image::{mip_level_count, Image};
use glint_rhi::sampler::Sampler;
use glint_rhi::upload::StagingUploader;
use glint_rhi::format;

use crate::error::{RenderError, RenderResult};
use crate::targets::RenderTargets;

/// Texture format all uploads use.
const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Device-local mesh: vertex and index buffers plus draw parameters.
pub struct GpuMesh {
    /// Vertex buffer bound at slot 0.
    vertex_buffer: Buffer,
    /// Index buffer.
    index_buffer: Buffer,
    /// Number of indices to draw.
    index_count: u32,
    /// Index element width captured at registration.
    index_type: vk::IndexType,
}

impl GpuMesh {
    /// Returns the vertex buffer handle.
    #[inline]
    pub fn vertex_buffer_handle(&self) -> vk::Buffer {
        self.vertex_buffer.handle()
    }

    /// Returns the index buffer handle.
    #[inline]
    pub fn index_buffer_handle(&self) -> vk::Buffer {
        self.index_buffer.handle()
    }

    /// Returns the number of indices.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Returns the index type bound at draw time.
    #[inline]
    pub fn index_type(&self) -> vk::IndexType {
        self.index_type
    }
}

/// GPU-resident texture: mipmapped image, sampler, and one descriptor set
/// per swapchain image.
pub struct GpuTexture {
    /// Sampled image with its full mip chain.
    image: Image,
    /// Sampler covering the whole chain.
    sampler: Sampler,
    /// One combined-image-sampler set per swapchain image.
    descriptor_sets: Vec<vk::DescriptorSet>,
}

impl GpuTexture {
    /// Returns the descriptor set for one swapchain image.
    #[inline]
    pub fn descriptor_set(&self, image_index: u32) -> vk::DescriptorSet {
        self.descriptor_sets[image_index as usize]
    }
}

/// All GPU-resident meshes and textures, keyed by their stable IDs.
pub struct GpuAssets {
    device: Arc<Device>,
    meshes: BTreeMap<MeshId, GpuMesh>,
    textures: BTreeMap<TextureId, GpuTexture>,
}

impl GpuAssets {
    /// Creates an empty asset store.
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            meshes: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }

    /// Uploads a mesh into device-local buffers under `id`.
    ///
    /// Blocks until both staging copies complete.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DuplicateMesh`] when `id` is already
    /// registered, or an RHI error if buffer creation or upload fails.
    pub fn upload_mesh(
        &mut self,
        id: MeshId,
        mesh: &MeshData,
        uploader: &StagingUploader,
    ) -> RenderResult<()> {
        if self.meshes.contains_key(&id) {
            return Err(RenderError::DuplicateMesh(id));
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let vertex_buffer = Buffer::new(
            self.device.clone(),
            vertex_bytes.len() as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryIntent::DeviceLocal,
        )?;
        uploader.upload_to_buffer(vertex_bytes, &vertex_buffer)?;

        let index_bytes = mesh.indices.as_bytes();
        let index_buffer = Buffer::new(
            self.device.clone(),
            index_bytes.len() as vk::DeviceSize,
            vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            MemoryIntent::DeviceLocal,
        )?;
        uploader.upload_to_buffer(index_bytes, &index_buffer)?;

        let index_type = match mesh.indices {
            IndexData::U16(_) => vk::IndexType::UINT16,
            IndexData::U32(_) => vk::IndexType::UINT32,
        };

        info!(
            "Uploaded mesh {:?}: {} vertices, {} indices",
            id,
            mesh.vertices.len(),
            mesh.indices.len()
        );

        self.meshes.insert(
            id,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.indices.len() as u32,
                index_type,
            },
        );
        Ok(())
    }

    /// Uploads a texture with a full mip chain under `id`.
    ///
    /// Blocks until the copy and mip blits complete. Descriptor sets are
    /// allocated from the current target group's pool, one per swapchain
    /// image.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::DuplicateTexture`] when `id` is already
    /// registered, [`RenderError::UnsupportedBlitFormat`] when the device
    /// cannot linearly blit the texture format, or an RHI error if any
    /// Vulkan operation fails.
    pub fn upload_texture(
        &mut self,
        instance: &ash::Instance,
        id: TextureId,
        texture: &TextureData,
        uploader: &StagingUploader,
        targets: &RenderTargets,
    ) -> RenderResult<()> {
        if self.textures.contains_key(&id) {
            return Err(RenderError::DuplicateTexture(id));
        }

        if !format::supports_linear_blit(instance, self.device.physical_device(), TEXTURE_FORMAT) {
            return Err(RenderError::UnsupportedBlitFormat(TEXTURE_FORMAT));
        }

        let mip_levels = mip_level_count(texture.width, texture.height);
        let image = Image::new(
            self.device.clone(),
            vk::Extent2D {
                width: texture.width,
                height: texture.height,
            },
            TEXTURE_FORMAT,
            vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST
                | vk::ImageUsageFlags::SAMPLED,
            vk::ImageAspectFlags::COLOR,
            mip_levels,
        )?;
        uploader.upload_to_image(&texture.pixels, &image)?;

        let sampler = Sampler::new(self.device.clone(), mip_levels)?;

        let descriptor_sets = targets.allocate_texture_sets()?;
        write_texture_sets(&self.device, &descriptor_sets, &image, &sampler);

        info!(
            "Uploaded texture {:?}: {}x{}, {} mip level(s)",
            id, texture.width, texture.height, mip_levels
        );

        self.textures.insert(
            id,
            GpuTexture {
                image,
                sampler,
                descriptor_sets,
            },
        );
        Ok(())
    }

    /// Re-allocates every texture's descriptor sets from a freshly built
    /// target group.
    ///
    /// Called after swapchain recreation; the old sets died with the old
    /// group's pool. Images and samplers are reused as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the new pool cannot satisfy the allocations.
    pub fn rebuild_descriptor_sets(&mut self, targets: &RenderTargets) -> RenderResult<()> {
        for texture in self.textures.values_mut() {
            texture.descriptor_sets = targets.allocate_texture_sets()?;
            write_texture_sets(
                &self.device,
                &texture.descriptor_sets,
                &texture.image,
                &texture.sampler,
            );
        }
        Ok(())
    }

    /// Looks up a mesh by ID.
    #[inline]
    pub fn mesh(&self, id: MeshId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    /// Looks up a texture by ID.
    #[inline]
    pub fn texture(&self, id: TextureId) -> Option<&GpuTexture> {
        self.textures.get(&id)
    }

    /// Returns the number of registered meshes.
    #[inline]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Returns the number of registered textures.
    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

/// Points a texture's descriptor sets at its image and sampler.
fn write_texture_sets(
    device: &Device,
    sets: &[vk::DescriptorSet],
    image: &Image,
    sampler: &Sampler,
) {
    for &set in sets {
        let image_infos = [descriptor::image_info(
            sampler.handle(),
            image.view(),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )];
        let writes = [vk::WriteDescriptorSet::default()
            .dst_set(set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos)];
        update_descriptor_sets(device, &writes);
    }
}
