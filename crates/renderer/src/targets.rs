//! The resize-atomic render target group.
//!
//! Everything whose size or count depends on the swapchain lives in
//! [`RenderTargets`] and is built and destroyed as a unit: the swapchain
//! itself, the render pass, the depth attachment, the per-image
//! framebuffers, the per-image camera uniform buffers with their descriptor
//! sets, and the graphics pipeline. A window resize never patches members
//! in place; the renderer drops the whole group and rebuilds it, so a
//! half-updated state cannot be observed.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::info;

use glint_platform::Surface;
use glint_rhi::buffer::{Buffer, MemoryIntent};
use glint_rhi::descriptor::{
    self, DescriptorPool, DescriptorSetLayout, update_descriptor_sets,
};
use glint_rhi::device::Device;
use glint_rhi::instance::Instance;
use glint_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use glint_rhi::render_pass::{Framebuffer, RenderPass};
use glint_rhi::shader::{Shader, ShaderStage};
use glint_rhi::swapchain::Swapchain;
use glint_rhi::vertex::{
    instance_attribute_descriptions, instance_binding_description, MeshVertex,
};
use glint_rhi::RhiResult;

use crate::depth_buffer::DepthBuffer;
use crate::ubo::CameraUbo;

/// Upper bound on distinct textures the descriptor pool is sized for.
///
/// Each resident texture takes one combined-image-sampler set per swapchain
/// image from the group's pool.
pub const MAX_TEXTURE_SLOTS: u32 = 64;

/// Swapchain-sized resources, built and torn down atomically.
///
/// Fields are declared in reverse dependency order so the default drop
/// order tears the group down cleanly: pipeline before its layout, sets
/// with their pool, framebuffers and depth before the render pass, and the
/// swapchain last.
pub struct RenderTargets {
    /// Instanced mesh pipeline.
    pipeline: Pipeline,
    /// Pipeline layout: set 0 frame data, set 1 texture.
    pipeline_layout: PipelineLayout,
    /// Per-image frame descriptor sets (camera UBO at binding 0).
    frame_sets: Vec<vk::DescriptorSet>,
    /// Pool all per-image sets are allocated from, including texture sets.
    descriptor_pool: DescriptorPool,
    /// Layout of the per-texture combined-image-sampler set.
    texture_set_layout: DescriptorSetLayout,
    /// Layout of the per-image frame set.
    frame_set_layout: DescriptorSetLayout,
    /// Per-image camera uniform buffers, persistently mapped.
    camera_ubos: Vec<Buffer>,
    /// One framebuffer per swapchain image.
    framebuffers: Vec<Framebuffer>,
    /// Depth attachment shared by all framebuffers.
    depth_buffer: DepthBuffer,
    /// Single-subpass render pass.
    render_pass: RenderPass,
    /// The swapchain with its images and views.
    swapchain: Swapchain,
}

impl RenderTargets {
    /// Builds the full group for the current surface state.
    ///
    /// `old_swapchain` carries the handle being replaced during recreation,
    /// or null on first creation; the caller keeps the old group alive until
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns an error if any member fails to build, including unreadable
    /// shader blobs. The partially built group is dropped cleanly.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: &Surface,
        framebuffer_extent: vk::Extent2D,
        vertex_shader_path: &Path,
        fragment_shader_path: &Path,
        old_swapchain: vk::SwapchainKHR,
    ) -> RhiResult<Self> {
        let swapchain = Swapchain::new(
            instance,
            device.clone(),
            surface.handle(),
            surface.loader(),
            framebuffer_extent,
            old_swapchain,
        )?;
        let extent = swapchain.extent();
        let image_count = swapchain.image_count();

        let depth_buffer = DepthBuffer::new(instance.handle(), device.clone(), extent)?;

        let render_pass = RenderPass::new(device.clone(), swapchain.format(), depth_buffer.format())?;

        let mut framebuffers = Vec::with_capacity(image_count);
        for &color_view in swapchain.image_views() {
            framebuffers.push(Framebuffer::new(
                device.clone(),
                &render_pass,
                color_view,
                depth_buffer.view(),
                extent,
            )?);
        }

        let mut camera_ubos = Vec::with_capacity(image_count);
        for _ in 0..image_count {
            camera_ubos.push(Buffer::new(
                device.clone(),
                CameraUbo::SIZE as vk::DeviceSize,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
                MemoryIntent::HostPersistent,
            )?);
        }

        let frame_set_layout = DescriptorSetLayout::new(
            device.clone(),
            &[descriptor::uniform_buffer_binding(
                0,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            )],
        )?;
        let texture_set_layout = DescriptorSetLayout::new(
            device.clone(),
            &[descriptor::combined_image_sampler_binding(
                0,
                vk::ShaderStageFlags::FRAGMENT,
            )],
        )?;

        let image_count_u32 = image_count as u32;
        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(image_count_u32),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(image_count_u32 * MAX_TEXTURE_SLOTS),
        ];
        let descriptor_pool = DescriptorPool::new(
            device.clone(),
            image_count_u32 * (1 + MAX_TEXTURE_SLOTS),
            &pool_sizes,
        )?;

        let frame_layouts = vec![frame_set_layout.handle(); image_count];
        let frame_sets = descriptor_pool.allocate(&frame_layouts)?;

        for (set, ubo) in frame_sets.iter().zip(&camera_ubos) {
            let buffer_infos = [descriptor::buffer_info(
                ubo.handle(),
                0,
                CameraUbo::SIZE as vk::DeviceSize,
            )];
            let writes = [vk::WriteDescriptorSet::default()
                .dst_set(*set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_infos)];
            update_descriptor_sets(&device, &writes);
        }

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            vertex_shader_path,
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            fragment_shader_path,
            ShaderStage::Fragment,
            "main",
        )?;

        let pipeline_layout = PipelineLayout::new(
            device.clone(),
            &[frame_set_layout.handle(), texture_set_layout.handle()],
            &[],
        )?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(MeshVertex::binding_description())
            .vertex_attributes(&MeshVertex::attribute_descriptions())
            .vertex_binding(instance_binding_description())
            .vertex_attributes(&instance_attribute_descriptions())
            .build(device, &pipeline_layout, &render_pass)?;

        // Every per-image array mirrors the reported image count.
        debug_assert_eq!(framebuffers.len(), image_count);
        debug_assert_eq!(camera_ubos.len(), image_count);
        debug_assert_eq!(frame_sets.len(), image_count);

        info!(
            "Render targets built: {}x{}, {} images",
            extent.width, extent.height, image_count
        );

        Ok(Self {
            pipeline,
            pipeline_layout,
            frame_sets,
            descriptor_pool,
            texture_set_layout,
            frame_set_layout,
            camera_ubos,
            framebuffers,
            depth_buffer,
            render_pass,
            swapchain,
        })
    }

    /// Writes the camera UBO for one swapchain image.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapped write fails.
    pub fn update_camera_ubo(&self, image_index: u32, ubo: &CameraUbo) -> RhiResult<()> {
        self.camera_ubos[image_index as usize].write_bytes(0, bytemuck::bytes_of(ubo))
    }

    /// Allocates one texture descriptor set per swapchain image.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted.
    pub fn allocate_texture_sets(&self) -> RhiResult<Vec<vk::DescriptorSet>> {
        let layouts = vec![self.texture_set_layout.handle(); self.swapchain.image_count()];
        self.descriptor_pool.allocate(&layouts)
    }

    /// Returns the swapchain.
    #[inline]
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Returns the swapchain extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the number of swapchain images.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    /// Returns the render pass handle.
    #[inline]
    pub fn render_pass_handle(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    /// Returns the framebuffer handle for one swapchain image.
    #[inline]
    pub fn framebuffer_handle(&self, image_index: u32) -> vk::Framebuffer {
        self.framebuffers[image_index as usize].handle()
    }

    /// Returns the graphics pipeline handle.
    #[inline]
    pub fn pipeline_handle(&self) -> vk::Pipeline {
        self.pipeline.handle()
    }

    /// Returns the pipeline layout handle.
    #[inline]
    pub fn pipeline_layout_handle(&self) -> vk::PipelineLayout {
        self.pipeline_layout.handle()
    }

    /// Returns the frame descriptor set for one swapchain image.
    #[inline]
    pub fn frame_set(&self, image_index: u32) -> vk::DescriptorSet {
        self.frame_sets[image_index as usize]
    }
}
