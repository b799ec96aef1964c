//! Synchronous staging uploads to device-local memory.
//!
//! The [`StagingUploader`] moves host data into device-local buffers and
//! images through a temporary host-visible staging buffer and a one-shot
//! command buffer on the graphics queue. Every operation blocks on a fence
//! until the GPU has finished, then frees the staging buffer. Deliberately
//! synchronous: uploads happen at load time, not inside the frame loop, and
//! the blocking contract keeps resource lifetimes trivial.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glint_rhi::vk;
//! use glint_rhi::device::Device;
//! use glint_rhi::buffer::{Buffer, MemoryIntent};
//! use glint_rhi::upload::StagingUploader;
//!
//! # fn example(device: Arc<Device>) -> Result<(), glint_rhi::RhiError> {
//! let uploader = StagingUploader::new(device.clone())?;
//!
//! let vertices: [f32; 6] = [0.0, 0.5, -0.5, -0.5, 0.5, -0.5];
//! let data = bytemuck::cast_slice(&vertices);
//! let vertex_buffer = Buffer::new(
//!     device,
//!     data.len() as vk::DeviceSize,
//!     vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
//!     MemoryIntent::DeviceLocal,
//! )?;
//! uploader.upload_to_buffer(data, &vertex_buffer)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, MemoryIntent};
use crate::command::{CommandBuffer, CommandPool};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::Image;
use crate::sync::Fence;

/// Blocking staging-upload engine on the graphics queue.
///
/// Owns a transient command pool; each operation records a fresh one-shot
/// command buffer, submits it, and waits for completion.
pub struct StagingUploader {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Transient pool for one-shot transfer command buffers.
    pool: CommandPool,
}

impl StagingUploader {
    /// Creates an uploader with a transient pool on the graphics queue.
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or_else(|| RhiError::InvalidResource("no graphics queue family".to_string()))?;
        let pool = CommandPool::new_transient(device.clone(), graphics_family)?;

        Ok(Self { device, pool })
    }

    /// Uploads `data` into a device-local buffer.
    ///
    /// Blocks until the GPU copy completes. The destination must carry
    /// `TRANSFER_DST` usage and be at least `data.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is empty, the destination is too small, or
    /// any Vulkan operation fails.
    pub fn upload_to_buffer(&self, data: &[u8], dst: &Buffer) -> RhiResult<()> {
        if data.is_empty() {
            return Err(RhiError::InvalidResource(
                "upload data must not be empty".to_string(),
            ));
        }
        if (data.len() as vk::DeviceSize) > dst.size() {
            return Err(RhiError::InvalidResource(format!(
                "upload of {} bytes exceeds destination buffer of {} bytes",
                data.len(),
                dst.size()
            )));
        }

        let staging = Buffer::new_with_data(
            self.device.clone(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryIntent::HostSequential,
            data,
        )?;

        self.submit_one_shot(|cmd| {
            let region = vk::BufferCopy::default().size(data.len() as vk::DeviceSize);
            cmd.copy_buffer(staging.handle(), dst.handle(), &[region]);
            Ok(())
        })?;

        debug!("Uploaded {} bytes to device-local buffer", data.len());
        Ok(())
    }

    /// Uploads tightly packed pixel data into mip level 0 of an image and
    /// generates the remaining mip levels on the GPU.
    ///
    /// Blocks until the copy and the mip blits complete. The image ends in
    /// `SHADER_READ_ONLY_OPTIMAL` across its whole chain. The caller is
    /// responsible for the linear-blit capability check on the format.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is empty or any Vulkan operation fails.
    pub fn upload_to_image(&self, data: &[u8], image: &Image) -> RhiResult<()> {
        if data.is_empty() {
            return Err(RhiError::InvalidResource(
                "upload data must not be empty".to_string(),
            ));
        }

        let staging = Buffer::new_with_data(
            self.device.clone(),
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryIntent::HostSequential,
            data,
        )?;

        let extent = image.extent();

        self.submit_one_shot(|cmd| {
            image.record_layout_transition(
                cmd,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            )?;

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(0)
                        .base_array_layer(0)
                        .layer_count(1),
                )
                .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
                .image_extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                });

            cmd.copy_buffer_to_image(
                staging.handle(),
                image.handle(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            image.record_mipmap_generation(cmd);
            Ok(())
        })?;

        debug!(
            "Uploaded {} bytes to image {}x{} ({} mip level(s))",
            data.len(),
            extent.width,
            extent.height,
            image.mip_levels()
        );
        Ok(())
    }

    /// Copies `size` bytes between two existing buffers.
    ///
    /// For callers that keep a persistent staging buffer of their own and
    /// only need the blocking copy half of [`upload_to_buffer`]. The source
    /// must carry `TRANSFER_SRC` and the destination `TRANSFER_DST` usage.
    ///
    /// [`upload_to_buffer`]: StagingUploader::upload_to_buffer
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero, exceeds either buffer, or any
    /// Vulkan operation fails.
    pub fn copy_between_buffers(
        &self,
        src: &Buffer,
        dst: &Buffer,
        size: vk::DeviceSize,
    ) -> RhiResult<()> {
        if size == 0 {
            return Err(RhiError::InvalidResource(
                "copy size must be greater than 0".to_string(),
            ));
        }
        if size > src.size() || size > dst.size() {
            return Err(RhiError::InvalidResource(format!(
                "copy of {} bytes exceeds buffer sizes (src {}, dst {})",
                size,
                src.size(),
                dst.size()
            )));
        }

        self.submit_one_shot(|cmd| {
            let region = vk::BufferCopy::default().size(size);
            cmd.copy_buffer(src.handle(), dst.handle(), &[region]);
            Ok(())
        })?;

        debug!("Copied {} bytes between buffers", size);
        Ok(())
    }

    /// Reads `size` bytes back from a device-local buffer.
    ///
    /// The symmetric readback of [`upload_to_buffer`], used to validate
    /// uploads. Blocks until the GPU copy completes. The source must carry
    /// `TRANSFER_SRC` usage.
    ///
    /// [`upload_to_buffer`]: StagingUploader::upload_to_buffer
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero, exceeds the source buffer, or any
    /// Vulkan operation fails.
    pub fn download_from_buffer(
        &self,
        src: &Buffer,
        size: vk::DeviceSize,
    ) -> RhiResult<Vec<u8>> {
        if size == 0 {
            return Err(RhiError::InvalidResource(
                "download size must be greater than 0".to_string(),
            ));
        }
        if size > src.size() {
            return Err(RhiError::InvalidResource(format!(
                "download of {} bytes exceeds source buffer of {} bytes",
                size,
                src.size()
            )));
        }

        let readback = Buffer::new(
            self.device.clone(),
            size,
            vk::BufferUsageFlags::TRANSFER_DST,
            MemoryIntent::HostReadback,
        )?;

        self.submit_one_shot(|cmd| {
            let region = vk::BufferCopy::default().size(size);
            cmd.copy_buffer(src.handle(), readback.handle(), &[region]);
            Ok(())
        })?;

        let mut out = vec![0u8; size as usize];
        readback.read_bytes(0, &mut out)?;

        debug!("Downloaded {} bytes from device-local buffer", size);
        Ok(out)
    }

    /// Records a one-shot command buffer, submits it on the graphics queue,
    /// and blocks on a fence until it retires.
    fn submit_one_shot<F>(&self, record: F) -> RhiResult<()>
    where
        F: FnOnce(&CommandBuffer) -> RhiResult<()>,
    {
        let cmd = CommandBuffer::new(self.device.clone(), &self.pool)?;

        cmd.begin()?;
        record(&cmd)?;
        cmd.end()?;

        let fence = Fence::new(self.device.clone(), false)?;

        let command_buffers = [cmd.handle()];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                fence.handle(),
            )?;
        }

        fence.wait(u64::MAX)?;

        unsafe {
            self.device
                .handle()
                .free_command_buffers(self.pool.handle(), &command_buffers);
        }

        Ok(())
    }
}
