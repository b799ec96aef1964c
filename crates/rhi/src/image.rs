//! GPU image management.
//!
//! This module handles 2D images with gpu-allocator managed memory: texture
//! images with full mip chains, depth attachments, layout transitions, and
//! GPU-side mipmap generation.
//!
//! # Overview
//!
//! - [`Image`] wraps VkImage + allocation + VkImageView
//! - [`mip_level_count`] computes the full-chain mip count for an extent
//! - [`Image::generate_mipmaps`] fills levels 1..n by blitting down the chain

use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use tracing::debug;

use crate::command::CommandBuffer;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Number of mip levels in a full chain for the given extent.
///
/// `floor(log2(max(width, height))) + 1`, so a 1x1 image has one level.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// GPU image wrapper with managed memory and a default view.
///
/// The image, its allocation, and its view are created together and
/// destroyed together in Drop (view, then allocation, then image).
pub struct Image {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// GPU memory allocation. `None` only after Drop takes it.
    allocation: Option<Allocation>,
    /// Default image view over all mip levels.
    view: vk::ImageView,
    /// Image format.
    format: vk::Format,
    /// Image extent.
    extent: vk::Extent2D,
    /// Number of mip levels.
    mip_levels: u32,
}

impl Image {
    /// Creates a device-local 2D image with `mip_levels` levels and a view
    /// covering the whole chain.
    ///
    /// # Errors
    ///
    /// Returns an error if image, memory, or view creation fails, or if the
    /// extent is zero.
    pub fn new(
        device: Arc<Device>,
        extent: vk::Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        aspect: vk::ImageAspectFlags,
        mip_levels: u32,
    ) -> RhiResult<Self> {
        if extent.width == 0 || extent.height == 0 {
            return Err(RhiError::InvalidResource(
                "image extent must be nonzero".to_string(),
            ));
        }

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(mip_levels)
            .array_layers(1)
            .format(format)
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(vk::SampleCountFlags::TYPE_1);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().map_err(|_| {
                RhiError::InvalidResource("allocator mutex poisoned".to_string())
            })?;
            allocator.allocate(&AllocationCreateDesc {
                name: "image",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(aspect)
                    .base_mip_level(0)
                    .level_count(mip_levels)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&view_info, None)? };

        debug!(
            "Created image {}x{} ({:?}, {} mip level(s))",
            extent.width, extent.height, format, mip_levels
        );

        Ok(Self {
            device,
            image,
            allocation: Some(allocation),
            view,
            format,
            extent,
            mip_levels,
        })
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    /// Returns the default image view.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Returns the image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the image extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the number of mip levels.
    #[inline]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Records a layout transition over the whole mip chain.
    ///
    /// Handles the transitions the upload path needs: UNDEFINED →
    /// TRANSFER_DST and TRANSFER_DST → SHADER_READ_ONLY.
    ///
    /// # Errors
    ///
    /// Returns an error for a transition pair this helper does not model.
    pub fn record_layout_transition(
        &self,
        cmd: &CommandBuffer,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) -> RhiResult<()> {
        let (src_access, dst_access, src_stage, dst_stage) = match (old_layout, new_layout) {
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => (
                vk::AccessFlags::empty(),
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
            ),
            (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
                (
                    vk::AccessFlags::TRANSFER_WRITE,
                    vk::AccessFlags::SHADER_READ,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::PipelineStageFlags::FRAGMENT_SHADER,
                )
            }
            _ => {
                return Err(RhiError::InvalidResource(format!(
                    "unsupported layout transition {:?} -> {:?}",
                    old_layout, new_layout
                )))
            }
        };

        let barrier = vk::ImageMemoryBarrier::default()
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(self.image)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(self.mip_levels)
                    .base_array_layer(0)
                    .layer_count(1),
            )
            .src_access_mask(src_access)
            .dst_access_mask(dst_access);

        cmd.pipeline_barrier(src_stage, dst_stage, &[barrier]);
        Ok(())
    }

    /// Records mipmap generation for the whole chain.
    ///
    /// Expects every level in TRANSFER_DST_OPTIMAL (the state after the
    /// staging copy into level 0). Each level i is produced by blitting
    /// level i-1 with LINEAR filtering; the source level moves through
    /// TRANSFER_SRC and ends in SHADER_READ_ONLY, and the last level goes
    /// from TRANSFER_DST to SHADER_READ_ONLY directly. After the recorded
    /// commands retire, the whole chain reads as SHADER_READ_ONLY.
    ///
    /// The caller must have verified linear blit support for the format
    /// (`format::supports_linear_blit`); driver-level failure during the
    /// blit is fatal with no recovery contract.
    pub fn record_mipmap_generation(&self, cmd: &CommandBuffer) {
        let mut barrier = vk::ImageMemoryBarrier::default()
            .image(self.image)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_array_layer(0)
                    .layer_count(1)
                    .level_count(1),
            );

        let mut mip_width = self.extent.width as i32;
        let mut mip_height = self.extent.height as i32;

        for level in 1..self.mip_levels {
            // Source level: TRANSFER_DST -> TRANSFER_SRC for the blit read.
            barrier.subresource_range.base_mip_level = level - 1;
            barrier.old_layout = vk::ImageLayout::TRANSFER_DST_OPTIMAL;
            barrier.new_layout = vk::ImageLayout::TRANSFER_SRC_OPTIMAL;
            barrier.src_access_mask = vk::AccessFlags::TRANSFER_WRITE;
            barrier.dst_access_mask = vk::AccessFlags::TRANSFER_READ;

            cmd.pipeline_barrier(
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                &[barrier],
            );

            let dst_width = (mip_width / 2).max(1);
            let dst_height = (mip_height / 2).max(1);

            let blit = vk::ImageBlit::default()
                .src_offsets([
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D {
                        x: mip_width,
                        y: mip_height,
                        z: 1,
                    },
                ])
                .src_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(level - 1)
                        .base_array_layer(0)
                        .layer_count(1),
                )
                .dst_offsets([
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D {
                        x: dst_width,
                        y: dst_height,
                        z: 1,
                    },
                ])
                .dst_subresource(
                    vk::ImageSubresourceLayers::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .mip_level(level)
                        .base_array_layer(0)
                        .layer_count(1),
                );

            cmd.blit_image(
                self.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                self.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );

            // Source level consumed; settle it for sampling.
            barrier.old_layout = vk::ImageLayout::TRANSFER_SRC_OPTIMAL;
            barrier.new_layout = vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;
            barrier.src_access_mask = vk::AccessFlags::TRANSFER_READ;
            barrier.dst_access_mask = vk::AccessFlags::SHADER_READ;

            cmd.pipeline_barrier(
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                &[barrier],
            );

            mip_width = dst_width;
            mip_height = dst_height;
        }

        // Last level never becomes a blit source.
        barrier.subresource_range.base_mip_level = self.mip_levels - 1;
        barrier.old_layout = vk::ImageLayout::TRANSFER_DST_OPTIMAL;
        barrier.new_layout = vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL;
        barrier.src_access_mask = vk::AccessFlags::TRANSFER_WRITE;
        barrier.dst_access_mask = vk::AccessFlags::SHADER_READ;

        cmd.pipeline_barrier(
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            &[barrier],
        );
    }
}

impl Drop for Image {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
        }

        if let Some(allocation) = self.allocation.take() {
            if let Ok(mut allocator) = self.device.allocator().lock() {
                if let Err(e) = allocator.free(allocation) {
                    tracing::error!("Failed to free image allocation: {:?}", e);
                }
            }
        }

        unsafe {
            self.device.handle().destroy_image(self.image, None);
        }

        debug!(
            "Destroyed image {}x{} ({:?})",
            self.extent.width, self.extent.height, self.format
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(512, 256), 10);
        assert_eq!(mip_level_count(256, 512), 10);
        assert_eq!(mip_level_count(1920, 1080), 11);
    }

    #[test]
    fn test_mip_level_count_non_power_of_two() {
        // floor(log2(100)) = 6, so 7 levels
        assert_eq!(mip_level_count(100, 50), 7);
        // floor(log2(1000)) = 9, so 10 levels
        assert_eq!(mip_level_count(1000, 1000), 10);
    }
}
