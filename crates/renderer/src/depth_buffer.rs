//! Depth attachment management.
//!
//! The depth buffer is sized to the swapchain extent and is a member of the
//! resize-atomic group: it is dropped and rebuilt together with the
//! swapchain, render pass, and framebuffers.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use glint_rhi::device::Device;
use glint_rhi::image::Image;
use glint_rhi::{format, RhiResult};

/// Depth attachment backed by a device-local image.
///
/// The format is selected per device at creation, preferring `D32_SFLOAT`.
pub struct DepthBuffer {
    /// Depth image with its view and allocation.
    image: Image,
}

impl DepthBuffer {
    /// Creates a depth buffer matching the swapchain extent.
    ///
    /// # Errors
    ///
    /// Returns an error if no depth format is supported or image creation
    /// fails.
    pub fn new(
        instance: &ash::Instance,
        device: Arc<Device>,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let format = format::select_depth_format(instance, device.physical_device())?;

        let image = Image::new(
            device,
            extent,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            vk::ImageAspectFlags::DEPTH,
            1,
        )?;

        info!(
            "Created depth buffer: {}x{} ({:?})",
            extent.width, extent.height, format
        );

        Ok(Self { image })
    }

    /// Returns the depth image view.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.image.view()
    }

    /// Returns the depth format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    /// Returns the depth buffer extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}
