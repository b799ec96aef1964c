//! Frame synchronization and the submit/present protocol.
//!
//! The [`FrameManager`] coordinates the frames-in-flight pattern: while the
//! GPU renders frame N, the CPU prepares frame N+1 in a different slot. Each
//! of the [`FRAMES_IN_FLIGHT`] slots carries its own semaphore pair and
//! in-flight fence.
//!
//! # Per-Image Fences
//!
//! The swapchain may hand back an image that a submission from another slot
//! is still rendering to. The manager keeps one fence handle per swapchain
//! image recording which submission last used it; when an acquired image is
//! still in flight under a different slot, the host waits on that fence too
//! before reusing the image.
//!
//! # Out-of-Date Acquire
//!
//! When acquire reports the swapchain out of date, the frame is abandoned
//! without a submission and the slot index does not advance. The slot's
//! fence was never reset, so the next frame's wait returns immediately and
//! the slot cannot starve.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use glint_rhi::device::Device;
use glint_rhi::swapchain::Swapchain;
use glint_rhi::sync::{FrameSync, FRAMES_IN_FLIGHT};
use glint_rhi::RhiResult;

/// Result of a swapchain image acquisition.
pub enum AcquireOutcome {
    /// An image was acquired. `suboptimal` requests recreation after the
    /// frame completes.
    Acquired {
        /// Index of the acquired swapchain image.
        image_index: u32,
        /// True when the swapchain no longer matches the surface exactly.
        suboptimal: bool,
    },
    /// The swapchain is out of date; the frame must be abandoned and the
    /// swapchain recreated.
    OutOfDate,
}

/// Manages frame slots and the per-frame synchronization protocol.
pub struct FrameManager {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// One set of synchronization primitives per frame slot.
    slots: Vec<FrameSync>,
    /// Last-use fence per swapchain image; null until first use.
    images_in_flight: Vec<vk::Fence>,
    /// Current frame slot index.
    current_slot: usize,
}

impl FrameManager {
    /// Creates the frame slots and an empty per-image fence table.
    ///
    /// # Errors
    ///
    /// Returns an error if synchronization object creation fails.
    pub fn new(device: Arc<Device>, image_count: usize) -> RhiResult<Self> {
        let mut slots = Vec::with_capacity(FRAMES_IN_FLIGHT);
        for _ in 0..FRAMES_IN_FLIGHT {
            slots.push(FrameSync::new(device.clone())?);
        }

        info!(
            "Frame manager created: {} slots, {} swapchain images",
            FRAMES_IN_FLIGHT, image_count
        );

        Ok(Self {
            device,
            slots,
            images_in_flight: vec![vk::Fence::null(); image_count],
            current_slot: 0,
        })
    }

    /// Returns the current frame slot index.
    #[inline]
    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    /// Resizes the per-image fence table after swapchain recreation.
    ///
    /// All entries reset to null; the old swapchain's images are gone and so
    /// are their pending submissions (the caller waits for device idle
    /// before recreating).
    pub fn reset_image_table(&mut self, image_count: usize) {
        self.images_in_flight = vec![vk::Fence::null(); image_count];
        debug!("Per-image fence table reset for {} images", image_count);
    }

    /// Waits for the current slot's previous submission to retire.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_for_slot(&self) -> RhiResult<()> {
        self.slots[self.current_slot]
            .in_flight_fence()
            .wait(u64::MAX)?;
        Ok(())
    }

    /// Acquires the next swapchain image with an unbounded wait.
    ///
    /// Signals the current slot's image-available semaphore.
    ///
    /// # Errors
    ///
    /// Returns an error for any acquire failure other than out-of-date,
    /// which is reported through [`AcquireOutcome::OutOfDate`].
    pub fn acquire(&mut self, swapchain: &Swapchain) -> RhiResult<AcquireOutcome> {
        let semaphore = self.slots[self.current_slot].image_available_handle();

        match swapchain.acquire_next_image(semaphore) {
            Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired {
                image_index,
                suboptimal,
            }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                Ok(AcquireOutcome::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Waits until the acquired image is no longer used by another slot,
    /// then records the current slot as its user.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn claim_image(&mut self, image_index: u32) -> RhiResult<()> {
        let image_fence = self.images_in_flight[image_index as usize];
        let slot_fence = self.slots[self.current_slot].in_flight_fence_handle();

        if image_fence != vk::Fence::null() && image_fence != slot_fence {
            let fences = [image_fence];
            unsafe {
                self.device
                    .handle()
                    .wait_for_fences(&fences, true, u64::MAX)?;
            }
        }

        self.images_in_flight[image_index as usize] = slot_fence;
        Ok(())
    }

    /// Submits a command buffer for the current slot.
    ///
    /// The slot's fence is reset immediately before the submission, so an
    /// abandoned frame never leaves it unsignaled. The submission waits on
    /// the image-available semaphore at COLOR_ATTACHMENT_OUTPUT and signals
    /// the render-finished semaphore plus the slot fence.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence reset or queue submission fails.
    pub fn submit(&self, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        let slot = &self.slots[self.current_slot];

        slot.in_flight_fence().reset()?;

        let wait_semaphores = [slot.image_available_handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.render_finished_handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                slot.in_flight_fence_handle(),
            )?;
        }

        Ok(())
    }

    /// Presents the rendered image, waiting on the render-finished
    /// semaphore.
    ///
    /// Returns true when the swapchain should be recreated (out of date or
    /// suboptimal).
    ///
    /// # Errors
    ///
    /// Returns an error for any present failure other than out-of-date or
    /// suboptimal.
    pub fn present(&self, swapchain: &Swapchain, image_index: u32) -> RhiResult<bool> {
        let slot = &self.slots[self.current_slot];

        match swapchain.present(
            self.device.present_queue(),
            image_index,
            slot.render_finished_handle(),
        ) {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during present");
                Ok(true)
            }
            Err(vk::Result::SUBOPTIMAL_KHR) => {
                debug!("Swapchain suboptimal during present");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Advances to the next frame slot. Not called for abandoned frames.
    pub fn advance(&mut self) {
        self.current_slot = (self.current_slot + 1) % FRAMES_IN_FLIGHT;
    }

    /// Waits for every slot's last submission to retire.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_all(&self) -> RhiResult<()> {
        let fences: Vec<vk::Fence> = self
            .slots
            .iter()
            .map(|slot| slot.in_flight_fence_handle())
            .collect();

        unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, u64::MAX)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_count_matches_constant() {
        assert_eq!(FRAMES_IN_FLIGHT, 2);
    }

    #[test]
    fn test_frame_manager_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameManager>();
        assert_send::<AcquireOutcome>();
    }
}
