//! Per-image command buffer recording.
//!
//! One primary command buffer exists per swapchain image. Each frame the
//! acquired image's buffer is reset and re-recorded from the live batch set:
//! begin the render pass, bind the pipeline and the frame set, then one
//! indexed instanced draw per live batch. An optional [`OverlayDraw`] hook
//! records extra commands inside the same render pass, after the batches.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use glint_rhi::command::{CommandBuffer, CommandPool};
use glint_rhi::device::Device;
use glint_rhi::{RhiError, RhiResult};

use crate::batch::BatchSet;
use crate::gpu_assets::GpuAssets;
use crate::targets::RenderTargets;

/// Hook for recording extra draw commands inside the frame's render pass.
///
/// Called after all batches are recorded, with the pass still open and the
/// viewport and scissor set to the full extent. Implementations bind their
/// own pipelines and must not end the pass.
pub trait OverlayDraw {
    /// Records overlay commands into the frame's command buffer.
    fn record(&self, cmd: &CommandBuffer, extent: vk::Extent2D);
}

/// Owns the per-image primary command buffers and records frames.
pub struct CommandRecorder {
    device: Arc<Device>,
    /// Pool the per-image buffers are allocated from; allows per-buffer
    /// reset.
    pool: CommandPool,
    /// One primary command buffer per swapchain image.
    buffers: Vec<CommandBuffer>,
}

impl CommandRecorder {
    /// Creates a recorder with one command buffer per swapchain image.
    ///
    /// # Errors
    ///
    /// Returns an error if pool or buffer creation fails.
    pub fn new(device: Arc<Device>, image_count: usize) -> RhiResult<Self> {
        let graphics_family = device
            .queue_families()
            .graphics_family
            .ok_or_else(|| RhiError::InvalidResource("no graphics queue family".to_string()))?;
        let pool = CommandPool::new(device.clone(), graphics_family)?;

        let mut recorder = Self {
            device,
            pool,
            buffers: Vec::new(),
        };
        recorder.resize(image_count)?;
        Ok(recorder)
    }

    /// Re-allocates the per-image buffers for a new swapchain image count.
    ///
    /// The old buffers are freed with their pool reset; the caller waits for
    /// device idle before recreation, so none are in flight.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn resize(&mut self, image_count: usize) -> RhiResult<()> {
        self.buffers.clear();
        for _ in 0..image_count {
            self.buffers
                .push(CommandBuffer::new(self.device.clone(), &self.pool)?);
        }
        debug!("Allocated {} frame command buffers", image_count);
        Ok(())
    }

    /// Returns the command buffer handle for one swapchain image.
    #[inline]
    pub fn buffer_handle(&self, image_index: u32) -> vk::CommandBuffer {
        self.buffers[image_index as usize].handle()
    }

    /// Records the frame for one swapchain image.
    ///
    /// Resets the image's buffer and records the full pass: clear, pipeline
    /// and frame set binds, then per live batch the texture set, the mesh's
    /// vertex and index buffers, the batch's instance buffer, and one
    /// `draw_indexed` with the batch's instance count. A batch whose mesh or
    /// texture was never registered is skipped; in debug builds that trips
    /// an assertion instead.
    ///
    /// # Errors
    ///
    /// Returns an error if buffer reset, begin, or end fails.
    pub fn record(
        &self,
        image_index: u32,
        targets: &RenderTargets,
        assets: &GpuAssets,
        batches: &BatchSet,
        clear_color: [f32; 4],
        overlay: Option<&dyn OverlayDraw>,
    ) -> RhiResult<()> {
        let cmd = &self.buffers[image_index as usize];
        let extent = targets.extent();

        cmd.reset()?;
        cmd.begin()?;

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let pass_begin = vk::RenderPassBeginInfo::default()
            .render_pass(targets.render_pass_handle())
            .framebuffer(targets.framebuffer_handle(image_index))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        cmd.begin_render_pass(&pass_begin);
        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, targets.pipeline_handle());

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        cmd.set_viewport(&viewport);
        cmd.set_scissor(&vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        });

        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            targets.pipeline_layout_handle(),
            0,
            &[targets.frame_set(image_index)],
            &[],
        );

        for ((mesh_id, texture_id), batch) in batches.live_batches() {
            let Some(mesh) = assets.mesh(mesh_id) else {
                debug_assert!(false, "draw references unregistered mesh {:?}", mesh_id);
                continue;
            };
            let Some(texture) = assets.texture(texture_id) else {
                debug_assert!(
                    false,
                    "draw references unregistered texture {:?}",
                    texture_id
                );
                continue;
            };

            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                targets.pipeline_layout_handle(),
                1,
                &[texture.descriptor_set(image_index)],
                &[],
            );
            cmd.bind_vertex_buffers(
                0,
                &[mesh.vertex_buffer_handle(), batch.buffer_handle()],
                &[0, 0],
            );
            cmd.bind_index_buffer(mesh.index_buffer_handle(), 0, mesh.index_type());
            cmd.draw_indexed(mesh.index_count(), batch.count(), 0, 0, 0);
        }

        if let Some(overlay) = overlay {
            overlay.record(cmd, extent);
        }

        cmd.end_render_pass();
        cmd.end()?;

        Ok(())
    }
}
