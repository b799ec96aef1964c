//! The renderer facade.
//!
//! [`Renderer`] owns the whole Vulkan stack for one window: instance,
//! surface, device, the resize-atomic target group, GPU assets, instance
//! batches, per-image command buffers, and the frame synchronization state.
//! The application hands it a window and a filled [`DrawSubmission`] each
//! frame; everything else is internal.
//!
//! # Frame Protocol
//!
//! [`Renderer::draw_frame`] runs one iteration of the frame loop: handle a
//! pending recreation, wait for the frame slot, acquire an image, claim it
//! against other slots, upload camera and instance data, record, submit,
//! present, advance. An out-of-date swapchain at any point marks recreation
//! pending and abandons the frame; the rebuild happens at the start of the
//! next call, never mid-frame.

use std::path::PathBuf;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use glint_platform::{Surface, Window};
use glint_rhi::device::Device;
use glint_rhi::instance::Instance;
use glint_rhi::physical_device::select_physical_device;
use glint_rhi::upload::StagingUploader;
use glint_assets::{MeshData, MeshId, TextureData, TextureId};
use glint_scene::Camera;

use crate::batch::{BatchSet, DrawSubmission};
use crate::error::RenderResult;
use crate::frame::{AcquireOutcome, FrameManager};
use crate::gpu_assets::GpuAssets;
use crate::recorder::{CommandRecorder, OverlayDraw};
use crate::targets::RenderTargets;
use crate::ubo::CameraUbo;

/// Renderer construction parameters.
pub struct RendererConfig {
    /// Path to the compiled vertex shader (SPIR-V).
    pub vertex_shader_path: PathBuf,
    /// Path to the compiled fragment shader (SPIR-V).
    pub fragment_shader_path: PathBuf,
    /// Clear color for the color attachment, RGBA.
    pub clear_color: [f32; 4],
    /// Whether to enable the Vulkan validation layer.
    pub enable_validation: bool,
}

impl RendererConfig {
    /// Creates a config with the default clear color and validation enabled
    /// in debug builds.
    pub fn new(
        vertex_shader_path: impl Into<PathBuf>,
        fragment_shader_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vertex_shader_path: vertex_shader_path.into(),
            fragment_shader_path: fragment_shader_path.into(),
            clear_color: [0.05, 0.05, 0.08, 1.0],
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Owns the Vulkan stack and drives the frame loop for one window.
///
/// Fields are declared in drop order: per-frame state and GPU resources
/// first, then the target group, then the device, surface, and instance.
/// `Drop` only waits for the device to go idle; destruction itself falls
/// out of the field order.
pub struct Renderer {
    /// Current frame's pending draw submission.
    submission: DrawSubmission,
    /// Active camera, copied into the per-image UBO each frame.
    camera: Camera,
    /// Optional overlay recorded inside the render pass.
    overlay: Option<Box<dyn OverlayDraw>>,
    /// Clear color for the color attachment.
    clear_color: [f32; 4],
    /// Shader paths, kept for target group rebuilds.
    vertex_shader_path: PathBuf,
    fragment_shader_path: PathBuf,
    /// Target group rebuild requested; handled at the next draw_frame.
    recreate_pending: bool,
    /// Total frames presented.
    frames_rendered: u64,
    /// Per-key instance buffers.
    batches: BatchSet,
    /// GPU-resident meshes and textures.
    assets: GpuAssets,
    /// Per-image command buffers.
    recorder: CommandRecorder,
    /// Frame slots and the per-image fence table.
    frame_manager: FrameManager,
    /// Blocking staging upload engine.
    uploader: StagingUploader,
    /// The resize-atomic target group.
    targets: RenderTargets,
    /// Logical device; the last clone of this Arc drops after all GPU
    /// resources above.
    device: Arc<Device>,
    /// Window surface, dropped before the instance.
    surface: Surface,
    /// Vulkan instance, dropped last.
    instance: Instance,
}

impl Renderer {
    /// Creates a renderer for the given window.
    ///
    /// # Errors
    ///
    /// Returns an error if instance, surface, device, or any initial GPU
    /// resource creation fails, including unreadable shader files.
    pub fn new(window: &Window, config: RendererConfig) -> RenderResult<Self> {
        let extensions = window.required_surface_extensions()?;
        let instance = Instance::new(config.enable_validation, &extensions)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let gpu = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &gpu)?;

        let uploader = StagingUploader::new(device.clone())?;
        let targets = RenderTargets::new(
            &instance,
            device.clone(),
            &surface,
            window.extent(),
            &config.vertex_shader_path,
            &config.fragment_shader_path,
            vk::SwapchainKHR::null(),
        )?;
        let frame_manager = FrameManager::new(device.clone(), targets.image_count())?;
        let recorder = CommandRecorder::new(device.clone(), targets.image_count())?;

        let mut camera = Camera::default();
        camera.set_aspect(window.aspect_ratio());

        info!("Renderer initialized");

        Ok(Self {
            submission: DrawSubmission::new(),
            camera,
            overlay: None,
            clear_color: config.clear_color,
            vertex_shader_path: config.vertex_shader_path,
            fragment_shader_path: config.fragment_shader_path,
            recreate_pending: false,
            frames_rendered: 0,
            batches: BatchSet::new(device.clone()),
            assets: GpuAssets::new(device.clone()),
            recorder,
            frame_manager,
            uploader,
            targets,
            device,
            surface,
            instance,
        })
    }

    /// Registers a mesh on the GPU under `id`. Blocks until uploaded.
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate ID or a failed upload.
    pub fn upload_mesh(&mut self, id: MeshId, mesh: &MeshData) -> RenderResult<()> {
        self.assets.upload_mesh(id, mesh, &self.uploader)
    }

    /// Registers a texture on the GPU under `id`, with a full mip chain.
    /// Blocks until uploaded.
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate ID, an unblittable format, or a
    /// failed upload.
    pub fn upload_texture(&mut self, id: TextureId, texture: &TextureData) -> RenderResult<()> {
        self.assets
            .upload_texture(self.instance.handle(), id, texture, &self.uploader, &self.targets)
    }

    /// Replaces the active camera. The aspect ratio is overridden to match
    /// the current swapchain extent.
    pub fn set_camera(&mut self, camera: Camera) {
        let extent = self.targets.extent();
        self.camera = camera;
        self.camera
            .set_aspect(extent.width as f32 / extent.height.max(1) as f32);
    }

    /// Returns the current frame's submission for scene code to fill.
    #[inline]
    pub fn submission_mut(&mut self) -> &mut DrawSubmission {
        &mut self.submission
    }

    /// Installs or removes the overlay hook.
    pub fn set_overlay(&mut self, overlay: Option<Box<dyn OverlayDraw>>) {
        self.overlay = overlay;
    }

    /// Returns the number of draw calls the last frame issued.
    #[inline]
    pub fn draw_call_count(&self) -> u32 {
        self.batches.draw_call_count()
    }

    /// Returns the total number of frames presented.
    #[inline]
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Renders and presents one frame from the current submission.
    ///
    /// The submission is consumed; it comes back empty for the next frame
    /// on every path, including frames abandoned to an out-of-date
    /// swapchain or a zero-extent window. A stale submission must never
    /// carry into the next frame: the scene collaborator repopulates every
    /// tick, and surviving records would be drawn twice.
    ///
    /// An abandoned frame is not an error: the call returns `Ok` with
    /// recreation pending, and the next call rebuilds the target group
    /// before drawing.
    ///
    /// # Errors
    ///
    /// Returns an error on any Vulkan failure other than the out-of-date
    /// and suboptimal conditions, which are handled internally.
    pub fn draw_frame(&mut self, window: &mut Window) -> RenderResult<()> {
        let submission = std::mem::take(&mut self.submission);
        let result = self.render_frame(window, &submission);
        // Keeps the per-key allocations for the next frame.
        self.submission = submission;
        self.submission.clear();
        result
    }

    fn render_frame(
        &mut self,
        window: &mut Window,
        submission: &DrawSubmission,
    ) -> RenderResult<()> {
        if window.take_resized() {
            self.recreate_pending = true;
        }
        if self.recreate_pending {
            self.recreate_targets(window)?;
            if self.recreate_pending {
                // Zero-extent window; nothing to draw until it comes back.
                return Ok(());
            }
        }

        self.frame_manager.wait_for_slot()?;

        let (image_index, suboptimal) = match self.frame_manager.acquire(self.targets.swapchain())? {
            AcquireOutcome::Acquired {
                image_index,
                suboptimal,
            } => (image_index, suboptimal),
            AcquireOutcome::OutOfDate => {
                self.recreate_pending = true;
                return Ok(());
            }
        };
        if suboptimal {
            self.recreate_pending = true;
        }

        self.frame_manager.claim_image(image_index)?;

        let ubo = CameraUbo::from_camera(&self.camera);
        self.targets.update_camera_ubo(image_index, &ubo)?;

        self.batches.finalize(submission, &self.uploader)?;

        self.recorder.record(
            image_index,
            &self.targets,
            &self.assets,
            &self.batches,
            self.clear_color,
            self.overlay.as_deref(),
        )?;

        self.frame_manager
            .submit(self.recorder.buffer_handle(image_index))?;

        if self
            .frame_manager
            .present(self.targets.swapchain(), image_index)?
        {
            self.recreate_pending = true;
        }

        self.frame_manager.advance();
        self.frames_rendered += 1;

        Ok(())
    }

    /// Blocks until the GPU has finished all submitted work.
    ///
    /// # Errors
    ///
    /// Returns an error if the device wait fails.
    pub fn wait_for_operations(&self) -> RenderResult<()> {
        self.device.wait_idle()?;
        Ok(())
    }

    /// Rebuilds the target group for the window's current extent.
    ///
    /// Skipped while the framebuffer extent is zero (minimized window); the
    /// recreation stays pending until the window has area again.
    fn recreate_targets(&mut self, window: &Window) -> RenderResult<()> {
        let extent = window.extent();
        if extent.width == 0 || extent.height == 0 {
            debug!("Skipping target rebuild for zero extent");
            return Ok(());
        }

        self.device.wait_idle()?;

        let old_swapchain = self.targets.swapchain().handle();
        self.targets = RenderTargets::new(
            &self.instance,
            self.device.clone(),
            &self.surface,
            extent,
            &self.vertex_shader_path,
            &self.fragment_shader_path,
            old_swapchain,
        )?;

        self.frame_manager.reset_image_table(self.targets.image_count());
        self.recorder.resize(self.targets.image_count())?;
        self.assets.rebuild_descriptor_sets(&self.targets)?;
        self.camera.set_aspect(window.aspect_ratio());

        self.recreate_pending = false;
        info!(
            "Target group rebuilt: {}x{}",
            extent.width, extent.height
        );
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            warn!("Device wait failed during renderer teardown: {}", e);
        }
        info!("Renderer shut down after {} frame(s)", self.frames_rendered);
    }
}
