//! Demo harness for the glint renderer.
//!
//! Uploads a cube mesh and a checkerboard texture, then draws a grid of
//! spinning cubes with an orbiting camera. Everything is generated
//! procedurally so the demo runs without asset files; only the compiled
//! shaders are loaded from disk.

use anyhow::Result;
use glam::{Mat4, Quat, Vec2, Vec3};
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use glint_assets::{IndexData, MeshData, MeshId, MeshVertex, TextureData, TextureId};
use glint_core::Timer;
use glint_platform::Window;
use glint_renderer::{InstanceRecord, Renderer, RendererConfig};
use glint_scene::Camera;

const CUBE_MESH: MeshId = MeshId(1);
const CHECKER_TEXTURE: TextureId = TextureId(1);

/// Side length of the cube grid.
const GRID_SIZE: i32 = 8;
/// Spacing between cube centers.
const GRID_SPACING: f32 = 2.5;

/// Unit cube with per-face normals and UVs.
fn cube_mesh() -> Result<MeshData> {
    // One quad per face, 24 vertices total so normals stay flat.
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, tangent, bitangent) in faces {
        let base = vertices.len() as u16;
        let center = normal * 0.5;
        let corners = [
            (center - tangent * 0.5 - bitangent * 0.5, Vec2::new(0.0, 0.0)),
            (center + tangent * 0.5 - bitangent * 0.5, Vec2::new(1.0, 0.0)),
            (center + tangent * 0.5 + bitangent * 0.5, Vec2::new(1.0, 1.0)),
            (center - tangent * 0.5 + bitangent * 0.5, Vec2::new(0.0, 1.0)),
        ];
        for (position, uv) in corners {
            vertices.push(MeshVertex::new(position, normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    Ok(MeshData::new(vertices, IndexData::U16(indices))?)
}

/// Two-tone checkerboard, `size` x `size` pixels with 8-pixel cells.
fn checker_texture(size: u32) -> Result<TextureData> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / 8) + (y / 8)) % 2 == 0;
            if light {
                pixels.extend_from_slice(&[220, 220, 220, 255]);
            } else {
                pixels.extend_from_slice(&[60, 70, 90, 255]);
            }
        }
    }
    Ok(TextureData::new(pixels, size, size)?)
}

/// Fills the submission with the spinning cube grid.
fn fill_scene(renderer: &mut Renderer, elapsed: f32) {
    let spin = Quat::from_rotation_y(elapsed * 0.7);
    let instances = renderer.submission_mut().instances_mut(CUBE_MESH, CHECKER_TEXTURE);

    for x in 0..GRID_SIZE {
        for z in 0..GRID_SIZE {
            let offset = (GRID_SIZE - 1) as f32 * GRID_SPACING * 0.5;
            let position = Vec3::new(
                x as f32 * GRID_SPACING - offset,
                ((x + z) as f32 * 0.8 + elapsed).sin() * 0.5,
                z as f32 * GRID_SPACING - offset,
            );
            instances.push(InstanceRecord::new(Mat4::from_rotation_translation(
                spin, position,
            )));
        }
    }
}

/// Camera orbiting the grid center.
fn orbit_camera(elapsed: f32) -> Camera {
    let radius = GRID_SIZE as f32 * GRID_SPACING * 0.9;
    let angle = elapsed * 0.2;

    let mut camera = Camera::new();
    camera.eye = Vec3::new(angle.cos() * radius, radius * 0.5, angle.sin() * radius);
    camera.look_at(Vec3::ZERO);
    camera
}

struct App {
    window: Option<Window>,
    renderer: Option<Renderer>,
    timer: Timer,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            renderer: None,
            timer: Timer::new(),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(event_loop, 1280, 720, "glint")?;

        let config = RendererConfig::new(
            "shaders/mesh.vert.spv",
            "shaders/mesh.frag.spv",
        );
        let mut renderer = Renderer::new(&window, config)?;

        renderer.upload_mesh(CUBE_MESH, &cube_mesh()?)?;
        renderer.upload_texture(CHECKER_TEXTURE, &checker_texture(256)?)?;

        info!("Initialization complete, entering main loop");
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                error!("Initialization failed: {:?}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let _delta = self.timer.delta_secs();
                let elapsed = self.timer.elapsed_secs();

                if let (Some(renderer), Some(window)) =
                    (self.renderer.as_mut(), self.window.as_mut())
                {
                    renderer.set_camera(orbit_camera(elapsed));
                    fill_scene(renderer, elapsed);

                    if let Err(e) = renderer.draw_frame(window) {
                        error!("Render error: {:?}", e);
                        event_loop.exit();
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    glint_core::init_logging();
    info!("Starting glint");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
