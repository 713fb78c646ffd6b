//! Terminal front end: an ASCII rasterization backend and an interactive viewer

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use illustra_core::shapes::IndexedMesh;
use illustra_core::{
    group, primitive, Axis, BoundingBox, Camera, Color as Rgba, Plane, Renderer, SceneNode,
};
use nalgebra::{Point3, Vector3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod error;
pub mod renderer;
pub mod stl;

pub use error::LoadError;
pub use renderer::AsciiRenderer;

/// Viewer settings
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalConfig {
    pub target_fps: u32,
    /// Radians per key press
    pub rotation_step: f32,
    /// Idle rotation per frame around x and y, in radians
    pub spin: (f32, f32),
    /// Outline thickness in cells
    pub outline_threshold: f32,
    pub surface_color: Rgba,
    pub wire_color: Rgba,
    pub bounds_color: Rgba,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            rotation_step: 0.1,
            spin: (0.01, 0.015),
            outline_threshold: 0.6,
            surface_color: Rgba::rgb(0.6, 0.8, 1.0),
            wire_color: Rgba::rgb(1.0, 0.9, 0.3),
            bounds_color: Rgba::rgba(0.5, 0.5, 0.5, 0.6),
        }
    }
}

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Place `node` under this rotation about `pivot`; X first, then Y, then Z
    pub fn apply(&self, node: &SceneNode, pivot: &Point3<f32>) -> SceneNode {
        let axis = |direction: Vector3<f32>| Axis::new(*pivot, direction);
        node.rotate_around(&axis(Vector3::x()), self.x)
            .rotate_around(&axis(Vector3::y()), self.y)
            .rotate_around(&axis(Vector3::z()), self.z)
    }
}

/// The static parts of the viewed scene, built once
struct Model {
    surface: SceneNode,
    wireframe: SceneNode,
    bounds_box: SceneNode,
    bounds: BoundingBox,
}

impl Model {
    fn new(mesh: &IndexedMesh, config: &TerminalConfig) -> Option<Self> {
        let surface = primitive::indexed_triangles(config.surface_color, &mesh.points, &mesh.faces);
        let bounds = surface.bounds()?;
        let wireframe = primitive::wireframe(config.wire_color, &mesh.points, &mesh.faces);
        let corners = bounds.corners();
        let box_edges: Vec<_> = BoundingBox::edge_indices()
            .iter()
            .map(|&(a, b)| (corners[a], corners[b]))
            .collect();
        let bounds_box = primitive::curve(config.bounds_color, &box_edges);
        Some(Self {
            surface,
            wireframe,
            bounds_box,
            bounds,
        })
    }

    /// Plane just past the model's +x side, where its mirror image is reflected
    fn mirror_plane(&self) -> Plane {
        let gap = 0.25 * self.bounds.diagonal().x.max(1e-3);
        Plane::new(
            Point3::new(self.bounds.max.x + gap, 0.0, 0.0),
            Vector3::x(),
        )
    }

    /// Bounds of the model together with its mirror image under any rotation
    fn view_bounds(&self) -> BoundingBox {
        let center = self.bounds.center();
        let radius = self.bounds.diagonal().norm() / 2.0;
        let reach = Vector3::repeat(radius);
        let own = BoundingBox::new(center - reach, center + reach);
        let plane = self.mirror_plane();
        let mirrored = own.transformed(&illustra_core::Frame::identity().mirrored_across(&plane));
        own.union(&mirrored)
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    model: Option<Model>,
    config: TerminalConfig,
    rotation: RotationState,
    camera: Camera,
    renderer: Renderer<AsciiRenderer>,
    show_mirror: bool,
    show_wireframe: bool,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: &IndexedMesh, config: TerminalConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let model = Model::new(mesh, &config);
        if model.is_none() {
            log::warn!("Mesh has no drawable faces; the view will be empty");
        }
        let camera = match &model {
            Some(model) => Camera::framing(&model.view_bounds(), width as u32, height as u32),
            None => Camera::new(width as u32, height as u32),
        };

        Ok(Self {
            model,
            rotation: RotationState::new(0.3, 0.3, 0.0),
            camera,
            renderer: Renderer::new(
                AsciiRenderer::new(width as usize, height as usize)
                    .with_outline_width(config.outline_threshold),
            ),
            config,
            show_mirror: true,
            show_wireframe: false,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let fps = u64::from(self.config.target_fps.max(1));
        let target_frame_time = Duration::from_millis(1000 / fps);

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let step = self.config.rotation_step;
        match event::read()? {
            Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.running = false;
                }
                KeyCode::Char('w') | KeyCode::Up => {
                    self.rotation.rotate(step, 0.0, 0.0);
                }
                KeyCode::Char('s') | KeyCode::Down => {
                    self.rotation.rotate(-step, 0.0, 0.0);
                }
                KeyCode::Char('a') | KeyCode::Left => {
                    self.rotation.rotate(0.0, -step, 0.0);
                }
                KeyCode::Char('d') | KeyCode::Right => {
                    self.rotation.rotate(0.0, step, 0.0);
                }
                KeyCode::Char('e') => {
                    self.rotation.rotate(0.0, 0.0, step);
                }
                KeyCode::Char('r') => {
                    self.rotation.rotate(0.0, 0.0, -step);
                }
                KeyCode::Char('m') => {
                    self.show_mirror = !self.show_mirror;
                }
                KeyCode::Char('f') => {
                    self.show_wireframe = !self.show_wireframe;
                }
                _ => {}
            },
            Event::Resize(width, height) => {
                self.camera.screen_width = u32::from(width).max(1);
                self.camera.screen_height = u32::from(height).max(1);
            }
            _ => {}
        }
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        let (dx, dy) = self.config.spin;
        self.rotation.rotate(dx, dy, 0.0);
    }

    /// A fresh tree for this frame; the meshes themselves are shared
    fn scene(&self) -> SceneNode {
        let Some(model) = &self.model else {
            return SceneNode::Empty;
        };
        let pivot = model.bounds.center();
        let wireframe = if self.show_wireframe {
            model.wireframe.clone()
        } else {
            SceneNode::Empty
        };
        let body = group([model.surface.clone(), wireframe, model.bounds_box.clone()]);
        let posed = self.rotation.apply(&body, &pivot);
        let mirrored = if self.show_mirror {
            posed.mirror_across(&model.mirror_plane())
        } else {
            SceneNode::Empty
        };
        group([posed, mirrored])
    }

    fn render(&mut self) -> io::Result<()> {
        let scene = self.scene();
        self.renderer.render(&self.camera, &scene);

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.backend().present(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "Illustra | FPS: {:.1} | WASD/Arrows=Rotate E/R=Roll M=Mirror F=Wireframe Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
