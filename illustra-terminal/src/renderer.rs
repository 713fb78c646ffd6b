//! ASCII rasterizer for terminal rendering

use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use illustra_core::primitive::{CurveVertex, PointVertex, SurfaceVertex};
use illustra_core::{
    Backend, Camera, CullFace, DrawableEntity, GeometryPrimitive, RenderError, RenderResult,
};
use nalgebra::{Matrix4, Point3};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Character drawn where a surface meets one of its open edges
const OUTLINE_CHAR: char = '&';

/// Nominal pixel size of one terminal cell, for point radii
const PIXELS_PER_CELL: f32 = 8.0;

/// Lines are pulled this far towards the viewer so they win over the surface
/// they outline
const LINE_DEPTH_BIAS: f32 = 1e-3;

/// A projected corner: screen x, screen y, NDC depth
type ScreenPoint = (f32, f32, f32);

/// ASCII renderer that rasterizes drawable entities into terminal cells
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    /// Outline thickness in cells
    outline_width: f32,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            outline_width: 0.6,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::White; size],
        }
    }

    pub fn with_outline_width(mut self, cells: f32) -> Self {
        self.outline_width = cells;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Character at a cell, for inspection
    pub fn cell(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    /// Buffer contents as lines of text, without colour
    pub fn text(&self) -> Vec<String> {
        self.char_buffer
            .chunks(self.width.max(1))
            .map(|row| row.iter().collect())
            .collect()
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::White);
    }

    fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height).with_outline_width(self.outline_width);
        }
    }

    fn plot(&mut self, x: i32, y: i32, depth: f32, character: char, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            self.char_buffer[idx] = character;
            self.color_buffer[idx] = color;
        }
    }

    fn project(camera: &Camera, mvp: &Matrix4<f32>, position: &[f32; 3]) -> Option<ScreenPoint> {
        camera.project_to_screen(&Point3::from(*position), mvp)
    }

    fn render_surface(
        &mut self,
        vertices: &[SurfaceVertex],
        entity: &DrawableEntity,
        camera: &Camera,
    ) {
        for triangle in vertices.chunks_exact(3) {
            self.render_triangle(triangle, entity, camera);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &[SurfaceVertex],
        entity: &DrawableEntity,
        camera: &Camera,
    ) {
        // Project vertices to screen space
        let mut screen_coords = Vec::with_capacity(3);
        for vertex in triangle {
            match Self::project(camera, &entity.mvp, &vertex.position) {
                Some(coords) => screen_coords.push(coords),
                None => return, // Triangle is clipped
            }
        }
        let (v0, v1, v2) = (screen_coords[0], screen_coords[1], screen_coords[2]);

        // Screen y points down, so counter-clockwise triangles have negative area
        let doubled_area = (v1.0 - v0.0) * (v2.1 - v0.1) - (v1.1 - v0.1) * (v2.0 - v0.0);
        let front_facing = doubled_area < 0.0;
        let culled = match entity.cull {
            CullFace::Back => !front_facing,
            CullFace::Front => front_facing,
        };
        if culled || doubled_area == 0.0 {
            return;
        }

        // Shade by the view-space face normal
        let corners: Vec<Point3<f32>> = triangle
            .iter()
            .map(|v| entity.model_view.transform_point(&Point3::from(v.position)))
            .collect();
        let cross = (corners[1] - corners[0]).cross(&(corners[2] - corners[0]));
        let model_area = cross.norm() / 2.0;
        let brightness = if model_area > 0.0 {
            (cross.z / cross.norm()).abs()
        } else {
            0.0
        };
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let character = LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1).max(1)];

        // Cells per model unit, to turn interpolated edge distances into cells
        let scale = if model_area > 0.0 {
            (doubled_area.abs() / 2.0 / model_area).sqrt()
        } else {
            0.0
        };
        let distances = [
            triangle[0].edge_distances,
            triangle[1].edge_distances,
            triangle[2].edge_distances,
        ];
        let color = to_terminal_color(&triangle[0].color);
        let outline_width = self.outline_width;

        self.rasterize_triangle(&screen_coords, |weights| {
            let nearest = nearest_open_edge(&distances, weights) * scale;
            if nearest < outline_width {
                (OUTLINE_CHAR, Color::White)
            } else {
                (character, color)
            }
        });
    }

    fn rasterize_triangle<F>(&mut self, coords: &[ScreenPoint], shade: F)
    where
        F: Fn([f32; 3]) -> (char, Color),
    {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                        let (character, color) = shade([w0, w1, w2]);
                        self.plot(x, y, depth, character, color);
                    }
                }
            }
        }
    }

    fn render_curve(&mut self, vertices: &[CurveVertex], entity: &DrawableEntity, camera: &Camera) {
        for segment in vertices.chunks_exact(2) {
            let start = Self::project(camera, &entity.mvp, &segment[0].position);
            let end = Self::project(camera, &entity.mvp, &segment[1].position);
            if let (Some(a), Some(b)) = (start, end) {
                let faint = segment[0].color[3] < 0.5;
                let color = to_terminal_color(&segment[0].color);
                self.draw_line(a, b, faint, color);
            }
        }
    }

    /// DDA line between two projected points
    fn draw_line(&mut self, a: ScreenPoint, b: ScreenPoint, faint: bool, color: Color) {
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let character = if faint {
            '.'
        } else if dx.abs() > 2.0 * dy.abs() {
            '-'
        } else if dy.abs() > 2.0 * dx.abs() {
            '|'
        } else if (dx > 0.0) == (dy > 0.0) {
            '\\'
        } else {
            '/'
        };

        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (a.0 + dx * t).floor() as i32;
            let y = (a.1 + dy * t).floor() as i32;
            let depth = a.2 + (b.2 - a.2) * t - LINE_DEPTH_BIAS;
            self.plot(x, y, depth, character, color);
        }
    }

    fn render_points(
        &mut self,
        vertices: &[PointVertex],
        entity: &DrawableEntity,
        camera: &Camera,
    ) {
        for vertex in vertices {
            let Some((x, y, depth)) = Self::project(camera, &entity.mvp, &vertex.position) else {
                continue;
            };
            let color = to_terminal_color(&vertex.color);
            let cells = (vertex.radius / PIXELS_PER_CELL).max(0.5);
            let reach = cells.ceil() as i32;
            let (cx, cy) = (x.floor() as i32, y.floor() as i32);
            for oy in -reach..=reach {
                for ox in -reach..=reach {
                    if ((ox * ox + oy * oy) as f32).sqrt() <= cells {
                        self.plot(cx + ox, cy + oy, depth - LINE_DEPTH_BIAS, 'o', color);
                    }
                }
            }
        }
    }

    /// Write the buffer to the terminal
    pub fn present<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                writer.queue(SetForegroundColor(self.color_buffer[idx]))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Backend for AsciiRenderer {
    type Output = ();

    fn draw(&mut self, camera: &Camera, entities: &[DrawableEntity]) -> RenderResult<()> {
        if camera.screen_width == 0 || camera.screen_height == 0 {
            return Err(RenderError::ContextUnavailable(
                "terminal has no cells".to_string(),
            ));
        }
        self.resize(camera.screen_width as usize, camera.screen_height as usize);
        self.clear();

        for entity in entities {
            match entity.primitive.as_ref() {
                GeometryPrimitive::Surface { vertices, .. } => {
                    self.render_surface(vertices, entity, camera)
                }
                GeometryPrimitive::Curve { vertices, .. } => {
                    self.render_curve(vertices, entity, camera)
                }
                GeometryPrimitive::Points { vertices, .. } => {
                    self.render_points(vertices, entity, camera)
                }
            }
        }
        Ok(())
    }

    fn fallback(&mut self, error: &RenderError) {
        self.clear();
        if self.width == 0 || self.height == 0 {
            return;
        }
        let message = format!("render failed: {error}");
        let row = self.height / 2;
        for (x, c) in message.chars().take(self.width).enumerate() {
            let idx = row * self.width + x;
            self.char_buffer[idx] = c;
            self.color_buffer[idx] = Color::Red;
        }
    }
}

/// Interpolated distance to the nearest open edge; slots whose edge is closed
/// hold infinity at every corner and are skipped
fn nearest_open_edge(distances: &[[f32; 3]; 3], weights: [f32; 3]) -> f32 {
    (0..3)
        .filter(|&slot| distances.iter().all(|d| d[slot].is_finite()))
        .map(|slot| (0..3).map(|corner| weights[corner] * distances[corner][slot]).sum::<f32>())
        .fold(f32::INFINITY, f32::min)
}

/// Terminal color for an RGBA vertex color, blended over black
fn to_terminal_color(rgba: &[f32; 4]) -> Color {
    let channel = |c: f32| (c * rgba[3] * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::Rgb {
        r: channel(rgba[0]),
        g: channel(rgba[1]),
        b: channel(rgba[2]),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
