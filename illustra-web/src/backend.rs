//! WebGL2 implementation of the core [`Backend`].
//!
//! Each primitive is uploaded once into its own buffer and vertex array,
//! keyed by [`MeshId`], and redrawn from there for every placement of it.

use hashbrown::HashMap;
use illustra_core::{
    Backend, Camera, CullFace, DrawableEntity, GeometryPrimitive, MeshId, RenderError,
    RenderResult,
};
use log::{debug, error, warn};
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::shaders::{self, VertexLayout, CURVE_LAYOUT, POINT_LAYOUT, SURFACE_LAYOUT};
use crate::WebConfig;

/// A linked program with the uniforms it uses
struct Program {
    program: WebGlProgram,
    mvp: Option<WebGlUniformLocation>,
    model_view: Option<WebGlUniformLocation>,
    line_width: Option<WebGlUniformLocation>,
    outline_color: Option<WebGlUniformLocation>,
    pixel_ratio: Option<WebGlUniformLocation>,
}

impl Program {
    fn new(gl: &Gl, vertex: &str, fragment: &str) -> RenderResult<Self> {
        let program = shaders::link_program(gl, vertex, fragment)?;
        let uniform = |name: &str| gl.get_uniform_location(&program, name);
        Ok(Self {
            mvp: uniform("u_mvp"),
            model_view: uniform("u_model_view"),
            line_width: uniform("u_line_width"),
            outline_color: uniform("u_outline_color"),
            pixel_ratio: uniform("u_pixel_ratio"),
            program,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Surface,
    Curve,
    Points,
}

impl Kind {
    fn of(primitive: &GeometryPrimitive) -> Self {
        match primitive {
            GeometryPrimitive::Surface { .. } => Kind::Surface,
            GeometryPrimitive::Curve { .. } => Kind::Curve,
            GeometryPrimitive::Points { .. } => Kind::Points,
        }
    }

    fn layout(self) -> &'static VertexLayout {
        match self {
            Kind::Surface => &SURFACE_LAYOUT,
            Kind::Curve => &CURVE_LAYOUT,
            Kind::Points => &POINT_LAYOUT,
        }
    }

    fn mode(self) -> u32 {
        match self {
            Kind::Surface => Gl::TRIANGLES,
            Kind::Curve => Gl::LINES,
            Kind::Points => Gl::POINTS,
        }
    }
}

/// Uploaded vertex data of one primitive
struct GpuMesh {
    kind: Kind,
    buffer: WebGlBuffer,
    vao: WebGlVertexArrayObject,
    count: i32,
}

fn exhausted(what: &str) -> RenderError {
    RenderError::ResourceExhausted {
        what: what.to_string(),
    }
}

pub struct WebGlBackend {
    canvas: HtmlCanvasElement,
    gl: Gl,
    config: WebConfig,
    surface: Program,
    curve: Program,
    points: Program,
    meshes: HashMap<MeshId, GpuMesh>,
    /// Message element shown in place of the canvas after a failure
    notice: Option<Element>,
}

impl WebGlBackend {
    /// Acquire a WebGL2 context on `canvas` and compile the three programs
    pub fn new(canvas: HtmlCanvasElement, config: WebConfig) -> RenderResult<Self> {
        let gl = canvas
            .get_context("webgl2")
            .map_err(|e| RenderError::ContextUnavailable(format!("{:?}", e)))?
            .ok_or_else(|| RenderError::ContextUnavailable("webgl2 not supported".to_string()))?
            .dyn_into::<Gl>()
            .map_err(|_| RenderError::ContextUnavailable("unexpected context type".to_string()))?;

        let surface = Program::new(&gl, shaders::SURFACE_VERTEX, shaders::SURFACE_FRAGMENT)?;
        let curve = Program::new(&gl, shaders::CURVE_VERTEX, shaders::CURVE_FRAGMENT)?;
        let points = Program::new(&gl, shaders::POINT_VERTEX, shaders::POINT_FRAGMENT)?;

        gl.enable(Gl::DEPTH_TEST);
        gl.enable(Gl::BLEND);
        gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        gl.front_face(Gl::CCW);

        Ok(Self {
            canvas,
            gl,
            config,
            surface,
            curve,
            points,
            meshes: HashMap::new(),
            notice: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut WebConfig {
        &mut self.config
    }

    /// Number of primitives currently resident on the GPU
    pub fn resident_count(&self) -> usize {
        self.meshes.len()
    }

    /// Release the GPU resources of a primitive that will not be drawn again
    pub fn forget(&mut self, id: MeshId) {
        if let Some(mesh) = self.meshes.remove(&id) {
            self.gl.delete_vertex_array(Some(&mesh.vao));
            self.gl.delete_buffer(Some(&mesh.buffer));
            debug!("Released mesh {}", id.value());
        }
    }

    fn upload(&mut self, primitive: &GeometryPrimitive) -> RenderResult<()> {
        let id = primitive.id();
        if self.meshes.contains_key(&id) {
            return Ok(());
        }

        let gl = &self.gl;
        let kind = Kind::of(primitive);
        let buffer = gl.create_buffer().ok_or_else(|| exhausted("vertex buffer"))?;
        let Some(vao) = gl.create_vertex_array() else {
            gl.delete_buffer(Some(&buffer));
            return Err(exhausted("vertex array"));
        };

        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        gl.buffer_data_with_u8_array(Gl::ARRAY_BUFFER, primitive.vertex_bytes(), Gl::STATIC_DRAW);

        let layout = kind.layout();
        for attribute in layout.attributes {
            gl.enable_vertex_attrib_array(attribute.location);
            gl.vertex_attrib_pointer_with_i32(
                attribute.location,
                attribute.size,
                Gl::FLOAT,
                false,
                layout.stride,
                attribute.offset,
            );
        }
        gl.bind_vertex_array(None);

        if gl.get_error() == Gl::OUT_OF_MEMORY {
            gl.delete_vertex_array(Some(&vao));
            gl.delete_buffer(Some(&buffer));
            return Err(exhausted("GPU memory for vertex data"));
        }

        debug!(
            "Uploaded mesh {}: {} vertices",
            id.value(),
            primitive.vertex_count()
        );
        self.meshes.insert(
            id,
            GpuMesh {
                kind,
                buffer,
                vao,
                count: primitive.vertex_count() as i32,
            },
        );
        Ok(())
    }

    fn draw_entity(&self, entity: &DrawableEntity) {
        let Some(mesh) = self.meshes.get(&entity.primitive.id()) else {
            return;
        };
        let gl = &self.gl;
        let program = match mesh.kind {
            Kind::Surface => &self.surface,
            Kind::Curve => &self.curve,
            Kind::Points => &self.points,
        };
        gl.use_program(Some(&program.program));

        gl.uniform_matrix4fv_with_f32_array(program.mvp.as_ref(), false, entity.mvp.as_slice());
        match mesh.kind {
            Kind::Surface => {
                gl.uniform_matrix4fv_with_f32_array(
                    program.model_view.as_ref(),
                    false,
                    entity.model_view.as_slice(),
                );
                gl.uniform1f(program.line_width.as_ref(), self.config.line_width);
                gl.uniform4fv_with_f32_array(
                    program.outline_color.as_ref(),
                    &self.config.outline_color.to_array(),
                );
                gl.enable(Gl::CULL_FACE);
                gl.cull_face(match entity.cull {
                    CullFace::Back => Gl::BACK,
                    CullFace::Front => Gl::FRONT,
                });
            }
            Kind::Curve | Kind::Points => {
                gl.uniform1f(program.pixel_ratio.as_ref(), self.config.pixel_ratio);
                gl.disable(Gl::CULL_FACE);
            }
        }

        gl.bind_vertex_array(Some(&mesh.vao));
        gl.draw_arrays(mesh.kind.mode(), 0, mesh.count);
        gl.bind_vertex_array(None);
    }

    fn clear_notice(&mut self) {
        if let Some(notice) = self.notice.take() {
            notice.remove();
            if let Err(e) = self.canvas.remove_attribute("hidden") {
                warn!("Could not unhide canvas: {:?}", e);
            }
        }
    }

    fn show_notice(&mut self, message: &str) -> Option<()> {
        if self.notice.is_none() {
            let document = self.canvas.owner_document()?;
            let notice = document.create_element("pre").ok()?;
            notice.set_attribute("class", "illustra-error").ok()?;
            self.canvas
                .insert_adjacent_element("afterend", &notice)
                .ok()?;
            self.notice = Some(notice);
        }
        let notice = self.notice.as_ref()?;
        notice.set_text_content(Some(message));
        self.canvas.set_attribute("hidden", "").ok()
    }
}

impl Backend for WebGlBackend {
    type Output = ();

    fn draw(&mut self, camera: &Camera, entities: &[DrawableEntity]) -> RenderResult<()> {
        if self.gl.is_context_lost() {
            return Err(RenderError::ContextUnavailable("context lost".to_string()));
        }
        for entity in entities {
            self.upload(&entity.primitive)?;
        }
        self.clear_notice();

        let gl = &self.gl;
        gl.viewport(0, 0, camera.screen_width as i32, camera.screen_height as i32);
        let [r, g, b, a] = self.config.clear_color.to_array();
        gl.clear_color(r, g, b, a);
        gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);

        for entity in entities {
            self.draw_entity(entity);
        }

        match self.gl.get_error() {
            Gl::NO_ERROR => Ok(()),
            Gl::OUT_OF_MEMORY => Err(exhausted("GPU memory")),
            code => Err(RenderError::Backend(format!("WebGL error 0x{:04x}", code))),
        }
    }

    fn fallback(&mut self, error: &RenderError) {
        let message = format!("Unable to draw this view: {error}");
        if self.show_notice(&message).is_none() {
            error!("Could not display render failure on the page: {message}");
        }
    }
}
