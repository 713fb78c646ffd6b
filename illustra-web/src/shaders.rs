//! GLSL ES 3.00 programs and their vertex layouts.
//!
//! Attribute locations are fixed in the shader source so the layouts below
//! can be bound without querying the linked program.

use illustra_core::primitive::{CurveVertex, PointVertex, SurfaceVertex};
use illustra_core::{RenderError, RenderResult};
use std::mem::size_of;
use web_sys::{WebGl2RenderingContext as Gl, WebGlProgram, WebGlShader};

pub const SURFACE_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_edge_distances;
layout(location = 2) in vec4 a_color;

uniform mat4 u_mvp;
uniform mat4 u_model_view;

out vec3 v_view_position;
out vec3 v_edge_distances;
out vec4 v_color;

void main() {
    v_view_position = (u_model_view * vec4(a_position, 1.0)).xyz;
    // Closed edges carry +inf; keep the interpolation finite
    v_edge_distances = min(a_edge_distances, vec3(1.0e6));
    v_color = a_color;
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

pub const SURFACE_FRAGMENT: &str = r#"#version 300 es
precision highp float;

uniform float u_line_width;
uniform vec4 u_outline_color;

in vec3 v_view_position;
in vec3 v_edge_distances;
in vec4 v_color;

out vec4 frag_color;

void main() {
    vec3 normal = normalize(cross(dFdx(v_view_position), dFdy(v_view_position)));
    float light = 0.35 + 0.65 * abs(normal.z);
    vec4 shaded = vec4(v_color.rgb * light, v_color.a);

    // Distance to the nearest open edge, in pixels
    vec3 pixels = v_edge_distances / max(fwidth(v_edge_distances), vec3(1.0e-6));
    float nearest = min(min(pixels.x, pixels.y), pixels.z);
    float outline = 1.0 - smoothstep(u_line_width - 1.0, u_line_width, nearest);

    frag_color = mix(shaded, u_outline_color, outline);
}
"#;

pub const CURVE_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 2) in vec4 a_color;

uniform mat4 u_mvp;

out vec4 v_color;

void main() {
    v_color = a_color;
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

pub const CURVE_FRAGMENT: &str = r#"#version 300 es
precision mediump float;

in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;

pub const POINT_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec3 a_position;
layout(location = 2) in vec4 a_color;
layout(location = 3) in float a_radius;

uniform mat4 u_mvp;
uniform float u_pixel_ratio;

out vec4 v_color;

void main() {
    v_color = a_color;
    gl_PointSize = 2.0 * a_radius * u_pixel_ratio;
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

pub const POINT_FRAGMENT: &str = r#"#version 300 es
precision mediump float;

in vec4 v_color;
out vec4 frag_color;

void main() {
    vec2 offset = gl_PointCoord * 2.0 - 1.0;
    float r = dot(offset, offset);
    if (r > 1.0) {
        discard;
    }
    float edge = 1.0 - smoothstep(0.8, 1.0, r);
    frag_color = vec4(v_color.rgb, v_color.a * edge);
}
"#;

/// One float attribute inside an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attribute {
    pub location: u32,
    /// Component count
    pub size: i32,
    /// Byte offset into the vertex
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexLayout {
    pub stride: i32,
    pub attributes: &'static [Attribute],
}

pub const SURFACE_LAYOUT: VertexLayout = VertexLayout {
    stride: size_of::<SurfaceVertex>() as i32,
    attributes: &[
        Attribute { location: 0, size: 3, offset: 0 },
        Attribute { location: 1, size: 3, offset: 12 },
        Attribute { location: 2, size: 4, offset: 24 },
    ],
};

pub const CURVE_LAYOUT: VertexLayout = VertexLayout {
    stride: size_of::<CurveVertex>() as i32,
    attributes: &[
        Attribute { location: 0, size: 3, offset: 0 },
        Attribute { location: 2, size: 4, offset: 12 },
    ],
};

pub const POINT_LAYOUT: VertexLayout = VertexLayout {
    stride: size_of::<PointVertex>() as i32,
    attributes: &[
        Attribute { location: 0, size: 3, offset: 0 },
        Attribute { location: 2, size: 4, offset: 12 },
        Attribute { location: 3, size: 1, offset: 28 },
    ],
};

fn compile_shader(gl: &Gl, kind: u32, source: &str) -> RenderResult<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| RenderError::ResourceExhausted {
            what: "shader object".to_string(),
        })?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let compiled = gl
        .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if compiled {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(RenderError::ShaderCompilation(log))
    }
}

/// Compile and link a vertex/fragment pair
pub fn link_program(gl: &Gl, vertex: &str, fragment: &str) -> RenderResult<WebGlProgram> {
    let vertex = compile_shader(gl, Gl::VERTEX_SHADER, vertex)?;
    let fragment = compile_shader(gl, Gl::FRAGMENT_SHADER, fragment)?;

    let program = gl
        .create_program()
        .ok_or_else(|| RenderError::ResourceExhausted {
            what: "program object".to_string(),
        })?;
    gl.attach_shader(&program, &vertex);
    gl.attach_shader(&program, &fragment);
    gl.link_program(&program);

    // Shaders are owned by the program once linked
    gl.delete_shader(Some(&vertex));
    gl.delete_shader(Some(&fragment));

    let linked = gl
        .get_program_parameter(&program, Gl::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if linked {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(RenderError::ShaderCompilation(log))
    }
}
