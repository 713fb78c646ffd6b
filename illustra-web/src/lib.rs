//! Illustra Web - WebGL2 renderer for browsers
//!
//! Draws the same scene trees as the terminal front end, on a `<canvas>`,
//! with anti-aliased outlines on open mesh edges.

use illustra_core::Color;
use wasm_bindgen::prelude::*;

pub mod backend;
pub mod shaders;
pub mod viewer;

pub use backend::WebGlBackend;
pub use viewer::WebViewer;

/// Drawing settings for [`WebGlBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    pub clear_color: Color,
    pub surface_color: Color,
    pub outline_color: Color,
    /// Open-edge outline width in pixels
    pub line_width: f32,
    /// Scale from point radius to device pixels
    pub pixel_ratio: f32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::rgb(0.08, 0.08, 0.1),
            surface_color: Color::rgb(0.6, 0.8, 1.0),
            outline_color: Color::BLACK,
            line_width: 1.5,
            pixel_ratio: 1.0,
        }
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    // Errs only when a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);
}
