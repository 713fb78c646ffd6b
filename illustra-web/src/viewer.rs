use illustra_core::shapes::IndexedMesh;
use illustra_core::{
    group, primitive, Axis, BoundingBox, Camera, Frame, MeshId, Plane, Renderer, SceneNode,
};
use nalgebra::{Point3, Vector3};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::backend::WebGlBackend;
use crate::WebConfig;

fn js_error(message: impl AsRef<str>) -> JsValue {
    js_sys::Error::new(message.as_ref()).into()
}

/// Build an indexed mesh from flat `[x, y, z, ...]` and `[a, b, c, ...]` arrays
pub fn mesh_from_arrays(points: &[f32], faces: &[u32]) -> Result<IndexedMesh, String> {
    if points.len() % 3 != 0 {
        return Err(format!("point array length {} is not a multiple of 3", points.len()));
    }
    if faces.len() % 3 != 0 {
        return Err(format!("face array length {} is not a multiple of 3", faces.len()));
    }
    Ok(IndexedMesh {
        points: points
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect(),
        faces: faces.chunks_exact(3).map(|f| [f[0], f[1], f[2]]).collect(),
    })
}

fn mesh_id(node: &SceneNode) -> Option<MeshId> {
    match node {
        SceneNode::Primitive(primitive) => Some(primitive.id()),
        _ => None,
    }
}

struct Model {
    surface: SceneNode,
    bounds: BoundingBox,
}

impl Model {
    fn mirror_plane(&self) -> Plane {
        let gap = 0.25 * self.bounds.diagonal().x.max(1e-3);
        Plane::new(Point3::new(self.bounds.max.x + gap, 0.0, 0.0), Vector3::x())
    }

    /// Room for the model and its mirror image under any rotation
    fn view_bounds(&self) -> BoundingBox {
        let center = self.bounds.center();
        let reach = Vector3::repeat(self.bounds.diagonal().norm() / 2.0);
        let own = BoundingBox::new(center - reach, center + reach);
        own.union(&own.transformed(&Frame::identity().mirrored_across(&self.mirror_plane())))
    }

    fn scene(&self, rotation: &Vector3<f32>, mirrored: bool) -> SceneNode {
        let pivot = self.bounds.center();
        let posed = self
            .surface
            .rotate_around(&Axis::new(pivot, Vector3::x()), rotation.x)
            .rotate_around(&Axis::new(pivot, Vector3::y()), rotation.y)
            .rotate_around(&Axis::new(pivot, Vector3::z()), rotation.z);
        if mirrored {
            let image = posed.mirror_across(&self.mirror_plane());
            group([posed, image])
        } else {
            posed
        }
    }
}

/// Browser-facing viewer for one mesh and, optionally, its mirror image
#[wasm_bindgen]
pub struct WebViewer {
    renderer: Renderer<WebGlBackend>,
    camera: Camera,
    model: Option<Model>,
    rotation: Vector3<f32>,
    mirrored: bool,
}

#[wasm_bindgen]
impl WebViewer {
    /// Attach to the `<canvas>` with the given element id
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebViewer, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| js_error("no document available"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| js_error(format!("no element with id '{canvas_id}'")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error(format!("element '{canvas_id}' is not a canvas")))?;

        let camera = Camera::new(canvas.width(), canvas.height());
        let backend =
            WebGlBackend::new(canvas, WebConfig::default()).map_err(|e| js_error(e.to_string()))?;
        log::info!("Viewer attached to #{canvas_id}");

        Ok(WebViewer {
            renderer: Renderer::new(backend),
            camera,
            model: None,
            rotation: Vector3::zeros(),
            mirrored: false,
        })
    }

    /// Replace the displayed mesh; `points` is xyz triples, `faces` index triples
    #[wasm_bindgen(js_name = loadMesh)]
    pub fn load_mesh(&mut self, points: &[f32], faces: &[u32]) -> Result<(), JsValue> {
        let mesh = mesh_from_arrays(points, faces).map_err(js_error)?;
        let color = self.renderer.backend().config().surface_color;
        let surface = primitive::indexed_triangles(color, &mesh.points, &mesh.faces);

        if let Some(id) = self.model.take().and_then(|old| mesh_id(&old.surface)) {
            self.renderer.backend_mut().forget(id);
        }

        let Some(bounds) = surface.bounds() else {
            log::warn!("Mesh has no drawable faces");
            return Ok(());
        };
        let model = Model { surface, bounds };
        let canvas = self.renderer.backend().canvas();
        self.camera = Camera::framing(&model.view_bounds(), canvas.width(), canvas.height());
        self.rotation = Vector3::zeros();
        self.model = Some(model);
        Ok(())
    }

    /// Add to the rotation about the model's x, y and z axes, in radians
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.rotation += Vector3::new(dx, dy, dz);
    }

    /// Show or hide the mirrored copy
    #[wasm_bindgen(js_name = setMirrored)]
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    /// Outline width of open edges, in pixels
    #[wasm_bindgen(js_name = setLineWidth)]
    pub fn set_line_width(&mut self, pixels: f32) {
        self.renderer.backend_mut().config_mut().line_width = pixels.max(0.0);
    }

    /// Draw one frame; failures replace the canvas with a message
    pub fn render(&mut self) {
        let canvas = self.renderer.backend().canvas();
        self.camera.screen_width = canvas.width().max(1);
        self.camera.screen_height = canvas.height().max(1);

        let scene = match &self.model {
            Some(model) => model.scene(&self.rotation, self.mirrored),
            None => SceneNode::Empty,
        };
        self.renderer.render(&self.camera, &scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use illustra_core::{shapes, Color};

    fn cube_model() -> Model {
        let mesh = shapes::cube(2.0);
        let surface = primitive::indexed_triangles(Color::WHITE, &mesh.points, &mesh.faces);
        let bounds = surface.bounds().unwrap();
        Model { surface, bounds }
    }

    #[test]
    fn test_mesh_from_arrays() {
        let mesh = mesh_from_arrays(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0],
            &[0, 1, 2],
        )
        .unwrap();
        assert_eq!(mesh.points.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_mesh_from_ragged_arrays_is_rejected() {
        assert!(mesh_from_arrays(&[0.0, 1.0], &[]).is_err());
        assert!(mesh_from_arrays(&[0.0; 9], &[0, 1]).is_err());
    }

    #[test]
    fn test_mirrored_scene_draws_twice_with_opposite_cull() {
        let model = cube_model();
        let camera = Camera::framing(&model.view_bounds(), 640, 480);
        let scene = model.scene(&Vector3::new(0.3, 0.2, 0.0), true);
        let entities = illustra_core::collect(&camera, &scene);
        assert_eq!(entities.len(), 2);
        assert_ne!(entities[0].cull, entities[1].cull);
        assert_eq!(entities[0].primitive.id(), entities[1].primitive.id());
    }

    #[test]
    fn test_unmirrored_scene_keeps_bounds_under_zero_rotation() {
        let model = cube_model();
        let scene = model.scene(&Vector3::zeros(), false);
        let bounds = scene.bounds().unwrap();
        assert_relative_eq!(bounds.min, model.bounds.min, epsilon = 1e-5);
        assert_relative_eq!(bounds.max, model.bounds.max, epsilon = 1e-5);
    }

    #[test]
    fn test_surface_node_has_mesh_id() {
        let model = cube_model();
        assert!(mesh_id(&model.surface).is_some());
        assert!(mesh_id(&SceneNode::Empty).is_none());
    }
}
