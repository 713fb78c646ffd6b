//! Scene traversal and the rasterization backend seam.
//!
//! [`collect`] flattens a scene tree against a camera into drawable entities in
//! pre-order. [`Renderer`] hands them to a [`Backend`] and turns any backend
//! failure into the backend's visible fallback output.

use std::sync::Arc;

use log::{debug, error};
use nalgebra::Matrix4;

use crate::camera::Camera;
use crate::error::{RenderError, RenderResult};
use crate::frame::Frame;
use crate::primitive::GeometryPrimitive;
use crate::scene::SceneNode;

/// Which triangle faces the backend discards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullFace {
    /// Normal winding: drop faces turned away from the camera
    Back,
    /// Mirrored winding: counter-clockwise faces now point away
    Front,
}

impl CullFace {
    pub fn from_parity(mirrored: bool) -> Self {
        if mirrored {
            CullFace::Front
        } else {
            CullFace::Back
        }
    }
}

/// A primitive with its transforms resolved, ready for submission
#[derive(Debug, Clone)]
pub struct DrawableEntity {
    pub primitive: Arc<GeometryPrimitive>,
    /// Model-to-camera transform
    pub model_view: Matrix4<f32>,
    /// Model-to-clip transform
    pub mvp: Matrix4<f32>,
    pub cull: CullFace,
}

/// Flatten `node` into entities, one per primitive leaf, in pre-order.
///
/// No depth sorting is done; backends rely on a depth buffer.
pub fn collect(camera: &Camera, node: &SceneNode) -> Vec<DrawableEntity> {
    let view = camera.view_matrix();
    let projection = camera.projection_matrix();
    let mut entities = Vec::new();
    collect_into(node, &Frame::identity(), false, &view, &projection, &mut entities);
    entities
}

fn collect_into(
    node: &SceneNode,
    frame: &Frame,
    mirrored: bool,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
    out: &mut Vec<DrawableEntity>,
) {
    match node {
        SceneNode::Empty => {}
        SceneNode::Primitive(primitive) => {
            let model_view = view * frame.to_matrix();
            out.push(DrawableEntity {
                primitive: Arc::clone(primitive),
                model_view,
                mvp: projection * model_view,
                cull: CullFace::from_parity(mirrored),
            });
        }
        SceneNode::Placed(placed) => collect_into(
            &placed.child,
            &frame.compose(&placed.frame),
            mirrored ^ placed.mirrored,
            view,
            projection,
            out,
        ),
        SceneNode::Group(children) => {
            for child in children.iter() {
                collect_into(child, frame, mirrored, view, projection, out);
            }
        }
    }
}

/// A rasterizer that can draw a frame's worth of entities
pub trait Backend {
    /// What one render call produces (an image, a text buffer, nothing)
    type Output;

    /// Draw `entities`, uploading any primitive not seen before
    fn draw(&mut self, camera: &Camera, entities: &[DrawableEntity]) -> RenderResult<Self::Output>;

    /// Visible placeholder output after `draw` failed
    fn fallback(&mut self, error: &RenderError) -> Self::Output;
}

/// Drives a backend: collect, draw, fall back on failure
pub struct Renderer<B> {
    backend: B,
}

impl<B: Backend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Render `scene` as seen by `camera`.
    ///
    /// Backend failures are logged and replaced by the backend's fallback.
    pub fn render(&mut self, camera: &Camera, scene: &SceneNode) -> B::Output {
        let entities = collect(camera, scene);
        debug!("Collected {} drawable entities", entities.len());
        match self.backend.draw(camera, &entities) {
            Ok(output) => output,
            Err(err) => {
                error!("Render failed: {err}");
                self.backend.fallback(&err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::frame::{Axis, Plane};
    use crate::primitive::{self, MeshId};
    use crate::scene::group;
    use crate::shapes;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Point3, Vector3};

    fn cube() -> SceneNode {
        let mesh = shapes::cube(1.0);
        primitive::indexed_triangles(Color::WHITE, &mesh.points, &mesh.faces)
    }

    fn dot() -> SceneNode {
        primitive::points(2.0, Color::BLACK, &[Point3::origin()])
    }

    fn ids(entities: &[DrawableEntity]) -> Vec<MeshId> {
        entities.iter().map(|e| e.primitive.id()).collect()
    }

    #[derive(Default)]
    struct RecordingBackend {
        frames: Vec<Vec<MeshId>>,
    }

    impl Backend for RecordingBackend {
        type Output = usize;

        fn draw(&mut self, _camera: &Camera, entities: &[DrawableEntity]) -> RenderResult<usize> {
            self.frames.push(ids(entities));
            Ok(entities.len())
        }

        fn fallback(&mut self, _error: &RenderError) -> usize {
            0
        }
    }

    struct ExhaustedBackend;

    impl Backend for ExhaustedBackend {
        type Output = String;

        fn draw(&mut self, _camera: &Camera, _entities: &[DrawableEntity]) -> RenderResult<String> {
            Err(RenderError::ResourceExhausted {
                what: "vertex buffer".to_string(),
            })
        }

        fn fallback(&mut self, error: &RenderError) -> String {
            format!("[render failed: {error}]")
        }
    }

    #[test]
    fn test_empty_emits_nothing() {
        let camera = Camera::default();
        assert!(collect(&camera, &SceneNode::Empty).is_empty());
        assert!(collect(&camera, &group([SceneNode::Empty, SceneNode::Empty])).is_empty());
    }

    #[test]
    fn test_group_order_is_concatenation() {
        let camera = Camera::default();
        let a = group([cube(), dot().translate_by(&Vector3::x())]);
        let b = cube().rotate_around(&Axis::y(), 0.5);

        let together = collect(&camera, &group([a.clone(), b.clone()]));
        let mut separate = collect(&camera, &a);
        separate.extend(collect(&camera, &b));

        assert_eq!(ids(&together), ids(&separate));
        for (x, y) in together.iter().zip(&separate) {
            assert_eq!(x.mvp, y.mvp);
            assert_eq!(x.cull, y.cull);
        }
    }

    #[test]
    fn test_siblings_share_parent_state() {
        let camera = Camera::default();
        let scene = group([cube().mirror_across(&Plane::yz()), cube()]).translate_by(&Vector3::z());
        let entities = collect(&camera, &scene);
        assert_eq!(entities[0].cull, CullFace::Front);
        assert_eq!(entities[1].cull, CullFace::Back);
        let mirror = Frame::identity().mirrored_across(&Plane::yz()).to_matrix();
        assert_relative_eq!(entities[0].mvp, entities[1].mvp * mirror, epsilon = 1e-5);
    }

    #[test]
    fn test_two_mirrors_cancel() {
        let camera = Camera::default();
        let node = cube()
            .mirror_across(&Plane::yz())
            .mirror_across(&Plane::new(Point3::new(0.0, 1.0, 0.0), Vector3::y()));
        let entities = collect(&camera, &node);
        assert_eq!(entities[0].cull, CullFace::Back);
    }

    #[test]
    fn test_mirrors_across_levels_cancel() {
        let camera = Camera::default();
        let inner = group([cube().mirror_across(&Plane::xy())]);
        let outer = group([inner.mirror_across(&Plane::xz())]);
        assert_eq!(collect(&camera, &outer)[0].cull, CullFace::Back);

        let odd = group([outer.mirror_across(&Plane::yz())]);
        assert_eq!(collect(&camera, &odd)[0].cull, CullFace::Front);
    }

    #[test]
    fn test_parity_matches_transform_handedness() {
        let camera = Camera::default();
        let left = Frame::identity().mirrored_across(&Plane::xy());
        let scene = group([
            cube(),
            cube().place_in(&left),
            group([cube().mirror_across(&Plane::yz())]).relative_to(&left),
            group([cube().rotate_around(&Axis::z(), 2.0)]).mirror_across(&Plane::xz()),
        ]);
        for entity in collect(&camera, &scene) {
            let linear: Matrix3<f32> = entity.model_view.fixed_view::<3, 3>(0, 0).into_owned();
            let det = linear.determinant();
            assert_eq!(det < 0.0, entity.cull == CullFace::Front);
        }
    }

    #[test]
    fn test_renderer_passes_entities_to_backend() {
        let mut renderer = Renderer::new(RecordingBackend::default());
        let shared = cube();
        let scene = group([shared.clone(), shared.translate_by(&Vector3::y()), dot()]);
        assert_eq!(renderer.render(&Camera::default(), &scene), 3);
        assert_eq!(renderer.render(&Camera::default(), &SceneNode::Empty), 0);

        let frames = &renderer.backend().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][0], frames[0][1]);
        assert_ne!(frames[0][0], frames[0][2]);
    }

    #[test]
    fn test_renderer_falls_back_on_failure() {
        let mut renderer = Renderer::new(ExhaustedBackend);
        let output = renderer.render(&Camera::default(), &cube());
        assert!(output.starts_with("[render failed"));
        assert!(output.contains("vertex buffer"));
    }
}
