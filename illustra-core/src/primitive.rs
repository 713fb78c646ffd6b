//! Immutable drawable primitives and their builders.
//!
//! Builders do all per-mesh work up front: bounds, edge classification and
//! corner annotation happen once here, never per render. Each builder returns
//! a [`SceneNode`], which is [`SceneNode::Empty`] for degenerate input.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use log::{debug, warn};
use nalgebra::Point3;

use crate::annotate::assemble;
use crate::color::Color;
use crate::edges::BoundaryEdgeSet;
use crate::geometry::BoundingBox;
use crate::scene::SceneNode;

/// Alpha multiplier applied to interior edges by [`wireframe`]
pub const INTERIOR_EDGE_ALPHA: f32 = 0.4;

/// Process-unique identity of a primitive's vertex buffer.
///
/// Backends key their uploaded GPU resources on this so each primitive is
/// uploaded once no matter how many times or places it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Surface vertex layout: position, edge distances, color (40 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    pub position: [f32; 3],
    pub edge_distances: [f32; 3],
    pub color: [f32; 4],
}

/// Curve vertex layout: position, color (28 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CurveVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Point vertex layout: position, color, screen-space radius (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub radius: f32,
}

/// A render-ready geometry unit
#[derive(Debug)]
pub enum GeometryPrimitive {
    /// Triangle list, three vertices per face
    Surface {
        id: MeshId,
        vertices: Vec<SurfaceVertex>,
        bounds: BoundingBox,
    },
    /// Line list, two vertices per segment
    Curve {
        id: MeshId,
        vertices: Vec<CurveVertex>,
        bounds: BoundingBox,
    },
    Points {
        id: MeshId,
        vertices: Vec<PointVertex>,
        radius: f32,
        bounds: BoundingBox,
    },
}

impl GeometryPrimitive {
    pub fn id(&self) -> MeshId {
        match self {
            Self::Surface { id, .. } | Self::Curve { id, .. } | Self::Points { id, .. } => *id,
        }
    }

    pub fn bounds(&self) -> &BoundingBox {
        match self {
            Self::Surface { bounds, .. }
            | Self::Curve { bounds, .. }
            | Self::Points { bounds, .. } => bounds,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Surface { vertices, .. } => vertices.len(),
            Self::Curve { vertices, .. } => vertices.len(),
            Self::Points { vertices, .. } => vertices.len(),
        }
    }

    /// Raw vertex buffer contents for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        match self {
            Self::Surface { vertices, .. } => bytemuck::cast_slice(vertices),
            Self::Curve { vertices, .. } => bytemuck::cast_slice(vertices),
            Self::Points { vertices, .. } => bytemuck::cast_slice(vertices),
        }
    }

    pub fn vertex_stride(&self) -> usize {
        match self {
            Self::Surface { .. } => std::mem::size_of::<SurfaceVertex>(),
            Self::Curve { .. } => std::mem::size_of::<CurveVertex>(),
            Self::Points { .. } => std::mem::size_of::<PointVertex>(),
        }
    }
}

fn node(primitive: GeometryPrimitive) -> SceneNode {
    SceneNode::Primitive(Arc::new(primitive))
}

/// Faces whose indices all address an existing point
fn valid_faces(point_count: usize, faces: &[[u32; 3]]) -> Vec<[u32; 3]> {
    let valid: Vec<[u32; 3]> = faces
        .iter()
        .copied()
        .filter(|face| face.iter().all(|&i| (i as usize) < point_count))
        .collect();
    if valid.len() < faces.len() {
        warn!(
            "Skipped {} of {} faces referencing vertices beyond {}",
            faces.len() - valid.len(),
            faces.len(),
            point_count
        );
    }
    valid
}

/// Build an annotated surface from an indexed triangle mesh.
///
/// Faces with out-of-range indices are dropped; the rest still render.
///
/// # Example
///
/// ```
/// use illustra_core::{primitive, shapes, Color};
///
/// let mesh = shapes::square();
/// let node = primitive::indexed_triangles(Color::WHITE, &mesh.points, &mesh.faces);
/// assert_eq!(node.primitive_count(), 1);
///
/// let empty = primitive::indexed_triangles(Color::WHITE, &[], &[]);
/// assert!(empty.is_empty());
/// ```
pub fn indexed_triangles(color: Color, points: &[Point3<f32>], faces: &[[u32; 3]]) -> SceneNode {
    let Some(bounds) = BoundingBox::from_points(points) else {
        return SceneNode::Empty;
    };
    let faces = valid_faces(points.len(), faces);
    if faces.is_empty() {
        return SceneNode::Empty;
    }

    let edges = BoundaryEdgeSet::build(&faces);
    let color = color.to_array();
    let mut vertices = Vec::with_capacity(faces.len() * 3);
    for &face in &faces {
        let corners = face.map(|i| points[i as usize]);
        for corner in assemble(&edges, face, corners) {
            vertices.push(SurfaceVertex {
                position: corner.position.coords.into(),
                edge_distances: corner.edge_distances,
                color,
            });
        }
    }

    debug!(
        "Built surface: {} faces, {} open edges",
        faces.len(),
        edges.open_edge_count()
    );
    node(GeometryPrimitive::Surface {
        id: MeshId::next(),
        vertices,
        bounds,
    })
}

/// Most triangles a soup may hold while its corner indices still fit in `u32`
pub const MAX_SOUP_TRIANGLES: usize = (u32::MAX / 3) as usize;

/// Build a surface from a triangle soup; every triangle stands alone, so all
/// of its edges are outlined.
///
/// Triangles past [`MAX_SOUP_TRIANGLES`] are dropped with a warning.
pub fn triangles(color: Color, soup: &[[Point3<f32>; 3]]) -> SceneNode {
    let kept = soup_len(soup.len());
    let soup = &soup[..kept];
    let points: Vec<Point3<f32>> = soup.iter().flatten().copied().collect();
    let faces: Vec<[u32; 3]> = (0..kept as u32)
        .map(|t| [3 * t, 3 * t + 1, 3 * t + 2])
        .collect();
    indexed_triangles(color, &points, &faces)
}

fn soup_len(len: usize) -> usize {
    if len > MAX_SOUP_TRIANGLES {
        warn!(
            "Triangle soup holds {} triangles; keeping the first {}",
            len, MAX_SOUP_TRIANGLES
        );
    }
    len.min(MAX_SOUP_TRIANGLES)
}

fn colored_curve<I>(segments: I) -> SceneNode
where
    I: IntoIterator<Item = (Point3<f32>, Point3<f32>, Color)>,
{
    let mut bounds: Option<BoundingBox> = None;
    let mut vertices = Vec::new();
    for (a, b, color) in segments {
        let Some(hull) = BoundingBox::from_points([&a, &b]) else {
            continue;
        };
        bounds = Some(bounds.map_or(hull, |acc| acc.union(&hull)));
        let color = color.to_array();
        vertices.push(CurveVertex {
            position: a.coords.into(),
            color,
        });
        vertices.push(CurveVertex {
            position: b.coords.into(),
            color,
        });
    }

    match bounds {
        Some(bounds) => {
            debug!("Built curve: {} segments", vertices.len() / 2);
            node(GeometryPrimitive::Curve {
                id: MeshId::next(),
                vertices,
                bounds,
            })
        }
        None => SceneNode::Empty,
    }
}

/// Build a set of line segments in one color
pub fn curve(color: Color, edges: &[(Point3<f32>, Point3<f32>)]) -> SceneNode {
    colored_curve(edges.iter().map(|&(a, b)| (a, b, color)))
}

/// Build the wireframe of a mesh: open edges in `color`, interior edges in
/// `color` faded by [`INTERIOR_EDGE_ALPHA`].
pub fn wireframe(color: Color, points: &[Point3<f32>], faces: &[[u32; 3]]) -> SceneNode {
    let faces = valid_faces(points.len(), faces);
    let edges = BoundaryEdgeSet::build(&faces);
    let faded = color.with_alpha(color.a * INTERIOR_EDGE_ALPHA);
    let segment = |(i, j): (u32, u32), c: Color| (points[i as usize], points[j as usize], c);

    let open = edges.open_edges().into_iter().map(|e| segment(e, color));
    let interior = edges.interior_edges().into_iter().map(|e| segment(e, faded));
    colored_curve(open.chain(interior))
}

/// Build a point cloud drawn as sprites of `radius` pixels
pub fn points(radius: f32, color: Color, points: &[Point3<f32>]) -> SceneNode {
    let Some(bounds) = BoundingBox::from_points(points) else {
        return SceneNode::Empty;
    };
    let color = color.to_array();
    let vertices = points
        .iter()
        .map(|p| PointVertex {
            position: p.coords.into(),
            color,
            radius,
        })
        .collect();

    debug!("Built point cloud: {} points", points.len());
    node(GeometryPrimitive::Points {
        id: MeshId::next(),
        vertices,
        radius,
        bounds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use approx::assert_relative_eq;

    fn primitive(node: &SceneNode) -> &GeometryPrimitive {
        match node {
            SceneNode::Primitive(p) => p,
            other => panic!("expected a primitive, got {:?}", other),
        }
    }

    #[test]
    fn test_vertex_layout_sizes() {
        assert_eq!(std::mem::size_of::<SurfaceVertex>(), 40);
        assert_eq!(std::mem::size_of::<CurveVertex>(), 28);
        assert_eq!(std::mem::size_of::<PointVertex>(), 32);
    }

    #[test]
    fn test_empty_inputs_are_empty_nodes() {
        assert!(indexed_triangles(Color::WHITE, &[], &[]).is_empty());
        assert!(curve(Color::WHITE, &[]).is_empty());
        assert!(points(2.0, Color::WHITE, &[]).is_empty());
        assert!(triangles(Color::WHITE, &[]).is_empty());
    }

    #[test]
    fn test_square_surface() {
        let mesh = shapes::square();
        let node = indexed_triangles(Color::rgb(1.0, 0.0, 0.0), &mesh.points, &mesh.faces);
        let GeometryPrimitive::Surface { vertices, bounds, .. } = primitive(&node) else {
            panic!("expected a surface");
        };
        assert_eq!(vertices.len(), 6);
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 0.0));
        assert_eq!(vertices[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(vertices[0].edge_distances[0], 0.0);
        assert_relative_eq!(vertices[0].edge_distances[1], 1.0);
        assert!(vertices[0].edge_distances[2].is_infinite());
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_dangling_faces_are_skipped() {
        let mesh = shapes::square();
        let mut faces = mesh.faces.clone();
        faces.push([0, 2, 99]);
        let node = indexed_triangles(Color::WHITE, &mesh.points, &faces);
        assert_eq!(primitive(&node).vertex_count(), 6);

        let all_bad = indexed_triangles(Color::WHITE, &mesh.points, &[[7, 8, 9]]);
        assert!(all_bad.is_empty());
    }

    #[test]
    fn test_soup_outlines_every_edge() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let node = triangles(Color::WHITE, &[tri]);
        let GeometryPrimitive::Surface { vertices, .. } = primitive(&node) else {
            panic!("expected a surface");
        };
        assert!(vertices
            .iter()
            .all(|v| v.edge_distances.iter().all(|d| d.is_finite())));
    }

    #[test]
    fn test_soup_length_is_capped_to_index_range() {
        assert_eq!(soup_len(4), 4);
        assert_eq!(soup_len(MAX_SOUP_TRIANGLES), MAX_SOUP_TRIANGLES);
        assert_eq!(soup_len(MAX_SOUP_TRIANGLES + 1), MAX_SOUP_TRIANGLES);
        let last = (MAX_SOUP_TRIANGLES - 1) as u32;
        assert!(last.checked_mul(3).and_then(|i| i.checked_add(2)).is_some());
    }

    #[test]
    fn test_curve_bounds_and_layout() {
        let node = curve(
            Color::WHITE.with_alpha(0.5),
            &[
                (Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0)),
                (Point3::new(-1.0, 0.0, 3.0), Point3::new(0.0, 0.0, 0.0)),
            ],
        );
        let prim = primitive(&node);
        assert_eq!(prim.vertex_count(), 4);
        assert_eq!(prim.bounds().min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(prim.bounds().max, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(prim.vertex_bytes().len(), 4 * prim.vertex_stride());
    }

    #[test]
    fn test_wireframe_fades_interior_edges() {
        let mesh = shapes::square();
        let node = wireframe(Color::WHITE, &mesh.points, &mesh.faces);
        let GeometryPrimitive::Curve { vertices, .. } = primitive(&node) else {
            panic!("expected a curve");
        };
        assert_eq!(vertices.len(), 10);
        let opaque = vertices.iter().filter(|v| v.color[3] == 1.0).count();
        let faded = vertices
            .iter()
            .filter(|v| (v.color[3] - INTERIOR_EDGE_ALPHA).abs() < 1e-6)
            .count();
        assert_eq!(opaque, 8);
        assert_eq!(faded, 2);
    }

    #[test]
    fn test_point_cloud() {
        let cloud = [Point3::new(1.0, 1.0, 1.0), Point3::new(-1.0, 0.0, 2.0)];
        let node = points(3.0, Color::BLACK, &cloud);
        let GeometryPrimitive::Points { vertices, radius, bounds, .. } = primitive(&node) else {
            panic!("expected points");
        };
        assert_eq!(*radius, 3.0);
        assert_eq!(vertices[1].radius, 3.0);
        assert!(bounds.contains(&Point3::new(0.0, 0.5, 1.5)));
    }

    #[test]
    fn test_mesh_ids_are_unique() {
        let mesh = shapes::square();
        let a = indexed_triangles(Color::WHITE, &mesh.points, &mesh.faces);
        let b = indexed_triangles(Color::WHITE, &mesh.points, &mesh.faces);
        assert_ne!(primitive(&a).id(), primitive(&b).id());
    }
}
