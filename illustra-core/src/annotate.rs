//! Per-corner edge-distance annotation.
//!
//! Each triangle corner carries three distances, one per triangle edge in the
//! order `(v1, v2)`, `(v2, v3)`, `(v3, v1)`. A slot is `+inf` when its edge is
//! not open. For an open edge the two corners on it store `0` and the opposite
//! corner stores its height over the edge, so the interpolated value across the
//! face is the distance to that edge and its zero set traces the boundary.

use nalgebra::Point3;

use crate::edges::BoundaryEdgeSet;
use crate::geometry::triangle_area;

/// One triangle corner with its distances to the triangle's open edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotatedVertex {
    pub position: Point3<f32>,
    pub edge_distances: [f32; 3],
}

impl AnnotatedVertex {
    /// Smallest finite edge distance, or `+inf` when no slot is open
    pub fn nearest_open_edge(&self) -> f32 {
        self.edge_distances.iter().copied().fold(f32::INFINITY, f32::min)
    }
}

/// Annotate the three corners of the face `indices` with positions `points`.
///
/// Pure: identical inputs always give bit-identical output.
pub fn assemble(
    edges: &BoundaryEdgeSet,
    indices: [u32; 3],
    points: [Point3<f32>; 3],
) -> [AnnotatedVertex; 3] {
    let [i1, i2, i3] = indices;
    let [p1, p2, p3] = points;
    let open = [
        edges.is_open_edge(i1, i2),
        edges.is_open_edge(i2, i3),
        edges.is_open_edge(i3, i1),
    ];

    let interior = !open.iter().any(|&o| o)
        && !indices.iter().any(|&i| edges.is_edge_vertex(i));
    if interior {
        return points.map(|position| AnnotatedVertex {
            position,
            edge_distances: [f32::INFINITY; 3],
        });
    }

    let double_area = 2.0 * triangle_area(&p1, &p2, &p3);
    let height = |a: &Point3<f32>, b: &Point3<f32>| {
        let length = (b - a).norm();
        if length > 0.0 {
            double_area / length
        } else {
            0.0
        }
    };
    let on_edge = |slot: usize| if open[slot] { 0.0 } else { f32::INFINITY };
    let opposite = |slot: usize, a: &Point3<f32>, b: &Point3<f32>| {
        if open[slot] {
            height(a, b)
        } else {
            f32::INFINITY
        }
    };

    [
        AnnotatedVertex {
            position: p1,
            edge_distances: [on_edge(0), opposite(1, &p2, &p3), on_edge(2)],
        },
        AnnotatedVertex {
            position: p2,
            edge_distances: [on_edge(0), on_edge(1), opposite(2, &p3, &p1)],
        },
        AnnotatedVertex {
            position: p3,
            edge_distances: [opposite(0, &p1, &p2), on_edge(1), on_edge(2)],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;
    use approx::assert_relative_eq;

    fn corners(mesh: &shapes::IndexedMesh, face: [u32; 3]) -> [Point3<f32>; 3] {
        face.map(|i| mesh.points[i as usize])
    }

    #[test]
    fn test_interior_triangle_is_all_infinite() {
        let mesh = shapes::cube(1.0);
        let edges = BoundaryEdgeSet::build(&mesh.faces);
        for &face in &mesh.faces {
            for vertex in assemble(&edges, face, corners(&mesh, face)) {
                assert!(vertex.edge_distances.iter().all(|d| d.is_infinite()));
            }
        }
    }

    #[test]
    fn test_square_corner_distances() {
        let mesh = shapes::square();
        let edges = BoundaryEdgeSet::build(&mesh.faces);
        let face = mesh.faces[0];
        let [v0, v1, v2] = assemble(&edges, face, corners(&mesh, face));

        // Slots: (0,1) open, (1,2) open, (2,0) shared with the other face
        assert_eq!(v0.edge_distances[0], 0.0);
        assert_relative_eq!(v0.edge_distances[1], 1.0);
        assert!(v0.edge_distances[2].is_infinite());

        assert_eq!(v1.edge_distances, [0.0, 0.0, f32::INFINITY]);

        assert_relative_eq!(v2.edge_distances[0], 1.0);
        assert_eq!(v2.edge_distances[1], 0.0);
        assert!(v2.edge_distances[2].is_infinite());
        assert_eq!(v2.position, Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_single_triangle_heights() {
        let edges = BoundaryEdgeSet::build(&[[0, 1, 2]]);
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 3.0, 0.0),
        ];
        let [v1, v2, v3] = assemble(&edges, [0, 1, 2], points);
        // Height of the right angle over the hypotenuse: 2 * 6 / 5
        assert_relative_eq!(v1.edge_distances[1], 2.4);
        assert_relative_eq!(v2.edge_distances[2], 4.0);
        assert_relative_eq!(v3.edge_distances[0], 3.0);
        assert_eq!(v1.nearest_open_edge(), 0.0);
    }

    #[test]
    fn test_boundary_vertex_without_open_slot() {
        // Open fan around vertex 0: the middle face touches only boundary
        // vertices, yet its two spokes are shared and stay closed
        let faces = [[0, 1, 2], [0, 2, 3], [0, 3, 4]];
        let edges = BoundaryEdgeSet::build(&faces);
        assert!(edges.is_edge_vertex(0));
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let annotated = assemble(&edges, [0, 2, 3], points);
        assert!(!edges.is_open_edge(0, 2) && !edges.is_open_edge(3, 0));
        assert!(edges.is_open_edge(2, 3));
        assert_eq!(annotated[0].edge_distances[0], f32::INFINITY);
        assert_eq!(annotated[0].edge_distances[2], f32::INFINITY);
        assert_relative_eq!(annotated[0].edge_distances[1], 0.5f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_edge_has_zero_height() {
        let edges = BoundaryEdgeSet::build(&[[0, 1, 2]]);
        let p = Point3::new(1.0, 1.0, 1.0);
        let annotated = assemble(&edges, [0, 1, 2], [p, p, p]);
        assert!(annotated
            .iter()
            .flat_map(|v| v.edge_distances)
            .all(|d| d == 0.0));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let mesh = shapes::square();
        let edges = BoundaryEdgeSet::build(&mesh.faces);
        let face = mesh.faces[1];
        let first = assemble(&edges, face, corners(&mesh, face));
        let second = assemble(&edges, face, corners(&mesh, face));
        for (a, b) in first.iter().zip(&second) {
            let bits = |v: &AnnotatedVertex| v.edge_distances.map(f32::to_bits);
            assert_eq!(bits(a), bits(b));
        }
    }
}
