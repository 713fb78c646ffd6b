//! Boundary-edge classification for indexed triangle meshes.
//!
//! Every triangle edge is counted once per incident face. An edge with
//! multiplicity exactly one is *open* (it lies on the surface boundary);
//! interior edges have two, non-manifold edges more than two. Only open edges
//! are drawn as outlines, so non-manifold fans never get highlighted.

use hashbrown::{HashMap, HashSet};
use log::debug;

/// Order-independent key for the edge `(i, j)`
#[inline]
fn edge_key(i: u32, j: u32) -> u64 {
    let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
    (u64::from(lo) << 32) | u64::from(hi)
}

#[inline]
fn edge_from_key(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

/// Edge multiplicities and boundary vertices of one mesh
#[derive(Debug, Clone, Default)]
pub struct BoundaryEdgeSet {
    multiplicity: HashMap<u64, u32>,
    boundary_vertices: HashSet<u32>,
}

impl BoundaryEdgeSet {
    /// Count every face edge and collect the vertices of open edges.
    ///
    /// Duplicate faces count as separate incident triangles.
    ///
    /// # Example
    ///
    /// ```
    /// use illustra_core::edges::BoundaryEdgeSet;
    ///
    /// let edges = BoundaryEdgeSet::build(&[[0, 1, 2], [0, 2, 3]]);
    /// assert!(edges.is_open_edge(0, 1));
    /// assert!(!edges.is_open_edge(2, 0));
    /// assert_eq!(edges.open_edge_count(), 4);
    /// ```
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut multiplicity: HashMap<u64, u32> = HashMap::with_capacity(faces.len() * 2);
        for &[a, b, c] in faces {
            for key in [edge_key(a, b), edge_key(b, c), edge_key(c, a)] {
                *multiplicity.entry(key).or_insert(0) += 1;
            }
        }

        let mut boundary_vertices = HashSet::new();
        for (&key, _) in multiplicity.iter().filter(|&(_, &count)| count == 1) {
            let (i, j) = edge_from_key(key);
            boundary_vertices.insert(i);
            boundary_vertices.insert(j);
        }

        debug!(
            "Classified {} edges from {} faces, {} boundary vertices",
            multiplicity.len(),
            faces.len(),
            boundary_vertices.len()
        );

        Self {
            multiplicity,
            boundary_vertices,
        }
    }

    /// Number of faces incident to the edge; 0 when the edge is not in the mesh
    pub fn multiplicity(&self, i: u32, j: u32) -> u32 {
        self.multiplicity.get(&edge_key(i, j)).copied().unwrap_or(0)
    }

    pub fn is_open_edge(&self, i: u32, j: u32) -> bool {
        self.multiplicity(i, j) == 1
    }

    pub fn is_edge_vertex(&self, i: u32) -> bool {
        self.boundary_vertices.contains(&i)
    }

    /// Open edges as `(min, max)` pairs in ascending order
    pub fn open_edges(&self) -> Vec<(u32, u32)> {
        self.edges_where(|count| count == 1)
    }

    /// Edges shared by two or more faces, in ascending order
    pub fn interior_edges(&self) -> Vec<(u32, u32)> {
        self.edges_where(|count| count >= 2)
    }

    fn edges_where(&self, keep: impl Fn(u32) -> bool) -> Vec<(u32, u32)> {
        let mut keys: Vec<u64> = self
            .multiplicity
            .iter()
            .filter(|&(_, &count)| keep(count))
            .map(|(&key, _)| key)
            .collect();
        keys.sort_unstable();
        keys.into_iter().map(edge_from_key).collect()
    }

    pub fn boundary_vertices(&self) -> impl Iterator<Item = u32> + '_ {
        self.boundary_vertices.iter().copied()
    }

    pub fn edge_count(&self) -> usize {
        self.multiplicity.len()
    }

    pub fn open_edge_count(&self) -> usize {
        self.multiplicity.values().filter(|&&count| count == 1).count()
    }

    /// True when no edge is open
    pub fn is_closed(&self) -> bool {
        self.boundary_vertices.is_empty()
    }

    /// True when no edge borders more than two faces
    pub fn is_manifold(&self) -> bool {
        self.multiplicity.values().all(|&count| count <= 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes;

    #[test]
    fn test_closed_mesh_has_no_open_edges() {
        for mesh in [shapes::cube(1.0), shapes::tetrahedron(1.0)] {
            let edges = BoundaryEdgeSet::build(&mesh.faces);
            assert!(edges.open_edges().is_empty());
            assert_eq!(edges.boundary_vertices().count(), 0);
            assert!(edges.is_closed());
            assert!(edges.is_manifold());
        }
    }

    #[test]
    fn test_single_triangle_is_all_boundary() {
        let edges = BoundaryEdgeSet::build(&[[0, 1, 2]]);
        assert!(edges.is_open_edge(0, 1));
        assert!(edges.is_open_edge(1, 2));
        assert!(edges.is_open_edge(2, 0));
        for v in 0..3 {
            assert!(edges.is_edge_vertex(v));
        }
        assert_eq!(edges.open_edges(), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_non_manifold_fan_is_not_open() {
        let edges = BoundaryEdgeSet::build(&[[0, 1, 2], [1, 0, 3], [0, 1, 4]]);
        assert_eq!(edges.multiplicity(0, 1), 3);
        assert!(!edges.is_open_edge(0, 1));
        assert!(!edges.is_manifold());
        // The fan's outer edges are still open
        assert!(edges.is_open_edge(1, 4));
    }

    #[test]
    fn test_duplicate_faces_close_their_edges() {
        let edges = BoundaryEdgeSet::build(&[[0, 1, 2], [0, 1, 2]]);
        assert!(edges.open_edges().is_empty());
        assert_eq!(edges.multiplicity(2, 1), 2);
    }

    #[test]
    fn test_square_classification() {
        let mesh = shapes::square();
        let edges = BoundaryEdgeSet::build(&mesh.faces);
        assert_eq!(edges.open_edges(), vec![(0, 1), (0, 3), (1, 2), (2, 3)]);
        assert_eq!(edges.interior_edges(), vec![(0, 2)]);
        assert_eq!(edges.edge_count(), 5);
        assert_eq!(edges.open_edge_count(), 4);
    }

    #[test]
    fn test_unreferenced_edge() {
        let edges = BoundaryEdgeSet::build(&[[0, 1, 2]]);
        assert_eq!(edges.multiplicity(5, 6), 0);
        assert!(!edges.is_open_edge(5, 6));
        assert!(!edges.is_edge_vertex(5));
    }

    #[test]
    fn test_open_edges_is_restartable() {
        let edges = BoundaryEdgeSet::build(&shapes::square().faces);
        assert_eq!(edges.open_edges(), edges.open_edges());
    }

    #[test]
    fn test_large_indices_do_not_collide() {
        let edges = BoundaryEdgeSet::build(&[[u32::MAX, 0, 1]]);
        assert!(edges.is_open_edge(0, u32::MAX));
        assert!(edges.is_edge_vertex(u32::MAX));
    }
}
