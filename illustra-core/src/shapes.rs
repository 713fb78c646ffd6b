//! Small indexed meshes for demos and tests

use nalgebra::Point3;

/// Indexed triangle mesh in the builder input form
#[derive(Debug, Clone, Default)]
pub struct IndexedMesh {
    pub points: Vec<Point3<f32>>,
    pub faces: Vec<[u32; 3]>,
}

/// Axis-aligned cube centred on the origin, wound counter-clockwise seen
/// from outside. Closed and manifold: every edge borders two faces.
pub fn cube(size: f32) -> IndexedMesh {
    let h = size / 2.0;
    let points = vec![
        Point3::new(-h, -h, -h),
        Point3::new(h, -h, -h),
        Point3::new(h, h, -h),
        Point3::new(-h, h, -h),
        Point3::new(-h, -h, h),
        Point3::new(h, -h, h),
        Point3::new(h, h, h),
        Point3::new(-h, h, h),
    ];
    let faces = vec![
        // Front (+z)
        [4, 5, 6],
        [4, 6, 7],
        // Back (-z)
        [0, 3, 2],
        [0, 2, 1],
        // Top (+y)
        [3, 7, 6],
        [3, 6, 2],
        // Bottom (-y)
        [0, 1, 5],
        [0, 5, 4],
        // Right (+x)
        [1, 2, 6],
        [1, 6, 5],
        // Left (-x)
        [0, 4, 7],
        [0, 7, 3],
    ];
    IndexedMesh { points, faces }
}

/// Unit square in the xy-plane split along its (0, 2) diagonal
pub fn square() -> IndexedMesh {
    IndexedMesh {
        points: vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        faces: vec![[0, 1, 2], [0, 2, 3]],
    }
}

/// Regular-ish tetrahedron with outward winding
pub fn tetrahedron(size: f32) -> IndexedMesh {
    IndexedMesh {
        points: vec![
            Point3::new(size, size, size),
            Point3::new(size, -size, -size),
            Point3::new(-size, size, -size),
            Point3::new(-size, -size, size),
        ],
        faces: vec![[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::triangle_area;

    fn signed_volume(mesh: &IndexedMesh) -> f32 {
        mesh.faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| mesh.points[i as usize].coords);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    #[test]
    fn test_cube_is_outward_wound() {
        let mesh = cube(2.0);
        assert_eq!(mesh.points.len(), 8);
        assert_eq!(mesh.faces.len(), 12);
        assert!((signed_volume(&mesh) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_tetrahedron_is_outward_wound() {
        assert!(signed_volume(&tetrahedron(1.0)) > 0.0);
    }

    #[test]
    fn test_square_area() {
        let mesh = square();
        let total: f32 = mesh
            .faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| mesh.points[i as usize]);
                triangle_area(&a, &b, &c)
            })
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
