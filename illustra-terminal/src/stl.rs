//! STL loading for binary and ASCII formats
//!
//! STL stores every triangle with its own three corners. Corners at the same
//! position are welded into one indexed vertex so shared edges are recognised
//! as interior and only the true boundary is outlined.

use hashbrown::HashMap;
use nalgebra::Point3;
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::float,
    sequence::preceded,
    IResult,
};
use std::path::Path;

use illustra_core::shapes::IndexedMesh;

use crate::error::{LoadError, Result};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Collects corners into an indexed mesh, merging bit-identical positions
#[derive(Default)]
struct Welder {
    mesh: IndexedMesh,
    lookup: HashMap<[u32; 3], u32>,
}

impl Welder {
    fn index(&mut self, p: Point3<f32>) -> u32 {
        // Adding 0.0 folds -0.0 into 0.0
        let key = [p.x, p.y, p.z].map(|c| (c + 0.0).to_bits());
        let points = &mut self.mesh.points;
        *self.lookup.entry(key).or_insert_with(|| {
            points.push(p);
            (points.len() - 1) as u32
        })
    }

    fn add_triangle(&mut self, corners: [Point3<f32>; 3]) {
        let face = corners.map(|p| self.index(p));
        self.mesh.faces.push(face);
    }

    fn finish(self) -> IndexedMesh {
        self.mesh
    }
}

fn read_f32(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<IndexedMesh> {
    if data.len() < HEADER_LEN + 4 {
        return Err(LoadError::TooSmall(data.len()));
    }

    // Skip 80-byte header
    let data = &data[HEADER_LEN..];

    // Read triangle count (4 bytes, little-endian)
    let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let body = &data[4..];
    let available = body.len() / FACET_LEN;
    if available < declared {
        return Err(LoadError::Truncated {
            declared,
            available,
        });
    }

    let mut welder = Welder::default();
    for facet in body.chunks_exact(FACET_LEN).take(declared) {
        // Normal (12 bytes) is recomputed from winding, so skip it
        let corner = |k: usize| {
            let offset = 12 + 12 * k;
            Point3::new(
                read_f32(facet, offset),
                read_f32(facet, offset + 4),
                read_f32(facet, offset + 8),
            )
        };
        welder.add_triangle([corner(0), corner(1), corner(2)]);
    }

    Ok(welder.finish())
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<IndexedMesh> {
    match parse_ascii_stl_impl(input) {
        Ok((_, triangles)) => {
            let mut welder = Welder::default();
            for triangle in triangles {
                welder.add_triangle(triangle);
            }
            Ok(welder.finish())
        }
        Err(e) => Err(LoadError::Ascii(format!("{:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<[Point3<f32>; 3]>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, triangles))
}

fn parse_facet(input: &str) -> IResult<&str, [Point3<f32>; 3]> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _) = parse_point(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_point(input)
}

fn parse_point(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<IndexedMesh> {
    // Binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}

/// Read and parse an STL file from disk
pub fn load(path: &Path) -> Result<IndexedMesh> {
    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_stl(&data)?;
    log::info!(
        "Loaded {}: {} vertices, {} faces",
        path.display(),
        mesh.points.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use illustra_core::BoundaryEdgeSet;

    const SQUARE: &str = "solid square
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 1 1 0
    endloop
  endfacet
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 1 0
      vertex 0 1 0
    endloop
  endfacet
endsolid square
";

    fn binary(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for corner in triangle {
                for c in corner {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.faces.len(), 0);
    }

    #[test]
    fn test_binary_corners_are_welded() {
        let data = binary(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [-0.0, 1.0, 0.0]],
        ]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.points.len(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary(&[[[0.0; 3]; 3]]);
        data[80..84].copy_from_slice(&5u32.to_le_bytes());
        assert!(matches!(
            parse_binary_stl(&data),
            Err(LoadError::Truncated {
                declared: 5,
                available: 1
            })
        ));
        assert!(matches!(
            parse_binary_stl(&[0u8; 10]),
            Err(LoadError::TooSmall(10))
        ));
    }

    #[test]
    fn test_ascii_square_has_one_interior_edge() {
        let mesh = parse_stl(SQUARE.as_bytes()).unwrap();
        assert_eq!(mesh.points.len(), 4);
        let edges = BoundaryEdgeSet::build(&mesh.faces);
        assert_eq!(edges.open_edge_count(), 4);
        assert_eq!(edges.interior_edges(), vec![(0, 2)]);
    }

    #[test]
    fn test_bad_ascii_is_an_error() {
        assert!(matches!(
            parse_ascii_stl("solid broken\n facet normal 0 0"),
            Err(LoadError::Ascii(_))
        ));
    }
}
