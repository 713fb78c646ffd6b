//! Illustra Core Library - Scene trees and edge-aware meshes
//!
//! This library provides the pure core of the illustration renderer: an
//! immutable placement tree of primitives with handedness tracking, surface
//! builders that classify open edges for crisp outlines, and the traversal
//! that turns a tree into drawable entities for a rasterization backend.

pub mod annotate;
pub mod camera;
pub mod color;
pub mod edges;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod primitive;
pub mod render;
pub mod scene;
pub mod shapes;

// Re-export commonly used types
pub use annotate::{assemble, AnnotatedVertex};
pub use camera::{Camera, ProjectionMode};
pub use color::Color;
pub use edges::BoundaryEdgeSet;
pub use error::{RenderError, RenderResult};
pub use frame::{Axis, Frame, Plane};
pub use geometry::BoundingBox;
pub use primitive::{GeometryPrimitive, MeshId};
pub use render::{collect, Backend, CullFace, DrawableEntity, Renderer};
pub use scene::{group, Placement, SceneNode};
