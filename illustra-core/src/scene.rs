//! The immutable placement tree.
//!
//! Nodes are cheap to clone and share subtrees through `Arc`, so one mesh can
//! appear under many placements. Every operation returns a new node; nothing
//! is mutated in place.
//!
//! Transforms fold into an existing [`Placement`] instead of nesting a new one,
//! so a node never carries more than one placement layer however many
//! transforms were applied to it. Each placement records whether it reverses
//! handedness; the parity along a root-to-leaf path is the XOR of those flags.
//!
//! ```
//! use illustra_core::{group, primitive, shapes, Color, Plane};
//! use nalgebra::Vector3;
//!
//! let mesh = shapes::cube(1.0);
//! let cube = primitive::indexed_triangles(Color::WHITE, &mesh.points, &mesh.faces);
//! let scene = group([
//!     cube.clone(),
//!     cube.translate_by(&Vector3::new(2.0, 0.0, 0.0)).mirror_across(&Plane::yz()),
//! ]);
//! assert_eq!(scene.primitive_count(), 2);
//! ```

use std::sync::Arc;

use nalgebra::Vector3;

use crate::frame::{Axis, Frame, Plane};
use crate::geometry::BoundingBox;
use crate::primitive::GeometryPrimitive;

/// A child placed in its parent's coordinates
#[derive(Debug, Clone)]
pub struct Placement {
    /// The child's frame relative to the parent's frame
    pub frame: Frame,
    /// Whether this placement alone reverses handedness
    pub mirrored: bool,
    pub child: SceneNode,
}

#[derive(Debug, Clone, Default)]
pub enum SceneNode {
    /// Nothing; absorbs transforms and renders nothing
    #[default]
    Empty,
    Primitive(Arc<GeometryPrimitive>),
    Placed(Arc<Placement>),
    Group(Arc<[SceneNode]>),
}

/// Aggregate nodes without transforming them
pub fn group<I>(nodes: I) -> SceneNode
where
    I: IntoIterator<Item = SceneNode>,
{
    SceneNode::Group(nodes.into_iter().collect())
}

impl SceneNode {
    pub fn is_empty(&self) -> bool {
        matches!(self, SceneNode::Empty)
    }

    /// Apply `frame_fn` to this node's placement, wrapping leaves in a new one.
    ///
    /// `is_mirror` states whether the step reverses handedness.
    pub fn transform<F>(&self, is_mirror: bool, frame_fn: F) -> SceneNode
    where
        F: FnOnce(&Frame) -> Frame,
    {
        let placement = match self {
            SceneNode::Empty => return SceneNode::Empty,
            SceneNode::Primitive(_) | SceneNode::Group(_) => Placement {
                frame: frame_fn(&Frame::identity()),
                mirrored: is_mirror,
                child: self.clone(),
            },
            SceneNode::Placed(placed) => Placement {
                frame: frame_fn(&placed.frame),
                mirrored: is_mirror ^ placed.mirrored,
                child: placed.child.clone(),
            },
        };
        SceneNode::Placed(Arc::new(placement))
    }

    pub fn translate_by(&self, v: &Vector3<f32>) -> SceneNode {
        self.transform(false, |frame| frame.translated_by(v))
    }

    pub fn rotate_around(&self, axis: &Axis, angle: f32) -> SceneNode {
        self.transform(false, |frame| frame.rotated_around(axis, angle))
    }

    /// Reflect through `plane`; always flips parity
    pub fn mirror_across(&self, plane: &Plane) -> SceneNode {
        self.transform(true, |frame| frame.mirrored_across(plane))
    }

    /// Treat this node's coordinates as local to `target`.
    ///
    /// A left-handed target counts as a mirror.
    pub fn place_in(&self, target: &Frame) -> SceneNode {
        self.transform(!target.is_right_handed(), |frame| frame.placed_in(target))
    }

    /// Re-express this node in `target`'s coordinates
    pub fn relative_to(&self, target: &Frame) -> SceneNode {
        self.transform(!target.is_right_handed(), |frame| frame.relative_to(target))
    }

    /// Number of primitive leaves, counting shared subtrees once per path
    pub fn primitive_count(&self) -> usize {
        match self {
            SceneNode::Empty => 0,
            SceneNode::Primitive(_) => 1,
            SceneNode::Placed(placed) => placed.child.primitive_count(),
            SceneNode::Group(children) => children.iter().map(SceneNode::primitive_count).sum(),
        }
    }

    /// Nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        match self {
            SceneNode::Empty | SceneNode::Primitive(_) => 1,
            SceneNode::Placed(placed) => 1 + placed.child.depth(),
            SceneNode::Group(children) => {
                1 + children.iter().map(SceneNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Longest run of directly nested placements anywhere in the tree
    pub fn placement_depth(&self) -> usize {
        match self {
            SceneNode::Empty | SceneNode::Primitive(_) => 0,
            SceneNode::Placed(placed) => {
                let below = placed.child.placement_depth();
                match placed.child {
                    SceneNode::Placed(_) => 1 + below,
                    _ => below.max(1),
                }
            }
            SceneNode::Group(children) => children
                .iter()
                .map(SceneNode::placement_depth)
                .max()
                .unwrap_or(0),
        }
    }

    /// Bounds of every primitive in root coordinates; `None` when there are none
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds_in(&Frame::identity())
    }

    fn bounds_in(&self, frame: &Frame) -> Option<BoundingBox> {
        match self {
            SceneNode::Empty => None,
            SceneNode::Primitive(primitive) => Some(primitive.bounds().transformed(frame)),
            SceneNode::Placed(placed) => placed.child.bounds_in(&frame.compose(&placed.frame)),
            SceneNode::Group(children) => children
                .iter()
                .filter_map(|child| child.bounds_in(frame))
                .reduce(|a, b| a.union(&b)),
        }
    }
}
