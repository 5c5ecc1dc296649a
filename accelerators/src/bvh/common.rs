//! BVH Common

use pvs_core::geometry::*;
use pvs_core::math::Axis;
use shared_arena::ArenaArc;

/// Splitting method to use to subdivide triangles.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SplitMethod {
    /// Surface Area Heuristic.
    SAH,

    /// Splitting planes at the midpoint of each region of space.
    Middle,

    /// Partition triangles into equally sized subsets such that the first half of the triangles have smallest
    /// centroid coordinate values along the chosen axis, and second have have the largest centroid coordinate values.
    EqualCounts,
}

/// SAH bucket information.
#[derive(Copy, Clone, Debug)]
pub struct BucketInfo {
    /// Count of triangles.
    pub count: usize,

    /// Bounding box for the bucket.
    pub bounds: Bounds3f,
}

impl Default for BucketInfo {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Bounds3f::EMPTY,
        }
    }
}

/// Stores information about a triangle.
#[derive(Copy, Clone, Debug)]
pub struct BVHPrimitiveInfo {
    /// Index in the input triangle list.
    pub primitive_number: usize,

    /// The bounding box of triangle.
    pub bounds: Bounds3f,

    /// The centroid of bounding box of triangle.
    pub centroid: Point3f,
}

impl BVHPrimitiveInfo {
    /// Create a `BVHPrimitiveInfo`.
    ///
    /// * `primitive_number` - Index in the input triangle list.
    /// * `bounds`           - The bounding box of triangle.
    pub fn new(primitive_number: usize, bounds: Bounds3f) -> Self {
        Self {
            primitive_number,
            bounds,
            centroid: bounds.centroid(),
        }
    }
}

/// Node counts gathered while building.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildCounts {
    /// All nodes.
    pub total_nodes: usize,

    /// Leaf nodes only.
    pub leaf_nodes: usize,
}

/// BVHBuildNode represents a node of the Bound Volume Hierarchy.
#[derive(Clone)]
pub struct BVHBuildNode {
    /// Bounding box of all children beneath this node.
    pub bounds: Bounds3f,

    /// Children of this node.
    pub children: [Option<ArenaArc<BVHBuildNode>>; 2],

    /// Coordinate axis along which triangles are partitioned between the
    /// two children.
    pub split_axis: Axis,

    /// Index of first triangle in `BVHAccel::triangles` stored at this node.
    pub first_prim_offset: usize,

    /// Number of triangles stored at this node starting at `first_prim_offset`.
    pub n_primitives: u16,
}

impl BVHBuildNode {
    /// Create a leaf BVH node.
    ///
    /// * `first`  - Index of first triangle in `BVHAccel::triangles` stored at this node.
    /// * `n`      - Number of triangles stored at this node.
    /// * `bounds` - Bounding box.
    pub fn new_leaf_node(first: usize, n: u16, bounds: Bounds3f) -> Self {
        Self {
            first_prim_offset: first,
            n_primitives: n,
            bounds,
            children: [None, None],
            split_axis: Axis::default(),
        }
    }

    /// Allocates an interior BVH node.
    ///
    /// * `axis` - Axis used for partitioning children.
    /// * `c0`   - First child.
    /// * `c1`   - Second child.
    pub fn new_interior_node(axis: Axis, c0: ArenaArc<BVHBuildNode>, c1: ArenaArc<BVHBuildNode>) -> Self {
        Self {
            first_prim_offset: 0,
            n_primitives: 0,
            bounds: c0.bounds.union(&c1.bounds),
            children: [Some(c0), Some(c1)],
            split_axis: axis,
        }
    }
}

/// Contents of a flattened node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LinearNodeKind {
    /// Leaf referencing `count` triangles starting at `first` in `BVHAccel::triangles`.
    Leaf { first: u32, count: u16 },

    /// Interior node. The first child directly follows this node; `second_child` is the offset of the other.
    Interior { second_child: u32, axis: Axis },
}

/// A node of the depth-first flattened hierarchy.
#[derive(Copy, Clone, Debug)]
pub struct LinearBVHNode {
    /// Bounding box for the node.
    pub bounds: Bounds3f,

    /// Leaf or interior data.
    pub kind: LinearNodeKind,
}

impl LinearBVHNode {
    /// Returns the range of `BVHAccel::triangles` referenced by a leaf, or `None` for interior nodes.
    pub fn leaf_range(&self) -> Option<std::ops::Range<usize>> {
        match self.kind {
            LinearNodeKind::Leaf { first, count } => Some(first as usize..first as usize + count as usize),
            LinearNodeKind::Interior { .. } => None,
        }
    }
}
