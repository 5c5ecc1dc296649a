//! Bounding Volume Hierarchy.

use pvs_core::geometry::*;
use pvs_core::math::*;
use pvs_core::query::*;

mod common;
mod sah;

pub use common::*;
use shared_arena::SharedArena;

/// Bounding Volume Hierarchy over room-tagged triangles.
#[derive(Clone)]
pub struct BVHAccel {
    /// The triangles, ordered so that each leaf references a contiguous range.
    pub triangles: Vec<Triangle>,

    /// Maximum number of triangles in the node.
    pub max_prims_in_node: u8,

    /// Spliting method.
    pub split_method: SplitMethod,

    /// The list of nodes.
    pub nodes: Vec<LinearBVHNode>,
}

impl BVHAccel {
    /// Create a new Bounding Volume Hierarchy Accelerator.
    ///
    /// * `triangles`         - The triangles.
    /// * `max_prims_in_node` - Maximum number of triangles in a node.
    /// * `split_method`      - The splitting method.
    pub fn new(triangles: &[Triangle], max_prims_in_node: u8, split_method: SplitMethod) -> Self {
        let n_primitives = triangles.len();
        if n_primitives == 0 {
            return Self {
                triangles: vec![],
                max_prims_in_node,
                split_method,
                nodes: vec![],
            };
        }

        // Initializes primitive_info array for triangles.
        let mut primitive_info: Vec<BVHPrimitiveInfo> = triangles
            .iter()
            .enumerate()
            .map(|(i, t)| BVHPrimitiveInfo::new(i, t.world_bound()))
            .collect();

        // Build BVH tree for triangles using `primitive_info`.
        let arena = SharedArena::<BVHBuildNode>::with_capacity(2 * n_primitives);
        let mut counts = BuildCounts::default();
        let mut ordered = Vec::<Triangle>::with_capacity(n_primitives);
        let root = sah::build(
            &arena,
            triangles,
            split_method,
            max_prims_in_node,
            &mut primitive_info,
            0,
            n_primitives,
            &mut counts,
            &mut ordered,
        );

        let (arena_used, _arena_free) = arena.stats();
        info!(
            "BVH created with {} nodes ({} leaves) for {} triangles ({:.2} MB), arena allocated {:.2} MB",
            counts.total_nodes,
            counts.leaf_nodes,
            n_primitives,
            (counts.total_nodes * std::mem::size_of::<LinearBVHNode>()) as f32 / (1024.0 * 1024.0),
            (arena_used * std::mem::size_of::<BVHBuildNode>()) as f32 / (1024.0 * 1024.0)
        );

        // Compute representation of depth-first traversal of BVH tree.
        let mut nodes = Vec::with_capacity(counts.total_nodes);
        Self::flatten_bvh_tree(&root, &mut nodes);

        debug_assert!(counts.total_nodes == nodes.len());

        Self {
            triangles: ordered,
            max_prims_in_node,
            split_method,
            nodes,
        }
    }

    /// Flatten the tree in depth-first order, returning the offset of `node`.
    ///
    /// * `node`  - The node.
    /// * `nodes` - The linear nodes being filled.
    fn flatten_bvh_tree(node: &BVHBuildNode, nodes: &mut Vec<LinearBVHNode>) -> u32 {
        let my_offset = nodes.len() as u32;

        match &node.children {
            [Some(c0), Some(c1)] => {
                // Reserve this node's slot; the second child offset is known once the first subtree is flattened.
                nodes.push(LinearBVHNode {
                    bounds: node.bounds,
                    kind: LinearNodeKind::Interior {
                        second_child: 0,
                        axis: node.split_axis,
                    },
                });
                Self::flatten_bvh_tree(c0, nodes);
                let second_child = Self::flatten_bvh_tree(c1, nodes);
                nodes[my_offset as usize].kind = LinearNodeKind::Interior {
                    second_child,
                    axis: node.split_axis,
                };
            }
            _ => {
                nodes.push(LinearBVHNode {
                    bounds: node.bounds,
                    kind: LinearNodeKind::Leaf {
                        first: node.first_prim_offset as u32,
                        count: node.n_primitives,
                    },
                });
            }
        }

        my_offset
    }

    /// Returns a bounding box in the world space.
    pub fn world_bound(&self) -> Bounds3f {
        self.nodes.first().map_or(Bounds3f::EMPTY, |n| n.bounds)
    }

    /// Follow a ray through the hierarchy, offering every allowed triangle it hits to the handler. The ray's
    /// `t_max` shrinks to each hit so only progressively nearer intersections are reported.
    ///
    /// * `r`       - The ray.
    /// * `handler` - Filters candidates and records hits.
    pub fn trace<H: RayHitHandler>(&self, r: &mut Ray, handler: &mut H) {
        if self.nodes.is_empty() {
            return;
        }

        let inv_dir = Vector3f::new(1.0 / r.d.x, 1.0 / r.d.y, 1.0 / r.d.z);
        let dir_is_neg = [
            if inv_dir.x < 0.0 { 1_u8 } else { 0_u8 },
            if inv_dir.y < 0.0 { 1_u8 } else { 0_u8 },
            if inv_dir.z < 0.0 { 1_u8 } else { 0_u8 },
        ];

        // Follow ray through BVH nodes to find triangle intersections.
        let (mut to_visit_offset, mut current_node_index) = (0, 0);
        let mut nodes_to_visit = [0_usize; 64];

        loop {
            // Check ray against BVH node.
            let node = &self.nodes[current_node_index];
            if node.bounds.intersect_p_inv(r, &inv_dir, dir_is_neg) {
                match node.kind {
                    LinearNodeKind::Leaf { first, count } => {
                        // Intersect ray with triangles in leaf BVH node.
                        let first = first as usize;
                        for triangle in &self.triangles[first..first + count as usize] {
                            if !handler.allow(triangle) {
                                continue;
                            }
                            if let Some(hit) = triangle.intersect(r) {
                                r.t_max = hit.t;
                                handler.on_hit(triangle, hit.t, r.at(hit.t), hit.n);
                            }
                        }
                        if to_visit_offset == 0 {
                            break;
                        }
                        to_visit_offset -= 1;
                        current_node_index = nodes_to_visit[to_visit_offset];
                    }
                    LinearNodeKind::Interior { second_child, axis } => {
                        // Put far BVH node on nodes_to_visit stack, advance to near node.
                        if dir_is_neg[usize::from(axis)] == 1 {
                            nodes_to_visit[to_visit_offset] = current_node_index + 1;
                            current_node_index = second_child as usize;
                        } else {
                            nodes_to_visit[to_visit_offset] = second_child as usize;
                            current_node_index += 1;
                        }
                        to_visit_offset += 1;
                    }
                }
            } else {
                if to_visit_offset == 0 {
                    break;
                }
                to_visit_offset -= 1;
                current_node_index = nodes_to_visit[to_visit_offset];
            }
        }
    }
}

impl SpatialQuery for BVHAccel {
    fn probe_down(&self, origin: &Point3f, max_distance: Float, room_filter: Option<usize>) -> Option<SurfaceHit> {
        let mut ray = Ray::new(*origin, DOWN, max_distance);
        let mut handler = GroundHitHandler::new(room_filter);
        self.trace(&mut ray, &mut handler);
        handler.into_hit(&DOWN)
    }

    fn trace_direction(&self, origin: &Point3f, direction: &Vector3f, max_distance: Float) -> Option<RoomHit> {
        let mut ray = Ray::new(*origin, *direction, max_distance);
        let mut handler = RoomIdHitHandler::new();
        self.trace(&mut ray, &mut handler);
        handler.into_hit()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
