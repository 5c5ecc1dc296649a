//! Surface Area Heuristic Algorithm

use super::common::*;
use order_stat::kth_by;
use pvs_core::geometry::*;
use pvs_core::math::*;
use shared_arena::{ArenaArc, SharedArena};
use std::cmp::Ordering;

const N_BUCKETS: usize = 12;

/// Recursively build the BVH structure for either Middle, EqualCounts or SAH
/// algorithm.
///
/// * `arena`             - Shared arena for memory allocations.
/// * `triangles`         - The triangles to partition.
/// * `split_method`      - Middle|EqualCounts|SAH
/// * `max_prims_in_node` - Maximum number of triangles in the node.
/// * `primitive_info`    - Triangle information.
/// * `start`             - Starting index. For first call it should be 0.
/// * `end`               - Ending index + 1. For first call it should be number
///                         of triangles.
/// * `counts`            - Used to return node counts.
/// * `ordered`           - Used to return a list of triangles ordered such that
///                         triangles in leaf nodes occupy contiguous ranges in
///                         the vector.
#[allow(clippy::too_many_arguments)]
pub fn build(
    arena: &SharedArena<BVHBuildNode>,
    triangles: &[Triangle],
    split_method: SplitMethod,
    max_prims_in_node: u8,
    primitive_info: &mut [BVHPrimitiveInfo],
    start: usize,
    end: usize,
    counts: &mut BuildCounts,
    ordered: &mut Vec<Triangle>,
) -> ArenaArc<BVHBuildNode> {
    // Compute bounds of all triangles in BVH node.
    let bounds = primitive_info[start..end]
        .iter()
        .fold(Bounds3f::EMPTY, |b, info| b.union(&info.bounds));

    let mut dim = Axis::default(); // Will be set if we need to make interior node.

    let n_primitives = end - start;

    let interior_midpoint = if n_primitives == 1 {
        // Create leaf BVHBuildNode.
        None
    } else {
        // Compute bound of triangle centroids, choose split dimension dim.
        let centroid_bounds = primitive_info[start..end]
            .iter()
            .fold(Bounds3f::EMPTY, |b, info| b.union(&info.centroid));
        dim = centroid_bounds.maximum_extent();

        // Partition triangles into two sets and build children.
        if centroid_bounds.p_max[dim] == centroid_bounds.p_min[dim] {
            // Create leaf BVHBuildNode.
            None
        } else {
            match split_method {
                SplitMethod::Middle => Some(split_middle(primitive_info, start, end, dim, &centroid_bounds)),
                SplitMethod::EqualCounts => Some(split_equal_counts(primitive_info, start, end, dim)),
                SplitMethod::SAH => split_sah(
                    primitive_info,
                    start,
                    end,
                    dim,
                    &centroid_bounds,
                    &bounds,
                    max_prims_in_node,
                ),
            }
        }
    };

    counts.total_nodes += 1;

    // A leaf holds at most `u16::MAX` triangles; larger sets with coincident centroids are split in half.
    let leaf_count = match interior_midpoint {
        None => u16::try_from(n_primitives).ok(),
        Some(_) => None,
    };

    if let Some(n) = leaf_count {
        // Create leaf BVHBuildNode.
        counts.leaf_nodes += 1;
        let first_prim_offset = ordered.len();
        ordered.extend(
            primitive_info[start..end]
                .iter()
                .map(|info| triangles[info.primitive_number]),
        );
        arena.alloc_arc(BVHBuildNode::new_leaf_node(first_prim_offset, n, bounds))
    } else {
        let mid = interior_midpoint.unwrap_or((start + end) / 2);
        // Create interior BVHBuildNode.
        let c0 = build(
            arena,
            triangles,
            split_method,
            max_prims_in_node,
            primitive_info,
            start,
            mid,
            counts,
            ordered,
        );
        let c1 = build(
            arena,
            triangles,
            split_method,
            max_prims_in_node,
            primitive_info,
            mid,
            end,
            counts,
            ordered,
        );
        arena.alloc_arc(BVHBuildNode::new_interior_node(dim, c0, c1))
    }
}

/// Split using planes at the midpoint of the centroid bounds.
///
/// * `primitive_info`  - Slice containing all triangle info.
/// * `start`           - Starting index in primitive_info.
/// * `end`             - Ending index + 1 in primitive_info.
/// * `dim`             - Axis used to partition triangles.
/// * `centroid_bounds` - Bounding box of triangle centroids in primitive_info
///                       from start to end.
fn split_middle(
    primitive_info: &mut [BVHPrimitiveInfo],
    start: usize,
    end: usize,
    dim: Axis,
    centroid_bounds: &Bounds3f,
) -> usize {
    let pmid = (centroid_bounds.p_min[dim] + centroid_bounds.p_max[dim]) / 2.0;
    let infos = primitive_info[start..end].iter_mut();
    let split = itertools::partition(infos, |pi| pi.centroid[dim] < pmid);
    let mid = start + split;

    if mid != start && mid != end {
        mid
    } else {
        // Lots of triangles with large overlapping bounding boxes may fail to
        // partition; fall back to EqualCounts.
        split_equal_counts(primitive_info, start, end, dim)
    }
}

/// Partition triangles into equally sized subsets along `dim`.
///
/// * `primitive_info`  - Slice containing all triangle info.
/// * `start`           - Starting index in primitive_info.
/// * `end`             - Ending index + 1 in primitive_info.
/// * `dim`             - Axis used to partition triangles.
fn split_equal_counts(primitive_info: &mut [BVHPrimitiveInfo], start: usize, end: usize, dim: Axis) -> usize {
    let mid = (start + end) / 2;
    kth_by(&mut primitive_info[start..end], mid - start, |a, b| {
        a.centroid[dim]
            .partial_cmp(&b.centroid[dim])
            .unwrap_or(Ordering::Equal)
    });
    mid
}

/// Returns the SAH bucket of a centroid.
///
/// * `centroid_bounds` - Bounding box of the centroids being partitioned.
/// * `centroid`        - The centroid.
/// * `dim`             - Axis used to partition triangles.
fn bucket_index(centroid_bounds: &Bounds3f, centroid: &Point3f, dim: Axis) -> usize {
    let b = (N_BUCKETS as Float * centroid_bounds.offset(centroid)[dim]) as usize;
    min(b, N_BUCKETS - 1)
}

/// Partition triangles using Surface Area Heuristic.
///
/// If the algorithm is able to partition triangles it will return the pivot
/// index (mid) for interior node creation; otherwise None is returned to
/// indicate leaf node creation.
///
/// * `primitive_info`    - Slice containing all triangle info.
/// * `start`             - Start index in primitive_info.
/// * `end`               - End index in primitive_info.
/// * `dim`               - Axis used to partition triangles.
/// * `centroid_bounds`   - Bounding box of triangle centroids in primitive_info
///                         from start to end.
/// * `bounds`            - Bound box of all triangles in BVH node.
/// * `max_prims_in_node` - Maximum triangles allowed in node.
fn split_sah(
    primitive_info: &mut [BVHPrimitiveInfo],
    start: usize,
    end: usize,
    dim: Axis,
    centroid_bounds: &Bounds3f,
    bounds: &Bounds3f,
    max_prims_in_node: u8,
) -> Option<usize> {
    let n_primitives = end - start;
    if n_primitives <= 2 {
        // Partition triangles into equally-sized subsets.
        return Some(split_equal_counts(primitive_info, start, end, dim));
    }

    // Initialize BucketInfo for SAH partition buckets.
    let mut buckets = [BucketInfo::default(); N_BUCKETS];
    for info in primitive_info[start..end].iter() {
        let b = bucket_index(centroid_bounds, &info.centroid, dim);
        buckets[b].count += 1;
        buckets[b].bounds = buckets[b].bounds.union(&info.bounds);
    }

    // Compute costs for splitting after each bucket.
    let mut cost = [0.0 as Float; N_BUCKETS - 1];
    for (i, cost_i) in cost.iter_mut().enumerate() {
        let (b0, count0) = buckets[..=i]
            .iter()
            .fold((Bounds3f::EMPTY, 0), |(b, c), bucket| (b.union(&bucket.bounds), c + bucket.count));
        let (b1, count1) = buckets[i + 1..]
            .iter()
            .fold((Bounds3f::EMPTY, 0), |(b, c), bucket| (b.union(&bucket.bounds), c + bucket.count));

        *cost_i = 1.0
            + (count0 as Float * b0.surface_area() + count1 as Float * b1.surface_area()) / bounds.surface_area();
    }

    // Find bucket to split at that minimizes SAH metric.
    let mut min_cost = cost[0];
    let mut min_cost_split_bucket = 0;
    for (i, cost_i) in cost.iter().enumerate().skip(1) {
        if *cost_i < min_cost {
            min_cost = *cost_i;
            min_cost_split_bucket = i;
        }
    }

    // Either create leaf or split triangles at selected SAH bucket.
    let leaf_cost = n_primitives as Float;
    if n_primitives > max_prims_in_node as usize || min_cost < leaf_cost {
        let infos = primitive_info[start..end].iter_mut();
        let split = itertools::partition(infos, |pi| {
            bucket_index(centroid_bounds, &pi.centroid, dim) <= min_cost_split_bucket
        });
        Some(start + split)
    } else {
        None
    }
}
