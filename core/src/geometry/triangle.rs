//! Room Tagged Triangles

use super::*;
use crate::math::*;
use std::mem::size_of;

/// A closed collidable triangle owned by a room.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle {
    /// The three vertices.
    pub p: [Point3f; 3],

    /// Index of the room that owns this triangle.
    pub room: usize,
}

/// Result of a ray-triangle intersection.
#[derive(Copy, Clone, Debug)]
pub struct TriangleHit {
    /// Parametric distance along the ray.
    pub t: Float,

    /// Geometric normal of the triangle (not oriented to the ray).
    pub n: Vector3f,
}

impl Triangle {
    /// Create a new triangle.
    ///
    /// * `p0`   - First vertex.
    /// * `p1`   - Second vertex.
    /// * `p2`   - Third vertex.
    /// * `room` - Index of the owning room.
    pub fn new(p0: Point3f, p1: Point3f, p2: Point3f, room: usize) -> Self {
        Self { p: [p0, p1, p2], room }
    }

    /// Returns the bounding box of the triangle.
    pub fn world_bound(&self) -> Bounds3f {
        Bounds3f::new(self.p[0], self.p[1]).union(&self.p[2])
    }

    /// Returns the unit geometric normal (p0 -> p1) x (p0 -> p2).
    pub fn normal(&self) -> Vector3f {
        (self.p[1] - self.p[0]).cross(&(self.p[2] - self.p[0])).normalize()
    }

    /// Returns the parametric distance and geometric normal of the intersection of a ray with the triangle, if any.
    /// Uses the watertight ray-triangle test so rays hitting shared edges never slip between neighbouring
    /// triangles.
    ///
    /// * `r` - The ray.
    pub fn intersect(&self, r: &Ray) -> Option<TriangleHit> {
        let [p0, p1, p2] = self.p;

        // Translate vertices based on ray origin.
        let o = Vector3::from(r.o);
        let mut p0t = Vector3::from(p0) - o;
        let mut p1t = Vector3::from(p1) - o;
        let mut p2t = Vector3::from(p2) - o;

        // Permute components of triangle vertices and ray direction.
        let kz = r.d.abs().max_dimension();
        let kx = kz + 1;
        let ky = kx + 1;
        let d = r.d.permute(kx, ky, kz);
        p0t = p0t.permute(kx, ky, kz);
        p1t = p1t.permute(kx, ky, kz);
        p2t = p2t.permute(kx, ky, kz);

        // Apply shear transformation to translated vertex positions.
        let sx = -d.x / d.z;
        let sy = -d.y / d.z;
        let sz = 1.0 / d.z;
        p0t.x += sx * p0t.z;
        p0t.y += sy * p0t.z;
        p1t.x += sx * p1t.z;
        p1t.y += sy * p1t.z;
        p2t.x += sx * p2t.z;
        p2t.y += sy * p2t.z;

        // Compute edge function coefficients e0, e1, e2.
        let mut e0 = p1t.x * p2t.y - p1t.y * p2t.x;
        let mut e1 = p2t.x * p0t.y - p2t.y * p0t.x;
        let mut e2 = p0t.x * p1t.y - p0t.y * p1t.x;

        // Fallback to double-precision test at triangle edges.
        if size_of::<Float>() == size_of::<f32>() && (e0 == 0.0 || e1 == 0.0 || e2 == 0.0) {
            e0 = ((p1t.x as f64) * (p2t.y as f64) - (p1t.y as f64) * (p2t.x as f64)) as Float;
            e1 = ((p2t.x as f64) * (p0t.y as f64) - (p2t.y as f64) * (p0t.x as f64)) as Float;
            e2 = ((p0t.x as f64) * (p1t.y as f64) - (p0t.y as f64) * (p1t.x as f64)) as Float;
        }

        // Perform triangle edge and determinant tests.
        if (e0 < 0.0 || e1 < 0.0 || e2 < 0.0) && (e0 > 0.0 || e1 > 0.0 || e2 > 0.0) {
            return None;
        }
        let det = e0 + e1 + e2;
        if det == 0.0 {
            return None;
        }

        // Compute scaled hit distance to triangle and test against ray `t` range.
        p0t.z *= sz;
        p1t.z *= sz;
        p2t.z *= sz;
        let t_scaled = e0 * p0t.z + e1 * p1t.z + e2 * p2t.z;
        if det < 0.0 && (t_scaled >= 0.0 || t_scaled < r.t_max * det) {
            return None;
        } else if det > 0.0 && (t_scaled <= 0.0 || t_scaled > r.t_max * det) {
            return None;
        }

        let inv_det = 1.0 / det;
        let t = t_scaled * inv_det;

        // Ensure that computed triangle `t` is conservatively greater than zero.
        let max_z_t = Vector3::new(p0t.z, p1t.z, p2t.z).abs().max_component();
        let delta_z = gamma(3) * max_z_t;
        let max_x_t = Vector3::new(p0t.x, p1t.x, p2t.x).abs().max_component();
        let max_y_t = Vector3::new(p0t.y, p1t.y, p2t.y).abs().max_component();
        let delta_x = gamma(5) * (max_x_t + max_z_t);
        let delta_y = gamma(5) * (max_y_t + max_z_t);
        let delta_e = 2.0 * (gamma(2) * max_x_t * max_y_t + delta_y * max_x_t + delta_x * max_y_t);
        let max_e = Vector3::new(e0, e1, e2).abs().max_component();
        let delta_t =
            3.0 * (gamma(3) * max_e * max_z_t + delta_e * max_z_t + delta_z * max_e) * inv_det.abs();
        if t <= delta_t {
            return None;
        }

        Some(TriangleHit { t, n: self.normal() })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    fn floor(y: Float, room: usize) -> Triangle {
        Triangle::new(
            Point3f::new(-10.0, y, -10.0),
            Point3f::new(10.0, y, -10.0),
            Point3f::new(0.0, y, 10.0),
            room,
        )
    }

    #[test]
    fn downward_ray_hits_floor() {
        let r = Ray::new(Point3f::new(0.0, 5.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), 100.0);
        let hit = floor(1.0, 3).intersect(&r).unwrap();
        assert!(approx_eq!(f32, hit.t, 4.0, epsilon = 0.0001));
        assert!(approx_eq!(f32, hit.n.y.abs(), 1.0, epsilon = 0.0001));
    }

    #[test]
    fn ray_shorter_than_distance_misses() {
        let r = Ray::new(Point3f::new(0.0, 5.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), 3.0);
        assert!(floor(1.0, 0).intersect(&r).is_none());
    }

    #[test]
    fn ray_outside_triangle_misses() {
        let r = Ray::new(Point3f::new(50.0, 5.0, 0.0), Vector3f::new(0.0, -1.0, 0.0), 100.0);
        assert!(floor(1.0, 0).intersect(&r).is_none());
    }

    #[test]
    fn ray_behind_origin_misses() {
        let r = Ray::new(Point3f::new(0.0, 5.0, 0.0), Vector3f::new(0.0, 1.0, 0.0), 100.0);
        assert!(floor(1.0, 0).intersect(&r).is_none());
    }

    #[test]
    fn world_bound_encloses_vertices() {
        let b = floor(2.0, 0).world_bound();
        assert_eq!(b.p_min, Point3f::new(-10.0, 2.0, -10.0));
        assert_eq!(b.p_max, Point3f::new(10.0, 2.0, 10.0));
    }
}
