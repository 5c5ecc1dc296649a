//! 3-D Axis Aligned Bounding Boxes.

use super::{Point3, Point3f, Ray, Vector3, Vector3f};
use crate::math::*;
use num_traits::{Bounded, Num};

/// 3-D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3<T> {
    /// Minimum bounds.
    pub p_min: Point3<T>,

    /// Maximum bounds.
    pub p_max: Point3<T>,
}

/// 3-D bounding box containing `Float` points.
pub type Bounds3f = Bounds3<Float>;

/// Union of a bounding box with another item.
pub trait Union<T> {
    /// Returns the smallest bounding box containing `self` and `other`.
    ///
    /// * `other` - The other item.
    fn union(&self, other: &T) -> Self;
}

impl Bounds3f {
    /// An empty bounding box.
    pub const EMPTY: Self = Self {
        p_min: Point3 {
            x: Float::MAX,
            y: Float::MAX,
            z: Float::MAX,
        },
        p_max: Point3 {
            x: Float::MIN,
            y: Float::MIN,
            z: Float::MIN,
        },
    };

    /// Returns the surface area of the six faces of the box.
    pub fn surface_area(&self) -> Float {
        if self.is_empty() {
            0.0
        } else {
            let d = self.diagonal();
            2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
        }
    }

    /// Returns the continuous position of a point relative to the corners of the box, where a point at the minimum
    /// corner has offset (0, 0, 0) and a point at the maximum corner has offset (1, 1, 1).
    ///
    /// * `p` - The point.
    pub fn offset(&self, p: &Point3f) -> Vector3f {
        let mut o = *p - self.p_min;
        if self.p_max.x > self.p_min.x {
            o.x /= self.p_max.x - self.p_min.x;
        }
        if self.p_max.y > self.p_min.y {
            o.y /= self.p_max.y - self.p_min.y;
        }
        if self.p_max.z > self.p_min.z {
            o.z /= self.p_max.z - self.p_min.z;
        }
        o
    }

    /// Returns the centroid of the box.
    pub fn centroid(&self) -> Point3f {
        0.5 * (self.p_min + self.p_max)
    }

    /// Returns true if a ray intersects the box. Uses the precomputed reciprocal of the ray direction and the sign of
    /// each direction component.
    ///
    /// * `ray`        - The ray.
    /// * `inv_dir`    - Reciprocal of the ray direction.
    /// * `dir_is_neg` - 1 for each negative direction component, 0 otherwise.
    pub fn intersect_p_inv(&self, ray: &Ray, inv_dir: &Vector3f, dir_is_neg: [u8; 3]) -> bool {
        let corner = |is_max: u8| if is_max == 1 { self.p_max } else { self.p_min };

        // Check for ray intersection against x and y slabs.
        let mut t_min = (corner(dir_is_neg[0]).x - ray.o.x) * inv_dir.x;
        let mut t_max = (corner(1 - dir_is_neg[0]).x - ray.o.x) * inv_dir.x;
        let ty_min = (corner(dir_is_neg[1]).y - ray.o.y) * inv_dir.y;
        let mut ty_max = (corner(1 - dir_is_neg[1]).y - ray.o.y) * inv_dir.y;

        // Update t_max and ty_max to ensure robust bounds intersection.
        t_max *= 1.0 + 2.0 * gamma(3);
        ty_max *= 1.0 + 2.0 * gamma(3);
        if t_min > ty_max || ty_min > t_max {
            return false;
        }
        if ty_min > t_min {
            t_min = ty_min;
        }
        if ty_max < t_max {
            t_max = ty_max;
        }

        // Check for ray intersection against z slab.
        let tz_min = (corner(dir_is_neg[2]).z - ray.o.z) * inv_dir.z;
        let mut tz_max = (corner(1 - dir_is_neg[2]).z - ray.o.z) * inv_dir.z;
        tz_max *= 1.0 + 2.0 * gamma(3);
        if t_min > tz_max || tz_min > t_max {
            return false;
        }
        if tz_min > t_min {
            t_min = tz_min;
        }
        if tz_max < t_max {
            t_max = tz_max;
        }

        t_min < ray.t_max && t_max > 0.0
    }
}

impl<T: Num + Bounded + PartialOrd + Copy> Bounds3<T> {
    /// Returns a bounding box enclosing two points.
    ///
    /// * `p1` - First point.
    /// * `p2` - Second point.
    pub fn new(p1: Point3<T>, p2: Point3<T>) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Returns an empty bounding box where minimum is greater than maximum.
    pub fn empty() -> Self {
        Self {
            p_min: Point3::new(T::max_value(), T::max_value(), T::max_value()),
            p_max: Point3::new(T::min_value(), T::min_value(), T::min_value()),
        }
    }

    /// Returns true if the minimum exceeds the maximum along any axis.
    pub fn is_empty(&self) -> bool {
        self.p_max.x < self.p_min.x || self.p_max.y < self.p_min.y || self.p_max.z < self.p_min.z
    }

    /// Returns the vector from the minimum to the maximum corner.
    pub fn diagonal(&self) -> Vector3<T> {
        self.p_max - self.p_min
    }

    /// Returns the axis with the largest extent.
    pub fn maximum_extent(&self) -> Axis {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns true if the point lies inside or on the boundary of the box.
    ///
    /// * `p` - The point.
    pub fn contains(&self, p: &Point3<T>) -> bool {
        p.x >= self.p_min.x
            && p.x <= self.p_max.x
            && p.y >= self.p_min.y
            && p.y <= self.p_max.y
            && p.z >= self.p_min.z
            && p.z <= self.p_max.z
    }
}

impl<T: Num + Bounded + PartialOrd + Copy> From<Point3<T>> for Bounds3<T> {
    /// Returns a degenerate bounding box enclosing a single point.
    fn from(p: Point3<T>) -> Self {
        Self { p_min: p, p_max: p }
    }
}

impl<T: Num + Bounded + PartialOrd + Copy> Union<Point3<T>> for Bounds3<T> {
    fn union(&self, other: &Point3<T>) -> Self {
        Self {
            p_min: self.p_min.min(other),
            p_max: self.p_max.max(other),
        }
    }
}

impl<T: Num + Bounded + PartialOrd + Copy> Union<Bounds3<T>> for Bounds3<T> {
    fn union(&self, other: &Bounds3<T>) -> Self {
        Self {
            p_min: self.p_min.min(&other.p_min),
            p_max: self.p_max.max(&other.p_max),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
