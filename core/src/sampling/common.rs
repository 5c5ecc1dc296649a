//! Common sampling functions.

use crate::geometry::*;
use crate::math::*;
use crate::rng::*;

/// Uniformly sample a direction on the unit sphere using the inverse-transform construction
/// `θ = 2π·u₁`, `φ = acos(2·u₂ − 1)`.
///
/// The whole sphere is covered, not only the upper hemisphere, so rays can discover rooms that lie below the
/// sample point.
///
/// * `u1` - Uniform sample in [0, 1) for the azimuth.
/// * `u2` - Uniform sample in [0, 1) for the polar angle.
pub fn uniform_sample_sphere(u1: Float, u2: Float) -> Vector3f {
    let theta = TWO_PI * u1;
    let phi = clamp(2.0 * u2 - 1.0, -1.0, 1.0).acos();
    let sin_phi = phi.sin();
    Vector3f::new(sin_phi * theta.cos(), sin_phi * theta.sin(), phi.cos())
}

/// Draw a uniformly distributed point in the horizontal (X/Z) rectangle spanned by a bounding box. The returned
/// point's Y coordinate is the box's maximum height.
///
/// * `rng`    - Random number generator.
/// * `bounds` - The bounding box.
pub fn uniform_sample_footprint(rng: &mut RNG, bounds: &Bounds3f) -> Point3f {
    let d = bounds.diagonal();
    let px = bounds.p_min.x + rng.uniform_float() * d.x;
    let pz = bounds.p_min.z + rng.uniform_float() * d.z;
    Point3f::new(px, bounds.p_max.y, pz)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
