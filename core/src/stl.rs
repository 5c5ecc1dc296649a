//! Binary STL Export
//!
//! Debug meshes (collision geometry and visibility rays) are written as binary STL in a Z-up frame.

use crate::geometry::*;
use crate::math::Float;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Text at the start of the 80 byte STL header.
const STL_HEADER: &[u8] = b"Exported from PVSGen";

/// Thickness of the prisms representing debug rays.
pub const RAY_THICKNESS: Float = 0.25;

/// A triangle of a debug mesh.
pub type Facet = [Point3f; 3];

/// Converts a Y-up point to the Z-up frame STL viewers expect.
///
/// * `p` - The point.
fn to_z_up(p: &Point3f) -> Point3f {
    Point3f::new(p.x, p.z, p.y)
}

/// Writes facets as binary STL.
///
/// * `writer` - Destination.
/// * `facets` - Triangles in Y-up world space.
pub fn write_stl<W: Write>(writer: &mut W, facets: &[Facet]) -> io::Result<()> {
    let mut header = [0_u8; 80];
    header[..STL_HEADER.len()].copy_from_slice(STL_HEADER);
    writer.write_all(&header)?;

    let count = u32::try_from(facets.len()).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many facets"))?;
    writer.write_u32::<LittleEndian>(count)?;

    for facet in facets {
        let [a, b, c] = [to_z_up(&facet[0]), to_z_up(&facet[1]), to_z_up(&facet[2])];
        let n = (c - b).cross(&(a - b)).normalize();
        for v in [n.x, n.y, n.z, a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z] {
            writer.write_f32::<LittleEndian>(v)?;
        }
        writer.write_u16::<LittleEndian>(0)?; // No attributes.
    }

    Ok(())
}

/// Writes facets to a binary STL file.
///
/// * `path`   - Output file path.
/// * `facets` - Triangles in Y-up world space.
pub fn export_stl<P: AsRef<Path>>(path: P, facets: &[Facet]) -> io::Result<()> {
    let path = path.as_ref();
    info!("Writing {} triangles to '{}'", facets.len(), path.display());

    let mut writer = BufWriter::new(File::create(path)?);
    write_stl(&mut writer, facets)?;
    writer.flush()
}

/// Returns the facets of the level's collision geometry.
///
/// * `triangles` - Collidable triangles.
pub fn collision_facets(triangles: &[Triangle]) -> Vec<Facet> {
    triangles.iter().map(|t| t.p).collect()
}

/// Builds thin triangular prisms along rays so they can be inspected in a mesh viewer.
#[derive(Clone, Debug, Default)]
pub struct RayMeshBuilder {
    /// Accumulated facets.
    pub facets: Vec<Facet>,
}

impl RayMeshBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prism from `start` to `hit`.
    ///
    /// * `start`     - Ray origin.
    /// * `hit`       - Intersection point.
    /// * `thickness` - Prism thickness.
    pub fn add_ray(&mut self, start: Point3f, hit: Point3f, thickness: Float) {
        let direction = (hit - start).normalize();
        let up = if direction.y.abs() > 0.99 {
            Vector3f::new(0.0, 0.0, 1.0)
        } else {
            Vector3f::new(0.0, 1.0, 0.0)
        };

        let half = thickness / 2.0;
        let right = direction.cross(&up).normalize() * half;
        let offset_up = right.cross(&direction).normalize() * half;

        let p1 = start + right;
        let p2 = start - right * 0.5 + offset_up;
        let p3 = start - right * 0.5 - offset_up;
        let p4 = hit + right;
        let p5 = hit - right * 0.5 + offset_up;
        let p6 = hit - right * 0.5 - offset_up;

        self.facets.extend_from_slice(&[
            [p1, p2, p4],
            [p2, p5, p4],
            [p2, p3, p5],
            [p3, p6, p5],
            [p3, p1, p6],
            [p1, p4, p6],
        ]);
    }

    /// Add every ray of a debug ray list.
    ///
    /// * `rays` - Debug rays.
    pub fn add_rays(&mut self, rays: &[crate::query::DebugRay]) {
        for ray in rays {
            self.add_ray(ray.origin, ray.hit, RAY_THICKNESS);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use float_cmp::*;
    use std::io::Cursor;

    #[test]
    fn binary_layout() {
        let facet = [
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
        ];
        let mut buf = vec![];
        write_stl(&mut buf, &[facet, facet]).unwrap();
        assert_eq!(buf.len(), 80 + 4 + 2 * 50);
        assert!(buf.starts_with(b"Exported from PVSGen"));
        assert!(buf[STL_HEADER.len()..80].iter().all(|&b| b == 0));

        let mut cursor = Cursor::new(&buf[80..]);
        assert_eq!(cursor.read_u32::<LittleEndian>().unwrap(), 2);
        let n: Vec<f32> = (0..3).map(|_| cursor.read_f32::<LittleEndian>().unwrap()).collect();
        // Z-up facet lies in the z = 0 plane.
        assert!(approx_eq!(f32, n[2].abs(), 1.0, epsilon = 0.0001));
        // Second vertex (1, 0, 0) after the normal and the first vertex.
        let v: Vec<f32> = (0..6).map(|_| cursor.read_f32::<LittleEndian>().unwrap()).collect();
        assert_eq!(&v[3..], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn third_vertex_is_swizzled_to_z_up() {
        let p = to_z_up(&Point3f::new(1.0, 2.0, 3.0));
        assert_eq!(p, Point3f::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn ray_prism_has_six_facets_around_the_ray() {
        let mut builder = RayMeshBuilder::new();
        let start = Point3f::new(0.0, 0.0, 0.0);
        let hit = Point3f::new(10.0, 0.0, 0.0);
        builder.add_ray(start, hit, RAY_THICKNESS);
        builder.add_ray(start, Point3f::new(0.0, 5.0, 0.0), RAY_THICKNESS);
        assert_eq!(builder.facets.len(), 12);
        for facet in &builder.facets[..6] {
            for p in facet {
                assert!(p.distance(&start) <= RAY_THICKNESS || p.distance(&hit) <= RAY_THICKNESS);
            }
        }
        for facet in &builder.facets[6..] {
            for p in facet {
                assert!(!p.has_nans());
            }
        }
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("physics.stl");
        let t = Triangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            0,
        );
        export_stl(&path, &collision_facets(&[t])).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 134);
    }
}
