//! Procedural meshes, useful for testing and benchmarking
use crate::Mesh;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Builds a flat disc in the XY plane, centered at the origin
///
/// Vertex 0 is the center; it is surrounded by `rings` concentric rings of
/// `segments` vertices each, evenly spaced out to `radius`.  Triangles are
/// wound counter-clockwise when seen from `+Z`.
///
/// # Panics
/// If `rings` is zero or `segments` is less than 3
pub fn disc(radius: f64, rings: usize, segments: usize) -> Mesh {
    assert!(rings >= 1);
    assert!(segments >= 3);

    let mut vertices = vec![Vector3::zeros()];
    for ring in 1..=rings {
        let r = radius * ring as f64 / rings as f64;
        for k in 0..segments {
            let a = 2.0 * PI * k as f64 / segments as f64;
            vertices.push(Vector3::new(r * a.cos(), r * a.sin(), 0.0));
        }
    }

    let at = |ring: usize, k: usize| 1 + (ring - 1) * segments + k % segments;
    let mut triangles = vec![];
    for k in 0..segments {
        triangles.push(Vector3::new(0, at(1, k), at(1, k + 1)));
    }
    for ring in 1..rings {
        for k in 0..segments {
            let (i0, i1) = (at(ring, k), at(ring, k + 1));
            let (o0, o1) = (at(ring + 1, k), at(ring + 1, k + 1));
            triangles.push(Vector3::new(i0, o0, o1));
            triangles.push(Vector3::new(i0, o1, i1));
        }
    }
    Mesh::from_valid(vertices, triangles)
}

/// Builds a UV sphere centered at the origin, with outward-facing triangles
///
/// Vertex 0 is the north pole (`+Z`) and the last vertex is the south pole;
/// between them are `stacks - 1` rings of `slices` vertices each.
///
/// # Panics
/// If `stacks` is less than 2 or `slices` is less than 3
pub fn uv_sphere(radius: f64, stacks: usize, slices: usize) -> Mesh {
    assert!(stacks >= 2);
    assert!(slices >= 3);

    let mut vertices = vec![Vector3::new(0.0, 0.0, radius)];
    for i in 1..stacks {
        let theta = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            let phi = 2.0 * PI * j as f64 / slices as f64;
            vertices.push(
                Vector3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                ) * radius,
            );
        }
    }
    let south = vertices.len();
    vertices.push(Vector3::new(0.0, 0.0, -radius));

    let at = |ring: usize, j: usize| 1 + (ring - 1) * slices + j % slices;
    let mut triangles = vec![];
    for j in 0..slices {
        triangles.push(Vector3::new(0, at(1, j), at(1, j + 1)));
    }
    for ring in 1..stacks - 1 {
        for j in 0..slices {
            let (u0, u1) = (at(ring, j), at(ring, j + 1));
            let (l0, l1) = (at(ring + 1, j), at(ring + 1, j + 1));
            triangles.push(Vector3::new(u0, l0, l1));
            triangles.push(Vector3::new(u0, l1, u1));
        }
    }
    for j in 0..slices {
        let last = stacks - 1;
        triangles.push(Vector3::new(south, at(last, j + 1), at(last, j)));
    }
    Mesh::from_valid(vertices, triangles)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::Triangle;
    use approx::assert_relative_eq;

    /// Signed volume, which is positive for outward-facing triangles
    fn volume(mesh: &Mesh) -> f64 {
        (0..mesh.triangles().len())
            .map(|t| {
                let [a, b, c] = mesh.corners(t);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    #[test]
    fn disc_shape() {
        let mesh = disc(10.0, 4, 16);
        assert_eq!(mesh.vertices().len(), 1 + 4 * 16);
        assert_eq!(mesh.triangles().len(), 16 + 2 * 3 * 16);
        for t in 0..mesh.triangles().len() {
            let n = Triangle(mesh.corners(t)).normal().unwrap();
            assert_relative_eq!(n, Vector3::z(), epsilon = 1e-12);
        }
    }

    #[test]
    fn sphere_shape() {
        let mesh = uv_sphere(2.0, 8, 12);
        assert_eq!(mesh.vertices().len(), 2 + 7 * 12);
        assert_eq!(mesh.triangles().len(), 2 * 12 + 2 * 6 * 12);

        // Closed and outward-facing, so every edge is shared by exactly two
        // triangles and the signed volume is close to the true volume
        assert_eq!(mesh.edge_count() * 2, mesh.triangles().len() * 3);
        let v = volume(&mesh);
        assert!(v > 0.0);
        assert!(v < 4.0 / 3.0 * PI * 8.0);
        for t in 0..mesh.triangles().len() {
            let [a, b, c] = mesh.corners(t);
            let n = Triangle::new(a, b, c).area_normal();
            assert!(n.dot(&(a + b + c)) > 0.0);
        }
    }
}
