//! Geometric primitives and the shared tolerance policy
//!
//! Every comparison that decides whether two pieces of geometry touch goes
//! through [`tolerance`], so that the spatial filter, the sphere / triangle
//! tests, and the edge crossing solver agree at the boundary.
use nalgebra::Vector3;

mod crossing;
mod tri_tri;

pub use crossing::{
    Crossing, CrossingKind, edge_crossings, pair_chords, triangle_chords,
};
pub use tri_tri::{
    TriTriIntersection, triangle_intersection, triangles_intersect,
};

/// Relative epsilon for all geometric comparisons
pub const EPSILON: f64 = 1e-10;

/// Absolute tolerance for geometry at the given length scale
///
/// The tolerance is purely relative, so scaling a mesh and its query radii
/// by the same factor never changes the outcome of a comparison.
pub fn tolerance(scale: f64) -> f64 {
    EPSILON * scale.abs()
}

/// A sphere (or closed ball, depending on context)
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    /// Center position
    pub center: Vector3<f64>,
    /// Radius
    pub radius: f64,
}

impl Sphere {
    /// Builds a new sphere
    pub fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Tolerance used for comparisons against this sphere
    pub fn tolerance(&self) -> f64 {
        tolerance(self.radius)
    }

    /// Checks whether a point is strictly inside the sphere
    pub fn contains(&self, p: &Vector3<f64>) -> bool {
        (p - self.center).norm_squared() < self.radius * self.radius
    }

    /// Checks whether the closed ball touches the given triangle
    pub fn touches(&self, t: &Triangle) -> bool {
        let r = self.radius + self.tolerance();
        (t.closest_point(&self.center) - self.center).norm_squared() <= r * r
    }

    /// Returns the axis-aligned bounds of the sphere
    pub fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        let r = Vector3::repeat(self.radius);
        (self.center - r, self.center + r)
    }
}

/// A triangle, stored as three corner positions in winding order
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triangle(pub [Vector3<f64>; 3]);

impl Triangle {
    /// Builds a new triangle
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self([a, b, c])
    }

    /// Returns the unnormalized normal
    ///
    /// Its length is twice the triangle's area, and it points to the side
    /// from which the corners appear counter-clockwise.
    pub fn area_normal(&self) -> Vector3<f64> {
        let [a, b, c] = &self.0;
        (b - a).cross(&(c - a))
    }

    /// Returns the unit normal, or `None` for a degenerate triangle
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.area_normal();
        let len = n.norm();
        let scale = self
            .0
            .iter()
            .zip(self.0.iter().skip(1))
            .map(|(a, b)| (b - a).norm())
            .fold(0.0, f64::max);
        (len > tolerance(scale * scale)).then(|| n / len)
    }

    /// Returns the axis-aligned bounds of the triangle
    pub fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        let [a, b, c] = &self.0;
        (a.inf(b).inf(c), a.sup(b).sup(c))
    }

    /// Finds the point on the (closed) triangle closest to `p`
    pub fn closest_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let [a, b, c] = self.0;
        let ab = b - a;
        let ac = c - a;

        let ap = p - a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return a + ab * (d1 / (d1 - d3));
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && d4 >= d3 && d5 >= d6 {
            return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
        }

        let sum = va + vb + vc;
        if sum.abs() <= f64::MIN_POSITIVE {
            // Collinear corners, so pick the best of the three sides
            return [(a, b), (b, c), (c, a)]
                .into_iter()
                .map(|(s, t)| closest_on_segment(s, t, p))
                .min_by(|u, v| {
                    (u - p).norm_squared().total_cmp(&(v - p).norm_squared())
                })
                .unwrap_or(a);
        }
        a + ab * (vb / sum) + ac * (vc / sum)
    }
}

fn closest_on_segment(
    a: Vector3<f64>,
    b: Vector3<f64>,
    p: &Vector3<f64>,
) -> Vector3<f64> {
    let d = b - a;
    let len2 = d.norm_squared();
    if len2 == 0.0 {
        return a;
    }
    let t = (d.dot(&(p - a)) / len2).clamp(0.0, 1.0);
    a + d * t
}

/// The closed set of primitives used in intersection tests
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Primitive {
    /// A triangle
    Triangle(Triangle),
    /// A sphere, treated as a closed ball
    Sphere(Sphere),
}

impl Primitive {
    /// Returns the axis-aligned bounds of the primitive
    pub fn bounds(&self) -> (Vector3<f64>, Vector3<f64>) {
        match self {
            Primitive::Triangle(t) => t.bounds(),
            Primitive::Sphere(s) => s.bounds(),
        }
    }

    /// Checks whether two primitives touch
    pub fn intersects(&self, other: &Primitive) -> bool {
        match (self, other) {
            (Primitive::Triangle(a), Primitive::Triangle(b)) => {
                triangles_intersect(a, b)
            }
            (Primitive::Triangle(t), Primitive::Sphere(s))
            | (Primitive::Sphere(s), Primitive::Triangle(t)) => s.touches(t),
            (Primitive::Sphere(a), Primitive::Sphere(b)) => {
                let r = a.radius + b.radius;
                (a.center - b.center).norm() <= r + tolerance(r)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle {
        Triangle::new(Vector3::zeros(), Vector3::x(), Vector3::y())
    }

    #[test]
    fn closest_point_regions() {
        let t = unit_triangle();
        let check = |p: Vector3<f64>, expected: Vector3<f64>| {
            assert_relative_eq!(t.closest_point(&p), expected, epsilon = 1e-12)
        };
        check(Vector3::new(-1.0, -1.0, 0.0), Vector3::zeros());
        check(Vector3::new(2.0, -0.5, 0.0), Vector3::x());
        check(Vector3::new(0.5, -1.0, 3.0), Vector3::new(0.5, 0.0, 0.0));
        check(Vector3::new(1.0, 1.0, 0.0), Vector3::new(0.5, 0.5, 0.0));
        check(Vector3::new(0.25, 0.25, 2.0), Vector3::new(0.25, 0.25, 0.0));
    }

    #[test]
    fn closest_point_degenerate() {
        let t = Triangle::new(
            Vector3::zeros(),
            Vector3::x(),
            Vector3::new(2.0, 0.0, 0.0),
        );
        let p = t.closest_point(&Vector3::new(1.5, 1.0, 0.0));
        assert_relative_eq!(p, Vector3::new(1.5, 0.0, 0.0), epsilon = 1e-12);
        assert!(t.normal().is_none());
    }

    #[test]
    fn normal() {
        let n = unit_triangle().normal().unwrap();
        assert_eq!(n, Vector3::z());
        assert_relative_eq!(unit_triangle().area_normal().norm(), 1.0);
    }

    #[test]
    fn sphere_touches() {
        let t = unit_triangle();
        let s = Sphere::new(Vector3::new(0.25, 0.25, 1.0), 1.0);
        assert!(s.touches(&t));
        let s = Sphere::new(Vector3::new(0.25, 0.25, 1.5), 1.0);
        assert!(!s.touches(&t));
        assert!(s.contains(&Vector3::new(0.25, 0.25, 1.0)));
        assert!(!s.contains(&Vector3::new(0.25, 0.25, 0.5)));
    }

    #[test]
    fn primitive_dispatch() {
        let t = Primitive::Triangle(unit_triangle());
        let s =
            Primitive::Sphere(Sphere::new(Vector3::new(0.0, 0.0, 0.5), 1.0));
        let far =
            Primitive::Sphere(Sphere::new(Vector3::new(5.0, 0.0, 0.0), 1.0));
        assert!(t.intersects(&s));
        assert!(s.intersects(&t));
        assert!(!t.intersects(&far));
        assert!(!s.intersects(&far));
        assert!(t.intersects(&t));

        let (lo, hi) = s.bounds();
        assert_eq!(lo, Vector3::new(-1.0, -1.0, -0.5));
        assert_eq!(hi, Vector3::new(1.0, 1.0, 1.5));
    }
}
