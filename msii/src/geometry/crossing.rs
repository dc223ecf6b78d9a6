//! Points where mesh edges cross a sphere, and the chords they bound
use super::{Sphere, Triangle};
use arrayvec::ArrayVec;
use nalgebra::Vector3;

/// Whether a crossing enters or exits the ball, walking along an edge
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrossingKind {
    /// Moving from outside to inside
    Enter,
    /// Moving from inside to outside
    Exit,
}

impl CrossingKind {
    /// Returns the opposite kind
    pub fn flip(self) -> Self {
        match self {
            CrossingKind::Enter => CrossingKind::Exit,
            CrossingKind::Exit => CrossingKind::Enter,
        }
    }
}

/// A single crossing of a segment `p → q` with a sphere
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Crossing {
    /// Position along the segment, in the range `[0, 1]`
    pub t: f64,
    /// Direction of the crossing when walking from `p` to `q`
    pub kind: CrossingKind,
}

impl Crossing {
    /// Returns the crossing's position on the segment `p → q`
    pub fn position(
        &self,
        p: &Vector3<f64>,
        q: &Vector3<f64>,
    ) -> Vector3<f64> {
        p + (q - p) * self.t
    }

    /// Returns the same crossing, seen when walking from `q` to `p`
    pub fn reversed(&self) -> Self {
        Self {
            t: 1.0 - self.t,
            kind: self.kind.flip(),
        }
    }
}

/// Finds the points where the segment `p → q` crosses the sphere
///
/// Crossings are returned in order of increasing `t`.  Endpoints are inside
/// the sphere only if they are strictly closer than its radius.  A segment
/// with both endpoints outside that only grazes the sphere (with the two
/// crossings closer together than the sphere's tolerance) is a touching
/// point and produces no crossings.
pub fn edge_crossings(
    p: &Vector3<f64>,
    q: &Vector3<f64>,
    sphere: &Sphere,
) -> ArrayVec<Crossing, 2> {
    let mut out = ArrayVec::new();
    let u = p - sphere.center;
    let v = q - sphere.center;
    let d = v - u;

    let tol = sphere.tolerance();
    let a = d.norm_squared();
    if a <= tol * tol {
        return out;
    }

    let r2 = sphere.radius * sphere.radius;
    let uu = u.norm_squared();
    let vv = v.norm_squared();

    // Roots of |u + t·d|² = r², as (-b ± root) / a
    let b = u.dot(&d);
    let root = (b * b - a * (uu - r2)).max(0.0).sqrt();
    let enter = Crossing {
        t: ((-b - root) / a).clamp(0.0, 1.0),
        kind: CrossingKind::Enter,
    };
    let exit = Crossing {
        t: ((-b + root) / a).clamp(0.0, 1.0),
        kind: CrossingKind::Exit,
    };

    match (uu < r2, vv < r2) {
        (true, true) => (),
        (true, false) => out.push(exit),
        (false, true) => out.push(enter),
        (false, false) => {
            // The closest point to the center must be strictly between the
            // endpoints, and closer than the radius
            let uv = u.dot(&v);
            let passes = uv < uu
                && uv < vv
                && (uu - r2) * (vv - r2) < (uv - r2) * (uv - r2);
            if passes && 2.0 * root > tol * a.sqrt() {
                out.push(enter);
                out.push(exit);
            }
        }
    }
    out
}

/// Pairs up crossings collected along a triangle's boundary into chords
///
/// `boundary` lists crossings in the order they are met when walking the
/// triangle's sides in winding order.  Each `Enter` crossing is paired with
/// the `Exit` crossing that cyclically precedes it, producing a chord
/// `(enter, exit)`; seen from the side the winding normal points to, chords
/// run clockwise around the sphere's center.  A triangle has at most three
/// chords, so any further pairs are ignored.
pub fn pair_chords<T: Copy>(
    boundary: &[(T, CrossingKind)],
) -> ArrayVec<(T, T), 3> {
    let mut out = ArrayVec::new();
    let n = boundary.len();
    for (i, &(item, kind)) in boundary.iter().enumerate() {
        let (prev, prev_kind) = boundary[(i + n - 1) % n];
        if kind == CrossingKind::Enter
            && prev_kind == CrossingKind::Exit
            && out.try_push((item, prev)).is_err()
        {
            break;
        }
    }
    out
}

/// Finds the chords along which a sphere cuts a triangle
///
/// See [`pair_chords`] for the orientation of the resulting chords.
pub fn triangle_chords(
    triangle: &Triangle,
    sphere: &Sphere,
) -> ArrayVec<(Vector3<f64>, Vector3<f64>), 3> {
    let mut boundary = ArrayVec::<_, 6>::new();
    for j in 0..3 {
        let p = &triangle.0[j];
        let q = &triangle.0[(j + 1) % 3];
        for c in edge_crossings(p, q, sphere) {
            boundary.push((c.position(p, q), c.kind));
        }
    }
    pair_chords(&boundary)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> Sphere {
        Sphere::new(Vector3::zeros(), 1.0)
    }

    #[test]
    fn single_crossing() {
        let p = Vector3::new(0.5, 0.0, 0.0);
        let q = Vector3::new(3.0, 0.0, 0.0);
        let c = edge_crossings(&p, &q, &unit());
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].kind, CrossingKind::Exit);
        assert_relative_eq!(
            c[0].position(&p, &q),
            Vector3::x(),
            epsilon = 1e-12
        );

        let c = edge_crossings(&q, &p, &unit());
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].kind, CrossingKind::Enter);
        assert_relative_eq!(c[0].t, 0.8);
        assert_relative_eq!(c[0].reversed().t, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn double_crossing() {
        let p = Vector3::new(-2.0, 0.5, 0.0);
        let q = Vector3::new(2.0, 0.5, 0.0);
        let c = edge_crossings(&p, &q, &unit());
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].kind, CrossingKind::Enter);
        assert_eq!(c[1].kind, CrossingKind::Exit);
        let x = 0.75f64.sqrt();
        assert_relative_eq!(
            c[0].position(&p, &q),
            Vector3::new(-x, 0.5, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            c[1].position(&p, &q),
            Vector3::new(x, 0.5, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn no_crossing() {
        let s = unit();
        let inside = edge_crossings(
            &Vector3::new(-0.5, 0.0, 0.0),
            &Vector3::new(0.5, 0.0, 0.0),
            &s,
        );
        assert!(inside.is_empty());

        let miss = edge_crossings(
            &Vector3::new(-2.0, 1.5, 0.0),
            &Vector3::new(2.0, 1.5, 0.0),
            &s,
        );
        assert!(miss.is_empty());

        // Tangent to the sphere, so it's only a touching point
        let tangent = edge_crossings(
            &Vector3::new(-2.0, 1.0, 0.0),
            &Vector3::new(2.0, 1.0, 0.0),
            &s,
        );
        assert!(tangent.is_empty());

        // Both endpoints outside, on the same side of the sphere
        let beyond = edge_crossings(
            &Vector3::new(1.5, 0.0, 0.0),
            &Vector3::new(3.0, 0.0, 0.0),
            &s,
        );
        assert!(beyond.is_empty());

        let point = edge_crossings(&Vector3::x(), &Vector3::x(), &s);
        assert!(point.is_empty());
    }

    #[test]
    fn corner_chord() {
        let t = Triangle::new(
            Vector3::zeros(),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(0.0, 2.0, 0.0),
        );
        let chords = triangle_chords(&t, &unit());
        assert_eq!(chords.len(), 1);
        let (start, end) = chords[0];
        assert_relative_eq!(start, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(end, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn side_chord() {
        let t = Triangle::new(
            Vector3::new(-2.0, -0.5, 0.0),
            Vector3::new(2.0, -0.5, 0.0),
            Vector3::new(0.0, 5.0, 0.0),
        );
        let chords = triangle_chords(&t, &unit());
        assert_eq!(chords.len(), 1);
        let x = 0.75f64.sqrt();
        let (start, end) = chords[0];
        assert_relative_eq!(
            start,
            Vector3::new(-x, -0.5, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(end, Vector3::new(x, -0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn pairing() {
        use CrossingKind::*;
        let chords =
            pair_chords(&[(0, Exit), (1, Enter), (2, Exit), (3, Enter)]);
        assert_eq!(chords.as_slice(), &[(1, 0), (3, 2)]);

        let chords = pair_chords(&[(0, Enter), (1, Exit)]);
        assert_eq!(chords.as_slice(), &[(0, 1)]);

        assert!(pair_chords::<usize>(&[]).is_empty());
    }
}
