//! Triangle / triangle intersection tests
//!
//! Both tests first reject triangle pairs where one triangle lies entirely
//! on one side of the other's plane, then compare the intervals that each
//! triangle cuts from the line where the two planes meet.  Coplanar pairs
//! fall back to a 2D test in the plane's dominant projection.
use super::{Triangle, tolerance};
use nalgebra::{Vector2, Vector3};

/// Result of [`triangle_intersection`]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TriTriIntersection {
    /// The triangles do not touch
    Disjoint,
    /// The triangles are coplanar and overlap
    Coplanar,
    /// The triangles cross along the given segment
    Segment(Vector3<f64>, Vector3<f64>),
}

/// Checks whether two triangles intersect, without any divisions
pub fn triangles_intersect(v: &Triangle, u: &Triangle) -> bool {
    let tol = tolerance(edge_scale(v, u));
    let (n1, du) = distances(v, u, tol);
    if same_side(&du) {
        return false;
    }
    let (n2, dv) = distances(u, v, tol);
    if same_side(&dv) {
        return false;
    }

    let axis = dominant_axis(&n1.cross(&n2));
    let vp = v.0.map(|p| p[axis]);
    let up = u.0.map(|p| p[axis]);

    let (Some(a), Some(b)) = (pivot(&dv), pivot(&du)) else {
        return coplanar(&n1, v, u);
    };
    let (va, vb, vc, x0, x1) = scaled_interval(a, &vp, &dv);
    let (ua, ub, uc, y0, y1) = scaled_interval(b, &up, &du);

    let xx = x0 * x1;
    let yy = y0 * y1;
    let xxyy = xx * yy;
    let s1 = sorted(va * xxyy + vb * x1 * yy, va * xxyy + vc * x0 * yy);
    let s2 = sorted(ua * xxyy + ub * xx * y1, ua * xxyy + uc * xx * y0);
    !(s1[1] < s2[0] || s2[1] < s1[0])
}

/// Checks whether two triangles intersect, returning the shared segment
pub fn triangle_intersection(
    v: &Triangle,
    u: &Triangle,
) -> TriTriIntersection {
    let tol = tolerance(edge_scale(v, u));
    let (n1, du) = distances(v, u, tol);
    if same_side(&du) {
        return TriTriIntersection::Disjoint;
    }
    let (n2, dv) = distances(u, v, tol);
    if same_side(&dv) {
        return TriTriIntersection::Disjoint;
    }

    let axis = dominant_axis(&n1.cross(&n2));
    let (Some(a), Some(b)) = (pivot(&dv), pivot(&du)) else {
        return if coplanar(&n1, v, u) {
            TriTriIntersection::Coplanar
        } else {
            TriTriIntersection::Disjoint
        };
    };
    let (i1, pa) = interval_with_points(a, v, axis, &dv);
    let (i2, pb) = interval_with_points(b, u, axis, &du);

    let (i1, smallest1) = sorted_with_index(i1);
    let (i2, smallest2) = sorted_with_index(i2);
    if i1[1] < i2[0] || i2[1] < i1[0] {
        return TriTriIntersection::Disjoint;
    }

    // Pick the inner two of the four interval endpoints
    let (start, end) = if i2[0] < i1[0] {
        let start = pa[smallest1];
        let end = if i2[1] < i1[1] {
            pb[1 - smallest2]
        } else {
            pa[1 - smallest1]
        };
        (start, end)
    } else {
        let start = pb[smallest2];
        let end = if i2[1] > i1[1] {
            pa[1 - smallest1]
        } else {
            pb[1 - smallest2]
        };
        (start, end)
    };
    TriTriIntersection::Segment(start, end)
}

/// Longest edge of either triangle
fn edge_scale(v: &Triangle, u: &Triangle) -> f64 {
    [v, u]
        .into_iter()
        .flat_map(|t| {
            (0..3).map(move |i| (t.0[(i + 1) % 3] - t.0[i]).norm())
        })
        .fold(0.0, f64::max)
}

/// Returns the plane normal of `t` and the scaled signed distances of
/// `other`'s corners to that plane, snapping near-zero distances to zero
fn distances(
    t: &Triangle,
    other: &Triangle,
    tol: f64,
) -> (Vector3<f64>, [f64; 3]) {
    let [a, b, c] = &t.0;
    let n = (b - a).cross(&(c - a));
    let d = -n.dot(a);
    let eps = tol * n.norm();
    let dist = other.0.map(|p| {
        let v = n.dot(&p) + d;
        if v.abs() < eps { 0.0 } else { v }
    });
    (n, dist)
}

fn same_side(d: &[f64; 3]) -> bool {
    d[0] * d[1] > 0.0 && d[0] * d[2] > 0.0
}

fn dominant_axis(d: &Vector3<f64>) -> usize {
    d.iamax()
}

/// Orders corners as `[lone, a, b]`, where `lone` is on its own side of the
/// other triangle's plane
///
/// Returns `None` if all three corners are on the plane.
fn pivot(d: &[f64; 3]) -> Option<[usize; 3]> {
    if d[0] * d[1] > 0.0 {
        Some([2, 0, 1])
    } else if d[0] * d[2] > 0.0 {
        Some([1, 0, 2])
    } else if d[1] * d[2] > 0.0 || d[0] != 0.0 {
        Some([0, 1, 2])
    } else if d[1] != 0.0 {
        Some([1, 0, 2])
    } else if d[2] != 0.0 {
        Some([2, 0, 1])
    } else {
        None
    }
}

/// Interval terms for the division-free test
fn scaled_interval(
    [l, a, b]: [usize; 3],
    p: &[f64; 3],
    d: &[f64; 3],
) -> (f64, f64, f64, f64, f64) {
    (
        p[l],
        (p[a] - p[l]) * d[l],
        (p[b] - p[l]) * d[l],
        d[l] - d[a],
        d[l] - d[b],
    )
}

/// Interval along the plane / plane line, with the matching 3D points
fn interval_with_points(
    [l, a, b]: [usize; 3],
    t: &Triangle,
    axis: usize,
    d: &[f64; 3],
) -> ([f64; 2], [Vector3<f64>; 2]) {
    let p = t.0.map(|v| v[axis]);
    let along = |o: usize| {
        let s = d[l] / (d[l] - d[o]);
        (p[l] + (p[o] - p[l]) * s, t.0[l] + (t.0[o] - t.0[l]) * s)
    };
    let (ia, pa) = along(a);
    let (ib, pb) = along(b);
    ([ia, ib], [pa, pb])
}

fn sorted(a: f64, b: f64) -> [f64; 2] {
    if a > b { [b, a] } else { [a, b] }
}

fn sorted_with_index(i: [f64; 2]) -> ([f64; 2], usize) {
    if i[0] > i[1] {
        ([i[1], i[0]], 1)
    } else {
        (i, 0)
    }
}

/// 2D overlap test for two triangles sharing a plane with normal `n`
fn coplanar(n: &Vector3<f64>, v: &Triangle, u: &Triangle) -> bool {
    let a = n.abs();
    let (i0, i1) = if a.x > a.y {
        if a.x > a.z { (1, 2) } else { (0, 1) }
    } else if a.z > a.y {
        (0, 1)
    } else {
        (0, 2)
    };
    let v = v.0.map(|p| Vector2::new(p[i0], p[i1]));
    let u = u.0.map(|p| Vector2::new(p[i0], p[i1]));

    for i in 0..3 {
        if edge_against_edges(&v[i], &v[(i + 1) % 3], &u) {
            return true;
        }
    }
    point_in_triangle(&v[0], &u) || point_in_triangle(&u[0], &v)
}

fn edge_against_edges(
    v0: &Vector2<f64>,
    v1: &Vector2<f64>,
    u: &[Vector2<f64>; 3],
) -> bool {
    let a = v1 - v0;
    (0..3).any(|i| edge_edge(v0, &a, &u[i], &u[(i + 1) % 3]))
}

fn edge_edge(
    v0: &Vector2<f64>,
    a: &Vector2<f64>,
    u0: &Vector2<f64>,
    u1: &Vector2<f64>,
) -> bool {
    let b = u0 - u1;
    let c = v0 - u0;
    let f = a.y * b.x - a.x * b.y;
    let d = b.y * c.x - b.x * c.y;
    if (f > 0.0 && d >= 0.0 && d <= f) || (f < 0.0 && d <= 0.0 && d >= f) {
        let e = a.x * c.y - a.y * c.x;
        if f > 0.0 {
            e >= 0.0 && e <= f
        } else {
            e <= 0.0 && e >= f
        }
    } else {
        false
    }
}

fn point_in_triangle(p: &Vector2<f64>, t: &[Vector2<f64>; 3]) -> bool {
    let side = |s: &Vector2<f64>, e: &Vector2<f64>| {
        let a = e.y - s.y;
        let b = -(e.x - s.x);
        let c = -a * s.x - b * s.y;
        a * p.x + b * p.y + c
    };
    let d0 = side(&t[0], &t[1]);
    let d1 = side(&t[1], &t[2]);
    let d2 = side(&t[2], &t[0]);
    d0 * d1 > 0.0 && d0 * d2 > 0.0
}
