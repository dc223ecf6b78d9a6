use crate::geometry::Sphere;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// The circular curve followed by a graph arc on the sphere's surface
///
/// An arc lies in the plane of its triangle, so it follows the circle where
/// that plane cuts the sphere.  It runs clockwise around the plane normal,
/// from `start` to `end`.
#[derive(Copy, Clone, Debug)]
pub struct ArcCurve {
    /// Start position
    pub start: Vector3<f64>,
    /// End position
    pub end: Vector3<f64>,

    /// Unit normal of the circle's plane
    normal: Vector3<f64>,
    /// Center of the circle
    center: Vector3<f64>,
    /// Radius of the circle
    radius: f64,
    /// Signed distance from the sphere's center to the circle's plane
    offset: f64,
    /// Radius of the sphere
    sphere_radius: f64,
    /// Swept angle, in the range `[0, 2π)`
    angle: f64,
}

impl ArcCurve {
    /// Builds the curve on `sphere` between two points in a plane
    pub fn new(
        sphere: &Sphere,
        start: Vector3<f64>,
        end: Vector3<f64>,
        normal: Vector3<f64>,
    ) -> Self {
        let offset = normal.dot(&(start - sphere.center));
        let center = sphere.center + normal * offset;
        let a = start - center;
        let b = end - center;
        let radius = a.norm();

        let tol = sphere.tolerance();
        let angle = if radius < tol || (end - start).norm() < tol {
            0.0
        } else {
            let mut t = (-a.cross(&b).dot(&normal)).atan2(a.dot(&b));
            if t < 0.0 {
                t += 2.0 * PI;
            }
            t
        };
        Self {
            start,
            end,
            normal,
            center,
            radius,
            offset,
            sphere_radius: sphere.radius,
            angle,
        }
    }

    /// Swept angle around the circle's center
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Length along the circle
    pub fn length(&self) -> f64 {
        self.angle * self.radius
    }

    /// Integral of geodesic curvature along the arc, on a unit sphere
    ///
    /// Positive values bend towards the left of the direction of travel,
    /// seen from outside the sphere.
    pub fn geodesic_curvature(&self) -> f64 {
        -self.offset * self.angle / self.sphere_radius
    }

    /// Unit tangent at the start of the arc
    pub fn start_tangent(&self) -> Vector3<f64> {
        self.tangent(&self.start)
    }

    /// Unit tangent at the end of the arc
    pub fn end_tangent(&self) -> Vector3<f64> {
        self.tangent(&self.end)
    }

    fn tangent(&self, p: &Vector3<f64>) -> Vector3<f64> {
        let t = (p - self.center).cross(&self.normal);
        if let Some(t) = t.try_normalize(self.radius * f64::EPSILON) {
            return t;
        }
        let chord = self.end - self.start;
        if let Some(t) = chord.try_normalize(0.0) {
            return t;
        }
        let other = if self.normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        self.normal.cross(&other).normalize()
    }
}

/// Signed angle of the turn from `a` to `b`, seen from the tip of `up`
///
/// Left turns are positive.
pub(crate) fn turning_angle(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    up: &Vector3<f64>,
) -> f64 {
    a.cross(b).dot(up).atan2(a.dot(b))
}
