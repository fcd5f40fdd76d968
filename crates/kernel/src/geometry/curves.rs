use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::point::Point3d;
use super::range::Interval;
use super::vector::Vec3;

/// Analytic curve representations carried by edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Curve {
    Line(Line3d),
    Circle(Circle3d),
}

/// An infinite line; edges bound it with a parameter range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Line3d {
    pub origin: Point3d,
    pub direction: Vec3,
}

impl Line3d {
    /// Line through `a` towards `b`, arc-length parametrized with `a` at 0.
    pub fn from_points(a: Point3d, b: Point3d) -> Self {
        let direction = (b - a).normalized().unwrap_or(Vec3::X);
        Self { origin: a, direction }
    }

    pub fn evaluate(&self, t: f64) -> Point3d {
        self.origin + self.direction * t
    }

    pub fn parameter_of(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.direction)
    }
}

/// A circle in 3D space, parametrized by angle from `x_axis`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Circle3d {
    pub center: Point3d,
    pub normal: Vec3,
    pub radius: f64,
    pub x_axis: Vec3,
}

impl Circle3d {
    pub fn new(center: Point3d, normal: Vec3, radius: f64) -> Self {
        let normal = normal.normalized().unwrap_or(Vec3::Z);
        Self {
            center,
            normal,
            radius,
            x_axis: normal.any_perpendicular(),
        }
    }

    pub fn with_axes(center: Point3d, normal: Vec3, x_axis: Vec3, radius: f64) -> Self {
        Self {
            center,
            normal: normal.normalized().unwrap_or(Vec3::Z),
            x_axis: x_axis.normalized().unwrap_or(Vec3::X),
            radius,
        }
    }

    fn y_axis(&self) -> Vec3 {
        self.normal.cross(&self.x_axis)
    }

    pub fn evaluate(&self, t: f64) -> Point3d {
        self.center + self.x_axis * (self.radius * t.cos()) + self.y_axis() * (self.radius * t.sin())
    }

    pub fn derivative(&self, t: f64) -> Vec3 {
        self.x_axis * (-self.radius * t.sin()) + self.y_axis() * (self.radius * t.cos())
    }

    /// Angle of the projection of `p`, in `(-PI, PI]`.
    pub fn angle_of(&self, p: &Point3d) -> f64 {
        let d = *p - self.center;
        d.dot(&self.y_axis()).atan2(d.dot(&self.x_axis))
    }
}

impl Curve {
    pub fn evaluate(&self, t: f64) -> Point3d {
        match self {
            Curve::Line(l) => l.evaluate(t),
            Curve::Circle(c) => c.evaluate(t),
        }
    }

    pub fn derivative(&self, t: f64) -> Vec3 {
        match self {
            Curve::Line(l) => l.direction,
            Curve::Circle(c) => c.derivative(t),
        }
    }

    /// Parameter of the closest curve point to `p`. Periodic curves unwrap
    /// into `[range.lo, range.lo + period)`, so a closed edge's end node maps
    /// to its start.
    pub fn parameter_of(&self, p: &Point3d, range: Interval) -> f64 {
        match self {
            Curve::Line(l) => l.parameter_of(p),
            Curve::Circle(c) => range.lo + (c.angle_of(p) - range.lo).rem_euclid(TAU),
        }
    }

    pub fn period(&self) -> Option<f64> {
        match self {
            Curve::Line(_) => None,
            Curve::Circle(_) => Some(TAU),
        }
    }

    pub fn curve_type_name(&self) -> &'static str {
        match self {
            Curve::Line(_) => "Line",
            Curve::Circle(_) => "Circle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn line_inverse_evaluates() {
        let l = Line3d::from_points(Point3d::new(1.0, 0.0, 0.0), Point3d::new(1.0, 4.0, 0.0));
        let curve = Curve::Line(l);
        let p = curve.evaluate(2.5);
        assert_relative_eq!(p.y, 2.5);
        assert_relative_eq!(curve.parameter_of(&p, Interval::new(0.0, 4.0)), 2.5);
    }

    #[test]
    fn circle_parameter_unwraps_into_range() {
        let c = Circle3d::with_axes(Point3d::ORIGIN, Vec3::Z, Vec3::X, 2.0);
        let curve = Curve::Circle(c);
        let p = curve.evaluate(3.0 * FRAC_PI_2);
        let t = curve.parameter_of(&p, Interval::new(0.0, 2.0 * PI));
        assert_relative_eq!(t, 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn circle_derivative_is_tangent() {
        let c = Circle3d::new(Point3d::ORIGIN, Vec3::Z, 1.0);
        let d = c.derivative(0.3);
        let radial = c.evaluate(0.3) - c.center;
        assert!(d.dot(&radial).abs() < 1e-12);
    }
}
