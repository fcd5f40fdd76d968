use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use super::bspline::BSplineSurface;
use super::point::Point3d;
use super::range::{Interval, UvBox};
use super::vector::Vec3;

/// Surface types carried by faces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Surface {
    Plane(Plane),
    Cylinder(Cylinder),
    BSpline(BSplineSurface),
}

/// Position plus first partial derivatives at a parameter location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDerivs {
    pub point: Point3d,
    pub du: Vec3,
    pub dv: Vec3,
}

impl SurfaceDerivs {
    /// Unoriented geometric normal `du x dv`.
    pub fn normal(&self) -> Vec3 {
        self.du.cross(&self.dv)
    }
}

/// Periods of a surface per parametric direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Periodicity {
    pub u: Option<f64>,
    pub v: Option<f64>,
}

impl Periodicity {
    pub fn period(&self, dir: usize) -> Option<f64> {
        if dir == 0 { self.u } else { self.v }
    }

    pub fn is_periodic(&self) -> bool {
        self.u.is_some() || self.v.is_some()
    }
}

/// An infinite plane with an explicit parametric frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
}

impl Plane {
    pub fn new(origin: Point3d, u_axis: Vec3, v_axis: Vec3) -> Self {
        Self {
            origin,
            u_axis,
            v_axis,
        }
    }

    pub fn xy() -> Self {
        Self::new(Point3d::ORIGIN, Vec3::X, Vec3::Y)
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin + self.u_axis * u + self.v_axis * v
    }

    pub fn normal(&self) -> Vec3 {
        self.u_axis.cross(&self.v_axis)
    }
}

/// A cylinder surface, `u` = angle from `ref_dir`, `v` = height along `axis`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Cylinder {
    pub origin: Point3d,
    pub axis: Vec3,
    pub radius: f64,
    pub ref_dir: Vec3,
}

impl Cylinder {
    pub fn new(origin: Point3d, axis: Vec3, radius: f64) -> Self {
        let axis = axis.normalized().unwrap_or(Vec3::Z);
        Self {
            origin,
            axis,
            radius,
            ref_dir: axis.any_perpendicular(),
        }
    }

    pub fn with_ref_dir(origin: Point3d, axis: Vec3, ref_dir: Vec3, radius: f64) -> Self {
        Self {
            origin,
            axis: axis.normalized().unwrap_or(Vec3::Z),
            radius,
            ref_dir: ref_dir.normalized().unwrap_or(Vec3::X),
        }
    }

    fn y_dir(&self) -> Vec3 {
        self.axis.cross(&self.ref_dir)
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.origin
            + self.ref_dir * (self.radius * u.cos())
            + self.y_dir() * (self.radius * u.sin())
            + self.axis * v
    }

    pub fn derivatives(&self, u: f64, _v: f64) -> (Vec3, Vec3) {
        let du = self.ref_dir * (-self.radius * u.sin()) + self.y_dir() * (self.radius * u.cos());
        (du, self.axis)
    }
}

impl Surface {
    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        match self {
            Surface::Plane(p) => p.evaluate(u, v),
            Surface::Cylinder(c) => c.evaluate(u, v),
            Surface::BSpline(b) => b.evaluate(u, v),
        }
    }

    pub fn derivatives(&self, u: f64, v: f64) -> SurfaceDerivs {
        let (du, dv) = match self {
            Surface::Plane(p) => (p.u_axis, p.v_axis),
            Surface::Cylinder(c) => c.derivatives(u, v),
            Surface::BSpline(b) => b.derivatives(u, v),
        };
        SurfaceDerivs {
            point: self.evaluate(u, v),
            du,
            dv,
        }
    }

    pub fn periodicity(&self) -> Periodicity {
        match self {
            Surface::Cylinder(_) => Periodicity {
                u: Some(TAU),
                v: None,
            },
            Surface::Plane(_) | Surface::BSpline(_) => Periodicity::default(),
        }
    }

    pub fn is_bspline(&self) -> bool {
        matches!(self, Surface::BSpline(_))
    }

    /// Parameter range of the B-spline approximation of this surface
    /// restricted to `trim`.
    ///
    /// Periodic directions are re-based onto the angle convention of the
    /// conversion, `(-PI, PI]`, so a full-turn face trimmed at `[0, 2PI]`
    /// converts to `[-PI, PI]`. Non-periodic directions keep the trim.
    pub fn proxy_range(&self, trim: &UvBox) -> UvBox {
        match self {
            Surface::Cylinder(_) => UvBox::new(rebase_angle_range(trim.u), trim.v),
            Surface::Plane(_) => *trim,
            Surface::BSpline(b) => b.domain(),
        }
    }

    pub fn surface_type_name(&self) -> &'static str {
        match self {
            Surface::Plane(_) => "Plane",
            Surface::Cylinder(_) => "Cylinder",
            Surface::BSpline(_) => "BSpline",
        }
    }
}

fn rebase_angle_range(range: Interval) -> Interval {
    if range.span() >= TAU - 1e-12 {
        return Interval::new(-PI, -PI + range.span());
    }
    let turns = ((range.lo - PI) / TAU).ceil();
    range.shifted(-turns * TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn plane_partials_are_frame_axes() {
        let s = Surface::Plane(Plane::new(Point3d::ORIGIN, Vec3::Y, Vec3::Z));
        let d = s.derivatives(1.0, 2.0);
        assert_relative_eq!(d.point.y, 1.0);
        assert_relative_eq!(d.point.z, 2.0);
        assert_relative_eq!(d.normal().x, 1.0);
    }

    #[test]
    fn cylinder_normal_points_outward() {
        let c = Cylinder::with_ref_dir(Point3d::ORIGIN, Vec3::Z, Vec3::X, 2.0);
        let s = Surface::Cylinder(c);
        for u in [0.0, FRAC_PI_2, 2.0, 4.5] {
            let d = s.derivatives(u, 0.5);
            let radial = d.point - Point3d::new(0.0, 0.0, 0.5);
            assert!(d.normal().dot(&radial) > 0.0);
            assert_relative_eq!(radial.length(), 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn full_turn_cylinder_proxy_is_centered() {
        let s = Surface::Cylinder(Cylinder::new(Point3d::ORIGIN, Vec3::Z, 1.0));
        let trim = UvBox::from_bounds(0.0, TAU, 0.0, 1.0);
        let proxy = s.proxy_range(&trim);
        assert_relative_eq!(proxy.u.lo, -PI);
        assert_relative_eq!(proxy.u.hi, PI);
        assert_eq!(proxy.v, trim.v);
    }

    #[test]
    fn partial_turn_proxy_is_rebased() {
        let s = Surface::Cylinder(Cylinder::new(Point3d::ORIGIN, Vec3::Z, 1.0));
        let trim = UvBox::from_bounds(4.0, 5.0, 0.0, 1.0);
        let proxy = s.proxy_range(&trim);
        assert_relative_eq!(proxy.u.lo, 4.0 - TAU, epsilon = 1e-12);
        assert_relative_eq!(proxy.u.span(), 1.0, epsilon = 1e-12);

        let unchanged = s.proxy_range(&UvBox::from_bounds(0.5, 1.0, 0.0, 1.0));
        assert_relative_eq!(unchanged.u.lo, 0.5);
    }

    #[test]
    fn plane_proxy_matches_trim() {
        let s = Surface::Plane(Plane::xy());
        let trim = UvBox::from_bounds(0.0, 3.0, 1.0, 2.0);
        assert_eq!(s.proxy_range(&trim), trim);
        assert!(!s.periodicity().is_periodic());
    }
}
