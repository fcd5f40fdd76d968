use serde::{Deserialize, Serialize};

use super::point::Point3d;
use super::range::{Interval, UvBox};
use super::vector::Vec3;
use crate::types::KernelError;

/// A non-rational tensor-product B-spline surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BSplineSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    /// Control points grid: [u_index * num_v + v_index]
    pub control_points: Vec<Point3d>,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub num_u: usize,
    pub num_v: usize,
}

impl BSplineSurface {
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        control_points: Vec<Point3d>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        num_u: usize,
        num_v: usize,
    ) -> Result<Self, KernelError> {
        if control_points.len() != num_u * num_v {
            return Err(KernelError::InvalidGeometry {
                reason: format!(
                    "expected {} control points, got {}",
                    num_u * num_v,
                    control_points.len()
                ),
            });
        }
        if knots_u.len() != num_u + degree_u + 1 || knots_v.len() != num_v + degree_v + 1 {
            return Err(KernelError::InvalidGeometry {
                reason: "knot vector length does not match control net".into(),
            });
        }
        Ok(Self {
            degree_u,
            degree_v,
            control_points,
            knots_u,
            knots_v,
            num_u,
            num_v,
        })
    }

    /// Degree (1,1) patch through four corners over `[0,1]^2`.
    pub fn bilinear(p00: Point3d, p10: Point3d, p01: Point3d, p11: Point3d) -> Self {
        Self {
            degree_u: 1,
            degree_v: 1,
            control_points: vec![p00, p01, p10, p11],
            knots_u: vec![0.0, 0.0, 1.0, 1.0],
            knots_v: vec![0.0, 0.0, 1.0, 1.0],
            num_u: 2,
            num_v: 2,
        }
    }

    /// Degree (2,2) Bezier patch over `[0,1]^2`; `net[i][j]` is the control
    /// point at u-index `i`, v-index `j`.
    pub fn quadratic_patch(net: [[Point3d; 3]; 3]) -> Self {
        Self {
            degree_u: 2,
            degree_v: 2,
            control_points: net.iter().flatten().copied().collect(),
            knots_u: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            knots_v: vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            num_u: 3,
            num_v: 3,
        }
    }

    pub fn domain(&self) -> UvBox {
        UvBox::new(
            Interval::new(
                self.knots_u[self.degree_u],
                self.knots_u[self.knots_u.len() - self.degree_u - 1],
            ),
            Interval::new(
                self.knots_v[self.degree_v],
                self.knots_v[self.knots_v.len() - self.degree_v - 1],
            ),
        )
    }

    fn find_span(knots: &[f64], count: usize, degree: usize, t: f64) -> usize {
        let n = count - 1;
        if t >= knots[n + 1] {
            return n;
        }
        if t <= knots[degree] {
            return degree;
        }
        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while t < knots[mid] || t >= knots[mid + 1] {
            if t < knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    fn basis_functions(knots: &[f64], span: usize, t: f64, degree: usize) -> Vec<f64> {
        let p = degree;
        let mut n_vals = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];

        n_vals[0] = 1.0;
        for j in 1..=p {
            left[j] = t - knots[span + 1 - j];
            right[j] = knots[span + j] - t;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = n_vals[r] / (right[r + 1] + left[j - r]);
                n_vals[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            n_vals[j] = saved;
        }
        n_vals
    }

    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        let span_u = Self::find_span(&self.knots_u, self.num_u, self.degree_u, u);
        let span_v = Self::find_span(&self.knots_v, self.num_v, self.degree_v, v);
        let basis_u = Self::basis_functions(&self.knots_u, span_u, u, self.degree_u);
        let basis_v = Self::basis_functions(&self.knots_v, span_v, v, self.degree_v);

        let mut acc = Vec3::ZERO;
        for (i, bu) in basis_u.iter().enumerate() {
            let u_idx = span_u - self.degree_u + i;
            for (j, bv) in basis_v.iter().enumerate() {
                let v_idx = span_v - self.degree_v + j;
                let cp = self.control_points[u_idx * self.num_v + v_idx];
                acc = acc + cp.to_vec3() * (bu * bv);
            }
        }
        Point3d::new(acc.x, acc.y, acc.z)
    }

    /// First partials via central differences, one-sided at the domain edge.
    pub fn derivatives(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let h = 1e-7;
        let dom = self.domain();

        let u0 = (u - h).max(dom.u.lo);
        let u1 = (u + h).min(dom.u.hi);
        let v0 = (v - h).max(dom.v.lo);
        let v1 = (v + h).min(dom.v.hi);

        let du = (self.evaluate(u1, v) - self.evaluate(u0, v)) / (u1 - u0);
        let dv = (self.evaluate(u, v1) - self.evaluate(u, v0)) / (v1 - v0);
        (du, dv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_patch() -> BSplineSurface {
        BSplineSurface::bilinear(
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
            Point3d::new(0.0, 3.0, 0.0),
            Point3d::new(2.0, 3.0, 0.0),
        )
    }

    #[test]
    fn bilinear_interpolates_corners() {
        let s = unit_patch();
        let p = s.evaluate(1.0, 1.0);
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 3.0);
        let m = s.evaluate(0.5, 0.5);
        assert_relative_eq!(m.x, 1.0);
        assert_relative_eq!(m.y, 1.5);
    }

    #[test]
    fn bilinear_partials() {
        let s = unit_patch();
        let (du, dv) = s.derivatives(0.3, 0.6);
        assert_relative_eq!(du.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(dv.y, 3.0, epsilon = 1e-6);
        assert!(du.cross(&dv).z > 0.0);
    }

    #[test]
    fn quadratic_patch_with_linear_rim_is_flat_at_the_edge() {
        let mut net = [[Point3d::ORIGIN; 3]; 3];
        for (i, row) in net.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                *p = Point3d::new(i as f64 / 2.0, j as f64 / 2.0, 0.0);
            }
        }
        net[1][1].z = 1.0;
        let s = BSplineSurface::quadratic_patch(net);
        let rim = s.evaluate(0.3, 0.0);
        assert_relative_eq!(rim.x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(rim.z, 0.0);
        // Center basis weight is (2 * 0.5 * 0.5)^2.
        assert_relative_eq!(s.evaluate(0.5, 0.5).z, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_net_is_rejected() {
        let err = BSplineSurface::new(
            1,
            1,
            vec![Point3d::ORIGIN; 3],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            2,
            2,
        );
        assert!(err.is_err());
    }
}
