use serde::{Deserialize, Serialize};

/// Closed parameter interval `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    /// Map a normalized value in `[0, 1]` onto this interval.
    pub fn denormalize(&self, s: f64) -> f64 {
        self.lo + s * self.span()
    }

    /// Inverse of [`Interval::denormalize`]. Zero-span intervals map to 0.
    pub fn normalize(&self, t: f64) -> f64 {
        let span = self.span();
        if span.abs() < 1e-300 { 0.0 } else { (t - self.lo) / span }
    }

    pub fn contains(&self, t: f64, tol: f64) -> bool {
        t >= self.lo - tol && t <= self.hi + tol
    }

    pub fn clamp(&self, t: f64) -> f64 {
        t.clamp(self.lo.min(self.hi), self.hi.max(self.lo))
    }

    pub fn shifted(&self, by: f64) -> Self {
        Self::new(self.lo + by, self.hi + by)
    }
}

/// Rectangular parameter box of a surface, `u` by `v`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvBox {
    pub u: Interval,
    pub v: Interval,
}

impl UvBox {
    pub fn new(u: Interval, v: Interval) -> Self {
        Self { u, v }
    }

    pub fn from_bounds(u0: f64, u1: f64, v0: f64, v1: f64) -> Self {
        Self::new(Interval::new(u0, u1), Interval::new(v0, v1))
    }

    pub fn axis(&self, dir: usize) -> Interval {
        if dir == 0 { self.u } else { self.v }
    }

    pub fn denormalize(&self, st: [f64; 2]) -> [f64; 2] {
        [self.u.denormalize(st[0]), self.v.denormalize(st[1])]
    }

    pub fn normalize(&self, uv: [f64; 2]) -> [f64; 2] {
        [self.u.normalize(uv[0]), self.v.normalize(uv[1])]
    }

    pub fn center(&self) -> [f64; 2] {
        self.denormalize([0.5, 0.5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn denormalize_and_back() {
        let i = Interval::new(-2.0, 6.0);
        assert_relative_eq!(i.denormalize(0.25), 0.0);
        assert_relative_eq!(i.normalize(0.0), 0.25);
    }

    #[test]
    fn zero_span_normalizes_to_zero() {
        let i = Interval::new(3.0, 3.0);
        assert_eq!(i.normalize(3.0), 0.0);
    }

    #[test]
    fn uv_box_center() {
        let b = UvBox::from_bounds(0.0, 2.0, 10.0, 20.0);
        assert_eq!(b.center(), [1.0, 15.0]);
        assert_eq!(b.axis(1), Interval::new(10.0, 20.0));
    }
}
