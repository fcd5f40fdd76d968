pub mod bspline;
pub mod curves;
pub mod point;
pub mod range;
pub mod surfaces;
pub mod vector;

pub use bspline::BSplineSurface;
pub use curves::{Circle3d, Curve, Line3d};
pub use point::Point3d;
pub use range::{Interval, UvBox};
pub use surfaces::{Cylinder, Periodicity, Plane, Surface, SurfaceDerivs};
pub use vector::Vec3;
