//! Property-based tests for the numeric stages using the `proptest` crate.

use std::f64::consts::TAU;

use proptest::prelude::*;

use cad_kernel::topology::primitives::make_plate;
use cad_kernel::{BrepModel, Periodicity, Point3d, UvBox, Vec3};
use mesh_reconcile::{
    correct_orientation, orientation_dot, periodic_offset, GeometryTopologyCache, ToleranceConfig,
    VertexClassifier,
};
use mesh_types::EntityRef;

const PERIODIC_TOL: f64 = 1e-4;

// ---------------------------------------------------------------------------
// 1. Periodic offset is exactly one period, signed towards the trim range,
//    and zero in non-periodic directions.
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn periodic_offset_is_signed_period(
        trim_lo in -10.0f64..10.0,
        delta in prop_oneof![-6.0f64..-1e-3, 1e-3f64..6.0],
        v_lo in -5.0f64..5.0,
        v_shift in -5.0f64..5.0,
    ) {
        let trim = UvBox::from_bounds(trim_lo, trim_lo + 1.0, v_lo, v_lo + 1.0);
        let proxy = UvBox::from_bounds(trim_lo - delta, trim_lo - delta + 1.0, v_lo + v_shift, v_lo + v_shift + 1.0);
        let periodicity = Periodicity { u: Some(TAU), v: None };
        let offset = periodic_offset(&trim, &proxy, &periodicity, PERIODIC_TOL);
        prop_assert_eq!(offset[0], TAU * delta.signum());
        prop_assert_eq!(offset[1], 0.0);
    }
}

// ---------------------------------------------------------------------------
// 2. Correcting a face twice changes nothing the second time, and leaves a
//    non-negative orientation dot product.
// ---------------------------------------------------------------------------

fn arb_triangle() -> impl Strategy<Value = [(f64, f64); 3]> {
    [(0.0f64..1.0, 0.0f64..1.0), (0.0f64..1.0, 0.0f64..1.0), (0.0f64..1.0, 0.0f64..1.0)]
}

fn area2(t: &[(f64, f64); 3]) -> f64 {
    (t[1].0 - t[0].0) * (t[2].1 - t[0].1) - (t[2].0 - t[0].0) * (t[1].1 - t[0].1)
}

proptest! {
    #[test]
    fn orientation_correction_is_idempotent(tri in arb_triangle()) {
        prop_assume!(area2(&tri).abs() > 1e-6);
        let model = BrepModel::with_bodies(vec![make_plate(Point3d::ORIGIN, Vec3::X, Vec3::Y, "p")]);
        let face = EntityRef::face(0, 0);
        let points: Vec<Point3d> = tri.iter().map(|&(x, y)| Point3d::new(x, y, 0.0)).collect();
        let uvs: Vec<[f64; 2]> = tri.iter().map(|&(x, y)| [x, y]).collect();
        let mut tris = vec![[0, 1, 2], [0, 2, 1]];

        correct_orientation(&model, face, &points, &uvs, &mut tris).unwrap();
        let once = tris.clone();
        let flipped_again = correct_orientation(&model, face, &points, &uvs, &mut tris).unwrap();
        prop_assert!(!flipped_again);
        prop_assert_eq!(&tris, &once);
        prop_assert!(orientation_dot(&model, face, &points, &uvs, &tris).unwrap().unwrap() >= 0.0);
    }
}

// ---------------------------------------------------------------------------
// 3. Un-normalized edge parameters stay inside the edge range.
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn edge_parameter_within_range(s in 0.0f64..=1.0, len in 0.1f64..20.0, e in 0usize..4) {
        let model = BrepModel::with_bodies(vec![make_plate(Point3d::ORIGIN, Vec3::X * len, Vec3::Y, "p")]);
        let cache = GeometryTopologyCache::build(&model, 0, &ToleranceConfig::default()).unwrap();
        let range = cache.edge(e).unwrap().range;
        let t = VertexClassifier::new(&cache).edge_parameter(e, s).unwrap();
        prop_assert!(range.contains(t, 1e-12));
    }
}
