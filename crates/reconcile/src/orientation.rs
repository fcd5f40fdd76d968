//! Face-level triangle winding correction.
//!
//! Only the first triangle of a face is sampled; its verdict is applied to
//! every triangle of the face. Faces whose triangles disagree among
//! themselves are neither detected nor repaired.

use cad_kernel::{CadKernel, Point3d};
use mesh_types::EntityRef;
use tracing::debug;

use crate::error::{ReconcileError, Result};

/// Dot product between the oriented surface normal at the centroid of the
/// first triangle and that triangle's winding normal. `None` for a face with
/// no triangles.
pub fn orientation_dot<K: CadKernel + ?Sized>(
    kernel: &K,
    face: EntityRef,
    points: &[Point3d],
    uvs: &[[f64; 2]],
    triangles: &[[usize; 3]],
) -> Result<Option<f64>> {
    let Some(first) = triangles.first() else {
        return Ok(None);
    };
    if first.iter().any(|&i| i >= points.len() || i >= uvs.len()) {
        return Err(ReconcileError::inconsistent(format!(
            "{face}: first triangle {first:?} indexes past {} points",
            points.len()
        )));
    }

    let [a, b, c] = *first;
    let centroid = [
        (uvs[a][0] + uvs[b][0] + uvs[c][0]) / 3.0,
        (uvs[a][1] + uvs[b][1] + uvs[c][1]) / 3.0,
    ];
    let derivs = kernel.face_eval(face, centroid)?;
    let geometry_normal = derivs.normal().scale_by(kernel.face_sense(face)?.sign());
    let triangle_normal = (points[b] - points[a]).cross(&(points[c] - points[a]));
    Ok(Some(geometry_normal.dot(&triangle_normal)))
}

/// Reverse the winding of every triangle of `face` when its first triangle
/// opposes the face orientation. Returns whether the face was flipped.
pub fn correct_orientation<K: CadKernel + ?Sized>(
    kernel: &K,
    face: EntityRef,
    points: &[Point3d],
    uvs: &[[f64; 2]],
    triangles: &mut [[usize; 3]],
) -> Result<bool> {
    let Some(dot) = orientation_dot(kernel, face, points, uvs, triangles)? else {
        return Ok(false);
    };
    if dot >= 0.0 {
        return Ok(false);
    }
    for tri in triangles.iter_mut() {
        tri.swap(0, 2);
    }
    debug!(%face, triangles = triangles.len(), "winding reversed");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cad_kernel::topology::primitives::{make_box, make_plate};
    use cad_kernel::{BrepModel, Vec3};

    fn plate() -> BrepModel {
        BrepModel::with_bodies(vec![make_plate(Point3d::ORIGIN, Vec3::X, Vec3::Y, "p")])
    }

    fn unit_triangle() -> (Vec<Point3d>, Vec<[f64; 2]>) {
        let points = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        ];
        let uvs = points.iter().map(|p| [p.x, p.y]).collect();
        (points, uvs)
    }

    #[test]
    fn antiparallel_triangle_is_swapped() {
        let model = plate();
        let face = EntityRef::face(0, 0);
        let (points, uvs) = unit_triangle();
        // Clockwise seen from +z, the plate normal.
        let mut tris = vec![[0, 2, 1]];
        assert!(orientation_dot(&model, face, &points, &uvs, &tris).unwrap().unwrap() < 0.0);

        assert!(correct_orientation(&model, face, &points, &uvs, &mut tris).unwrap());
        assert_eq!(tris, vec![[1, 2, 0]]);
        assert!(orientation_dot(&model, face, &points, &uvs, &tris).unwrap().unwrap() > 0.0);
    }

    #[test]
    fn aligned_face_is_untouched() {
        let model = plate();
        let (points, uvs) = unit_triangle();
        let mut tris = vec![[0, 1, 2]];
        assert!(!correct_orientation(&model, EntityRef::face(0, 0), &points, &uvs, &mut tris).unwrap());
        assert_eq!(tris, vec![[0, 1, 2]]);
    }

    #[test]
    fn reverse_sense_flips_expectation() {
        // Box face 0 (xmin) is Reverse: its oriented normal is -x.
        let model = BrepModel::with_bodies(vec![make_box(Point3d::ORIGIN, Point3d::new(1.0, 1.0, 1.0))]);
        let face = EntityRef::face(0, 0);
        let points = vec![
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
            Point3d::new(0.0, 0.0, 1.0),
        ];
        // xmin plane is framed by y (u) and z (v).
        let uvs = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let mut tris = vec![[0, 1, 2], [0, 2, 1]];
        assert!(correct_orientation(&model, face, &points, &uvs, &mut tris).unwrap());
        // Verdict from the first triangle applies to the whole face.
        assert_eq!(tris, vec![[2, 1, 0], [1, 2, 0]]);
    }

    #[test]
    fn empty_face_is_noop() {
        let model = plate();
        let mut tris: Vec<[usize; 3]> = Vec::new();
        assert!(!correct_orientation(&model, EntityRef::face(0, 0), &[], &[], &mut tris).unwrap());
    }

    #[test]
    fn second_application_is_noop() {
        let model = plate();
        let face = EntityRef::face(0, 0);
        let (points, uvs) = unit_triangle();
        let mut tris = vec![[0, 2, 1]];
        correct_orientation(&model, face, &points, &uvs, &mut tris).unwrap();
        let once = tris.clone();
        assert!(!correct_orientation(&model, face, &points, &uvs, &mut tris).unwrap());
        assert_eq!(tris, once);
    }
}
