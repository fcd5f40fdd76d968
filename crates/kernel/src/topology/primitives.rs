use std::collections::HashMap;
use std::f64::consts::TAU;

use mesh_types::{BodyKind, Sense};
use tracing::{info, instrument};

use super::model::{Body, BodyBuilder};
use crate::geometry::curves::Circle3d;
use crate::geometry::{BSplineSurface, Cylinder, Plane, Point3d, Surface, UvBox, Vec3};

const BOX_FACE_NAMES: [&str; 6] = ["xmin", "xmax", "ymin", "ymax", "zmin", "zmax"];

fn axis_vec(k: usize) -> Vec3 {
    match k {
        0 => Vec3::X,
        1 => Vec3::Y,
        _ => Vec3::Z,
    }
}

/// Axis-aligned box solid from `min` to `max`.
///
/// Node `i` sits at the corner selected by bits x=1, y=2, z=4. Edges run
/// from the lower to the higher corner along their axis. Each face is a
/// plane framed by the two axes following its normal axis cyclically, so
/// faces on the max side are `Forward` and faces on the min side `Reverse`.
/// Faces are named `xmin`..`zmax`; every edge is named `box_edge`.
#[instrument]
pub fn make_box(min: Point3d, max: Point3d) -> Body {
    info!(min = ?min.to_array(), max = ?max.to_array(), "creating box primitive");
    let size = [max.x - min.x, max.y - min.y, max.z - min.z];
    let mut builder = BodyBuilder::new();

    let nodes: Vec<usize> = (0..8)
        .map(|i| {
            let p = Point3d::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            );
            builder.node(p)
        })
        .collect();

    let mut edge_of: HashMap<(usize, usize), usize> = HashMap::new();
    for k in 0..3 {
        for a in 0..8usize {
            if a & (1 << k) == 0 {
                let b = a | (1 << k);
                let e = builder.line(nodes[a], nodes[b]);
                builder.name_edge(e, "box_edge");
                edge_of.insert((a, b), e);
            }
        }
    }

    for k in 0..3 {
        for s in 0..2usize {
            let k1 = (k + 1) % 3;
            let k2 = (k + 2) % 3;
            let c00 = s << k;
            let c10 = c00 | (1 << k1);
            let c01 = c00 | (1 << k2);
            let c11 = c10 | (1 << k2);
            let edges = vec![
                edge_of[&(c00, c10)],
                edge_of[&(c10, c11)],
                edge_of[&(c01, c11)],
                edge_of[&(c00, c01)],
            ];
            let plane = Plane::new(builder.node_point(nodes[c00]), axis_vec(k1), axis_vec(k2));
            let sense = if s == 1 { Sense::Forward } else { Sense::Reverse };
            let f = builder.face(
                Surface::Plane(plane),
                UvBox::from_bounds(0.0, size[k1], 0.0, size[k2]),
                sense,
                edges,
            );
            builder.name_face(f, BOX_FACE_NAMES[2 * k + s]);
        }
    }

    builder.build(BodyKind::Solid)
}

/// Rectangular sheet spanned by `u` and `v` from `origin`.
///
/// Loop edges run p0->p1->p2->p3->p0 with p0 = origin, p1 = origin+u,
/// p2 = origin+u+v, p3 = origin+v. The single face is named `name`.
#[instrument]
pub fn make_plate(origin: Point3d, u: Vec3, v: Vec3, name: &str) -> Body {
    info!(origin = ?origin.to_array(), "creating plate primitive");
    let mut builder = BodyBuilder::new();
    let p = [origin, origin + u, origin + u + v, origin + v];
    let n: Vec<usize> = p.iter().map(|pt| builder.node(*pt)).collect();
    let edges: Vec<usize> = (0..4).map(|i| builder.line(n[i], n[(i + 1) % 4])).collect();

    let plane = Plane::new(
        origin,
        u.normalized().unwrap_or(Vec3::X),
        v.normalized().unwrap_or(Vec3::Y),
    );
    let f = builder.face(
        Surface::Plane(plane),
        UvBox::from_bounds(0.0, u.length(), 0.0, v.length()),
        Sense::Forward,
        edges,
    );
    builder.name_face(f, name);
    builder.build(BodyKind::Sheet)
}

/// Closed cylinder solid: lateral wall (face 0) plus bottom (1) and top (2)
/// caps. Edges: bottom circle (0), top circle (1), seam line (2). The wall
/// loop visits the seam twice.
#[instrument]
pub fn make_cylinder(base: Point3d, axis: Vec3, radius: f64, height: f64) -> Body {
    info!(base = ?base.to_array(), radius, height, "creating cylinder primitive");
    let axis = axis.normalized().unwrap_or(Vec3::Z);
    let ref_dir = axis.any_perpendicular();
    let y_dir = axis.cross(&ref_dir);
    let top = base + axis * height;

    let mut builder = BodyBuilder::new();
    let n0 = builder.node(base + ref_dir * radius);
    let n1 = builder.node(top + ref_dir * radius);

    let bottom_circle = builder.circle(Circle3d::with_axes(base, axis, ref_dir, radius), n0);
    let top_circle = builder.circle(Circle3d::with_axes(top, axis, ref_dir, radius), n1);
    let seam = builder.line(n0, n1);

    let wall = builder.face(
        Surface::Cylinder(Cylinder::with_ref_dir(base, axis, ref_dir, radius)),
        UvBox::from_bounds(0.0, TAU, 0.0, height),
        Sense::Forward,
        vec![bottom_circle, seam, top_circle, seam],
    );
    let bottom = builder.face(
        Surface::Plane(Plane::new(base, ref_dir, y_dir)),
        UvBox::from_bounds(-radius, radius, -radius, radius),
        Sense::Reverse,
        vec![bottom_circle],
    );
    let cap = builder.face(
        Surface::Plane(Plane::new(top, ref_dir, y_dir)),
        UvBox::from_bounds(-radius, radius, -radius, radius),
        Sense::Forward,
        vec![top_circle],
    );
    builder
        .name_face(wall, "wall")
        .name_face(bottom, "bottom")
        .name_face(cap, "top");

    builder.build(BodyKind::Solid)
}

/// Flat circular sheet bounded by a single closed circle edge. The frame
/// matches `make_cylinder`, so a disc placed on a cylinder's cap shares its
/// circle and node.
#[instrument]
pub fn make_disc(center: Point3d, axis: Vec3, radius: f64, name: &str) -> Body {
    info!(center = ?center.to_array(), radius, "creating disc primitive");
    let axis = axis.normalized().unwrap_or(Vec3::Z);
    let ref_dir = axis.any_perpendicular();
    let y_dir = axis.cross(&ref_dir);

    let mut builder = BodyBuilder::new();
    let node = builder.node(center + ref_dir * radius);
    let rim = builder.circle(Circle3d::with_axes(center, axis, ref_dir, radius), node);
    let f = builder.face(
        Surface::Plane(Plane::new(center, ref_dir, y_dir)),
        UvBox::from_bounds(-radius, radius, -radius, radius),
        Sense::Forward,
        vec![rim],
    );
    builder.name_face(f, name);
    builder.build(BodyKind::Sheet)
}

/// Two-face solid over the square `[0,size]^2` at `z = 0`: a quadratic
/// dome `upper` (face 0) bulging to `height` and its mirror `lower` (face 1).
/// Both faces share the four straight rim edges, named `rim`.
#[instrument]
pub fn make_pillow(size: f64, height: f64) -> Body {
    info!(size, height, "creating pillow primitive");
    let mut builder = BodyBuilder::new();
    let corners = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(size, 0.0, 0.0),
        Point3d::new(size, size, 0.0),
        Point3d::new(0.0, size, 0.0),
    ];
    let n: Vec<usize> = corners.iter().map(|p| builder.node(*p)).collect();
    let edges: Vec<usize> = (0..4).map(|i| builder.line(n[i], n[(i + 1) % 4])).collect();
    for &e in &edges {
        builder.name_edge(e, "rim");
    }

    let dome = |z: f64| {
        let mut net = [[Point3d::ORIGIN; 3]; 3];
        for (i, row) in net.iter_mut().enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                *p = Point3d::new(size * i as f64 / 2.0, size * j as f64 / 2.0, 0.0);
            }
        }
        // Quadratic weight at the center is 1/4, so the apex reaches z.
        net[1][1].z = 4.0 * z;
        Surface::BSpline(BSplineSurface::quadratic_patch(net))
    };
    let unit = UvBox::from_bounds(0.0, 1.0, 0.0, 1.0);
    let upper = builder.face(dome(height), unit, Sense::Forward, edges.clone());
    let lower = builder.face(dome(-height), unit, Sense::Reverse, edges);
    builder.name_face(upper, "upper").name_face(lower, "lower");

    builder.build(BodyKind::Solid)
}
