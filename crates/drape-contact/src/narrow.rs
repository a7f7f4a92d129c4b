//! Narrow phase distance kernels.
//!
//! Refines broad phase candidates into exact contact data: closest
//! points, unit normal, gap and the barycentric stencil.
//!
//! - Point–triangle closest point by Voronoi-region classification
//! - Segment–segment closest points with parameter clamping
//! - Point–wall signed distance

use drape_math::Vec3;

use crate::contact::{Contact, ContactKind, Stencil, TriangleRegion};
use crate::wall::Wall;

/// Squared lengths below this are treated as zero.
const LENGTH_SQ_EPSILON: f64 = 1.0e-24;

/// Distances below this fall back to a geometric normal.
const NORMAL_EPSILON: f64 = 1.0e-12;

/// Closest point on a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleClosestPoint {
    /// The closest point.
    pub point: Vec3,
    /// Barycentric coordinates with respect to `(a, b, c)`.
    pub barycentric: [f64; 3],
    /// Feature containing the closest point.
    pub region: TriangleRegion,
}

/// Closest point on segment `ab` to `p`, with its parameter `t ∈ [0, 1]`.
pub fn closest_point_segment(p: Vec3, a: Vec3, b: Vec3) -> (Vec3, f64) {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= LENGTH_SQ_EPSILON {
        return (a, 0.0);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t, t)
}

/// Closest point on triangle `abc` to `p`.
///
/// Classifies `p` into the Voronoi regions of the triangle's vertices,
/// edges and face; only the face region requires a full barycentric solve.
pub fn closest_point_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> TriangleClosestPoint {
    let ab = b - a;
    let ac = c - a;

    if ab.cross(ac).length_squared() <= LENGTH_SQ_EPSILON {
        return closest_point_degenerate_triangle(p, a, b, c);
    }

    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return vertex_region(a, 0);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return vertex_region(b, 1);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return TriangleClosestPoint {
            point: a + ab * v,
            barycentric: [1.0 - v, v, 0.0],
            region: TriangleRegion::Edge(0),
        };
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return vertex_region(c, 2);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return TriangleClosestPoint {
            point: a + ac * w,
            barycentric: [1.0 - w, 0.0, w],
            region: TriangleRegion::Edge(2),
        };
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return TriangleClosestPoint {
            point: b + (c - b) * w,
            barycentric: [0.0, 1.0 - w, w],
            region: TriangleRegion::Edge(1),
        };
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    TriangleClosestPoint {
        point: a + ab * v + ac * w,
        barycentric: [1.0 - v - w, v, w],
        region: TriangleRegion::Face,
    }
}

fn vertex_region(point: Vec3, local: u8) -> TriangleClosestPoint {
    let mut barycentric = [0.0; 3];
    barycentric[local as usize] = 1.0;
    TriangleClosestPoint {
        point,
        barycentric,
        region: TriangleRegion::Vertex(local),
    }
}

/// Collapsed triangles: the closest point lies on one of the edges.
fn closest_point_degenerate_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> TriangleClosestPoint {
    let candidates = [(a, b, 0u8), (b, c, 1u8), (c, a, 2u8)];
    let mut best: Option<(f64, TriangleClosestPoint)> = None;
    for (start, end, edge) in candidates {
        let (point, t) = closest_point_segment(p, start, end);
        let mut barycentric = [0.0; 3];
        let i = edge as usize;
        barycentric[i] = 1.0 - t;
        barycentric[(i + 1) % 3] = t;
        let dist_sq = (p - point).length_squared();
        if best.map_or(true, |(d, _)| dist_sq < d) {
            best = Some((
                dist_sq,
                TriangleClosestPoint {
                    point,
                    barycentric,
                    region: TriangleRegion::Edge(edge),
                },
            ));
        }
    }
    best.map(|(_, cp)| cp).unwrap_or_else(|| vertex_region(a, 0))
}

/// Closest points between segments `p1q1` and `p2q2`.
///
/// Returns `(s, t, c1, c2)` with `c1 = p1 + s(q1 − p1)` and
/// `c2 = p2 + t(q2 − p2)`, both parameters clamped to `[0, 1]`.
pub fn closest_points_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (f64, f64, Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    let (s, t) = if a <= LENGTH_SQ_EPSILON && e <= LENGTH_SQ_EPSILON {
        (0.0, 0.0)
    } else if a <= LENGTH_SQ_EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= LENGTH_SQ_EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > 1.0e-12 * a * e {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (s, t, p1 + d1 * s, p2 + d2 * t)
}

/// Unsigned distance from `p` to triangle `abc`.
pub fn point_triangle_distance(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> f64 {
    (p - closest_point_triangle(p, a, b, c).point).length()
}

/// Unsigned distance between segments `p1q1` and `p2q2`.
pub fn segment_segment_distance(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> f64 {
    let (_, _, c1, c2) = closest_points_segments(p1, q1, p2, q2);
    (c1 - c2).length()
}

// ─── Contact Builders ────────────────────────────────────────

/// Point–triangle contact if the distance is below `gap_max`.
///
/// The normal points from the closest point towards the vertex; when the
/// vertex lies on the triangle the face normal is used instead.
pub fn point_triangle_contact(
    positions: &[Vec3],
    vertex: usize,
    triangle: usize,
    tri: [usize; 3],
    gap_max: f64,
) -> Option<Contact> {
    let p = positions[vertex];
    let [ia, ib, ic] = tri;
    let (a, b, c) = (positions[ia], positions[ib], positions[ic]);

    let closest = closest_point_triangle(p, a, b, c);
    let diff = p - closest.point;
    let dist = diff.length();
    if dist >= gap_max {
        return None;
    }

    let normal = if dist > NORMAL_EPSILON {
        diff / dist
    } else {
        (b - a).cross(c - a).normalize_or(Vec3::Z)
    };
    let [u, v, w] = closest.barycentric;

    Some(Contact {
        kind: ContactKind::PointTriangle {
            vertex,
            triangle,
            face: closest.region,
        },
        witness: closest.point,
        normal,
        gap: dist,
        stencil: Stencil::quad([vertex, ia, ib, ic], [1.0, -u, -v, -w]),
    })
}

/// Edge–edge contact if the distance is below `gap_max`.
///
/// The normal points from edge B's closest point towards edge A's.
pub fn edge_edge_contact(
    positions: &[Vec3],
    edge_a: usize,
    edge_b: usize,
    verts_a: [usize; 2],
    verts_b: [usize; 2],
    gap_max: f64,
) -> Option<Contact> {
    let (a0, a1) = (positions[verts_a[0]], positions[verts_a[1]]);
    let (b0, b1) = (positions[verts_b[0]], positions[verts_b[1]]);

    let (s, t, ca, cb) = closest_points_segments(a0, a1, b0, b1);
    let diff = ca - cb;
    let dist = diff.length();
    if dist >= gap_max {
        return None;
    }

    let normal = if dist > NORMAL_EPSILON {
        diff / dist
    } else {
        let da = a1 - a0;
        da.cross(b1 - b0)
            .normalize_or(da.normalize_or(Vec3::X).any_orthonormal_vector())
    };

    Some(Contact {
        kind: ContactKind::EdgeEdge { edge_a, edge_b },
        witness: cb,
        normal,
        gap: dist,
        stencil: Stencil::quad(
            [verts_a[0], verts_a[1], verts_b[0], verts_b[1]],
            [1.0 - s, s, -(1.0 - t), -t],
        ),
    })
}

/// Vertex–wall contact if the signed distance is below the wall's gap.
pub fn wall_contact(position: Vec3, vertex: usize, wall_index: usize, wall: &Wall) -> Option<Contact> {
    let gap = wall.signed_distance(position);
    if gap >= wall.gap {
        return None;
    }
    Some(Contact {
        kind: ContactKind::Wall {
            vertex,
            wall: wall_index,
        },
        witness: wall.project(position),
        normal: wall.normal,
        gap,
        stencil: Stencil::single(vertex),
    })
}
