//! Intersection classification and constructive intersection helpers.
//!
//! The `*_detection` functions are exact: they classify through predicate
//! signs and return the symbolic [`Position`] of the intersection on the
//! source and on the target. Colinear/coplanar overlaps route through a
//! dedicated branch that reports `(Parallel, Parallel)` when the overlap
//! has positive measure. The constructive functions build the intersection
//! point in floating point and are only used for foot points.

use super::position::{
    Position, point_segment_position_2d, point_triangle_position_2d,
};
use super::predicates::{Side, aligned_3d, orient_2d, orient_3d};
use super::{Point, Point2, Point3};

/// Positions of the intersection of segment `(p0, p1)` with segment
/// `(q0, q1)`: `.0` on the source, `.1` on the target.
pub fn segment_segment_intersection_detection(
    p0: &Point2,
    p1: &Point2,
    q0: &Point2,
    q1: &Point2,
) -> (Position, Position) {
    if p0 == p1 || q0 == q1 {
        return (Position::Parallel, Position::Parallel);
    }
    let s_q0 = orient_2d(p0, p1, q0);
    let s_q1 = orient_2d(p0, p1, q1);
    if s_q0.is_zero() && s_q1.is_zero() {
        return colinear_overlap(p0, p1, q0, q1);
    }
    let s_p0 = orient_2d(q0, q1, p0);
    let s_p1 = orient_2d(q0, q1, p1);
    // Equal nonzero signs on either side mean the line intersection falls
    // outside that segment (the zero/zero pair was handled above).
    if s_q0 == s_q1 || s_p0 == s_p1 {
        return (Position::Outside, Position::Outside);
    }
    let on_source = match (s_p0, s_p1) {
        (Side::Zero, _) => Position::Vertex(0),
        (_, Side::Zero) => Position::Vertex(1),
        _ => Position::Inside,
    };
    let on_target = match (s_q0, s_q1) {
        (Side::Zero, _) => Position::Vertex(0),
        (_, Side::Zero) => Position::Vertex(1),
        _ => Position::Inside,
    };
    (on_source, on_target)
}

/// Overlap classification of two colinear segments: positive-measure
/// overlap yields `(Parallel, Parallel)`, a single shared endpoint yields
/// its vertex codes, disjoint segments yield `Outside`.
fn colinear_overlap(
    p0: &Point2,
    p1: &Point2,
    q0: &Point2,
    q1: &Point2,
) -> (Position, Position) {
    let axis = if (p1[0] - p0[0]).abs() >= (p1[1] - p0[1]).abs() {
        0
    } else {
        1
    };
    let (p_low, p_high, p_low_v, p_high_v) = if p0[axis] <= p1[axis] {
        (p0[axis], p1[axis], 0u8, 1u8)
    } else {
        (p1[axis], p0[axis], 1u8, 0u8)
    };
    let (q_low, q_high, q_low_v, q_high_v) = if q0[axis] <= q1[axis] {
        (q0[axis], q1[axis], 0u8, 1u8)
    } else {
        (q1[axis], q0[axis], 1u8, 0u8)
    };
    if p_high < q_low || q_high < p_low {
        return (Position::Outside, Position::Outside);
    }
    if p_high == q_low {
        return (Position::Vertex(p_high_v), Position::Vertex(q_low_v));
    }
    if q_high == p_low {
        return (Position::Vertex(p_low_v), Position::Vertex(q_high_v));
    }
    (Position::Parallel, Position::Parallel)
}

/// Positions of the intersection of segment `(s0, s1)` with a triangle:
/// `.0` on the segment, `.1` on the triangle.
pub fn segment_triangle_intersection_detection(
    s0: &Point3,
    s1: &Point3,
    triangle: &[Point3; 3],
) -> (Position, Position) {
    let [t0, t1, t2] = triangle;
    if s0 == s1 || aligned_3d(t0, t1, t2) {
        return (Position::Parallel, Position::Parallel);
    }
    let side0 = orient_3d(t0, t1, t2, s0);
    let side1 = orient_3d(t0, t1, t2, s1);
    if side0.is_zero() && side1.is_zero() {
        return coplanar_segment_triangle(s0, s1, triangle);
    }
    if side0 == side1 {
        return (Position::Outside, Position::Outside);
    }
    if !side0.is_zero() && !side1.is_zero() {
        // The segment pierces the plane strictly between its endpoints.
        let on_triangle = piercing_position(s0, s1, triangle);
        if on_triangle == Position::Outside {
            return (Position::Outside, Position::Outside);
        }
        return (Position::Inside, on_triangle);
    }
    // One endpoint sits exactly on the plane.
    let (on_plane, vertex) = if side0.is_zero() { (s0, 0u8) } else { (s1, 1u8) };
    let axis = triangle_chart_axis(triangle);
    let projected = [
        drop_axis(t0, axis),
        drop_axis(t1, axis),
        drop_axis(t2, axis),
    ];
    let on_triangle =
        point_triangle_position_2d(&drop_axis(on_plane, axis), &projected);
    if on_triangle == Position::Outside {
        return (Position::Outside, Position::Outside);
    }
    (Position::Vertex(vertex), on_triangle)
}

/// Classification of the crossing point of a segment that strictly pierces
/// the triangle plane, from the signs of the four tetrahedra formed with
/// the triangle edges.
fn piercing_position(
    s0: &Point3,
    s1: &Point3,
    triangle: &[Point3; 3],
) -> Position {
    let [t0, t1, t2] = triangle;
    let sides = [
        orient_3d(s0, s1, t0, t1),
        orient_3d(s0, s1, t1, t2),
        orient_3d(s0, s1, t2, t0),
    ];
    let has_positive = sides.contains(&Side::Positive);
    let has_negative = sides.contains(&Side::Negative);
    if has_positive && has_negative {
        return Position::Outside;
    }
    let zeros: Vec<u8> = (0..3u8)
        .filter(|&e| sides[e as usize].is_zero())
        .collect();
    match zeros.as_slice() {
        [] => Position::Inside,
        [e] => Position::Edge(*e),
        [0, 1] => Position::Vertex(1),
        [1, 2] => Position::Vertex(2),
        [0, 2] => Position::Vertex(0),
        _ => Position::Parallel,
    }
}

fn triangle_chart_axis(triangle: &[Point3; 3]) -> usize {
    let u = triangle[1] - triangle[0];
    let v = triangle[2] - triangle[0];
    let normal = u.cross(&v);
    let mut axis = 0;
    let mut best = -1.0;
    for d in 0..3 {
        if normal[d].abs() > best {
            best = normal[d].abs();
            axis = d;
        }
    }
    axis
}

fn drop_axis(p: &Point3, axis: usize) -> Point2 {
    match axis {
        0 => Point2::new(p[1], p[2]),
        1 => Point2::new(p[2], p[0]),
        _ => Point2::new(p[0], p[1]),
    }
}

/// Overlap classification of a segment lying in the triangle plane.
fn coplanar_segment_triangle(
    s0: &Point3,
    s1: &Point3,
    triangle: &[Point3; 3],
) -> (Position, Position) {
    let axis = triangle_chart_axis(triangle);
    let tri2 = [
        drop_axis(&triangle[0], axis),
        drop_axis(&triangle[1], axis),
        drop_axis(&triangle[2], axis),
    ];
    let p0 = drop_axis(s0, axis);
    let p1 = drop_axis(s1, axis);
    let pos0 = point_triangle_position_2d(&p0, &tri2);
    let pos1 = point_triangle_position_2d(&p1, &tri2);
    // Any endpoint strictly inside, or both endpoints touching, means the
    // overlap has positive measure.
    if pos0 == Position::Inside || pos1 == Position::Inside {
        return (Position::Parallel, Position::Parallel);
    }
    if pos0 != Position::Outside && pos1 != Position::Outside {
        // The chord between two boundary points of a convex region lies
        // inside it.
        return (Position::Parallel, Position::Parallel);
    }
    if pos0 != Position::Outside || pos1 != Position::Outside {
        // One endpoint on the boundary: a single-point contact unless the
        // segment also meets the boundary elsewhere.
        let (touching_vertex, on_triangle) = if pos0 != Position::Outside {
            (0u8, pos0)
        } else {
            (1u8, pos1)
        };
        for e in 0..3 {
            let (on_segment, on_edge) = segment_segment_intersection_detection(
                &p0,
                &p1,
                &tri2[e],
                &tri2[(e + 1) % 3],
            );
            match on_edge {
                Position::Outside => {}
                Position::Parallel => {
                    return (Position::Parallel, Position::Parallel);
                }
                _ => {
                    if on_segment != Position::Vertex(touching_vertex) {
                        return (Position::Parallel, Position::Parallel);
                    }
                }
            }
        }
        return (Position::Vertex(touching_vertex), on_triangle);
    }
    // Both endpoints outside: the segment either misses the triangle,
    // grazes one vertex, or traverses it (positive measure).
    let mut touched_vertices: Vec<u8> = Vec::new();
    let mut crossings = 0usize;
    for e in 0..3 {
        let (_, on_edge) = segment_segment_intersection_detection(
            &p0,
            &p1,
            &tri2[e],
            &tri2[(e + 1) % 3],
        );
        match on_edge {
            Position::Outside => {}
            Position::Parallel => {
                return (Position::Parallel, Position::Parallel);
            }
            Position::Vertex(k) => {
                let vertex = ((e as u8) + k) % 3;
                if !touched_vertices.contains(&vertex) {
                    touched_vertices.push(vertex);
                }
            }
            _ => crossings += 1,
        }
    }
    if crossings > 0 || touched_vertices.len() > 1 {
        return (Position::Parallel, Position::Parallel);
    }
    if let [vertex] = touched_vertices.as_slice() {
        return (Position::Inside, Position::Vertex(*vertex));
    }
    (Position::Outside, Position::Outside)
}

/// Intersection point of two 2D segments, when it is a single point.
pub fn segment_segment_intersection(
    p0: &Point2,
    p1: &Point2,
    q0: &Point2,
    q1: &Point2,
) -> Option<Point2> {
    let u = p1 - p0;
    let v = q1 - q0;
    let denominator = u[0] * v[1] - u[1] * v[0];
    if denominator == 0.0 {
        return None;
    }
    let w = q0 - p0;
    let t = (w[0] * v[1] - w[1] * v[0]) / denominator;
    Some(p0 + u * t)
}

/// Intersection point of a 3D segment with the plane of a triangle, when
/// the segment is not parallel to it.
pub fn segment_triangle_intersection(
    s0: &Point3,
    s1: &Point3,
    triangle: &[Point3; 3],
) -> Option<Point3> {
    let u = triangle[1] - triangle[0];
    let v = triangle[2] - triangle[0];
    let normal = u.cross(&v);
    let direction = s1 - s0;
    let denominator = normal.dot(&direction);
    if denominator == 0.0 {
        return None;
    }
    let t = normal.dot(&(triangle[0] - s0)) / denominator;
    Some(s0 + direction * t)
}

/// Distance from a point to a segment, with the foot point.
pub fn point_segment_distance<const D: usize>(
    p: &Point<D>,
    s0: &Point<D>,
    s1: &Point<D>,
) -> (f64, Point<D>) {
    let direction = s1 - s0;
    let length2 = direction.norm_squared();
    if length2 == 0.0 {
        return ((p - s0).norm(), *s0);
    }
    let t = ((p - s0).dot(&direction) / length2).clamp(0.0, 1.0);
    let foot = s0 + direction * t;
    ((p - foot).norm(), foot)
}

/// Distance from a point to a triangle, with the foot point.
pub fn point_triangle_distance(
    p: &Point3,
    triangle: &[Point3; 3],
) -> (f64, Point3) {
    let u = triangle[1] - triangle[0];
    let v = triangle[2] - triangle[0];
    let normal = u.cross(&v);
    let norm2 = normal.norm_squared();
    if norm2 != 0.0 {
        let offset = (p - triangle[0]).dot(&normal) / norm2;
        let projection = p - normal * offset;
        let axis = triangle_chart_axis(triangle);
        let tri2 = [
            drop_axis(&triangle[0], axis),
            drop_axis(&triangle[1], axis),
            drop_axis(&triangle[2], axis),
        ];
        if point_triangle_position_2d(&drop_axis(&projection, axis), &tri2)
            != Position::Outside
        {
            return ((p - projection).norm(), projection);
        }
    }
    let mut best = (f64::INFINITY, *triangle.first().unwrap());
    for e in 0..3 {
        let candidate =
            point_segment_distance(p, &triangle[e], &triangle[(e + 1) % 3]);
        if candidate.0 < best.0 {
            best = candidate;
        }
    }
    best
}

/// Closest points between two segments: `(distance, point on first,
/// point on second)`.
pub fn segment_segment_distance<const D: usize>(
    p0: &Point<D>,
    p1: &Point<D>,
    q0: &Point<D>,
    q1: &Point<D>,
) -> (f64, Point<D>, Point<D>) {
    let u = p1 - p0;
    let v = q1 - q0;
    let w = p0 - q0;
    let a = u.norm_squared();
    let b = u.dot(&v);
    let c = v.norm_squared();
    let d = u.dot(&w);
    let e = v.dot(&w);
    let denominator = a * c - b * b;
    let mut s = if denominator != 0.0 {
        ((b * e - c * d) / denominator).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let t = if c != 0.0 {
        ((b * s + e) / c).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if a != 0.0 {
        s = ((b * t - d) / a).clamp(0.0, 1.0);
    }
    let on_first = p0 + u * s;
    let on_second = q0 + v * t;
    ((on_first - on_second).norm(), on_first, on_second)
}
