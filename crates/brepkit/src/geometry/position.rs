//! Symbolic classification of a point against segments, triangles and
//! tetrahedra.
//!
//! Everything here reduces to exact predicate signs; no tolerances. The
//! `Parallel` code flags degenerate support elements (zero-length segment,
//! flat triangle or tetrahedron), for which no classification is meaningful.

use super::predicates::{Side, aligned_3d, orient_2d, orient_3d};
use super::{Point, Point2, Point3};

/// Symbolic position of a point relative to an element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Position {
    Outside,
    Inside,
    /// On the i-th vertex of the element.
    Vertex(u8),
    /// On the interior of the i-th edge of the element.
    Edge(u8),
    /// On the interior of the i-th facet of the element.
    Facet(u8),
    /// Degenerate configuration: the element has no measure, or the overlap
    /// has positive measure in an intersection classification.
    Parallel,
}

impl Position {
    pub fn is_on_boundary(self) -> bool {
        matches!(
            self,
            Position::Vertex(_) | Position::Edge(_) | Position::Facet(_)
        )
    }
}

/// Side of `p` relative to the oriented segment `s0 -> s1`.
pub fn point_side_to_segment(p: &Point2, s0: &Point2, s1: &Point2) -> Side {
    orient_2d(s0, s1, p)
}

/// Side of `p` relative to the oriented line through `a` and `b`.
pub fn point_side_to_line(p: &Point2, a: &Point2, b: &Point2) -> Side {
    orient_2d(a, b, p)
}

/// Side of `p` relative to the plane spanned by `a`, `b`, `c`.
pub fn point_side_to_plane(
    p: &Point3,
    a: &Point3,
    b: &Point3,
    c: &Point3,
) -> Side {
    orient_3d(a, b, c, p)
}

/// Side of `p` relative to the supporting plane of an oriented triangle.
pub fn point_side_to_triangle(p: &Point3, triangle: &[Point3; 3]) -> Side {
    orient_3d(&triangle[0], &triangle[1], &triangle[2], p)
}

/// Index of the coordinate axis along which the segment extends the most.
fn dominant_axis<const D: usize>(s0: &Point<D>, s1: &Point<D>) -> usize {
    let mut axis = 0;
    let mut best = -1.0;
    for d in 0..D {
        let extent = (s1[d] - s0[d]).abs();
        if extent > best {
            best = extent;
            axis = d;
        }
    }
    axis
}

/// Position of a point known to be colinear with `s0 -> s1`, by exact
/// coordinate comparison along the dominant axis.
fn colinear_segment_position<const D: usize>(
    p: &Point<D>,
    s0: &Point<D>,
    s1: &Point<D>,
) -> Position {
    if p == s0 {
        return Position::Vertex(0);
    }
    if p == s1 {
        return Position::Vertex(1);
    }
    let axis = dominant_axis(s0, s1);
    let (low, high) = if s0[axis] <= s1[axis] {
        (s0[axis], s1[axis])
    } else {
        (s1[axis], s0[axis])
    };
    if p[axis] > low && p[axis] < high {
        Position::Inside
    } else {
        Position::Outside
    }
}

pub fn point_segment_position_2d(
    p: &Point2,
    s0: &Point2,
    s1: &Point2,
) -> Position {
    if s0 == s1 {
        return Position::Parallel;
    }
    if !orient_2d(s0, s1, p).is_zero() {
        return Position::Outside;
    }
    colinear_segment_position(p, s0, s1)
}

pub fn point_segment_position_3d(
    p: &Point3,
    s0: &Point3,
    s1: &Point3,
) -> Position {
    if s0 == s1 {
        return Position::Parallel;
    }
    if !aligned_3d(s0, s1, p) {
        return Position::Outside;
    }
    colinear_segment_position(p, s0, s1)
}

/// Classifies sign triples against the triangle edges `(0,1) (1,2) (2,0)`,
/// assuming they are already normalized to the triangle orientation.
fn classify_triangle_sides(sides: [Side; 3]) -> Position {
    if sides.contains(&Side::Negative) {
        return Position::Outside;
    }
    let zeros: Vec<u8> = (0..3u8)
        .filter(|&e| sides[e as usize].is_zero())
        .collect();
    match zeros.as_slice() {
        [] => Position::Inside,
        [e] => Position::Edge(*e),
        // Two touching edges share their middle vertex.
        [0, 1] => Position::Vertex(1),
        [1, 2] => Position::Vertex(2),
        [0, 2] => Position::Vertex(0),
        _ => Position::Parallel,
    }
}

pub fn point_triangle_position_2d(p: &Point2, triangle: &[Point2; 3]) -> Position {
    let [v0, v1, v2] = triangle;
    let orientation = orient_2d(v0, v1, v2);
    if orientation.is_zero() {
        return Position::Parallel;
    }
    let mut sides = [
        orient_2d(v0, v1, p),
        orient_2d(v1, v2, p),
        orient_2d(v2, v0, p),
    ];
    if orientation == Side::Negative {
        for side in &mut sides {
            *side = side.opposite();
        }
    }
    classify_triangle_sides(sides)
}

/// Axis to drop so that the triangle projects injectively: the one with the
/// largest normal component. The choice only selects a chart; the
/// classification in the chart stays exact.
fn normal_dominant_axis(triangle: &[Point3; 3]) -> usize {
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

pub fn point_triangle_position_3d(p: &Point3, triangle: &[Point3; 3]) -> Position {
    if aligned_3d(&triangle[0], &triangle[1], &triangle[2]) {
        return Position::Parallel;
    }
    if !orient_3d(&triangle[0], &triangle[1], &triangle[2], p).is_zero() {
        return Position::Outside;
    }
    let axis = normal_dominant_axis(triangle);
    let projected = [
        drop_axis(&triangle[0], axis),
        drop_axis(&triangle[1], axis),
        drop_axis(&triangle[2], axis),
    ];
    point_triangle_position_2d(&drop_axis(p, axis), &projected)
}

/// Facet `f` is opposite vertex `f`, oriented outward for a tetrahedron
/// with `orient_3d(v0, v1, v2, v3) == Positive`.
pub(crate) const TETRAHEDRON_FACET_VERTICES: [[usize; 3]; 4] =
    [[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]];

pub(crate) const TETRAHEDRON_EDGE_VERTICES: [[usize; 2]; 6] =
    [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

fn tetrahedron_edge_index(v0: usize, v1: usize) -> u8 {
    let key = if v0 < v1 { [v0, v1] } else { [v1, v0] };
    TETRAHEDRON_EDGE_VERTICES
        .iter()
        .position(|edge| *edge == key)
        .unwrap() as u8
}

pub fn point_tetrahedron_position(p: &Point3, tet: &[Point3; 4]) -> Position {
    let orientation = orient_3d(&tet[0], &tet[1], &tet[2], &tet[3]);
    if orientation.is_zero() {
        return Position::Parallel;
    }
    let mut zero_facets: Vec<usize> = Vec::new();
    for (f, facet) in TETRAHEDRON_FACET_VERTICES.iter().enumerate() {
        let mut side =
            orient_3d(&tet[facet[0]], &tet[facet[1]], &tet[facet[2]], p);
        if orientation == Side::Negative {
            side = side.opposite();
        }
        match side {
            // Outward facet: inside points are on the negative side.
            Side::Positive => return Position::Outside,
            Side::Zero => zero_facets.push(f),
            Side::Negative => {}
        }
    }
    match zero_facets.as_slice() {
        [] => Position::Inside,
        [f] => Position::Facet(*f as u8),
        [f0, f1] => {
            let shared: Vec<usize> = TETRAHEDRON_FACET_VERTICES[*f0]
                .iter()
                .copied()
                .filter(|v| TETRAHEDRON_FACET_VERTICES[*f1].contains(v))
                .collect();
            Position::Edge(tetrahedron_edge_index(shared[0], shared[1]))
        }
        [f0, f1, f2] => {
            let shared = TETRAHEDRON_FACET_VERTICES[*f0]
                .iter()
                .copied()
                .find(|v| {
                    TETRAHEDRON_FACET_VERTICES[*f1].contains(v)
                        && TETRAHEDRON_FACET_VERTICES[*f2].contains(v)
                })
                .unwrap();
            Position::Vertex(shared as u8)
        }
        _ => Position::Parallel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_positions_2d() {
        let s0 = Point2::new(0.0, 0.0);
        let s1 = Point2::new(1.0, 0.0);
        assert_eq!(
            point_segment_position_2d(&Point2::new(0.5, 0.0), &s0, &s1),
            Position::Inside
        );
        assert_eq!(
            point_segment_position_2d(&Point2::new(10.0, 0.0), &s0, &s1),
            Position::Outside
        );
        assert_eq!(
            point_segment_position_2d(&Point2::new(0.3, 2.0), &s0, &s1),
            Position::Outside
        );
        assert_eq!(
            point_segment_position_2d(&Point2::new(12.0, -6.0), &s0, &s1),
            Position::Outside
        );
        assert_eq!(
            point_segment_position_2d(&Point2::new(0.0, -1e-10), &s0, &s1),
            Position::Outside
        );
        assert_eq!(
            point_segment_position_2d(&s0, &s0, &s1),
            Position::Vertex(0)
        );
        assert_eq!(
            point_segment_position_2d(&s1, &s0, &s1),
            Position::Vertex(1)
        );
        assert_eq!(
            point_segment_position_2d(&s0, &s0, &s0),
            Position::Parallel
        );
    }

    #[test]
    fn segment_positions_3d() {
        let s0 = Point3::new(0.0, 0.0, 0.0);
        let s1 = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(
            point_segment_position_3d(&Point3::new(0.5, 0.5, 0.5), &s0, &s1),
            Position::Inside
        );
        assert_eq!(
            point_segment_position_3d(&Point3::new(2.0, 2.0, 2.0), &s0, &s1),
            Position::Outside
        );
        assert_eq!(
            point_segment_position_3d(&Point3::new(0.5, 0.5, 0.6), &s0, &s1),
            Position::Outside
        );
    }

    #[test]
    fn triangle_positions_2d() {
        let triangle = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert_eq!(
            point_triangle_position_2d(&Point2::new(0.25, 0.25), &triangle),
            Position::Inside
        );
        assert_eq!(
            point_triangle_position_2d(&Point2::new(0.5, 0.0), &triangle),
            Position::Edge(0)
        );
        assert_eq!(
            point_triangle_position_2d(&Point2::new(0.5, 0.5), &triangle),
            Position::Edge(1)
        );
        assert_eq!(
            point_triangle_position_2d(&Point2::new(0.0, 0.0), &triangle),
            Position::Vertex(0)
        );
        assert_eq!(
            point_triangle_position_2d(&Point2::new(2.0, 0.0), &triangle),
            Position::Outside
        );
        // Clockwise winding classifies the same.
        let clockwise = [triangle[0], triangle[2], triangle[1]];
        assert_eq!(
            point_triangle_position_2d(&Point2::new(0.25, 0.25), &clockwise),
            Position::Inside
        );
        let flat = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert_eq!(
            point_triangle_position_2d(&Point2::new(0.5, 0.0), &flat),
            Position::Parallel
        );
    }

    #[test]
    fn triangle_positions_3d() {
        let triangle = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        assert_eq!(
            point_triangle_position_3d(&Point3::new(0.25, 0.25, 1.0), &triangle),
            Position::Inside
        );
        assert_eq!(
            point_triangle_position_3d(&Point3::new(0.25, 0.25, 1.5), &triangle),
            Position::Outside
        );
        assert_eq!(
            point_triangle_position_3d(&Point3::new(0.5, 0.0, 1.0), &triangle),
            Position::Edge(0)
        );
        assert_eq!(
            point_triangle_position_3d(&Point3::new(1.0, 0.0, 1.0), &triangle),
            Position::Vertex(1)
        );
    }

    #[test]
    fn tetrahedron_positions() {
        let tet = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        assert_eq!(
            point_tetrahedron_position(&Point3::new(0.1, 0.1, 0.1), &tet),
            Position::Inside
        );
        assert_eq!(
            point_tetrahedron_position(&Point3::new(2.0, 0.0, 0.0), &tet),
            Position::Outside
        );
        for (v, vertex) in tet.iter().enumerate() {
            assert_eq!(
                point_tetrahedron_position(vertex, &tet),
                Position::Vertex(v as u8)
            );
        }
        // Base facet interior (z = 0) is facet 3.
        assert_eq!(
            point_tetrahedron_position(&Point3::new(0.2, 0.2, 0.0), &tet),
            Position::Facet(3)
        );
        // Middle of edge (0, 1).
        assert_eq!(
            point_tetrahedron_position(&Point3::new(0.5, 0.0, 0.0), &tet),
            Position::Edge(0)
        );
        // Middle of edge (2, 3).
        assert_eq!(
            point_tetrahedron_position(&Point3::new(0.0, 0.5, 0.5), &tet),
            Position::Edge(5)
        );
        let flat = [tet[0], tet[1], tet[2], Point3::new(1.0, 1.0, 0.0)];
        assert_eq!(
            point_tetrahedron_position(&Point3::new(0.1, 0.1, 0.0), &flat),
            Position::Parallel
        );
    }
}
