//! Ray, line and segment tracing against curves (2D) and surfaces (3D).
//!
//! Hits carry a signed distance (the sign of the projection of the foot on
//! the trace direction), the symbolic position on the hit element, and the
//! hit point. Grazing hits are deduplicated by topology: two hits merge
//! when their distances agree within `GLOBAL_EPSILON` and they resolve to
//! the same mesh vertex, or to the two sides of a shared polygon edge.
//! `Inside` and `Parallel` hits never merge.

use smallvec::SmallVec;

use super::aabb::AabbTree;
use crate::GLOBAL_EPSILON;
use crate::geometry::{
    BoundingBox, Point, Position, Vector, segment_segment_intersection,
    segment_segment_intersection_detection,
    segment_triangle_intersection, segment_triangle_intersection_detection,
    point_segment_distance,
};
use crate::mesh::{EdgedCurve, PolygonEdge, SurfaceMesh};

/// One tracing hit on a mesh element.
#[derive(Clone, Debug, PartialEq)]
pub struct RayHit<const D: usize> {
    pub element: u32,
    /// Distance from the trace origin, negative behind the direction.
    pub distance: f64,
    /// Position of the hit on the element.
    pub position: Position,
    pub point: Point<D>,
}

/// Clips an infinite line to a segment covering the mesh bounding box.
fn clip_line<const D: usize>(
    bbox: &BoundingBox<D>,
    origin: &Point<D>,
    direction: &Vector<D>,
    both_sides: bool,
) -> (Point<D>, Point<D>) {
    let mut extended = bbox.clone();
    extended.add_point(origin);
    let norm = direction.norm();
    let scale = if norm > 0.0 {
        extended.diagonal().norm() / norm
    } else {
        0.0
    };
    let begin = if both_sides {
        origin - direction * scale
    } else {
        *origin
    };
    (begin, origin + direction * scale)
}

fn signed_distance<const D: usize>(
    origin: &Point<D>,
    direction: &Vector<D>,
    point: &Point<D>,
) -> f64 {
    let offset = point - origin;
    let distance = offset.norm();
    if offset.dot(direction) < 0.0 {
        -distance
    } else {
        distance
    }
}

fn sort_hits<const D: usize>(hits: &mut [RayHit<D>]) {
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Tracing engine over an edged curve.
pub struct RayTracing2D<'a> {
    mesh: &'a EdgedCurve<2>,
    origin: Point2,
    hits: Vec<RayHit<2>>,
}

type Point2 = Point<2>;
type Point3 = Point<3>;

impl<'a> RayTracing2D<'a> {
    pub fn from_ray(
        mesh: &'a EdgedCurve<2>,
        origin: Point2,
        direction: Vector<2>,
    ) -> Self {
        let (begin, end) =
            clip_line(&mesh.bounding_box(), &origin, &direction, false);
        Self::from_segment(mesh, origin, begin, end)
    }

    pub fn from_line(
        mesh: &'a EdgedCurve<2>,
        origin: Point2,
        direction: Vector<2>,
    ) -> Self {
        let (begin, end) =
            clip_line(&mesh.bounding_box(), &origin, &direction, true);
        Self::from_segment(mesh, origin, begin, end)
    }

    pub fn from_segment(
        mesh: &'a EdgedCurve<2>,
        origin: Point2,
        begin: Point2,
        end: Point2,
    ) -> Self {
        let mut engine = Self {
            mesh,
            origin,
            hits: Vec::new(),
        };
        engine.compute(begin, end);
        engine
    }

    fn compute(&mut self, begin: Point2, end: Point2) {
        let direction = end - begin;
        let boxes: Vec<BoundingBox<2>> = (0..self.mesh.nb_edges())
            .map(|edge| {
                let (p0, p1) = self.mesh.segment(edge);
                BoundingBox::from_points([&p0, &p1])
            })
            .collect();
        let tree = AabbTree::new(boxes);
        let mut candidates = Vec::new();
        tree.ray_intersections(&begin, &direction, |edge| {
            candidates.push(edge);
            false
        });
        for edge in candidates {
            self.compute_edge(edge, &begin, &end);
        }
        let trace_direction = end - self.origin;
        let hits = &mut self.hits;
        for hit in hits.iter_mut() {
            hit.distance =
                signed_distance(&self.origin, &trace_direction, &hit.point);
        }
        sort_hits(&mut self.hits);
    }

    fn compute_edge(&mut self, edge: u32, begin: &Point2, end: &Point2) {
        let (p0, p1) = self.mesh.segment(edge);
        let (_, on_edge) =
            segment_segment_intersection_detection(begin, end, &p0, &p1);
        match on_edge {
            Position::Outside => {}
            Position::Parallel => {
                // Colinear overlap: report the closest point of the edge.
                let (_, foot) = point_segment_distance(&self.origin, &p0, &p1);
                self.hits.push(RayHit {
                    element: edge,
                    distance: 0.0,
                    position: Position::Parallel,
                    point: foot,
                });
            }
            position => {
                let point = match position {
                    Position::Vertex(0) => p0,
                    Position::Vertex(_) => p1,
                    _ => segment_segment_intersection(begin, end, &p0, &p1)
                        .unwrap_or(p0),
                };
                self.hits.push(RayHit {
                    element: edge,
                    distance: 0.0,
                    position,
                    point,
                });
            }
        }
    }

    fn are_equal(&self, first: &RayHit<2>, second: &RayHit<2>) -> bool {
        if (first.distance - second.distance).abs() > GLOBAL_EPSILON {
            return false;
        }
        let (Position::Vertex(v0), Position::Vertex(v1)) =
            (first.position, second.position)
        else {
            return false;
        };
        let first_vertex =
            self.mesh.edge_vertices(first.element)[v0 as usize];
        let second_vertex =
            self.mesh.edge_vertices(second.element)[v1 as usize];
        first_vertex == second_vertex
    }

    fn deduplicate(&self, hits: &[RayHit<2>]) -> Vec<RayHit<2>> {
        let mut result: Vec<RayHit<2>> = Vec::new();
        for hit in hits {
            if !result.iter().any(|kept| self.are_equal(kept, hit)) {
                result.push(hit.clone());
            }
        }
        result
    }

    /// The closest hit, by absolute distance.
    pub fn closest(&self) -> Option<RayHit<2>> {
        self.hits
            .iter()
            .min_by(|a, b| a.distance.abs().total_cmp(&b.distance.abs()))
            .cloned()
    }

    /// The `k` nearest hits after topological deduplication.
    pub fn closest_k(&self, k: usize) -> Vec<RayHit<2>> {
        let mut deduplicated = self.deduplicate(&self.hits);
        deduplicated
            .sort_by(|a, b| a.distance.abs().total_cmp(&b.distance.abs()));
        deduplicated.truncate(k);
        deduplicated
    }

    /// Every distinct hit, sorted by signed distance.
    pub fn all_intersections(&self) -> Vec<RayHit<2>> {
        self.deduplicate(&self.hits)
    }
}

/// Tracing engine over a surface mesh.
pub struct RayTracing3D<'a> {
    mesh: &'a SurfaceMesh<3>,
    origin: Point3,
    hits: Vec<RayHit<3>>,
}

impl<'a> RayTracing3D<'a> {
    pub fn from_ray(
        mesh: &'a SurfaceMesh<3>,
        origin: Point3,
        direction: Vector<3>,
    ) -> Self {
        let (begin, end) =
            clip_line(&mesh.bounding_box(), &origin, &direction, false);
        Self::from_segment(mesh, origin, begin, end)
    }

    pub fn from_line(
        mesh: &'a SurfaceMesh<3>,
        origin: Point3,
        direction: Vector<3>,
    ) -> Self {
        let (begin, end) =
            clip_line(&mesh.bounding_box(), &origin, &direction, true);
        Self::from_segment(mesh, origin, begin, end)
    }

    pub fn from_segment(
        mesh: &'a SurfaceMesh<3>,
        origin: Point3,
        begin: Point3,
        end: Point3,
    ) -> Self {
        let mut engine = Self {
            mesh,
            origin,
            hits: Vec::new(),
        };
        engine.compute(begin, end);
        engine
    }

    fn compute(&mut self, begin: Point3, end: Point3) {
        let direction = end - begin;
        let boxes: Vec<BoundingBox<3>> = (0..self.mesh.nb_polygons())
            .map(|polygon| {
                let mut bbox = BoundingBox::new();
                for &vertex in self.mesh.polygon_vertices(polygon) {
                    bbox.add_point(&self.mesh.point(vertex));
                }
                bbox
            })
            .collect();
        let tree = AabbTree::new(boxes);
        let mut candidates = Vec::new();
        tree.ray_intersections(&begin, &direction, |polygon| {
            candidates.push(polygon);
            false
        });
        for polygon in candidates {
            self.compute_polygon(polygon, &begin, &end);
        }
        let trace_direction = end - self.origin;
        for hit in &mut self.hits {
            hit.distance =
                signed_distance(&self.origin, &trace_direction, &hit.point);
        }
        sort_hits(&mut self.hits);
    }

    /// Fan-triangulates the polygon from its first vertex; triangle-local
    /// positions are lifted back to polygon-local codes.
    fn compute_polygon(&mut self, polygon: u32, begin: &Point3, end: &Point3) {
        let vertices: SmallVec<[u32; 8]> =
            self.mesh.polygon_vertices(polygon).iter().copied().collect();
        let arity = vertices.len();
        let p0 = self.mesh.point(vertices[0]);
        for fan in 1..arity - 1 {
            let triangle = [
                p0,
                self.mesh.point(vertices[fan]),
                self.mesh.point(vertices[fan + 1]),
            ];
            let (_, on_triangle) = segment_triangle_intersection_detection(
                begin, end, &triangle,
            );
            if on_triangle == Position::Outside {
                continue;
            }
            let position = lift_fan_position(
                on_triangle,
                fan as u8,
                arity as u8,
            );
            let point = match on_triangle {
                Position::Vertex(local) => triangle[local as usize],
                _ => {
                    match segment_triangle_intersection(begin, end, &triangle)
                    {
                        Some(point) => point,
                        // Coplanar grazing: report the foot point.
                        None => {
                            crate::geometry::point_triangle_distance(
                                &self.origin,
                                &triangle,
                            )
                            .1
                        }
                    }
                }
            };
            self.hits.push(RayHit {
                element: polygon,
                distance: 0.0,
                position,
                point,
            });
            break;
        }
    }

    fn are_equal(&self, first: &RayHit<3>, second: &RayHit<3>) -> bool {
        if (first.distance - second.distance).abs() > GLOBAL_EPSILON {
            return false;
        }
        match (first.position, second.position) {
            (Position::Vertex(v0), Position::Vertex(v1)) => {
                let first_vertex = self.mesh.polygon_vertex(
                    crate::mesh::PolygonVertex::new(first.element, v0),
                );
                let second_vertex = self.mesh.polygon_vertex(
                    crate::mesh::PolygonVertex::new(second.element, v1),
                );
                first_vertex == second_vertex
            }
            (Position::Edge(e0), Position::Edge(e1)) => {
                self.mesh.polygon_adjacent_edge(PolygonEdge::new(
                    first.element,
                    e0,
                )) == Some(PolygonEdge::new(second.element, e1))
            }
            _ => false,
        }
    }

    fn deduplicate(&self, hits: &[RayHit<3>]) -> Vec<RayHit<3>> {
        let mut result: Vec<RayHit<3>> = Vec::new();
        for hit in hits {
            if !result.iter().any(|kept| self.are_equal(kept, hit)) {
                result.push(hit.clone());
            }
        }
        result
    }

    pub fn closest(&self) -> Option<RayHit<3>> {
        self.hits
            .iter()
            .min_by(|a, b| a.distance.abs().total_cmp(&b.distance.abs()))
            .cloned()
    }

    pub fn closest_k(&self, k: usize) -> Vec<RayHit<3>> {
        let mut deduplicated = self.deduplicate(&self.hits);
        deduplicated
            .sort_by(|a, b| a.distance.abs().total_cmp(&b.distance.abs()));
        deduplicated.truncate(k);
        deduplicated
    }

    pub fn all_intersections(&self) -> Vec<RayHit<3>> {
        self.deduplicate(&self.hits)
    }
}

/// Maps a position on the fan triangle `(0, fan, fan + 1)` of a polygon
/// back to polygon-local codes; fan diagonals are interior.
fn lift_fan_position(position: Position, fan: u8, arity: u8) -> Position {
    match position {
        Position::Vertex(0) => Position::Vertex(0),
        Position::Vertex(1) => Position::Vertex(fan),
        Position::Vertex(_) => Position::Vertex(fan + 1),
        Position::Edge(0) => {
            if fan == 1 {
                Position::Edge(0)
            } else {
                Position::Inside
            }
        }
        Position::Edge(1) => Position::Edge(fan),
        Position::Edge(_) => {
            if fan + 2 == arity {
                Position::Edge(arity - 1)
            } else {
                Position::Inside
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2, Vector2};
    use crate::mesh::EdgedCurveBuilder;

    fn square_curve() -> EdgedCurve<2> {
        let mut curve = EdgedCurve::new();
        let mut builder = EdgedCurveBuilder::new(&mut curve);
        builder.create_point(Point2::new(0.0, 0.0));
        builder.create_point(Point2::new(2.0, 0.0));
        builder.create_point(Point2::new(2.0, 2.0));
        builder.create_point(Point2::new(0.0, 2.0));
        builder.create_edge(0, 1).unwrap();
        builder.create_edge(1, 2).unwrap();
        builder.create_edge(2, 3).unwrap();
        builder.create_edge(3, 0).unwrap();
        curve
    }

    #[test]
    fn ray_through_a_square() {
        let curve = square_curve();
        let tracing = RayTracing2D::from_ray(
            &curve,
            Point2::new(1.0, -1.0),
            Vector2::new(0.0, 1.0),
        );
        let hits = tracing.all_intersections();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].element, 0);
        assert_eq!(hits[0].position, Position::Inside);
        assert!((hits[0].distance - 1.0).abs() < 1e-12);
        assert_eq!(hits[1].element, 2);
        assert!((hits[1].distance - 3.0).abs() < 1e-12);
        let closest = tracing.closest().unwrap();
        assert_eq!(closest.element, 0);
    }

    #[test]
    fn ray_behind_origin_has_negative_distance() {
        let curve = square_curve();
        let tracing = RayTracing2D::from_line(
            &curve,
            Point2::new(1.0, 3.0),
            Vector2::new(0.0, 1.0),
        );
        let hits = tracing.all_intersections();
        assert_eq!(hits.len(), 2);
        assert!((hits[0].distance + 3.0).abs() < 1e-12);
        assert!((hits[1].distance + 1.0).abs() < 1e-12);
    }

    #[test]
    fn shared_vertex_reported_once() {
        let curve = square_curve();
        // Diagonal ray grazing the corner (2, 0), shared by edges 0 and 1.
        let tracing = RayTracing2D::from_ray(
            &curve,
            Point2::new(1.0, -1.0),
            Vector2::new(1.0, 1.0),
        );
        let hits = tracing.all_intersections();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].position.is_on_boundary());
    }

    #[test]
    fn fan_lift() {
        // Quad fan: triangles (0, 1, 2) and (0, 2, 3).
        assert_eq!(lift_fan_position(Position::Edge(0), 1, 4), Position::Edge(0));
        assert_eq!(lift_fan_position(Position::Edge(1), 1, 4), Position::Edge(1));
        assert_eq!(lift_fan_position(Position::Edge(2), 1, 4), Position::Inside);
        assert_eq!(lift_fan_position(Position::Edge(0), 2, 4), Position::Inside);
        assert_eq!(lift_fan_position(Position::Edge(2), 2, 4), Position::Edge(3));
        assert_eq!(lift_fan_position(Position::Vertex(2), 2, 4), Position::Vertex(3));
    }
}
