//! Polygonal surface mesh: polygons of arity >= 3 with edge adjacencies,
//! an optional derived edge table, and one-ring queries.

mod builder;
mod edges;

pub use self::builder::SurfaceBuilder;
pub use self::edges::SurfaceEdges;
pub(crate) use self::edges::edge_key;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::packed::PackedRows;
use super::point_set::PointSet;
use crate::attributes::{Attribute, AttributeManager, AttributeValue};
use crate::geometry::{BoundingBox, Point, Vector, try_normalize};
use crate::{NO_ID, NO_LID};

/// Local vertex `vertex` of polygon `polygon`.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct PolygonVertex {
    pub polygon: u32,
    pub vertex: u8,
}

impl PolygonVertex {
    pub fn new(polygon: u32, vertex: u8) -> Self {
        Self { polygon, vertex }
    }
}

impl Default for PolygonVertex {
    fn default() -> Self {
        Self {
            polygon: NO_ID,
            vertex: NO_LID,
        }
    }
}

impl AttributeValue for PolygonVertex {}

/// Local edge `edge` of polygon `polygon`, from `polygon_vertex(edge)` to
/// `polygon_vertex(edge + 1)` in cyclic order.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct PolygonEdge {
    pub polygon: u32,
    pub edge: u8,
}

impl PolygonEdge {
    pub fn new(polygon: u32, edge: u8) -> Self {
        Self { polygon, edge }
    }
}

impl Default for PolygonEdge {
    fn default() -> Self {
        Self {
            polygon: NO_ID,
            edge: NO_LID,
        }
    }
}

impl AttributeValue for PolygonEdge {}

pub(crate) const AROUND_VERTEX_ATTRIBUTE: &str = "polygon_around_vertex";

#[derive(Debug)]
pub struct SurfaceMesh<const D: usize> {
    points: PointSet<D>,
    polygons: PackedRows,
    /// Parallel to `polygons`: per polygon edge, the adjacent polygon or
    /// `NO_ID` on border.
    adjacents: PackedRows,
    polygon_attributes: AttributeManager,
    /// Per-vertex cached hint: one polygon corner using the vertex.
    around_vertex: Attribute<PolygonVertex>,
    edges: Option<SurfaceEdges>,
}

impl<const D: usize> Clone for SurfaceMesh<D> {
    fn clone(&self) -> Self {
        let points = self.points.clone();
        let around_vertex = points
            .vertex_attribute_manager()
            .find_attribute(AROUND_VERTEX_ATTRIBUTE)
            .expect("cloned surface keeps its around-vertex cache");
        Self {
            points,
            polygons: self.polygons.clone(),
            adjacents: self.adjacents.clone(),
            polygon_attributes: self.polygon_attributes.clone(),
            around_vertex,
            edges: self.edges.clone(),
        }
    }
}

impl<const D: usize> Default for SurfaceMesh<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> SurfaceMesh<D> {
    pub fn new() -> Self {
        let mut points = PointSet::new();
        // Internal derived state: never copied or transferred, only kept
        // in row lockstep.
        let around_vertex = points
            .vertex_attribute_manager_mut()
            .find_or_create_attribute_with_flags(
                AROUND_VERTEX_ATTRIBUTE,
                PolygonVertex::default(),
                crate::attributes::AttributeFlags {
                    assignable: false,
                    interpolable: false,
                    transferable: false,
                },
            )
            .expect("fresh manager");
        Self {
            points,
            polygons: PackedRows::new(),
            adjacents: PackedRows::new(),
            polygon_attributes: AttributeManager::new(0),
            around_vertex,
            edges: None,
        }
    }

    pub fn nb_vertices(&self) -> u32 {
        self.points.nb_vertices()
    }

    pub fn nb_polygons(&self) -> u32 {
        self.polygons.len()
    }

    pub fn point(&self, vertex: u32) -> Point<D> {
        self.points.point(vertex)
    }

    pub fn point_set(&self) -> &PointSet<D> {
        &self.points
    }

    pub fn bounding_box(&self) -> BoundingBox<D> {
        self.points.bounding_box()
    }

    pub fn vertex_attribute_manager(&self) -> &AttributeManager {
        self.points.vertex_attribute_manager()
    }

    pub fn vertex_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        self.points.vertex_attribute_manager_mut()
    }

    pub fn polygon_attribute_manager(&self) -> &AttributeManager {
        &self.polygon_attributes
    }

    pub fn polygon_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        &mut self.polygon_attributes
    }

    pub fn polygon_vertices(&self, polygon: u32) -> &[u32] {
        self.polygons.row(polygon)
    }

    pub fn polygon_vertex(&self, vertex: PolygonVertex) -> u32 {
        self.polygons.row(vertex.polygon)[vertex.vertex as usize]
    }

    pub fn nb_polygon_vertices(&self, polygon: u32) -> u32 {
        self.polygons.row_len(polygon)
    }

    pub fn nb_polygon_edges(&self, polygon: u32) -> u32 {
        self.polygons.row_len(polygon)
    }

    pub fn next_polygon_vertex(&self, vertex: PolygonVertex) -> PolygonVertex {
        let arity = self.nb_polygon_vertices(vertex.polygon) as u8;
        PolygonVertex::new(vertex.polygon, (vertex.vertex + 1) % arity)
    }

    pub fn previous_polygon_vertex(
        &self,
        vertex: PolygonVertex,
    ) -> PolygonVertex {
        let arity = self.nb_polygon_vertices(vertex.polygon) as u8;
        PolygonVertex::new(vertex.polygon, (vertex.vertex + arity - 1) % arity)
    }

    pub fn next_polygon_edge(&self, edge: PolygonEdge) -> PolygonEdge {
        let arity = self.nb_polygon_edges(edge.polygon) as u8;
        PolygonEdge::new(edge.polygon, (edge.edge + 1) % arity)
    }

    pub fn previous_polygon_edge(&self, edge: PolygonEdge) -> PolygonEdge {
        let arity = self.nb_polygon_edges(edge.polygon) as u8;
        PolygonEdge::new(edge.polygon, (edge.edge + arity - 1) % arity)
    }

    /// Vertices of a polygon edge, `(from, to)` in polygon order.
    pub fn polygon_edge_vertices(&self, edge: PolygonEdge) -> [u32; 2] {
        let vertices = self.polygons.row(edge.polygon);
        let from = vertices[edge.edge as usize];
        let to = vertices[(edge.edge as usize + 1) % vertices.len()];
        [from, to]
    }

    pub fn polygon_edge_vertex(&self, edge: PolygonEdge, which: u8) -> u32 {
        self.polygon_edge_vertices(edge)[which as usize]
    }

    pub fn polygon_adjacent(&self, edge: PolygonEdge) -> Option<u32> {
        let adjacent = self.adjacents.row(edge.polygon)[edge.edge as usize];
        (adjacent != NO_ID).then_some(adjacent)
    }

    /// The matching edge on the adjacent polygon, reciprocal of `edge`.
    pub fn polygon_adjacent_edge(&self, edge: PolygonEdge) -> Option<PolygonEdge> {
        let adjacent = self.polygon_adjacent(edge)?;
        let [from, to] = self.polygon_edge_vertices(edge);
        let vertices = self.polygons.row(adjacent);
        let arity = vertices.len();
        // A consistently oriented neighbor holds the reversed pair.
        for local in 0..arity {
            if vertices[local] == to && vertices[(local + 1) % arity] == from {
                return Some(PolygonEdge::new(adjacent, local as u8));
            }
        }
        for local in 0..arity {
            if vertices[local] == from && vertices[(local + 1) % arity] == to {
                return Some(PolygonEdge::new(adjacent, local as u8));
            }
        }
        None
    }

    pub fn is_edge_on_border(&self, edge: PolygonEdge) -> bool {
        self.polygon_adjacent(edge).is_none()
    }

    pub fn is_polygon_on_border(&self, polygon: u32) -> bool {
        !self.polygon_edges_on_border(polygon).is_empty()
    }

    pub fn polygon_edges_on_border(
        &self,
        polygon: u32,
    ) -> SmallVec<[PolygonEdge; 4]> {
        (0..self.nb_polygon_edges(polygon) as u8)
            .map(|edge| PolygonEdge::new(polygon, edge))
            .filter(|&edge| self.is_edge_on_border(edge))
            .collect()
    }

    /// Next border edge when walking the border forward through the shared
    /// vertex. The input edge must be on border.
    pub fn next_on_border(&self, edge: PolygonEdge) -> PolygonEdge {
        assert!(self.is_edge_on_border(edge), "edge must be on border");
        let mut current = self.next_polygon_edge(edge);
        while let Some(opposite) = self.polygon_adjacent_edge(current) {
            current = self.next_polygon_edge(opposite);
        }
        current
    }

    /// Previous border edge, symmetric of [`SurfaceMesh::next_on_border`].
    pub fn previous_on_border(&self, edge: PolygonEdge) -> PolygonEdge {
        assert!(self.is_edge_on_border(edge), "edge must be on border");
        let mut current = self.previous_polygon_edge(edge);
        while let Some(opposite) = self.polygon_adjacent_edge(current) {
            current = self.previous_polygon_edge(opposite);
        }
        current
    }

    /// Every polygon corner using `vertex`, walked through adjacencies
    /// from the cached hint.
    pub fn polygons_around_vertex(
        &self,
        vertex: u32,
    ) -> SmallVec<[PolygonVertex; 10]> {
        let mut result = SmallVec::new();
        let hint = self.around_vertex.value(vertex);
        if hint.polygon == NO_ID {
            return result;
        }
        let start = hint;
        let mut current = start;
        let mut border_reached = false;
        loop {
            result.push(current);
            let edge = PolygonEdge::new(current.polygon, current.vertex);
            match self.polygon_adjacent_edge(edge) {
                None => {
                    border_reached = true;
                    break;
                }
                Some(opposite) => {
                    let mut next = self.next_polygon_vertex(
                        PolygonVertex::new(opposite.polygon, opposite.edge),
                    );
                    if self.polygon_vertex(next) != vertex {
                        // Neighbor with flipped orientation.
                        next =
                            PolygonVertex::new(opposite.polygon, opposite.edge);
                    }
                    if next == start
                        || result.iter().any(|&pv| pv.polygon == next.polygon)
                    {
                        break;
                    }
                    current = next;
                }
            }
        }
        if border_reached {
            // Walk the other way around from the start.
            let mut backward = start;
            loop {
                let edge = self.previous_polygon_edge(PolygonEdge::new(
                    backward.polygon,
                    backward.vertex,
                ));
                let Some(opposite) = self.polygon_adjacent_edge(edge) else {
                    break;
                };
                let mut previous =
                    PolygonVertex::new(opposite.polygon, opposite.edge);
                if self.polygon_vertex(previous) != vertex {
                    previous = self.next_polygon_vertex(previous);
                }
                if result.iter().any(|&pv| pv.polygon == previous.polygon) {
                    break;
                }
                result.push(previous);
                backward = previous;
            }
        }
        result
    }

    /// The polygon edge going from `from` to `to`, if any. Directional:
    /// `(to, from)` is not a match.
    pub fn polygon_edge_from_vertices(
        &self,
        from: u32,
        to: u32,
    ) -> Option<PolygonEdge> {
        for corner in self.polygons_around_vertex(from) {
            if corner.vertex as u32 >= self.nb_polygon_vertices(corner.polygon)
            {
                continue;
            }
            let edge = PolygonEdge::new(corner.polygon, corner.vertex);
            if self.polygon_edge_vertices(edge) == [from, to] {
                return Some(edge);
            }
        }
        None
    }

    pub fn is_vertex_isolated(&self, vertex: u32) -> bool {
        self.around_vertex.value(vertex).polygon == NO_ID
    }

    pub fn are_edges_enabled(&self) -> bool {
        self.edges.is_some()
    }

    /// Materializes the edge table and its attribute manager. Idempotent.
    pub fn enable_edges(&mut self) {
        if self.edges.is_some() {
            return;
        }
        let mut edges = SurfaceEdges::new();
        for polygon in 0..self.nb_polygons() {
            let vertices = self.polygons.row(polygon);
            let arity = vertices.len();
            for local in 0..arity {
                edges.find_or_create_edge(
                    vertices[local],
                    vertices[(local + 1) % arity],
                );
            }
        }
        self.edges = Some(edges);
    }

    /// Drops the edge table and every edge attribute. Idempotent.
    pub fn disable_edges(&mut self) {
        self.edges = None;
    }

    pub fn edges(&self) -> &SurfaceEdges {
        self.edges.as_ref().expect("surface edges are not enabled")
    }

    pub fn edges_mut(&mut self) -> &mut SurfaceEdges {
        self.edges.as_mut().expect("surface edges are not enabled")
    }

    pub fn nb_edges(&self) -> u32 {
        self.edges().nb_edges()
    }

    pub fn edge_vertices(&self, edge: u32) -> [u32; 2] {
        self.edges().edge_vertices(edge)
    }

    /// Deduplicated edge id of a polygon edge.
    pub fn polygon_edge(&self, edge: PolygonEdge) -> u32 {
        let [from, to] = self.polygon_edge_vertices(edge);
        self.edges()
            .edge_from_vertices(from, to)
            .expect("polygon edge is registered")
    }

    pub fn is_edge_isolated(&self, edge: u32) -> bool {
        let key = self.edge_vertices(edge);
        for polygon in 0..self.nb_polygons() {
            let vertices = self.polygons.row(polygon);
            for local in 0..vertices.len() {
                let pair = edge_key(
                    vertices[local],
                    vertices[(local + 1) % vertices.len()],
                );
                if pair == key {
                    return false;
                }
            }
        }
        true
    }

    pub fn edge_attribute_manager(&self) -> &AttributeManager {
        self.edges().edge_attribute_manager()
    }

    pub fn edge_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        self.edges_mut().edge_attribute_manager_mut()
    }

    pub fn edge_barycenter(&self, edge: u32) -> Point<D> {
        let [v0, v1] = self.edge_vertices(edge);
        nalgebra::center(&self.point(v0), &self.point(v1))
    }

    pub fn edge_length(&self, edge: u32) -> f64 {
        let [v0, v1] = self.edge_vertices(edge);
        (self.point(v1) - self.point(v0)).norm()
    }

    pub fn polygon_barycenter(&self, polygon: u32) -> Point<D> {
        let vertices = self.polygon_vertices(polygon);
        let mut sum = Vector::<D>::zeros();
        for &vertex in vertices {
            sum += self.point(vertex).coords;
        }
        Point::from(sum / vertices.len() as f64)
    }

}

impl SurfaceMesh<2> {
    /// Signed shoelace area of the polygon (positive counterclockwise).
    pub fn polygon_area(&self, polygon: u32) -> f64 {
        let vertices = self.polygon_vertices(polygon);
        let mut twice_area = 0.0;
        for local in 0..vertices.len() {
            let p = self.point(vertices[local]);
            let q = self.point(vertices[(local + 1) % vertices.len()]);
            twice_area += p[0] * q[1] - q[0] * p[1];
        }
        twice_area / 2.0
    }
}

impl SurfaceMesh<3> {
    /// Area vector by Newell's method, normalized; `None` for degenerate
    /// polygons.
    pub fn polygon_normal(&self, polygon: u32) -> Option<Vector<3>> {
        let vertices = self.polygon_vertices(polygon);
        let mut normal = Vector::<3>::zeros();
        for local in 0..vertices.len() {
            let p = self.point(vertices[local]).coords;
            let q = self.point(vertices[(local + 1) % vertices.len()]).coords;
            normal += p.cross(&q);
        }
        try_normalize(normal).ok()
    }

    pub fn polygon_area(&self, polygon: u32) -> f64 {
        let vertices = self.polygon_vertices(polygon);
        let mut sum = Vector::<3>::zeros();
        for local in 0..vertices.len() {
            let p = self.point(vertices[local]).coords;
            let q = self.point(vertices[(local + 1) % vertices.len()]).coords;
            sum += p.cross(&q);
        }
        sum.norm() / 2.0
    }

    /// Mean of the incident polygon normals, skipping degenerate polygons;
    /// `None` when every incident polygon is degenerate.
    pub fn polygon_vertex_normal(&self, vertex: u32) -> Option<Vector<3>> {
        let mut sum = Vector::<3>::zeros();
        let mut found = false;
        for corner in self.polygons_around_vertex(vertex) {
            if let Some(normal) = self.polygon_normal(corner.polygon) {
                sum += normal;
                found = true;
            }
        }
        if !found {
            return None;
        }
        try_normalize(sum).ok()
    }
}
