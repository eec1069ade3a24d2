//! Hybrid polyhedral solid mesh.
//!
//! Polyhedra are tetrahedra, pyramids, prisms, hexahedra or general
//! polyhedra; the shape is fixed at creation. Fixed shapes read their
//! facet and edge layouts from the canonical tables and store no
//! per-element incidence; general polyhedra carry an explicit facet list
//! in local indices.

mod builder;
mod derived;
mod tables;

pub use self::builder::SolidBuilder;
pub use self::derived::{SolidEdges, SolidFacets};

use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::packed::PackedRows;
use super::point_set::PointSet;
use crate::attributes::{Attribute, AttributeManager, AttributeValue};
use crate::geometry::{BoundingBox, Point, Vector, try_normalize};
use crate::{NO_ID, NO_LID};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolyhedronShape {
    Tetrahedron,
    Pyramid,
    Prism,
    Hexahedron,
    General,
}

/// Local vertex `vertex` of polyhedron `polyhedron`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolyhedronVertex {
    pub polyhedron: u32,
    pub vertex: u8,
}

impl PolyhedronVertex {
    pub fn new(polyhedron: u32, vertex: u8) -> Self {
        Self { polyhedron, vertex }
    }
}

impl Default for PolyhedronVertex {
    fn default() -> Self {
        Self {
            polyhedron: NO_ID,
            vertex: NO_LID,
        }
    }
}

impl AttributeValue for PolyhedronVertex {}

/// Local facet `facet` of polyhedron `polyhedron`, oriented outward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolyhedronFacet {
    pub polyhedron: u32,
    pub facet: u8,
}

impl PolyhedronFacet {
    pub fn new(polyhedron: u32, facet: u8) -> Self {
        Self { polyhedron, facet }
    }
}

impl Default for PolyhedronFacet {
    fn default() -> Self {
        Self {
            polyhedron: NO_ID,
            facet: NO_LID,
        }
    }
}

impl AttributeValue for PolyhedronFacet {}

pub(crate) const AROUND_VERTEX_ATTRIBUTE: &str = "polyhedron_around_vertex";

#[derive(Debug)]
pub struct SolidMesh {
    points: PointSet<3>,
    polyhedra: PackedRows,
    shapes: Vec<PolyhedronShape>,
    /// Facet layouts of general polyhedra, in local vertex indices.
    general_facets: Vec<Option<Vec<Vec<u8>>>>,
    /// One slot per polyhedron facet: adjacent polyhedron or `NO_ID`.
    adjacents: PackedRows,
    polyhedron_attributes: AttributeManager,
    around_vertex: Attribute<PolyhedronVertex>,
    facets: Option<SolidFacets>,
    edges: Option<SolidEdges>,
}

impl Clone for SolidMesh {
    fn clone(&self) -> Self {
        let points = self.points.clone();
        let around_vertex = points
            .vertex_attribute_manager()
            .find_attribute(AROUND_VERTEX_ATTRIBUTE)
            .expect("cloned solid keeps its around-vertex cache");
        Self {
            points,
            polyhedra: self.polyhedra.clone(),
            shapes: self.shapes.clone(),
            general_facets: self.general_facets.clone(),
            adjacents: self.adjacents.clone(),
            polyhedron_attributes: self.polyhedron_attributes.clone(),
            around_vertex,
            facets: self.facets.clone(),
            edges: self.edges.clone(),
        }
    }
}

impl Default for SolidMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl SolidMesh {
    pub fn new() -> Self {
        let mut points = PointSet::new();
        // Internal derived state: never copied or transferred, only kept
        // in row lockstep.
        let around_vertex = points
            .vertex_attribute_manager_mut()
            .find_or_create_attribute_with_flags(
                AROUND_VERTEX_ATTRIBUTE,
                PolyhedronVertex::default(),
                crate::attributes::AttributeFlags {
                    assignable: false,
                    interpolable: false,
                    transferable: false,
                },
            )
            .expect("fresh manager");
        Self {
            points,
            polyhedra: PackedRows::new(),
            shapes: Vec::new(),
            general_facets: Vec::new(),
            adjacents: PackedRows::new(),
            polyhedron_attributes: AttributeManager::new(0),
            around_vertex,
            facets: None,
            edges: None,
        }
    }

    pub fn nb_vertices(&self) -> u32 {
        self.points.nb_vertices()
    }

    pub fn nb_polyhedra(&self) -> u32 {
        self.polyhedra.len()
    }

    pub fn point(&self, vertex: u32) -> Point<3> {
        self.points.point(vertex)
    }

    pub fn point_set(&self) -> &PointSet<3> {
        &self.points
    }

    pub fn bounding_box(&self) -> BoundingBox<3> {
        self.points.bounding_box()
    }

    pub fn vertex_attribute_manager(&self) -> &AttributeManager {
        self.points.vertex_attribute_manager()
    }

    pub fn vertex_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        self.points.vertex_attribute_manager_mut()
    }

    pub fn polyhedron_attribute_manager(&self) -> &AttributeManager {
        &self.polyhedron_attributes
    }

    pub fn polyhedron_attribute_manager_mut(
        &mut self,
    ) -> &mut AttributeManager {
        &mut self.polyhedron_attributes
    }

    pub fn polyhedron_shape(&self, polyhedron: u32) -> PolyhedronShape {
        self.shapes[polyhedron as usize]
    }

    pub fn polyhedron_vertices(&self, polyhedron: u32) -> &[u32] {
        self.polyhedra.row(polyhedron)
    }

    pub fn polyhedron_vertex(&self, vertex: PolyhedronVertex) -> u32 {
        self.polyhedra.row(vertex.polyhedron)[vertex.vertex as usize]
    }

    pub fn nb_polyhedron_vertices(&self, polyhedron: u32) -> u32 {
        self.polyhedra.row_len(polyhedron)
    }

    pub fn nb_polyhedron_facets(&self, polyhedron: u32) -> u32 {
        self.adjacents.row_len(polyhedron)
    }

    /// Local vertex layout of one facet.
    pub(crate) fn facet_locals(
        &self,
        facet: PolyhedronFacet,
    ) -> SmallVec<[u8; 4]> {
        match tables::shape_facets(self.polyhedron_shape(facet.polyhedron)) {
            Some(layouts) => {
                layouts[facet.facet as usize].iter().copied().collect()
            }
            None => self.general_facets[facet.polyhedron as usize]
                .as_ref()
                .expect("general polyhedra store their facets")
                [facet.facet as usize]
                .iter()
                .copied()
                .collect(),
        }
    }

    /// Ordered vertices of one facet, outward from the polyhedron.
    pub fn polyhedron_facet_vertices(
        &self,
        facet: PolyhedronFacet,
    ) -> SmallVec<[u32; 4]> {
        let vertices = self.polyhedra.row(facet.polyhedron);
        self.facet_locals(facet)
            .iter()
            .map(|&local| vertices[local as usize])
            .collect()
    }

    pub fn nb_polyhedron_facet_vertices(&self, facet: PolyhedronFacet) -> u32 {
        self.facet_locals(facet).len() as u32
    }

    /// Local edges of a polyhedron, as unordered local vertex pairs.
    pub fn polyhedron_edges_locals(
        &self,
        polyhedron: u32,
    ) -> SmallVec<[[u8; 2]; 12]> {
        match tables::shape_edges(self.polyhedron_shape(polyhedron)) {
            Some(edges) => edges.iter().copied().collect(),
            None => {
                let mut result: SmallVec<[[u8; 2]; 12]> = SmallVec::new();
                let layouts = self.general_facets[polyhedron as usize]
                    .as_ref()
                    .expect("general polyhedra store their facets");
                for facet in layouts {
                    for i in 0..facet.len() {
                        let v0 = facet[i];
                        let v1 = facet[(i + 1) % facet.len()];
                        let key = if v0 < v1 { [v0, v1] } else { [v1, v0] };
                        if !result.contains(&key) {
                            result.push(key);
                        }
                    }
                }
                result
            }
        }
    }

    /// Edges of a polyhedron as global vertex pairs.
    pub fn polyhedron_edges_vertices(
        &self,
        polyhedron: u32,
    ) -> SmallVec<[[u32; 2]; 12]> {
        let vertices = self.polyhedra.row(polyhedron);
        self.polyhedron_edges_locals(polyhedron)
            .iter()
            .map(|&[v0, v1]| {
                [vertices[v0 as usize], vertices[v1 as usize]]
            })
            .collect()
    }

    pub fn polyhedron_adjacent(&self, facet: PolyhedronFacet) -> Option<u32> {
        let adjacent =
            self.adjacents.row(facet.polyhedron)[facet.facet as usize];
        (adjacent != NO_ID).then_some(adjacent)
    }

    /// The reciprocal facet on the adjacent polyhedron: the unique facet
    /// with the same vertex set.
    pub fn polyhedron_adjacent_facet(
        &self,
        facet: PolyhedronFacet,
    ) -> Option<PolyhedronFacet> {
        let adjacent = self.polyhedron_adjacent(facet)?;
        let mut vertices: SmallVec<[u32; 4]> =
            self.polyhedron_facet_vertices(facet);
        vertices.sort_unstable();
        for other in 0..self.nb_polyhedron_facets(adjacent) as u8 {
            let candidate = PolyhedronFacet::new(adjacent, other);
            let mut candidate_vertices =
                self.polyhedron_facet_vertices(candidate);
            candidate_vertices.sort_unstable();
            if candidate_vertices == vertices {
                return Some(candidate);
            }
        }
        None
    }

    pub fn is_facet_on_border(&self, facet: PolyhedronFacet) -> bool {
        self.polyhedron_adjacent(facet).is_none()
    }

    pub fn polyhedron_facets_on_border(
        &self,
        polyhedron: u32,
    ) -> SmallVec<[PolyhedronFacet; 6]> {
        (0..self.nb_polyhedron_facets(polyhedron) as u8)
            .map(|facet| PolyhedronFacet::new(polyhedron, facet))
            .filter(|&facet| self.is_facet_on_border(facet))
            .collect()
    }

    pub fn is_polyhedron_on_border(&self, polyhedron: u32) -> bool {
        !self.polyhedron_facets_on_border(polyhedron).is_empty()
    }

    pub fn is_vertex_isolated(&self, vertex: u32) -> bool {
        self.around_vertex.value(vertex).polyhedron == NO_ID
    }

    /// Every polyhedron corner using `vertex`, found by traversing facet
    /// adjacencies from the cached hint, crossing only facets that share
    /// the vertex.
    pub fn polyhedra_around_vertex(
        &self,
        vertex: u32,
    ) -> SmallVec<[PolyhedronVertex; 20]> {
        let mut result = SmallVec::new();
        let hint = self.around_vertex.value(vertex);
        if hint.polyhedron == NO_ID {
            return result;
        }
        let mut queue = vec![hint.polyhedron];
        let mut visited: SmallVec<[u32; 20]> = SmallVec::new();
        visited.push(hint.polyhedron);
        while let Some(polyhedron) = queue.pop() {
            let local = self
                .polyhedra
                .row(polyhedron)
                .iter()
                .position(|&v| v == vertex);
            let Some(local) = local else {
                continue;
            };
            result.push(PolyhedronVertex::new(polyhedron, local as u8));
            for facet in 0..self.nb_polyhedron_facets(polyhedron) as u8 {
                let facet = PolyhedronFacet::new(polyhedron, facet);
                if !self
                    .polyhedron_facet_vertices(facet)
                    .contains(&vertex)
                {
                    continue;
                }
                if let Some(adjacent) = self.polyhedron_adjacent(facet)
                    && !visited.contains(&adjacent)
                {
                    visited.push(adjacent);
                    queue.push(adjacent);
                }
            }
        }
        result
    }

    /// The one-ring of polyhedra around an edge. Interior edges yield a
    /// cycle starting at the smallest polyhedron index; border edges yield
    /// the path between the two border facets, oriented from its smaller
    /// end.
    pub fn polyhedra_around_edge(&self, v0: u32, v1: u32) -> Vec<u32> {
        let start = self.polyhedra_around_vertex(v0).into_iter().find(|pv| {
            self.polyhedron_edges_vertices(pv.polyhedron)
                .iter()
                .any(|&pair| {
                    pair == [v0, v1] || pair == [v1, v0]
                })
        });
        let Some(start) = start else {
            return Vec::new();
        };
        let start = start.polyhedron;
        // Walk one way; on border, walk the other way from the start.
        let (forward, hit_border) = self.walk_around_edge(start, v0, v1, 0);
        if !hit_border {
            // Cycle: rotate so the smallest id comes first.
            let mut cycle = forward;
            let min_position = cycle
                .iter()
                .enumerate()
                .min_by_key(|&(_, &p)| p)
                .map(|(i, _)| i)
                .unwrap_or(0);
            cycle.rotate_left(min_position);
            return cycle;
        }
        let (backward, _) = self.walk_around_edge(start, v0, v1, 1);
        let mut path: Vec<u32> =
            backward.into_iter().skip(1).rev().collect();
        path.extend(forward);
        if path.first() > path.last() {
            path.reverse();
        }
        path
    }

    /// Walks adjacencies across the facets containing the edge, starting
    /// through the `direction`-th of the two incident facets of `start`.
    fn walk_around_edge(
        &self,
        start: u32,
        v0: u32,
        v1: u32,
        direction: usize,
    ) -> (Vec<u32>, bool) {
        let mut result = vec![start];
        let mut previous = NO_ID;
        let mut current = start;
        loop {
            let crossings: SmallVec<[PolyhedronFacet; 2]> = (0..self
                .nb_polyhedron_facets(current)
                as u8)
                .map(|facet| PolyhedronFacet::new(current, facet))
                .filter(|&facet| {
                    let vertices = self.polyhedron_facet_vertices(facet);
                    vertices.contains(&v0) && vertices.contains(&v1)
                })
                .collect();
            let next = crossings
                .iter()
                .filter_map(|&facet| self.polyhedron_adjacent(facet))
                .find(|&adjacent| adjacent != previous);
            let chosen = if current == start && previous == NO_ID {
                // First step: pick the requested direction.
                let mut adjacents = crossings
                    .iter()
                    .filter_map(|&facet| self.polyhedron_adjacent(facet));
                adjacents.nth(direction)
            } else {
                next
            };
            match chosen {
                None => return (result, true),
                Some(next) if next == start => return (result, false),
                // Safety stop on non-reciprocal adjacencies.
                Some(next) if result.contains(&next) => {
                    return (result, true);
                }
                Some(next) => {
                    previous = current;
                    current = next;
                    result.push(next);
                }
            }
        }
    }

    /// The two facets of a tetrahedron incident to an edge.
    pub fn edge_incident_facets(
        &self,
        tetrahedron: u32,
        edge_vertices: [u32; 2],
    ) -> Option<[PolyhedronFacet; 2]> {
        if self.polyhedron_shape(tetrahedron) != PolyhedronShape::Tetrahedron {
            return None;
        }
        let mut result: ArrayVec<PolyhedronFacet, 2> = ArrayVec::new();
        for facet in 0..4u8 {
            let facet = PolyhedronFacet::new(tetrahedron, facet);
            let vertices = self.polyhedron_facet_vertices(facet);
            if vertices.contains(&edge_vertices[0])
                && vertices.contains(&edge_vertices[1])
            {
                if result.try_push(facet).is_err() {
                    return None;
                }
            }
        }
        result.into_inner().ok()
    }

    /// The edge of a tetrahedron opposite to the given one.
    pub fn opposite_edge_vertices(
        &self,
        tetrahedron: u32,
        edge_vertices: [u32; 2],
    ) -> Option<[u32; 2]> {
        if self.polyhedron_shape(tetrahedron) != PolyhedronShape::Tetrahedron {
            return None;
        }
        let mut opposite: ArrayVec<u32, 2> = ArrayVec::new();
        for &vertex in self.polyhedron_vertices(tetrahedron) {
            if vertex != edge_vertices[0]
                && vertex != edge_vertices[1]
                && opposite.try_push(vertex).is_err()
            {
                return None;
            }
        }
        opposite.into_inner().ok()
    }

    /// The two facets incident to the edge opposite the given one, on a
    /// tetrahedron.
    pub fn opposite_edge_incident_facets(
        &self,
        tetrahedron: u32,
        edge_vertices: [u32; 2],
    ) -> Option<[PolyhedronFacet; 2]> {
        let opposite =
            self.opposite_edge_vertices(tetrahedron, edge_vertices)?;
        self.edge_incident_facets(tetrahedron, opposite)
    }

    pub fn are_facets_enabled(&self) -> bool {
        self.facets.is_some()
    }

    pub fn are_edges_enabled(&self) -> bool {
        self.edges.is_some()
    }

    /// Materializes the facet table. Idempotent.
    pub fn enable_facets(&mut self) {
        if self.facets.is_some() {
            return;
        }
        let mut facets = SolidFacets::new();
        for polyhedron in 0..self.nb_polyhedra() {
            for facet in 0..self.nb_polyhedron_facets(polyhedron) as u8 {
                let vertices = self.polyhedron_facet_vertices(
                    PolyhedronFacet::new(polyhedron, facet),
                );
                facets.find_or_create_facet(&vertices);
            }
        }
        self.facets = Some(facets);
    }

    pub fn disable_facets(&mut self) {
        self.facets = None;
    }

    /// Materializes the edge table. Idempotent.
    pub fn enable_edges(&mut self) {
        if self.edges.is_some() {
            return;
        }
        let mut edges = SolidEdges::new();
        for polyhedron in 0..self.nb_polyhedra() {
            for [v0, v1] in self.polyhedron_edges_vertices(polyhedron) {
                edges.find_or_create_edge(v0, v1);
            }
        }
        self.edges = Some(edges);
    }

    pub fn disable_edges(&mut self) {
        self.edges = None;
    }

    pub fn facets(&self) -> &SolidFacets {
        self.facets.as_ref().expect("solid facets are not enabled")
    }

    pub fn facets_mut(&mut self) -> &mut SolidFacets {
        self.facets.as_mut().expect("solid facets are not enabled")
    }

    pub fn edges(&self) -> &SolidEdges {
        self.edges.as_ref().expect("solid edges are not enabled")
    }

    pub fn edges_mut(&mut self) -> &mut SolidEdges {
        self.edges.as_mut().expect("solid edges are not enabled")
    }

    /// Deduplicated facet id of a polyhedron facet.
    pub fn polyhedron_facet(&self, facet: PolyhedronFacet) -> u32 {
        let vertices = self.polyhedron_facet_vertices(facet);
        self.facets()
            .facet_from_vertices(&vertices)
            .expect("polyhedron facet is registered")
    }

    pub fn edge_barycenter(&self, edge_vertices: [u32; 2]) -> Point<3> {
        nalgebra::center(
            &self.point(edge_vertices[0]),
            &self.point(edge_vertices[1]),
        )
    }

    pub fn edge_length(&self, edge_vertices: [u32; 2]) -> f64 {
        (self.point(edge_vertices[1]) - self.point(edge_vertices[0])).norm()
    }

    pub fn facet_barycenter(&self, vertices: &[u32]) -> Point<3> {
        let mut sum = Vector::<3>::zeros();
        for &vertex in vertices {
            sum += self.point(vertex).coords;
        }
        Point::from(sum / vertices.len() as f64)
    }

    pub fn polyhedron_barycenter(&self, polyhedron: u32) -> Point<3> {
        self.facet_barycenter(self.polyhedron_vertices(polyhedron))
    }

    /// Newell normal of a facet; `None` when degenerate.
    pub fn polyhedron_facet_normal(
        &self,
        facet: PolyhedronFacet,
    ) -> Option<Vector<3>> {
        let vertices = self.polyhedron_facet_vertices(facet);
        let mut normal = Vector::<3>::zeros();
        for i in 0..vertices.len() {
            let p = self.point(vertices[i]).coords;
            let q = self.point(vertices[(i + 1) % vertices.len()]).coords;
            normal += p.cross(&q);
        }
        try_normalize(normal).ok()
    }

    pub fn polyhedron_facet_area(&self, facet: PolyhedronFacet) -> f64 {
        let vertices = self.polyhedron_facet_vertices(facet);
        let mut sum = Vector::<3>::zeros();
        for i in 0..vertices.len() {
            let p = self.point(vertices[i]).coords;
            let q = self.point(vertices[(i + 1) % vertices.len()]).coords;
            sum += p.cross(&q);
        }
        sum.norm() / 2.0
    }

    /// Signed volume by divergence over the outward facets; positive for
    /// well-oriented polyhedra.
    pub fn polyhedron_volume(&self, polyhedron: u32) -> f64 {
        let mut six_volumes = 0.0;
        for facet in 0..self.nb_polyhedron_facets(polyhedron) as u8 {
            let vertices = self.polyhedron_facet_vertices(
                PolyhedronFacet::new(polyhedron, facet),
            );
            let origin = self.point(vertices[0]).coords;
            for i in 1..vertices.len() - 1 {
                let p = self.point(vertices[i]).coords;
                let q = self.point(vertices[i + 1]).coords;
                six_volumes += origin.dot(&p.cross(&q));
            }
        }
        six_volumes / 6.0
    }

}
