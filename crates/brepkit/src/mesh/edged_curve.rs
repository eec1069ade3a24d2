//! Point set with an edge table: the mesh of model lines and 2D tracing.

use smallvec::SmallVec;

use super::point_set::{PointSet, PointSetBuilder};
use crate::attributes::AttributeManager;
use crate::error::MeshError;
use crate::geometry::Point;

#[derive(Clone, Debug, Default)]
pub struct EdgedCurve<const D: usize> {
    points: PointSet<D>,
    edges: Vec<[u32; 2]>,
    edge_attributes: AttributeManager,
}

impl<const D: usize> EdgedCurve<D> {
    pub fn new() -> Self {
        Self {
            points: PointSet::new(),
            edges: Vec::new(),
            edge_attributes: AttributeManager::new(0),
        }
    }

    pub fn nb_vertices(&self) -> u32 {
        self.points.nb_vertices()
    }

    pub fn nb_edges(&self) -> u32 {
        self.edges.len() as u32
    }

    pub fn point(&self, vertex: u32) -> Point<D> {
        self.points.point(vertex)
    }

    pub fn point_set(&self) -> &PointSet<D> {
        &self.points
    }

    pub fn edge_vertices(&self, edge: u32) -> [u32; 2] {
        self.edges[edge as usize]
    }

    pub fn segment(&self, edge: u32) -> (Point<D>, Point<D>) {
        let [v0, v1] = self.edge_vertices(edge);
        (self.point(v0), self.point(v1))
    }

    pub fn edge_barycenter(&self, edge: u32) -> Point<D> {
        let (p0, p1) = self.segment(edge);
        nalgebra::center(&p0, &p1)
    }

    pub fn edge_length(&self, edge: u32) -> f64 {
        let (p0, p1) = self.segment(edge);
        (p1 - p0).norm()
    }

    pub fn edges_around_vertex(&self, vertex: u32) -> SmallVec<[u32; 4]> {
        let mut result = SmallVec::new();
        for (edge, vertices) in self.edges.iter().enumerate() {
            if vertices.contains(&vertex) {
                result.push(edge as u32);
            }
        }
        result
    }

    pub fn is_vertex_isolated(&self, vertex: u32) -> bool {
        !self.edges.iter().any(|vertices| vertices.contains(&vertex))
    }

    pub fn vertex_attribute_manager(&self) -> &AttributeManager {
        self.points.vertex_attribute_manager()
    }

    pub fn vertex_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        self.points.vertex_attribute_manager_mut()
    }

    pub fn edge_attribute_manager(&self) -> &AttributeManager {
        &self.edge_attributes
    }

    pub fn edge_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        &mut self.edge_attributes
    }

    pub fn bounding_box(&self) -> crate::geometry::BoundingBox<D> {
        self.points.bounding_box()
    }

    fn check_edge(&self, edge: u32) -> Result<(), MeshError> {
        if edge >= self.nb_edges() {
            return Err(MeshError::IndexOutOfRange {
                kind: "edge",
                index: edge,
                nb: self.nb_edges(),
            });
        }
        Ok(())
    }
}

/// Scoped mutable access to an edged curve.
pub struct EdgedCurveBuilder<'a, const D: usize> {
    mesh: &'a mut EdgedCurve<D>,
}

impl<'a, const D: usize> EdgedCurveBuilder<'a, D> {
    pub fn new(mesh: &'a mut EdgedCurve<D>) -> Self {
        Self { mesh }
    }

    pub fn create_point(&mut self, point: Point<D>) -> u32 {
        self.mesh.points.create_point(point)
    }

    pub fn create_vertex(&mut self) -> u32 {
        self.mesh.points.create_vertex()
    }

    pub fn set_point(
        &mut self,
        vertex: u32,
        point: Point<D>,
    ) -> Result<(), MeshError> {
        self.mesh.points.set_point(vertex, point)
    }

    pub fn create_edge(&mut self, v0: u32, v1: u32) -> Result<u32, MeshError> {
        self.mesh.points.check_vertex(v0)?;
        self.mesh.points.check_vertex(v1)?;
        self.mesh.edges.push([v0, v1]);
        self.mesh.edge_attributes.resize(self.mesh.nb_edges());
        Ok(self.mesh.nb_edges() - 1)
    }

    pub fn set_edge_vertex(
        &mut self,
        edge: u32,
        local: u8,
        vertex: u32,
    ) -> Result<(), MeshError> {
        self.mesh.check_edge(edge)?;
        self.mesh.points.check_vertex(vertex)?;
        if local > 1 {
            return Err(MeshError::LocalIndexOutOfRange {
                kind: "edge",
                index: edge,
                local,
            });
        }
        self.mesh.edges[edge as usize][local as usize] = vertex;
        Ok(())
    }

    pub fn delete_edges(&mut self, to_delete: &[bool]) -> Result<(), MeshError> {
        if to_delete.len() != self.mesh.nb_edges() as usize {
            return Err(MeshError::IndexOutOfRange {
                kind: "edge",
                index: to_delete.len() as u32,
                nb: self.mesh.nb_edges(),
            });
        }
        let mut row = 0;
        self.mesh.edges.retain(|_| {
            let keep = !to_delete[row];
            row += 1;
            keep
        });
        self.mesh.edge_attributes.delete_rows(to_delete)?;
        Ok(())
    }

    pub fn permute_edges(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), MeshError> {
        self.mesh.edge_attributes.permute_rows(permutation)?;
        let old = std::mem::take(&mut self.mesh.edges);
        self.mesh.edges = permutation
            .iter()
            .map(|&edge| old[edge as usize])
            .collect();
        Ok(())
    }

    /// Deletes the flagged vertices, removing every incident edge first.
    pub fn delete_vertices(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), MeshError> {
        if to_delete.len() != self.mesh.nb_vertices() as usize {
            return Err(MeshError::IndexOutOfRange {
                kind: "vertex",
                index: to_delete.len() as u32,
                nb: self.mesh.nb_vertices(),
            });
        }
        let dead_edges: Vec<bool> = self
            .mesh
            .edges
            .iter()
            .map(|vertices| {
                vertices.iter().any(|&v| to_delete[v as usize])
            })
            .collect();
        if dead_edges.iter().any(|&dead| dead) {
            self.delete_edges(&dead_edges)?;
        }
        let mut old_to_new = vec![crate::NO_ID; to_delete.len()];
        let mut kept = 0u32;
        for (vertex, &deleted) in to_delete.iter().enumerate() {
            if !deleted {
                old_to_new[vertex] = kept;
                kept += 1;
            }
        }
        self.mesh.points.delete_vertices(to_delete)?;
        for vertices in &mut self.mesh.edges {
            for vertex in vertices {
                *vertex = old_to_new[*vertex as usize];
            }
        }
        Ok(())
    }

    pub fn delete_isolated_vertices(&mut self) -> Result<(), MeshError> {
        let mut used = vec![false; self.mesh.nb_vertices() as usize];
        for vertices in &self.mesh.edges {
            for &vertex in vertices {
                used[vertex as usize] = true;
            }
        }
        let to_delete: Vec<bool> = used.iter().map(|&u| !u).collect();
        self.delete_vertices(&to_delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;

    fn polyline() -> EdgedCurve<2> {
        let mut curve = EdgedCurve::new();
        let mut builder = EdgedCurveBuilder::new(&mut curve);
        for x in 0..4 {
            builder.create_point(Point2::new(f64::from(x), 0.0));
        }
        builder.create_edge(0, 1).unwrap();
        builder.create_edge(1, 2).unwrap();
        builder.create_edge(2, 3).unwrap();
        curve
    }

    #[test]
    fn edge_queries() {
        let curve = polyline();
        assert_eq!(curve.nb_edges(), 3);
        assert_eq!(curve.edge_vertices(1), [1, 2]);
        assert_eq!(curve.edge_length(0), 1.0);
        assert_eq!(curve.edge_barycenter(2), Point2::new(2.5, 0.0));
        assert_eq!(curve.edges_around_vertex(1).as_slice(), &[0, 1]);
        assert!(!curve.is_vertex_isolated(0));
    }

    #[test]
    fn vertex_deletion_drops_incident_edges() {
        let mut curve = polyline();
        let tag = curve
            .edge_attribute_manager_mut()
            .find_or_create_attribute("tag", 0u32)
            .unwrap();
        for edge in 0..3 {
            tag.set_value(edge, edge + 10).unwrap();
        }
        EdgedCurveBuilder::new(&mut curve)
            .delete_vertices(&[false, true, false, false])
            .unwrap();
        assert_eq!(curve.nb_vertices(), 3);
        assert_eq!(curve.nb_edges(), 1);
        // Edge (2, 3) survived, renumbered to (1, 2), attribute intact.
        assert_eq!(curve.edge_vertices(0), [1, 2]);
        assert_eq!(tag.value(0), 12);
    }
}
