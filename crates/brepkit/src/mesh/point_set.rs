//! Vertex set with coordinates.
//!
//! Coordinates live in a reserved `Point<D>` attribute of the vertex
//! manager, so deletions, permutations and interpolations apply to the
//! geometry through the same path as any other column.

use ndarray::Array2;

use super::vertex_set::VertexSet;
use crate::attributes::{Attribute, AttributeFlags};
use crate::error::{AttributeError, MeshError};
use crate::geometry::{BoundingBox, Point};

pub(crate) const POINTS_ATTRIBUTE: &str = "points";

#[derive(Debug)]
pub struct PointSet<const D: usize> {
    vertices: VertexSet,
    points: Attribute<Point<D>>,
}

impl<const D: usize> Clone for PointSet<D> {
    fn clone(&self) -> Self {
        let vertices = self.vertices.clone();
        let points = vertices
            .vertex_attribute_manager()
            .find_attribute(POINTS_ATTRIBUTE)
            .expect("cloned point set keeps its coordinates");
        Self { vertices, points }
    }
}

impl<const D: usize> Default for PointSet<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> PointSet<D> {
    pub fn new() -> Self {
        let mut vertices = VertexSet::new();
        let points = vertices
            .vertex_attribute_manager_mut()
            .find_or_create_attribute_with_flags(
                POINTS_ATTRIBUTE,
                Point::origin(),
                AttributeFlags {
                    assignable: true,
                    interpolable: true,
                    transferable: true,
                },
            )
            .expect("fresh manager has no column yet");
        Self { vertices, points }
    }

    pub fn nb_vertices(&self) -> u32 {
        self.vertices.nb_vertices()
    }

    pub fn point(&self, vertex: u32) -> Point<D> {
        self.points.value(vertex)
    }

    pub fn vertex_set(&self) -> &VertexSet {
        &self.vertices
    }

    pub fn vertex_attribute_manager(&self) -> &crate::attributes::AttributeManager {
        self.vertices.vertex_attribute_manager()
    }

    pub fn vertex_attribute_manager_mut(
        &mut self,
    ) -> &mut crate::attributes::AttributeManager {
        self.vertices.vertex_attribute_manager_mut()
    }

    pub fn bounding_box(&self) -> BoundingBox<D> {
        let mut bbox = BoundingBox::new();
        for vertex in 0..self.nb_vertices() {
            bbox.add_point(&self.point(vertex));
        }
        bbox
    }

    /// Dense coordinate export, one row per vertex.
    pub fn coords_array(&self) -> Array2<f64> {
        let mut coords = Array2::zeros((self.nb_vertices() as usize, D));
        for vertex in 0..self.nb_vertices() {
            let point = self.point(vertex);
            for d in 0..D {
                coords[(vertex as usize, d)] = point[d];
            }
        }
        coords
    }

    pub(crate) fn create_vertex(&mut self) -> u32 {
        self.vertices.create_vertices(1)
    }

    pub(crate) fn create_point(&mut self, point: Point<D>) -> u32 {
        let vertex = self.create_vertex();
        self.points
            .set_value(vertex, point)
            .expect("vertex was just created");
        vertex
    }

    pub(crate) fn set_point(
        &mut self,
        vertex: u32,
        point: Point<D>,
    ) -> Result<(), MeshError> {
        self.check_vertex(vertex)?;
        self.points
            .set_value(vertex, point)
            .map_err(MeshError::from)
    }

    pub(crate) fn delete_vertices(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), AttributeError> {
        self.vertices.delete_vertices(to_delete)
    }

    pub(crate) fn permute_vertices(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), AttributeError> {
        self.vertices.permute_vertices(permutation)
    }

    pub(crate) fn check_vertex(&self, vertex: u32) -> Result<(), MeshError> {
        if vertex >= self.nb_vertices() {
            return Err(MeshError::IndexOutOfRange {
                kind: "vertex",
                index: vertex,
                nb: self.nb_vertices(),
            });
        }
        Ok(())
    }
}

/// Scoped mutable access to a point set.
pub struct PointSetBuilder<'a, const D: usize> {
    mesh: &'a mut PointSet<D>,
}

impl<'a, const D: usize> PointSetBuilder<'a, D> {
    pub fn new(mesh: &'a mut PointSet<D>) -> Self {
        Self { mesh }
    }

    pub fn create_vertex(&mut self) -> u32 {
        self.mesh.create_vertex()
    }

    pub fn create_point(&mut self, point: Point<D>) -> u32 {
        self.mesh.create_point(point)
    }

    pub fn set_point(
        &mut self,
        vertex: u32,
        point: Point<D>,
    ) -> Result<(), MeshError> {
        self.mesh.set_point(vertex, point)
    }

    pub fn delete_vertices(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), MeshError> {
        self.mesh.delete_vertices(to_delete).map_err(MeshError::from)
    }

    pub fn permute_vertices(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), MeshError> {
        self.mesh
            .permute_vertices(permutation)
            .map_err(MeshError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;

    #[test]
    fn points_follow_vertex_edits() {
        let mut mesh = PointSet::<3>::new();
        let mut builder = PointSetBuilder::new(&mut mesh);
        builder.create_point(Point3::new(0.0, 0.0, 0.0));
        builder.create_point(Point3::new(1.0, 0.0, 0.0));
        builder.create_point(Point3::new(2.0, 0.0, 0.0));
        builder.delete_vertices(&[true, false, false]).unwrap();
        assert_eq!(mesh.nb_vertices(), 2);
        assert_eq!(mesh.point(0), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(mesh.point(1), Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn clone_detaches_storage() {
        let mut mesh = PointSet::<2>::new();
        PointSetBuilder::new(&mut mesh)
            .create_point(crate::geometry::Point2::new(1.0, 2.0));
        let clone = mesh.clone();
        PointSetBuilder::new(&mut mesh)
            .set_point(0, crate::geometry::Point2::new(5.0, 5.0))
            .unwrap();
        assert_eq!(clone.point(0), crate::geometry::Point2::new(1.0, 2.0));
    }

    #[test]
    fn coords_export() {
        let mut mesh = PointSet::<2>::new();
        let mut builder = PointSetBuilder::new(&mut mesh);
        builder.create_point(crate::geometry::Point2::new(1.0, 2.0));
        builder.create_point(crate::geometry::Point2::new(3.0, 4.0));
        let coords = mesh.coords_array();
        assert_eq!(coords.shape(), &[2, 2]);
        assert_eq!(coords[(1, 0)], 3.0);
    }
}
