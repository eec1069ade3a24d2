//! Builder of polygonal surfaces.
//!
//! The builder is the only mutation path: it owns the mesh for the scope of
//! the edit and keeps polygons, adjacencies, attribute managers, the
//! around-vertex cache and the derived edge table in lockstep. Failed
//! operations leave the mesh untouched.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::edges::edge_key;
use super::{PolygonEdge, PolygonVertex, SurfaceMesh};
use crate::NO_ID;
use crate::error::MeshError;
use crate::geometry::Point;

pub struct SurfaceBuilder<'a, const D: usize> {
    mesh: &'a mut SurfaceMesh<D>,
}

impl<'a, const D: usize> SurfaceBuilder<'a, D> {
    pub fn new(mesh: &'a mut SurfaceMesh<D>) -> Self {
        Self { mesh }
    }

    pub fn create_vertex(&mut self) -> u32 {
        self.mesh.points.create_vertex()
    }

    pub fn create_point(&mut self, point: Point<D>) -> u32 {
        self.mesh.points.create_point(point)
    }

    pub fn set_point(
        &mut self,
        vertex: u32,
        point: Point<D>,
    ) -> Result<(), MeshError> {
        self.mesh.points.set_point(vertex, point)
    }

    /// Appends a polygon; adjacency slots default to border.
    pub fn create_polygon(&mut self, vertices: &[u32]) -> Result<u32, MeshError> {
        if vertices.len() < 3 || vertices.len() > usize::from(u8::MAX) {
            return Err(MeshError::InvalidArity {
                kind: "polygon",
                min: 3,
                got: vertices.len(),
            });
        }
        for &vertex in vertices {
            self.mesh.points.check_vertex(vertex)?;
        }
        let polygon = self.mesh.polygons.push_row(vertices);
        self.mesh
            .adjacents
            .push_row_filled(vertices.len() as u32, NO_ID);
        self.mesh.polygon_attributes.resize(polygon + 1);
        for (local, &vertex) in vertices.iter().enumerate() {
            self.hint_vertex(vertex, PolygonVertex::new(polygon, local as u8));
        }
        if let Some(edges) = &mut self.mesh.edges {
            for local in 0..vertices.len() {
                edges.find_or_create_edge(
                    vertices[local],
                    vertices[(local + 1) % vertices.len()],
                );
            }
        }
        Ok(polygon)
    }

    /// Pairs one polygon edge with another polygon; the reciprocal slot is
    /// the caller's responsibility, checked by `compute` paths.
    pub fn set_polygon_adjacent(
        &mut self,
        edge: PolygonEdge,
        adjacent: u32,
    ) -> Result<(), MeshError> {
        self.check_polygon_edge(edge)?;
        self.check_polygon(adjacent)?;
        self.mesh.adjacents.row_mut(edge.polygon)[edge.edge as usize] =
            adjacent;
        Ok(())
    }

    pub fn unset_polygon_adjacent(
        &mut self,
        edge: PolygonEdge,
    ) -> Result<(), MeshError> {
        self.check_polygon_edge(edge)?;
        self.mesh.adjacents.row_mut(edge.polygon)[edge.edge as usize] = NO_ID;
        Ok(())
    }

    /// Pairs up the polygon edges sharing an unordered vertex pair.
    /// Deterministic; edges shared by three or more polygons stay on
    /// border.
    pub fn compute_polygon_adjacencies(&mut self) {
        let all: Vec<u32> = (0..self.mesh.nb_polygons()).collect();
        self.compute_polygon_adjacencies_of(&all);
    }

    pub fn compute_polygon_adjacencies_of(&mut self, polygons: &[u32]) {
        let mut by_pair: FxHashMap<[u32; 2], SmallVec<[PolygonEdge; 2]>> =
            FxHashMap::default();
        for &polygon in polygons {
            let vertices = self.mesh.polygons.row(polygon);
            for local in 0..vertices.len() {
                let pair = edge_key(
                    vertices[local],
                    vertices[(local + 1) % vertices.len()],
                );
                by_pair
                    .entry(pair)
                    .or_default()
                    .push(PolygonEdge::new(polygon, local as u8));
            }
        }
        for (_, edges) in by_pair {
            if let [first, second] = edges.as_slice() {
                self.mesh.adjacents.row_mut(first.polygon)
                    [first.edge as usize] = second.polygon;
                self.mesh.adjacents.row_mut(second.polygon)
                    [second.edge as usize] = first.polygon;
            }
        }
    }

    /// Removes the flagged polygons and compacts; attribute rows, the
    /// around-vertex cache and the derived edge table follow.
    pub fn delete_polygons(&mut self, to_delete: &[bool]) -> Result<(), MeshError> {
        if to_delete.len() != self.mesh.nb_polygons() as usize {
            return Err(MeshError::IndexOutOfRange {
                kind: "polygon",
                index: to_delete.len() as u32,
                nb: self.mesh.nb_polygons(),
            });
        }
        let mut old_to_new = vec![NO_ID; to_delete.len()];
        let mut kept = 0u32;
        for (polygon, &deleted) in to_delete.iter().enumerate() {
            if !deleted {
                old_to_new[polygon] = kept;
                kept += 1;
            }
        }
        self.mesh.polygons.delete_rows(to_delete);
        self.mesh.adjacents.delete_rows(to_delete);
        for value in self.mesh.adjacents.values_mut() {
            if *value != NO_ID {
                *value = old_to_new[*value as usize];
            }
        }
        self.mesh.polygon_attributes.delete_rows(to_delete)?;
        self.rebuild_vertex_hints();
        self.prune_unused_edges()?;
        Ok(())
    }

    /// Reorders polygons: `new[i] = old[permutation[i]]`.
    pub fn permute_polygons(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), MeshError> {
        self.mesh.polygon_attributes.permute_rows(permutation)?;
        self.mesh.polygons.permute_rows(permutation);
        self.mesh.adjacents.permute_rows(permutation);
        let mut inverse = vec![0u32; permutation.len()];
        for (new_polygon, &old_polygon) in permutation.iter().enumerate() {
            inverse[old_polygon as usize] = new_polygon as u32;
        }
        for value in self.mesh.adjacents.values_mut() {
            if *value != NO_ID {
                *value = inverse[*value as usize];
            }
        }
        self.rebuild_vertex_hints();
        Ok(())
    }

    /// Deletes the flagged vertices, removing every incident polygon, then
    /// compacts vertex indices everywhere.
    pub fn delete_vertices(&mut self, to_delete: &[bool]) -> Result<(), MeshError> {
        if to_delete.len() != self.mesh.nb_vertices() as usize {
            return Err(MeshError::IndexOutOfRange {
                kind: "vertex",
                index: to_delete.len() as u32,
                nb: self.mesh.nb_vertices(),
            });
        }
        let dead_polygons: Vec<bool> = (0..self.mesh.nb_polygons())
            .map(|polygon| {
                self.mesh
                    .polygons
                    .row(polygon)
                    .iter()
                    .any(|&vertex| to_delete[vertex as usize])
            })
            .collect();
        if dead_polygons.contains(&true) {
            self.delete_polygons(&dead_polygons)?;
        }
        let mut old_to_new = vec![NO_ID; to_delete.len()];
        let mut kept = 0u32;
        for (vertex, &deleted) in to_delete.iter().enumerate() {
            if !deleted {
                old_to_new[vertex] = kept;
                kept += 1;
            }
        }
        self.mesh.points.delete_vertices(to_delete)?;
        self.mesh.polygons.remap_values(&old_to_new);
        if let Some(edges) = &mut self.mesh.edges {
            edges.remap_vertices(&old_to_new);
        }
        Ok(())
    }

    pub fn delete_isolated_vertices(&mut self) -> Result<(), MeshError> {
        let mut used = vec![false; self.mesh.nb_vertices() as usize];
        for &vertex in self.mesh.polygons.values() {
            used[vertex as usize] = true;
        }
        let to_delete: Vec<bool> = used.iter().map(|&u| !u).collect();
        self.delete_vertices(&to_delete)
    }

    /// Drops edges no polygon references; attribute rows follow.
    pub fn delete_isolated_edges(&mut self) -> Result<(), MeshError> {
        self.prune_unused_edges()
    }

    /// Reorders vertices: `new[i] = old[permutation[i]]`; polygon and edge
    /// references are rewritten accordingly.
    pub fn permute_vertices(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), MeshError> {
        self.mesh.points.permute_vertices(permutation)?;
        let mut inverse = vec![0u32; permutation.len()];
        for (new_vertex, &old_vertex) in permutation.iter().enumerate() {
            inverse[old_vertex as usize] = new_vertex as u32;
        }
        self.mesh.polygons.remap_values(&inverse);
        if let Some(edges) = &mut self.mesh.edges {
            edges.remap_vertices(&inverse);
        }
        Ok(())
    }

    /// Rewrites every reference to `old` into `new`; `old` becomes
    /// isolated. Registered edges are updated in place.
    pub fn replace_vertex(&mut self, old: u32, new: u32) -> Result<(), MeshError> {
        self.mesh.points.check_vertex(old)?;
        self.mesh.points.check_vertex(new)?;
        if old == new {
            return Ok(());
        }
        let corners = self.mesh.polygons_around_vertex(old);
        for corner in &corners {
            self.mesh.polygons.row_mut(corner.polygon)
                [corner.vertex as usize] = new;
        }
        if let Some(edges) = &mut self.mesh.edges {
            edges.replace_vertex(old, new);
        }
        self.mesh
            .around_vertex
            .set_value(old, PolygonVertex::default())
            .expect("vertex checked");
        if let Some(corner) = corners.first() {
            self.mesh
                .around_vertex
                .set_value(new, *corner)
                .expect("vertex checked");
        }
        Ok(())
    }

    /// Rebinds one polygon corner to another vertex. New edges are
    /// registered; stale ones are left for `delete_isolated_edges`.
    pub fn set_polygon_vertex(
        &mut self,
        corner: PolygonVertex,
        vertex: u32,
    ) -> Result<(), MeshError> {
        self.check_polygon_vertex(corner)?;
        self.mesh.points.check_vertex(vertex)?;
        let old = self.mesh.polygon_vertex(corner);
        self.mesh.polygons.row_mut(corner.polygon)[corner.vertex as usize] =
            vertex;
        if let Some(edges) = &mut self.mesh.edges {
            let vertices = self.mesh.polygons.row(corner.polygon);
            let arity = vertices.len();
            let local = corner.vertex as usize;
            edges.find_or_create_edge(
                vertices[local],
                vertices[(local + 1) % arity],
            );
            edges.find_or_create_edge(
                vertices[(local + arity - 1) % arity],
                vertices[local],
            );
        }
        if self.mesh.around_vertex.value(old) == corner {
            self.rebuild_vertex_hints();
        } else {
            self.hint_vertex(vertex, corner);
        }
        Ok(())
    }

    /// Rebinds the cached "one polygon around this vertex" hint.
    pub fn associate_polygon_vertex_to_vertex(
        &mut self,
        corner: PolygonVertex,
        vertex: u32,
    ) -> Result<(), MeshError> {
        self.check_polygon_vertex(corner)?;
        self.mesh.points.check_vertex(vertex)?;
        self.mesh
            .around_vertex
            .set_value(vertex, corner)
            .expect("vertex checked");
        Ok(())
    }

    fn hint_vertex(&mut self, vertex: u32, corner: PolygonVertex) {
        if self.mesh.around_vertex.value(vertex).polygon == NO_ID {
            self.mesh
                .around_vertex
                .set_value(vertex, corner)
                .expect("vertex in range");
        }
    }

    fn rebuild_vertex_hints(&mut self) {
        for vertex in 0..self.mesh.nb_vertices() {
            self.mesh
                .around_vertex
                .set_value(vertex, PolygonVertex::default())
                .expect("vertex in range");
        }
        for polygon in 0..self.mesh.nb_polygons() {
            let arity = self.mesh.polygons.row_len(polygon) as usize;
            for local in 0..arity {
                let vertex = self.mesh.polygons.row(polygon)[local];
                self.hint_vertex(
                    vertex,
                    PolygonVertex::new(polygon, local as u8),
                );
            }
        }
    }

    fn prune_unused_edges(&mut self) -> Result<(), MeshError> {
        let Some(edges) = &self.mesh.edges else {
            return Ok(());
        };
        let mut used = vec![false; edges.nb_edges() as usize];
        for polygon in 0..self.mesh.nb_polygons() {
            let vertices = self.mesh.polygons.row(polygon);
            for local in 0..vertices.len() {
                let pair = edge_key(
                    vertices[local],
                    vertices[(local + 1) % vertices.len()],
                );
                if let Some(edge) = edges.edge_from_vertices(pair[0], pair[1])
                {
                    used[edge as usize] = true;
                }
            }
        }
        let to_delete: Vec<bool> = used.iter().map(|&u| !u).collect();
        if to_delete.contains(&true) {
            self.mesh
                .edges
                .as_mut()
                .expect("checked above")
                .delete_edges(&to_delete)?;
        }
        Ok(())
    }

    fn check_polygon(&self, polygon: u32) -> Result<(), MeshError> {
        if polygon >= self.mesh.nb_polygons() {
            return Err(MeshError::IndexOutOfRange {
                kind: "polygon",
                index: polygon,
                nb: self.mesh.nb_polygons(),
            });
        }
        Ok(())
    }

    fn check_polygon_edge(&self, edge: PolygonEdge) -> Result<(), MeshError> {
        self.check_polygon(edge.polygon)?;
        if u32::from(edge.edge) >= self.mesh.nb_polygon_edges(edge.polygon) {
            return Err(MeshError::LocalIndexOutOfRange {
                kind: "polygon",
                index: edge.polygon,
                local: edge.edge,
            });
        }
        Ok(())
    }

    fn check_polygon_vertex(
        &self,
        corner: PolygonVertex,
    ) -> Result<(), MeshError> {
        self.check_polygon(corner.polygon)?;
        if u32::from(corner.vertex)
            >= self.mesh.nb_polygon_vertices(corner.polygon)
        {
            return Err(MeshError::LocalIndexOutOfRange {
                kind: "polygon",
                index: corner.polygon,
                local: corner.vertex,
            });
        }
        Ok(())
    }
}
