//! Builder of hybrid solid meshes.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::tables::{shape_facets, shape_nb_vertices};
use super::{PolyhedronFacet, PolyhedronShape, PolyhedronVertex, SolidMesh};
use crate::NO_ID;
use crate::error::MeshError;
use crate::geometry::Point;

pub struct SolidBuilder<'a> {
    mesh: &'a mut SolidMesh,
}

impl<'a> SolidBuilder<'a> {
    pub fn new(mesh: &'a mut SolidMesh) -> Self {
        Self { mesh }
    }

    pub fn create_vertex(&mut self) -> u32 {
        self.mesh.points.create_vertex()
    }

    pub fn create_point(&mut self, point: Point<3>) -> u32 {
        self.mesh.points.create_point(point)
    }

    pub fn set_point(
        &mut self,
        vertex: u32,
        point: Point<3>,
    ) -> Result<(), MeshError> {
        self.mesh.points.set_point(vertex, point)
    }

    pub fn create_tetrahedron(
        &mut self,
        vertices: [u32; 4],
    ) -> Result<u32, MeshError> {
        self.create_fixed(PolyhedronShape::Tetrahedron, &vertices)
    }

    pub fn create_pyramid(
        &mut self,
        vertices: [u32; 5],
    ) -> Result<u32, MeshError> {
        self.create_fixed(PolyhedronShape::Pyramid, &vertices)
    }

    pub fn create_prism(
        &mut self,
        vertices: [u32; 6],
    ) -> Result<u32, MeshError> {
        self.create_fixed(PolyhedronShape::Prism, &vertices)
    }

    pub fn create_hexahedron(
        &mut self,
        vertices: [u32; 8],
    ) -> Result<u32, MeshError> {
        self.create_fixed(PolyhedronShape::Hexahedron, &vertices)
    }

    fn create_fixed(
        &mut self,
        shape: PolyhedronShape,
        vertices: &[u32],
    ) -> Result<u32, MeshError> {
        debug_assert_eq!(
            shape_nb_vertices(shape),
            Some(vertices.len() as u8)
        );
        self.create_polyhedron_impl(shape, vertices, None)
    }

    /// Generic polyhedron with an explicit facet incidence, facets given
    /// as lists of local vertex indices.
    pub fn create_polyhedron(
        &mut self,
        vertices: &[u32],
        facets: &[Vec<u8>],
    ) -> Result<u32, MeshError> {
        if vertices.len() < 4 || vertices.len() > usize::from(u8::MAX) {
            return Err(MeshError::InvalidArity {
                kind: "polyhedron",
                min: 4,
                got: vertices.len(),
            });
        }
        if facets.len() < 4 {
            return Err(MeshError::InvalidArity {
                kind: "polyhedron facet list",
                min: 4,
                got: facets.len(),
            });
        }
        for facet in facets {
            if facet.len() < 3 {
                return Err(MeshError::InvalidArity {
                    kind: "polyhedron facet",
                    min: 3,
                    got: facet.len(),
                });
            }
            for &local in facet {
                if usize::from(local) >= vertices.len() {
                    return Err(MeshError::LocalIndexOutOfRange {
                        kind: "polyhedron",
                        index: self.mesh.nb_polyhedra(),
                        local,
                    });
                }
            }
        }
        self.create_polyhedron_impl(
            PolyhedronShape::General,
            vertices,
            Some(facets.to_vec()),
        )
    }

    fn create_polyhedron_impl(
        &mut self,
        shape: PolyhedronShape,
        vertices: &[u32],
        general_facets: Option<Vec<Vec<u8>>>,
    ) -> Result<u32, MeshError> {
        for &vertex in vertices {
            self.mesh.points.check_vertex(vertex)?;
        }
        let polyhedron = self.mesh.polyhedra.push_row(vertices);
        self.mesh.shapes.push(shape);
        let nb_facets = match &general_facets {
            Some(facets) => facets.len() as u32,
            None => shape_facets(shape)
                .expect("fixed shapes have facet tables")
                .len() as u32,
        };
        self.mesh.general_facets.push(general_facets);
        self.mesh.adjacents.push_row_filled(nb_facets, NO_ID);
        self.mesh.polyhedron_attributes.resize(polyhedron + 1);
        for (local, &vertex) in vertices.iter().enumerate() {
            self.hint_vertex(
                vertex,
                PolyhedronVertex::new(polyhedron, local as u8),
            );
        }
        if self.mesh.facets.is_some() {
            for facet in 0..nb_facets as u8 {
                let facet_vertices = self.mesh.polyhedron_facet_vertices(
                    PolyhedronFacet::new(polyhedron, facet),
                );
                self.mesh
                    .facets
                    .as_mut()
                    .expect("checked above")
                    .find_or_create_facet(&facet_vertices);
            }
        }
        if self.mesh.edges.is_some() {
            for [v0, v1] in self.mesh.polyhedron_edges_vertices(polyhedron) {
                self.mesh
                    .edges
                    .as_mut()
                    .expect("checked above")
                    .find_or_create_edge(v0, v1);
            }
        }
        Ok(polyhedron)
    }

    pub fn set_polyhedron_adjacent(
        &mut self,
        facet: PolyhedronFacet,
        adjacent: u32,
    ) -> Result<(), MeshError> {
        self.check_facet(facet)?;
        self.check_polyhedron(adjacent)?;
        self.mesh.adjacents.row_mut(facet.polyhedron)
            [facet.facet as usize] = adjacent;
        Ok(())
    }

    pub fn unset_polyhedron_adjacent(
        &mut self,
        facet: PolyhedronFacet,
    ) -> Result<(), MeshError> {
        self.check_facet(facet)?;
        self.mesh.adjacents.row_mut(facet.polyhedron)
            [facet.facet as usize] = NO_ID;
        Ok(())
    }

    /// Pairs up the polyhedron facets sharing a vertex set. Facets shared
    /// by more than two polyhedra stay on border.
    pub fn compute_polyhedron_adjacencies(&mut self) {
        let mut by_key: FxHashMap<
            SmallVec<[u32; 4]>,
            SmallVec<[PolyhedronFacet; 2]>,
        > = FxHashMap::default();
        for polyhedron in 0..self.mesh.nb_polyhedra() {
            for facet in 0..self.mesh.nb_polyhedron_facets(polyhedron) as u8 {
                let facet = PolyhedronFacet::new(polyhedron, facet);
                let mut vertices =
                    self.mesh.polyhedron_facet_vertices(facet);
                vertices.sort_unstable();
                by_key.entry(vertices).or_default().push(facet);
            }
        }
        for (_, facets) in by_key {
            if let [first, second] = facets.as_slice() {
                self.mesh.adjacents.row_mut(first.polyhedron)
                    [first.facet as usize] = second.polyhedron;
                self.mesh.adjacents.row_mut(second.polyhedron)
                    [second.facet as usize] = first.polyhedron;
            }
        }
    }

    /// Removes the flagged polyhedra and compacts ids everywhere. Derived
    /// facets and edges are left isolated, as the explicit cleanup calls
    /// decide when to drop them.
    pub fn delete_polyhedra(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), MeshError> {
        if to_delete.len() != self.mesh.nb_polyhedra() as usize {
            return Err(MeshError::IndexOutOfRange {
                kind: "polyhedron",
                index: to_delete.len() as u32,
                nb: self.mesh.nb_polyhedra(),
            });
        }
        let mut old_to_new = vec![NO_ID; to_delete.len()];
        let mut kept = 0u32;
        for (polyhedron, &deleted) in to_delete.iter().enumerate() {
            if !deleted {
                old_to_new[polyhedron] = kept;
                kept += 1;
            }
        }
        self.mesh.polyhedra.delete_rows(to_delete);
        self.mesh.adjacents.delete_rows(to_delete);
        for value in self.mesh.adjacents.values_mut() {
            if *value != NO_ID {
                *value = old_to_new[*value as usize];
            }
        }
        let mut row = 0;
        self.mesh.shapes.retain(|_| {
            let keep = !to_delete[row];
            row += 1;
            keep
        });
        let mut row = 0;
        self.mesh.general_facets.retain(|_| {
            let keep = !to_delete[row];
            row += 1;
            keep
        });
        self.mesh.polyhedron_attributes.delete_rows(to_delete)?;
        self.rebuild_vertex_hints();
        Ok(())
    }

    /// Reorders polyhedra: `new[i] = old[permutation[i]]`.
    pub fn permute_polyhedra(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), MeshError> {
        self.mesh.polyhedron_attributes.permute_rows(permutation)?;
        self.mesh.polyhedra.permute_rows(permutation);
        self.mesh.adjacents.permute_rows(permutation);
        let mut inverse = vec![0u32; permutation.len()];
        for (new_id, &old_id) in permutation.iter().enumerate() {
            inverse[old_id as usize] = new_id as u32;
        }
        for value in self.mesh.adjacents.values_mut() {
            if *value != NO_ID {
                *value = inverse[*value as usize];
            }
        }
        let old_shapes = std::mem::take(&mut self.mesh.shapes);
        let mut old_general: Vec<Option<Vec<Vec<u8>>>> =
            std::mem::take(&mut self.mesh.general_facets);
        for &old_id in permutation {
            self.mesh.shapes.push(old_shapes[old_id as usize]);
            self.mesh
                .general_facets
                .push(old_general[old_id as usize].take());
        }
        self.rebuild_vertex_hints();
        Ok(())
    }

    /// Reorders vertices: `new[i] = old[permutation[i]]`; every reference
    /// is rewritten.
    pub fn permute_vertices(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), MeshError> {
        self.mesh.points.permute_vertices(permutation)?;
        let mut inverse = vec![0u32; permutation.len()];
        for (new_id, &old_id) in permutation.iter().enumerate() {
            inverse[old_id as usize] = new_id as u32;
        }
        self.mesh.polyhedra.remap_values(&inverse);
        if let Some(facets) = &mut self.mesh.facets {
            facets.remap_vertices(&inverse);
        }
        if let Some(edges) = &mut self.mesh.edges {
            edges.remap_vertices(&inverse);
        }
        Ok(())
    }

    /// Deletes the flagged vertices, removing every incident polyhedron.
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
        let dead_polyhedra: Vec<bool> = (0..self.mesh.nb_polyhedra())
            .map(|polyhedron| {
                self.mesh
                    .polyhedra
                    .row(polyhedron)
                    .iter()
                    .any(|&vertex| to_delete[vertex as usize])
            })
            .collect();
        if dead_polyhedra.contains(&true) {
            self.delete_polyhedra(&dead_polyhedra)?;
        }
        // Derived entries on deleted vertices must go before renumbering.
        if self.mesh.facets.is_some() {
            let facets = self.mesh.facets.as_ref().expect("checked above");
            let dead: Vec<bool> = (0..facets.nb_facets())
                .map(|facet| {
                    facets
                        .facet_vertices(facet)
                        .iter()
                        .any(|&vertex| to_delete[vertex as usize])
                })
                .collect();
            self.mesh
                .facets
                .as_mut()
                .expect("checked above")
                .delete_facets(&dead)?;
        }
        if self.mesh.edges.is_some() {
            let edges = self.mesh.edges.as_ref().expect("checked above");
            let dead: Vec<bool> = (0..edges.nb_edges())
                .map(|edge| {
                    edges
                        .edge_vertices(edge)
                        .iter()
                        .any(|&vertex| to_delete[vertex as usize])
                })
                .collect();
            self.mesh
                .edges
                .as_mut()
                .expect("checked above")
                .delete_edges(&dead)?;
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
        self.mesh.polyhedra.remap_values(&old_to_new);
        if let Some(facets) = &mut self.mesh.facets {
            facets.remap_vertices(&old_to_new);
        }
        if let Some(edges) = &mut self.mesh.edges {
            edges.remap_vertices(&old_to_new);
        }
        Ok(())
    }

    pub fn delete_isolated_vertices(&mut self) -> Result<(), MeshError> {
        let mut used = vec![false; self.mesh.nb_vertices() as usize];
        for &vertex in self.mesh.polyhedra.values() {
            used[vertex as usize] = true;
        }
        let to_delete: Vec<bool> = used.iter().map(|&u| !u).collect();
        self.delete_vertices(&to_delete)
    }

    /// Drops derived facets no polyhedron references anymore.
    pub fn delete_isolated_facets(&mut self) -> Result<(), MeshError> {
        let Some(facets) = &self.mesh.facets else {
            return Ok(());
        };
        let mut used = vec![false; facets.nb_facets() as usize];
        for polyhedron in 0..self.mesh.nb_polyhedra() {
            for facet in 0..self.mesh.nb_polyhedron_facets(polyhedron) as u8 {
                let vertices = self.mesh.polyhedron_facet_vertices(
                    PolyhedronFacet::new(polyhedron, facet),
                );
                if let Some(id) = facets.facet_from_vertices(&vertices) {
                    used[id as usize] = true;
                }
            }
        }
        let to_delete: Vec<bool> = used.iter().map(|&u| !u).collect();
        if to_delete.contains(&true) {
            self.mesh
                .facets
                .as_mut()
                .expect("checked above")
                .delete_facets(&to_delete)?;
        }
        Ok(())
    }

    /// Drops derived edges no polyhedron references anymore.
    pub fn delete_isolated_edges(&mut self) -> Result<(), MeshError> {
        let Some(edges) = &self.mesh.edges else {
            return Ok(());
        };
        let mut used = vec![false; edges.nb_edges() as usize];
        for polyhedron in 0..self.mesh.nb_polyhedra() {
            for [v0, v1] in self.mesh.polyhedron_edges_vertices(polyhedron) {
                if let Some(id) = edges.edge_from_vertices(v0, v1) {
                    used[id as usize] = true;
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

    /// Rewrites every reference to `old` into `new`; `old` becomes
    /// isolated.
    pub fn replace_vertex(&mut self, old: u32, new: u32) -> Result<(), MeshError> {
        self.mesh.points.check_vertex(old)?;
        self.mesh.points.check_vertex(new)?;
        if old == new {
            return Ok(());
        }
        let corners = self.mesh.polyhedra_around_vertex(old);
        for corner in &corners {
            self.mesh.polyhedra.row_mut(corner.polyhedron)
                [corner.vertex as usize] = new;
        }
        if let Some(facets) = &mut self.mesh.facets {
            facets.replace_vertex(old, new);
        }
        if let Some(edges) = &mut self.mesh.edges {
            edges.replace_vertex(old, new);
        }
        self.mesh
            .around_vertex
            .set_value(old, PolyhedronVertex::default())
            .expect("vertex checked");
        if let Some(corner) = corners.first() {
            self.mesh
                .around_vertex
                .set_value(new, *corner)
                .expect("vertex checked");
        }
        Ok(())
    }

    pub fn set_polyhedron_vertex(
        &mut self,
        corner: PolyhedronVertex,
        vertex: u32,
    ) -> Result<(), MeshError> {
        self.check_polyhedron(corner.polyhedron)?;
        if u32::from(corner.vertex)
            >= self.mesh.nb_polyhedron_vertices(corner.polyhedron)
        {
            return Err(MeshError::LocalIndexOutOfRange {
                kind: "polyhedron",
                index: corner.polyhedron,
                local: corner.vertex,
            });
        }
        self.mesh.points.check_vertex(vertex)?;
        let old = self.mesh.polyhedron_vertex(corner);
        self.mesh.polyhedra.row_mut(corner.polyhedron)
            [corner.vertex as usize] = vertex;
        if self.mesh.around_vertex.value(old) == corner {
            self.rebuild_vertex_hints();
        } else {
            self.hint_vertex(vertex, corner);
        }
        Ok(())
    }

    /// Rebinds the cached "one polyhedron around this vertex" hint.
    pub fn associate_polyhedron_vertex_to_vertex(
        &mut self,
        corner: PolyhedronVertex,
        vertex: u32,
    ) -> Result<(), MeshError> {
        self.check_polyhedron(corner.polyhedron)?;
        self.mesh.points.check_vertex(vertex)?;
        self.mesh
            .around_vertex
            .set_value(vertex, corner)
            .expect("vertex checked");
        Ok(())
    }

    fn hint_vertex(&mut self, vertex: u32, corner: PolyhedronVertex) {
        if self.mesh.around_vertex.value(vertex).polyhedron == NO_ID {
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
                .set_value(vertex, PolyhedronVertex::default())
                .expect("vertex in range");
        }
        for polyhedron in 0..self.mesh.nb_polyhedra() {
            let arity = self.mesh.polyhedra.row_len(polyhedron) as usize;
            for local in 0..arity {
                let vertex = self.mesh.polyhedra.row(polyhedron)[local];
                self.hint_vertex(
                    vertex,
                    PolyhedronVertex::new(polyhedron, local as u8),
                );
            }
        }
    }

    fn check_polyhedron(&self, polyhedron: u32) -> Result<(), MeshError> {
        if polyhedron >= self.mesh.nb_polyhedra() {
            return Err(MeshError::IndexOutOfRange {
                kind: "polyhedron",
                index: polyhedron,
                nb: self.mesh.nb_polyhedra(),
            });
        }
        Ok(())
    }

    fn check_facet(&self, facet: PolyhedronFacet) -> Result<(), MeshError> {
        self.check_polyhedron(facet.polyhedron)?;
        if u32::from(facet.facet)
            >= self.mesh.nb_polyhedron_facets(facet.polyhedron)
        {
            return Err(MeshError::LocalIndexOutOfRange {
                kind: "polyhedron",
                index: facet.polyhedron,
                local: facet.facet,
            });
        }
        Ok(())
    }
}
