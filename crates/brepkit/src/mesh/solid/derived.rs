//! Derived facet and edge tables of a solid mesh.
//!
//! Facets are deduplicated by vertex cycle up to rotation and reflection;
//! edges by unordered vertex pair. Both carry their own attribute manager
//! and allocate ids in registration order (polyhedron creation order,
//! local facet/edge order). Deleting polyhedra leaves entries isolated
//! until `delete_isolated_facets` / `delete_isolated_edges` is called.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::attributes::AttributeManager;
use crate::error::AttributeError;

/// Canonical form of a facet cycle: minimal rotation of the smaller of the
/// two orientations.
pub(crate) fn facet_key(vertices: &[u32]) -> SmallVec<[u32; 4]> {
    let n = vertices.len();
    let mut best: Option<SmallVec<[u32; 4]>> = None;
    for reversed in [false, true] {
        let oriented: SmallVec<[u32; 4]> = if reversed {
            vertices.iter().rev().copied().collect()
        } else {
            vertices.iter().copied().collect()
        };
        for start in 0..n {
            let candidate: SmallVec<[u32; 4]> =
                (0..n).map(|i| oriented[(start + i) % n]).collect();
            if best.as_ref().is_none_or(|b| candidate < *b) {
                best = Some(candidate);
            }
        }
    }
    best.unwrap_or_default()
}

#[derive(Clone, Debug, Default)]
pub struct SolidFacets {
    /// Vertices as first registered, one row per facet.
    facets: Vec<SmallVec<[u32; 4]>>,
    index: FxHashMap<SmallVec<[u32; 4]>, u32>,
    attributes: AttributeManager,
}

impl SolidFacets {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn nb_facets(&self) -> u32 {
        self.facets.len() as u32
    }

    pub fn facet_vertices(&self, facet: u32) -> &[u32] {
        &self.facets[facet as usize]
    }

    /// Id of the facet with this vertex cycle, regardless of rotation or
    /// orientation.
    pub fn facet_from_vertices(&self, vertices: &[u32]) -> Option<u32> {
        self.index.get(&facet_key(vertices)).copied()
    }

    pub fn facet_attribute_manager(&self) -> &AttributeManager {
        &self.attributes
    }

    pub fn facet_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        &mut self.attributes
    }

    pub(crate) fn find_or_create_facet(&mut self, vertices: &[u32]) -> u32 {
        let key = facet_key(vertices);
        if let Some(&facet) = self.index.get(&key) {
            return facet;
        }
        let facet = self.nb_facets();
        self.facets.push(vertices.iter().copied().collect());
        self.index.insert(key, facet);
        self.attributes.resize(facet + 1);
        facet
    }

    pub(crate) fn delete_facets(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), AttributeError> {
        let mut row = 0;
        self.facets.retain(|_| {
            let keep = !to_delete[row];
            row += 1;
            keep
        });
        self.attributes.delete_rows(to_delete)?;
        self.rebuild_index();
        Ok(())
    }

    pub(crate) fn remap_vertices(&mut self, old_to_new: &[u32]) {
        for facet in &mut self.facets {
            for vertex in facet.iter_mut() {
                *vertex = old_to_new[*vertex as usize];
            }
        }
        self.rebuild_index();
    }

    pub(crate) fn replace_vertex(&mut self, old: u32, new: u32) {
        for facet in &mut self.facets {
            for vertex in facet.iter_mut() {
                if *vertex == old {
                    *vertex = new;
                }
            }
        }
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (facet, vertices) in self.facets.iter().enumerate() {
            self.index
                .entry(facet_key(vertices))
                .or_insert(facet as u32);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SolidEdges {
    edges: Vec<[u32; 2]>,
    index: FxHashMap<[u32; 2], u32>,
    attributes: AttributeManager,
}

fn edge_key(v0: u32, v1: u32) -> [u32; 2] {
    if v0 <= v1 { [v0, v1] } else { [v1, v0] }
}

impl SolidEdges {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn nb_edges(&self) -> u32 {
        self.edges.len() as u32
    }

    pub fn edge_vertices(&self, edge: u32) -> [u32; 2] {
        self.edges[edge as usize]
    }

    pub fn edge_from_vertices(&self, v0: u32, v1: u32) -> Option<u32> {
        self.index.get(&edge_key(v0, v1)).copied()
    }

    pub fn edge_attribute_manager(&self) -> &AttributeManager {
        &self.attributes
    }

    pub fn edge_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        &mut self.attributes
    }

    pub(crate) fn find_or_create_edge(&mut self, v0: u32, v1: u32) -> u32 {
        let key = edge_key(v0, v1);
        if let Some(&edge) = self.index.get(&key) {
            return edge;
        }
        let edge = self.nb_edges();
        self.edges.push(key);
        self.index.insert(key, edge);
        self.attributes.resize(edge + 1);
        edge
    }

    pub(crate) fn delete_edges(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), AttributeError> {
        let mut row = 0;
        self.edges.retain(|_| {
            let keep = !to_delete[row];
            row += 1;
            keep
        });
        self.attributes.delete_rows(to_delete)?;
        self.rebuild_index();
        Ok(())
    }

    pub(crate) fn remap_vertices(&mut self, old_to_new: &[u32]) {
        for vertices in &mut self.edges {
            *vertices = edge_key(
                old_to_new[vertices[0] as usize],
                old_to_new[vertices[1] as usize],
            );
        }
        self.rebuild_index();
    }

    pub(crate) fn replace_vertex(&mut self, old: u32, new: u32) {
        for vertices in &mut self.edges {
            if vertices.contains(&old) {
                let other = if vertices[0] == old {
                    vertices[1]
                } else {
                    vertices[0]
                };
                *vertices = edge_key(new, other);
            }
        }
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (edge, &vertices) in self.edges.iter().enumerate() {
            self.index.entry(vertices).or_insert(edge as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facet_key_ignores_rotation_and_reflection() {
        let key = facet_key(&[3, 1, 2]);
        assert_eq!(facet_key(&[1, 2, 3]), key);
        assert_eq!(facet_key(&[2, 3, 1]), key);
        assert_eq!(facet_key(&[3, 2, 1]), key);
        assert_ne!(facet_key(&[1, 2, 4]), key);
        // Quads: the diagonal matters.
        assert_ne!(facet_key(&[0, 1, 2, 3]), facet_key(&[0, 2, 1, 3]));
        assert_eq!(facet_key(&[0, 1, 2, 3]), facet_key(&[3, 2, 1, 0]));
    }

    #[test]
    fn facet_deduplication() {
        let mut facets = SolidFacets::new();
        assert_eq!(facets.find_or_create_facet(&[0, 1, 2]), 0);
        assert_eq!(facets.find_or_create_facet(&[2, 1, 0]), 0);
        assert_eq!(facets.find_or_create_facet(&[0, 1, 3]), 1);
        assert_eq!(facets.nb_facets(), 2);
        assert_eq!(facets.facet_from_vertices(&[1, 0, 2]), Some(0));
        assert_eq!(facets.facet_vertices(0), &[0, 1, 2]);
    }

    #[test]
    fn edge_table_tracks_deletions() {
        let mut edges = SolidEdges::new();
        edges.find_or_create_edge(0, 1);
        edges.find_or_create_edge(2, 1);
        edges.find_or_create_edge(2, 3);
        edges.delete_edges(&[false, true, false]).unwrap();
        assert_eq!(edges.nb_edges(), 2);
        assert_eq!(edges.edge_from_vertices(3, 2), Some(1));
        assert_eq!(edges.edge_from_vertices(1, 2), None);
    }
}
