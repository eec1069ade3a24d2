//! Derived edge table of a surface mesh.
//!
//! Edges are undirected and deduplicated: one id per unordered vertex
//! pair, stored sorted. Ids are allocated in registration order (polygon
//! creation order, local edge order), and the table carries its own
//! attribute manager so callers can attach edge data that survives mesh
//! edits.

use rustc_hash::FxHashMap;

use crate::attributes::AttributeManager;
use crate::error::AttributeError;

#[derive(Clone, Debug, Default)]
pub struct SurfaceEdges {
    edges: Vec<[u32; 2]>,
    index: FxHashMap<[u32; 2], u32>,
    attributes: AttributeManager,
}

pub(crate) fn edge_key(v0: u32, v1: u32) -> [u32; 2] {
    if v0 <= v1 { [v0, v1] } else { [v1, v0] }
}

impl SurfaceEdges {
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

    /// Rewrites edge vertices through a vertex renumbering; edges whose
    /// vertices were all kept stay in place, ids unchanged.
    pub(crate) fn remap_vertices(&mut self, old_to_new: &[u32]) {
        for vertices in &mut self.edges {
            let v0 = old_to_new[vertices[0] as usize];
            let v1 = old_to_new[vertices[1] as usize];
            *vertices = edge_key(v0, v1);
        }
        self.rebuild_index();
    }

    /// Replaces every occurrence of a vertex in place, keeping ids.
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
        // On duplicate pairs the first id wins, as in lookups.
        for (edge, &vertices) in self.edges.iter().enumerate() {
            self.index.entry(vertices).or_insert(edge as u32);
        }
    }
}
