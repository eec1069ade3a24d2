//! The base of every mesh: a set of vertices carrying an attribute
//! manager.

use crate::attributes::AttributeManager;
use crate::error::AttributeError;

#[derive(Clone, Debug, Default)]
pub struct VertexSet {
    attributes: AttributeManager,
}

impl VertexSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_vertices(&self) -> u32 {
        self.attributes.nb_rows()
    }

    pub fn vertex_attribute_manager(&self) -> &AttributeManager {
        &self.attributes
    }

    /// Mutable manager access, for attaching columns. Row-level edits go
    /// through the mesh builders so topology stays in lockstep.
    pub fn vertex_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        &mut self.attributes
    }

    pub(crate) fn create_vertices(&mut self, nb: u32) -> u32 {
        let first = self.nb_vertices();
        self.attributes.resize(first + nb);
        first
    }

    pub(crate) fn delete_vertices(
        &mut self,
        to_delete: &[bool],
    ) -> Result<(), AttributeError> {
        self.attributes.delete_rows(to_delete)
    }

    pub(crate) fn permute_vertices(
        &mut self,
        permutation: &[u32],
    ) -> Result<(), AttributeError> {
        self.attributes.permute_rows(permutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertices_and_attributes_share_the_row_count() {
        let mut vertices = VertexSet::new();
        assert_eq!(vertices.create_vertices(4), 0);
        assert_eq!(vertices.nb_vertices(), 4);
        let tag = vertices
            .vertex_attribute_manager_mut()
            .find_or_create_attribute("tag", 0u32)
            .unwrap();
        assert_eq!(tag.len(), 4);
        assert_eq!(vertices.create_vertices(2), 4);
        assert_eq!(tag.len(), 6);
        vertices
            .delete_vertices(&[false, true, false, false, true, false])
            .unwrap();
        assert_eq!(vertices.nb_vertices(), 4);
        assert_eq!(tag.len(), 4);
    }
}
