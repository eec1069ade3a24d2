//! Model-wide unique vertices.
//!
//! A unique vertex is an equivalence class of `(component, mesh vertex)`
//! pairs representing one welded geometric point. The class table carries
//! its own attribute manager so callers can attach model-wide per-point
//! data; membership is kept both ways for O(1) lookups.

use rustc_hash::FxHashMap;

use super::identifier::{ComponentId, Uuid};
use crate::attributes::AttributeManager;
use crate::error::ModelError;

/// One mesh vertex of one component.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComponentMeshVertex {
    pub component: ComponentId,
    pub vertex: u32,
}

impl ComponentMeshVertex {
    pub fn new(component: ComponentId, vertex: u32) -> Self {
        Self { component, vertex }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VertexIdentifier {
    attributes: AttributeManager,
    unique_of: FxHashMap<(Uuid, u32), u32>,
    members: Vec<Vec<ComponentMeshVertex>>,
}

impl VertexIdentifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_unique_vertices(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn create_unique_vertex(&mut self) -> u32 {
        self.members.push(Vec::new());
        self.attributes.resize(self.members.len() as u32);
        self.members.len() as u32 - 1
    }

    /// Welds a component mesh vertex into a unique vertex, detaching it
    /// from its previous class if any.
    pub fn set_unique_vertex(
        &mut self,
        vertex: ComponentMeshVertex,
        unique: u32,
    ) -> Result<(), ModelError> {
        if unique >= self.nb_unique_vertices() {
            return Err(ModelError::ComponentNotFound {
                id: format!("unique vertex {unique}"),
            });
        }
        let key = (vertex.component.id, vertex.vertex);
        if let Some(&previous) = self.unique_of.get(&key) {
            if previous == unique {
                return Ok(());
            }
            self.members[previous as usize]
                .retain(|member| *member != vertex);
        }
        self.unique_of.insert(key, unique);
        self.members[unique as usize].push(vertex);
        Ok(())
    }

    pub fn unset_unique_vertex(&mut self, vertex: &ComponentMeshVertex) {
        let key = (vertex.component.id, vertex.vertex);
        if let Some(unique) = self.unique_of.remove(&key) {
            self.members[unique as usize]
                .retain(|member| member != vertex);
        }
    }

    pub fn unique_vertex(&self, vertex: &ComponentMeshVertex) -> Option<u32> {
        self.unique_of
            .get(&(vertex.component.id, vertex.vertex))
            .copied()
    }

    /// Members of the equivalence class, in weld order.
    pub fn component_mesh_vertices(
        &self,
        unique: u32,
    ) -> &[ComponentMeshVertex] {
        &self.members[unique as usize]
    }

    pub fn has_component(&self, unique: u32, component: &Uuid) -> bool {
        self.members[unique as usize]
            .iter()
            .any(|member| member.component.id == *component)
    }

    /// Drops every record of a removed component.
    pub fn remove_component(&mut self, component: &Uuid) {
        self.unique_of.retain(|(id, _), _| id != component);
        for members in &mut self.members {
            members.retain(|member| member.component.id != *component);
        }
    }

    /// Compacts away the unique vertices with no member left.
    pub fn delete_isolated_unique_vertices(&mut self) -> Result<(), ModelError> {
        let to_delete: Vec<bool> = self
            .members
            .iter()
            .map(|members| members.is_empty())
            .collect();
        if !to_delete.contains(&true) {
            return Ok(());
        }
        let mut old_to_new = vec![crate::NO_ID; to_delete.len()];
        let mut kept = 0u32;
        for (unique, &deleted) in to_delete.iter().enumerate() {
            if !deleted {
                old_to_new[unique] = kept;
                kept += 1;
            }
        }
        let mut row = 0;
        self.members.retain(|_| {
            let keep = !to_delete[row];
            row += 1;
            keep
        });
        self.attributes
            .delete_rows(&to_delete)
            .map_err(ModelError::from)?;
        for unique in self.unique_of.values_mut() {
            *unique = old_to_new[*unique as usize];
        }
        Ok(())
    }

    /// Rewrites component uuids through a mapping, for model copies.
    pub(crate) fn remap_components(
        &mut self,
        mapping: &FxHashMap<Uuid, Uuid>,
    ) {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.members.par_iter_mut().for_each(|members| {
                for member in members {
                    if let Some(&target) =
                        mapping.get(&member.component.id)
                    {
                        member.component.id = target;
                    }
                }
            });
        }
        #[cfg(not(feature = "rayon"))]
        for members in &mut self.members {
            for member in members {
                if let Some(&target) = mapping.get(&member.component.id) {
                    member.component.id = target;
                }
            }
        }
        let old = std::mem::take(&mut self.unique_of);
        self.unique_of = old
            .into_iter()
            .map(|((id, vertex), unique)| {
                ((mapping.get(&id).copied().unwrap_or(id), vertex), unique)
            })
            .collect();
    }

    pub fn unique_vertex_attribute_manager(&self) -> &AttributeManager {
        &self.attributes
    }

    pub fn unique_vertex_attribute_manager_mut(
        &mut self,
    ) -> &mut AttributeManager {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::identifier::ComponentType;

    fn vertex(component: ComponentId, vertex: u32) -> ComponentMeshVertex {
        ComponentMeshVertex::new(component, vertex)
    }

    #[test]
    fn welding_and_rebinding() {
        let mut identifier = VertexIdentifier::new();
        let line = ComponentId::new(ComponentType("Line3D"), Uuid::new());
        let surface =
            ComponentId::new(ComponentType("Surface3D"), Uuid::new());
        let unique = identifier.create_unique_vertex();
        identifier.set_unique_vertex(vertex(line, 0), unique).unwrap();
        identifier
            .set_unique_vertex(vertex(surface, 4), unique)
            .unwrap();
        assert_eq!(identifier.unique_vertex(&vertex(line, 0)), Some(unique));
        assert_eq!(identifier.component_mesh_vertices(unique).len(), 2);
        assert!(identifier.has_component(unique, &line.id));
        // Rebinding moves the record to the other class.
        let other = identifier.create_unique_vertex();
        identifier.set_unique_vertex(vertex(line, 0), other).unwrap();
        assert_eq!(identifier.unique_vertex(&vertex(line, 0)), Some(other));
        assert_eq!(identifier.component_mesh_vertices(unique).len(), 1);
        assert!(!identifier.has_component(unique, &line.id));
    }

    #[test]
    fn isolated_classes_compact() {
        let mut identifier = VertexIdentifier::new();
        let corner =
            ComponentId::new(ComponentType("Corner3D"), Uuid::new());
        let first = identifier.create_unique_vertex();
        let second = identifier.create_unique_vertex();
        identifier
            .set_unique_vertex(vertex(corner, 0), second)
            .unwrap();
        let values = identifier
            .unique_vertex_attribute_manager_mut()
            .find_or_create_attribute("value", 0u32)
            .unwrap();
        values.set_value(second, 7).unwrap();
        let _ = first;
        identifier.delete_isolated_unique_vertices().unwrap();
        assert_eq!(identifier.nb_unique_vertices(), 1);
        assert_eq!(identifier.unique_vertex(&vertex(corner, 0)), Some(0));
        assert_eq!(values.value(0), 7);
    }
}
