//! The relationship store: a labelled multigraph over component ids.
//!
//! Nodes are components; edges carry one of four relation kinds. Boundary,
//! Internal and Item edges are directed (boundary -> incidence, internal ->
//! embedding, item -> collection); Generic edges are traversed both ways.
//! Each live relation owns a row in the relation attribute manager, in
//! insertion order; ranges yield component ids in that same order, which
//! is also the persisted one.

use petgraph::Directed;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::identifier::{ComponentId, Uuid};
use crate::attributes::AttributeManager;
use crate::error::ModelError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// Directed: boundary -> incidence.
    Boundary,
    /// Directed: internal -> embedding.
    Internal,
    /// Directed: item -> collection.
    Item,
    /// Undirected.
    Generic,
}

#[derive(Debug, Default)]
pub struct Relationships {
    graph: StableGraph<ComponentId, RelationKind, Directed, u32>,
    nodes: FxHashMap<Uuid, NodeIndex<u32>>,
    /// Live relations in insertion order; position = attribute row.
    rows: Vec<EdgeIndex<u32>>,
    attributes: AttributeManager,
}

impl Clone for Relationships {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            nodes: self.nodes.clone(),
            rows: self.rows.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_components(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn nb_relations(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn has_component(&self, id: &Uuid) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentId> {
        self.graph.node_weights()
    }

    /// Registers an isolated node.
    pub fn add_component(
        &mut self,
        component: ComponentId,
    ) -> Result<(), ModelError> {
        if self.nodes.contains_key(&component.id) {
            return Err(ModelError::DuplicateUuid {
                id: component.id.to_string(),
            });
        }
        let node = self.graph.add_node(component);
        self.nodes.insert(component.id, node);
        Ok(())
    }

    /// Deletes the node and every incident relation.
    pub fn remove_component(&mut self, id: &Uuid) -> Result<(), ModelError> {
        let node = self.node(id)?;
        let incident: Vec<EdgeIndex<u32>> = self
            .graph
            .edges(node)
            .chain(
                self.graph
                    .edges_directed(node, petgraph::Direction::Incoming),
            )
            .map(|edge| edge.id())
            .collect();
        for edge in incident {
            self.remove_edge(edge);
        }
        self.graph.remove_node(node);
        self.nodes.remove(id);
        Ok(())
    }

    pub fn add_boundary_relation(
        &mut self,
        boundary: &Uuid,
        incidence: &Uuid,
    ) -> Result<u32, ModelError> {
        self.add_relation(boundary, incidence, RelationKind::Boundary)
    }

    pub fn add_internal_relation(
        &mut self,
        internal: &Uuid,
        embedding: &Uuid,
    ) -> Result<u32, ModelError> {
        self.add_relation(internal, embedding, RelationKind::Internal)
    }

    pub fn add_item_in_collection(
        &mut self,
        item: &Uuid,
        collection: &Uuid,
    ) -> Result<u32, ModelError> {
        self.add_relation(item, collection, RelationKind::Item)
    }

    pub fn add_generic_relation(
        &mut self,
        first: &Uuid,
        second: &Uuid,
    ) -> Result<u32, ModelError> {
        self.add_relation(first, second, RelationKind::Generic)
    }

    /// Idempotent: an existing relation of the same kind between the same
    /// pair is returned instead of duplicated.
    fn add_relation(
        &mut self,
        from: &Uuid,
        to: &Uuid,
        kind: RelationKind,
    ) -> Result<u32, ModelError> {
        let from_node = self.node(from)?;
        let to_node = self.node(to)?;
        if let Some(existing) =
            self.find_relation_of_kind(from_node, to_node, kind)
        {
            return Ok(self.row_of(existing));
        }
        let edge = self.graph.add_edge(from_node, to_node, kind);
        self.rows.push(edge);
        self.attributes.resize(self.rows.len() as u32);
        Ok(self.rows.len() as u32 - 1)
    }

    /// Deletes every relation between the two components, regardless of
    /// kind and direction.
    pub fn remove_relation(
        &mut self,
        first: &Uuid,
        second: &Uuid,
    ) -> Result<(), ModelError> {
        let first_node = self.node(first)?;
        let second_node = self.node(second)?;
        let between: Vec<EdgeIndex<u32>> = self
            .graph
            .edges(first_node)
            .filter(|edge| edge.target() == second_node)
            .chain(
                self.graph
                    .edges(second_node)
                    .filter(|edge| edge.target() == first_node),
            )
            .map(|edge| edge.id())
            .collect();
        for edge in between {
            self.remove_edge(edge);
        }
        Ok(())
    }

    /// Attribute row of the first relation between the two components.
    pub fn relation_index(&self, first: &Uuid, second: &Uuid) -> Option<u32> {
        let first_node = *self.nodes.get(first)?;
        let second_node = *self.nodes.get(second)?;
        self.rows
            .iter()
            .position(|&edge| {
                self.graph.edge_endpoints(edge).is_some_and(
                    |(source, target)| {
                        (source == first_node && target == second_node)
                            || (source == second_node && target == first_node)
                    },
                )
            })
            .map(|row| row as u32)
    }

    pub fn boundaries(&self, id: &Uuid) -> Vec<ComponentId> {
        self.neighbors(id, RelationKind::Boundary, true)
    }

    pub fn incidences(&self, id: &Uuid) -> Vec<ComponentId> {
        self.neighbors(id, RelationKind::Boundary, false)
    }

    pub fn internals(&self, id: &Uuid) -> Vec<ComponentId> {
        self.neighbors(id, RelationKind::Internal, true)
    }

    pub fn embeddings(&self, id: &Uuid) -> Vec<ComponentId> {
        self.neighbors(id, RelationKind::Internal, false)
    }

    pub fn items(&self, id: &Uuid) -> Vec<ComponentId> {
        self.neighbors(id, RelationKind::Item, true)
    }

    pub fn collections(&self, id: &Uuid) -> Vec<ComponentId> {
        self.neighbors(id, RelationKind::Item, false)
    }

    /// Every related component, any kind, any direction.
    pub fn relations(&self, id: &Uuid) -> Vec<ComponentId> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut related: Vec<(u32, ComponentId)> = Vec::new();
        for (row, &edge) in self.rows.iter().enumerate() {
            let Some((source, target)) = self.graph.edge_endpoints(edge)
            else {
                continue;
            };
            let other = if source == node {
                target
            } else if target == node {
                source
            } else {
                continue;
            };
            related.push((row as u32, self.graph[other]));
        }
        related.sort_by_key(|&(row, _)| row);
        related.into_iter().map(|(_, component)| component).collect()
    }

    pub fn nb_boundaries(&self, id: &Uuid) -> u32 {
        self.boundaries(id).len() as u32
    }

    pub fn nb_incidences(&self, id: &Uuid) -> u32 {
        self.incidences(id).len() as u32
    }

    pub fn nb_internals(&self, id: &Uuid) -> u32 {
        self.internals(id).len() as u32
    }

    pub fn nb_embeddings(&self, id: &Uuid) -> u32 {
        self.embeddings(id).len() as u32
    }

    pub fn nb_items(&self, id: &Uuid) -> u32 {
        self.items(id).len() as u32
    }

    pub fn nb_collections(&self, id: &Uuid) -> u32 {
        self.collections(id).len() as u32
    }

    /// Is there a relation of this kind from `from` to `to`?
    pub fn has_relation(
        &self,
        from: &Uuid,
        to: &Uuid,
        kind: RelationKind,
    ) -> bool {
        let (Some(&from_node), Some(&to_node)) =
            (self.nodes.get(from), self.nodes.get(to))
        else {
            return false;
        };
        self.find_relation_of_kind(from_node, to_node, kind).is_some()
    }

    /// Rows of this manager map one-to-one onto live relations, in
    /// insertion order.
    pub fn relation_attribute_manager(&self) -> &AttributeManager {
        &self.attributes
    }

    pub fn relation_attribute_manager_mut(&mut self) -> &mut AttributeManager {
        &mut self.attributes
    }

    pub(crate) fn relation_entries(
        &self,
    ) -> impl Iterator<Item = (ComponentId, ComponentId, RelationKind)> + '_
    {
        self.rows.iter().filter_map(|&edge| {
            let (source, target) = self.graph.edge_endpoints(edge)?;
            Some((
                self.graph[source],
                self.graph[target],
                *self.graph.edge_weight(edge)?,
            ))
        })
    }

    fn neighbors(
        &self,
        id: &Uuid,
        kind: RelationKind,
        incoming: bool,
    ) -> Vec<ComponentId> {
        let Some(&node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut related: SmallVec<[(u32, ComponentId); 8]> = SmallVec::new();
        for (row, &edge) in self.rows.iter().enumerate() {
            let Some((source, target)) = self.graph.edge_endpoints(edge)
            else {
                continue;
            };
            if *self.graph.edge_weight(edge).expect("live edge") != kind {
                continue;
            }
            let other = if incoming && target == node {
                source
            } else if !incoming && source == node {
                target
            } else {
                continue;
            };
            related.push((row as u32, self.graph[other]));
        }
        related.sort_by_key(|&(row, _)| row);
        related.into_iter().map(|(_, component)| component).collect()
    }

    fn find_relation_of_kind(
        &self,
        from: NodeIndex<u32>,
        to: NodeIndex<u32>,
        kind: RelationKind,
    ) -> Option<EdgeIndex<u32>> {
        for edge in self.graph.edges(from) {
            if *edge.weight() == kind && edge.target() == to {
                return Some(edge.id());
            }
        }
        if kind == RelationKind::Generic {
            for edge in self.graph.edges(to) {
                if *edge.weight() == kind && edge.target() == from {
                    return Some(edge.id());
                }
            }
        }
        None
    }

    fn row_of(&self, edge: EdgeIndex<u32>) -> u32 {
        self.rows
            .iter()
            .position(|&candidate| candidate == edge)
            .expect("live edges have a row") as u32
    }

    fn remove_edge(&mut self, edge: EdgeIndex<u32>) {
        let row = self.row_of(edge);
        self.graph.remove_edge(edge);
        self.rows.remove(row as usize);
        let mut mask = vec![false; self.attributes.nb_rows() as usize];
        mask[row as usize] = true;
        self.attributes
            .delete_rows(&mask)
            .expect("mask sized to the manager");
    }

    fn node(&self, id: &Uuid) -> Result<NodeIndex<u32>, ModelError> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| ModelError::ComponentNotFound {
                id: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::identifier::ComponentType;

    fn component(tag: &'static str) -> ComponentId {
        ComponentId::new(ComponentType(tag), Uuid::new())
    }

    #[test]
    fn boundary_ranges_follow_direction() {
        let mut store = Relationships::new();
        let corner = component("Corner3D");
        let line_a = component("Line3D");
        let line_b = component("Line3D");
        store.add_component(corner).unwrap();
        store.add_component(line_a).unwrap();
        store.add_component(line_b).unwrap();
        store.add_boundary_relation(&corner.id, &line_a.id).unwrap();
        store.add_boundary_relation(&corner.id, &line_b.id).unwrap();
        assert_eq!(store.incidences(&corner.id), vec![line_a, line_b]);
        assert_eq!(store.boundaries(&line_a.id), vec![corner]);
        assert!(store.boundaries(&corner.id).is_empty());
        assert_eq!(store.nb_relations(), 2);
        assert_eq!(store.relations(&corner.id).len(), 2);
    }

    #[test]
    fn relations_are_idempotent() {
        let mut store = Relationships::new();
        let first = component("Surface3D");
        let second = component("Block");
        store.add_component(first).unwrap();
        store.add_component(second).unwrap();
        let row = store
            .add_boundary_relation(&first.id, &second.id)
            .unwrap();
        let again = store
            .add_boundary_relation(&first.id, &second.id)
            .unwrap();
        assert_eq!(row, again);
        assert_eq!(store.nb_relations(), 1);
        // A different kind between the same pair is a new relation.
        store.add_internal_relation(&first.id, &second.id).unwrap();
        assert_eq!(store.nb_relations(), 2);
    }

    #[test]
    fn duplicate_and_missing_components_fail() {
        let mut store = Relationships::new();
        let item = component("Corner3D");
        store.add_component(item).unwrap();
        assert!(matches!(
            store.add_component(item),
            Err(ModelError::DuplicateUuid { .. })
        ));
        let ghost = Uuid::new();
        assert!(matches!(
            store.add_boundary_relation(&item.id, &ghost),
            Err(ModelError::ComponentNotFound { .. })
        ));
    }

    #[test]
    fn removal_drops_incident_relations_and_rows() {
        let mut store = Relationships::new();
        let a = component("Corner3D");
        let b = component("Line3D");
        let c = component("Line3D");
        store.add_component(a).unwrap();
        store.add_component(b).unwrap();
        store.add_component(c).unwrap();
        store.add_boundary_relation(&a.id, &b.id).unwrap();
        store.add_boundary_relation(&a.id, &c.id).unwrap();
        let tag = store
            .relation_attribute_manager_mut()
            .find_or_create_attribute("tag", 0u32)
            .unwrap();
        tag.set_value(0, 10).unwrap();
        tag.set_value(1, 20).unwrap();
        store.remove_relation(&a.id, &b.id).unwrap();
        assert_eq!(store.nb_relations(), 1);
        // The surviving relation kept its attribute value on row 0.
        assert_eq!(tag.value(0), 20);
        store.remove_component(&a.id).unwrap();
        assert_eq!(store.nb_relations(), 0);
        assert!(!store.has_component(&a.id));
        assert!(store.has_component(&b.id));
    }

    #[test]
    fn generic_relations_ignore_direction() {
        let mut store = Relationships::new();
        let a = component("Surface3D");
        let b = component("Surface3D");
        store.add_component(a).unwrap();
        store.add_component(b).unwrap();
        let row = store.add_generic_relation(&a.id, &b.id).unwrap();
        assert_eq!(store.add_generic_relation(&b.id, &a.id).unwrap(), row);
        assert_eq!(store.relations(&a.id), vec![b]);
        assert_eq!(store.relations(&b.id), vec![a]);
    }
}
