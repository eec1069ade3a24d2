//! Boundary representation of a 3D model.
//!
//! A `BRep` aggregates typed component collections (corners, lines,
//! surfaces, blocks, model boundaries and component groups), one
//! relationship store and one unique-vertex index. Mutation goes through
//! [`BRepBuilder`], whose typed relationship wrappers validate the
//! component kinds at both endpoints.

use log::debug;

use super::component::{
    Block, BlockCollection, ComponentStore, Corner, CornerCollection, Line,
    LineCollection, ModelBoundary, Surface, SurfaceCollection,
};
use super::identifier::{ComponentId, ComponentType, Uuid};
use super::relationships::Relationships;
use super::vertex_identifier::{ComponentMeshVertex, VertexIdentifier};
use crate::error::ModelError;
use crate::mesh::{
    EdgedCurveBuilder, PointSetBuilder, SolidBuilder, SurfaceBuilder,
};

#[derive(Clone, Debug, Default)]
pub struct BRep {
    pub(crate) corners: ComponentStore<Corner<3>>,
    pub(crate) lines: ComponentStore<Line<3>>,
    pub(crate) surfaces: ComponentStore<Surface<3>>,
    pub(crate) blocks: ComponentStore<Block>,
    pub(crate) model_boundaries: ComponentStore<ModelBoundary>,
    pub(crate) corner_collections: ComponentStore<CornerCollection>,
    pub(crate) line_collections: ComponentStore<LineCollection>,
    pub(crate) surface_collections: ComponentStore<SurfaceCollection>,
    pub(crate) block_collections: ComponentStore<BlockCollection>,
    pub(crate) relationships: Relationships,
    pub(crate) vertex_identifier: VertexIdentifier,
}

impl BRep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short tag identifying the native persisted form.
    pub fn native_extension(&self) -> &'static str {
        "bk_brep"
    }

    pub fn nb_corners(&self) -> u32 {
        self.corners.len()
    }

    pub fn nb_lines(&self) -> u32 {
        self.lines.len()
    }

    pub fn nb_surfaces(&self) -> u32 {
        self.surfaces.len()
    }

    pub fn nb_blocks(&self) -> u32 {
        self.blocks.len()
    }

    pub fn nb_model_boundaries(&self) -> u32 {
        self.model_boundaries.len()
    }

    pub fn corner(&self, id: &Uuid) -> Result<&Corner<3>, ModelError> {
        self.corners.get(id)
    }

    pub fn line(&self, id: &Uuid) -> Result<&Line<3>, ModelError> {
        self.lines.get(id)
    }

    pub fn surface(&self, id: &Uuid) -> Result<&Surface<3>, ModelError> {
        self.surfaces.get(id)
    }

    pub fn block(&self, id: &Uuid) -> Result<&Block, ModelError> {
        self.blocks.get(id)
    }

    pub fn model_boundary(
        &self,
        id: &Uuid,
    ) -> Result<&ModelBoundary, ModelError> {
        self.model_boundaries.get(id)
    }

    pub fn corners(&self) -> impl Iterator<Item = &Corner<3>> {
        self.corners.iter()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line<3>> {
        self.lines.iter()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface<3>> {
        self.surfaces.iter()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn model_boundaries(&self) -> impl Iterator<Item = &ModelBoundary> {
        self.model_boundaries.iter()
    }

    pub fn boundaries(&self, id: &Uuid) -> Vec<ComponentId> {
        self.relationships.boundaries(id)
    }

    pub fn incidences(&self, id: &Uuid) -> Vec<ComponentId> {
        self.relationships.incidences(id)
    }

    pub fn internals(&self, id: &Uuid) -> Vec<ComponentId> {
        self.relationships.internals(id)
    }

    pub fn embeddings(&self, id: &Uuid) -> Vec<ComponentId> {
        self.relationships.embeddings(id)
    }

    pub fn items(&self, id: &Uuid) -> Vec<ComponentId> {
        self.relationships.items(id)
    }

    pub fn collections(&self, id: &Uuid) -> Vec<ComponentId> {
        self.relationships.collections(id)
    }

    pub fn nb_boundaries(&self, id: &Uuid) -> u32 {
        self.relationships.nb_boundaries(id)
    }

    pub fn nb_incidences(&self, id: &Uuid) -> u32 {
        self.relationships.nb_incidences(id)
    }

    pub fn nb_internals(&self, id: &Uuid) -> u32 {
        self.relationships.nb_internals(id)
    }

    pub fn nb_embeddings(&self, id: &Uuid) -> u32 {
        self.relationships.nb_embeddings(id)
    }

    pub fn nb_items(&self, id: &Uuid) -> u32 {
        self.relationships.nb_items(id)
    }

    pub fn nb_collections(&self, id: &Uuid) -> u32 {
        self.relationships.nb_collections(id)
    }

    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    pub fn vertex_identifier(&self) -> &VertexIdentifier {
        &self.vertex_identifier
    }

    pub fn nb_unique_vertices(&self) -> u32 {
        self.vertex_identifier.nb_unique_vertices()
    }

    pub fn unique_vertex(
        &self,
        vertex: &ComponentMeshVertex,
    ) -> Option<u32> {
        self.vertex_identifier.unique_vertex(vertex)
    }

    pub fn component_mesh_vertices(
        &self,
        unique: u32,
    ) -> &[ComponentMeshVertex] {
        self.vertex_identifier.component_mesh_vertices(unique)
    }

    /// The type tag of a registered component, searching every mixin.
    pub fn component_type_of(&self, id: &Uuid) -> Option<ComponentType> {
        if self.corners.get(id).is_ok() {
            return Some(Corner::<3>::component_type());
        }
        if self.lines.get(id).is_ok() {
            return Some(Line::<3>::component_type());
        }
        if self.surfaces.get(id).is_ok() {
            return Some(Surface::<3>::component_type());
        }
        if self.blocks.get(id).is_ok() {
            return Some(Block::component_type());
        }
        if self.model_boundaries.get(id).is_ok() {
            return Some(ModelBoundary::component_type());
        }
        if self.corner_collections.get(id).is_ok() {
            return Some(CornerCollection::component_type());
        }
        if self.line_collections.get(id).is_ok() {
            return Some(LineCollection::component_type());
        }
        if self.surface_collections.get(id).is_ok() {
            return Some(SurfaceCollection::component_type());
        }
        if self.block_collections.get(id).is_ok() {
            return Some(BlockCollection::component_type());
        }
        None
    }
}

/// Scoped mutable access to a B-Rep.
pub struct BRepBuilder<'a> {
    model: &'a mut BRep,
}

macro_rules! add_remove_component {
    ($add:ident, $remove:ident, $set_name:ident, $mesh_builder:ident,
     $store:ident, $component:ty, $builder:ty, $make_builder:expr) => {
        pub fn $add(&mut self) -> Uuid {
            let id = Uuid::new();
            let component = <$component>::new(id);
            self.model
                .relationships
                .add_component(component.component_id())
                .expect("fresh uuid");
            self.model
                .$store
                .add(id, component)
                .expect("fresh uuid");
            id
        }

        pub fn $remove(&mut self, id: &Uuid) -> Result<(), ModelError> {
            self.model.$store.remove(id)?;
            self.model.relationships.remove_component(id)?;
            self.model.vertex_identifier.remove_component(id);
            Ok(())
        }

        pub fn $set_name(
            &mut self,
            id: &Uuid,
            name: impl Into<String>,
        ) -> Result<(), ModelError> {
            self.model.$store.get_mut(id)?.set_name(name);
            Ok(())
        }

        pub fn $mesh_builder(
            &mut self,
            id: &Uuid,
        ) -> Result<$builder, ModelError> {
            let component = self.model.$store.get_mut(id)?;
            Ok($make_builder(component.mesh_mut()))
        }
    };
}

macro_rules! add_remove_meshless {
    ($add:ident, $remove:ident, $set_name:ident, $store:ident,
     $component:ty) => {
        pub fn $add(&mut self) -> Uuid {
            let id = Uuid::new();
            let component = <$component>::new(id);
            self.model
                .relationships
                .add_component(component.component_id())
                .expect("fresh uuid");
            self.model
                .$store
                .add(id, component)
                .expect("fresh uuid");
            id
        }

        pub fn $remove(&mut self, id: &Uuid) -> Result<(), ModelError> {
            self.model.$store.remove(id)?;
            self.model.relationships.remove_component(id)?;
            Ok(())
        }

        pub fn $set_name(
            &mut self,
            id: &Uuid,
            name: impl Into<String>,
        ) -> Result<(), ModelError> {
            self.model.$store.get_mut(id)?.set_name(name);
            Ok(())
        }
    };
}

impl<'a> BRepBuilder<'a> {
    pub fn new(model: &'a mut BRep) -> Self {
        Self { model }
    }

    add_remove_component!(
        add_corner,
        remove_corner,
        set_corner_name,
        corner_mesh_builder,
        corners,
        Corner<3>,
        PointSetBuilder<'_, 3>,
        PointSetBuilder::new
    );

    add_remove_component!(
        add_line,
        remove_line,
        set_line_name,
        line_mesh_builder,
        lines,
        Line<3>,
        EdgedCurveBuilder<'_, 3>,
        EdgedCurveBuilder::new
    );

    add_remove_component!(
        add_surface,
        remove_surface,
        set_surface_name,
        surface_mesh_builder,
        surfaces,
        Surface<3>,
        SurfaceBuilder<'_, 3>,
        SurfaceBuilder::new
    );

    add_remove_component!(
        add_block,
        remove_block,
        set_block_name,
        block_mesh_builder,
        blocks,
        Block,
        SolidBuilder<'_>,
        SolidBuilder::new
    );

    add_remove_meshless!(
        add_model_boundary,
        remove_model_boundary,
        set_model_boundary_name,
        model_boundaries,
        ModelBoundary
    );

    add_remove_meshless!(
        add_corner_collection,
        remove_corner_collection,
        set_corner_collection_name,
        corner_collections,
        CornerCollection
    );

    add_remove_meshless!(
        add_line_collection,
        remove_line_collection,
        set_line_collection_name,
        line_collections,
        LineCollection
    );

    add_remove_meshless!(
        add_surface_collection,
        remove_surface_collection,
        set_surface_collection_name,
        surface_collections,
        SurfaceCollection
    );

    add_remove_meshless!(
        add_block_collection,
        remove_block_collection,
        set_block_collection_name,
        block_collections,
        BlockCollection
    );

    fn check_kind(
        &self,
        id: &Uuid,
        expected: ComponentType,
        relation: &'static str,
    ) -> Result<(), ModelError> {
        let actual = self.model.component_type_of(id).ok_or_else(|| {
            ModelError::ComponentNotFound { id: id.to_string() }
        })?;
        if actual != expected {
            return Err(ModelError::InvalidRelationTypes {
                relation,
                from: actual.0,
                to: expected.0,
            });
        }
        Ok(())
    }

    pub fn add_corner_line_boundary_relationship(
        &mut self,
        corner: &Uuid,
        line: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(corner, Corner::<3>::component_type(), "boundary")?;
        self.check_kind(line, Line::<3>::component_type(), "boundary")?;
        self.model.relationships.add_boundary_relation(corner, line)
    }

    pub fn add_line_surface_boundary_relationship(
        &mut self,
        line: &Uuid,
        surface: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<3>::component_type(), "boundary")?;
        self.check_kind(surface, Surface::<3>::component_type(), "boundary")?;
        self.model.relationships.add_boundary_relation(line, surface)
    }

    pub fn add_surface_block_boundary_relationship(
        &mut self,
        surface: &Uuid,
        block: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(surface, Surface::<3>::component_type(), "boundary")?;
        self.check_kind(block, Block::component_type(), "boundary")?;
        self.model.relationships.add_boundary_relation(surface, block)
    }

    pub fn add_corner_surface_internal_relationship(
        &mut self,
        corner: &Uuid,
        surface: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(corner, Corner::<3>::component_type(), "internal")?;
        self.check_kind(surface, Surface::<3>::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(corner, surface)
    }

    pub fn add_corner_block_internal_relationship(
        &mut self,
        corner: &Uuid,
        block: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(corner, Corner::<3>::component_type(), "internal")?;
        self.check_kind(block, Block::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(corner, block)
    }

    pub fn add_line_surface_internal_relationship(
        &mut self,
        line: &Uuid,
        surface: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<3>::component_type(), "internal")?;
        self.check_kind(surface, Surface::<3>::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(line, surface)
    }

    pub fn add_line_block_internal_relationship(
        &mut self,
        line: &Uuid,
        block: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<3>::component_type(), "internal")?;
        self.check_kind(block, Block::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(line, block)
    }

    pub fn add_surface_block_internal_relationship(
        &mut self,
        surface: &Uuid,
        block: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(surface, Surface::<3>::component_type(), "internal")?;
        self.check_kind(block, Block::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(surface, block)
    }

    pub fn add_surface_in_model_boundary(
        &mut self,
        surface: &Uuid,
        boundary: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(surface, Surface::<3>::component_type(), "item")?;
        self.check_kind(boundary, ModelBoundary::component_type(), "item")?;
        self.model.relationships.add_item_in_collection(surface, boundary)
    }

    pub fn add_corner_in_corner_collection(
        &mut self,
        corner: &Uuid,
        collection: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(corner, Corner::<3>::component_type(), "item")?;
        self.check_kind(
            collection,
            CornerCollection::component_type(),
            "item",
        )?;
        self.model
            .relationships
            .add_item_in_collection(corner, collection)
    }

    pub fn add_line_in_line_collection(
        &mut self,
        line: &Uuid,
        collection: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<3>::component_type(), "item")?;
        self.check_kind(collection, LineCollection::component_type(), "item")?;
        self.model
            .relationships
            .add_item_in_collection(line, collection)
    }

    pub fn add_surface_in_surface_collection(
        &mut self,
        surface: &Uuid,
        collection: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(surface, Surface::<3>::component_type(), "item")?;
        self.check_kind(
            collection,
            SurfaceCollection::component_type(),
            "item",
        )?;
        self.model
            .relationships
            .add_item_in_collection(surface, collection)
    }

    pub fn add_block_in_block_collection(
        &mut self,
        block: &Uuid,
        collection: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(block, Block::component_type(), "item")?;
        self.check_kind(
            collection,
            BlockCollection::component_type(),
            "item",
        )?;
        self.model
            .relationships
            .add_item_in_collection(block, collection)
    }

    pub fn remove_relation(
        &mut self,
        first: &Uuid,
        second: &Uuid,
    ) -> Result<(), ModelError> {
        self.model.relationships.remove_relation(first, second)
    }

    pub fn create_unique_vertex(&mut self) -> u32 {
        self.model.vertex_identifier.create_unique_vertex()
    }

    pub fn set_unique_vertex(
        &mut self,
        vertex: ComponentMeshVertex,
        unique: u32,
    ) -> Result<(), ModelError> {
        self.model.vertex_identifier.set_unique_vertex(vertex, unique)
    }

    pub fn delete_isolated_unique_vertices(&mut self) -> Result<(), ModelError> {
        debug!("compacting isolated unique vertices");
        self.model.vertex_identifier.delete_isolated_unique_vertices()
    }
}
