//! Section: the 2D analogue of a B-Rep.
//!
//! Corners, lines and surfaces in the plane, with model boundaries made of
//! lines. Same relationship and unique-vertex machinery as the 3D model,
//! one dimension down.

use super::component::{
    ComponentStore, Corner, CornerCollection, Line, LineCollection,
    ModelBoundary, Surface, SurfaceCollection,
};
use super::identifier::{ComponentId, ComponentType, Uuid};
use super::relationships::Relationships;
use super::vertex_identifier::{ComponentMeshVertex, VertexIdentifier};
use crate::error::ModelError;
use crate::mesh::{EdgedCurveBuilder, PointSetBuilder, SurfaceBuilder};

#[derive(Clone, Debug, Default)]
pub struct Section {
    pub(crate) corners: ComponentStore<Corner<2>>,
    pub(crate) lines: ComponentStore<Line<2>>,
    pub(crate) surfaces: ComponentStore<Surface<2>>,
    pub(crate) model_boundaries: ComponentStore<ModelBoundary>,
    pub(crate) corner_collections: ComponentStore<CornerCollection>,
    pub(crate) line_collections: ComponentStore<LineCollection>,
    pub(crate) surface_collections: ComponentStore<SurfaceCollection>,
    pub(crate) relationships: Relationships,
    pub(crate) vertex_identifier: VertexIdentifier,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Short tag identifying the native persisted form.
    pub fn native_extension(&self) -> &'static str {
        "bk_section"
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

    pub fn nb_model_boundaries(&self) -> u32 {
        self.model_boundaries.len()
    }

    pub fn corner(&self, id: &Uuid) -> Result<&Corner<2>, ModelError> {
        self.corners.get(id)
    }

    pub fn line(&self, id: &Uuid) -> Result<&Line<2>, ModelError> {
        self.lines.get(id)
    }

    pub fn surface(&self, id: &Uuid) -> Result<&Surface<2>, ModelError> {
        self.surfaces.get(id)
    }

    pub fn model_boundary(
        &self,
        id: &Uuid,
    ) -> Result<&ModelBoundary, ModelError> {
        self.model_boundaries.get(id)
    }

    pub fn corners(&self) -> impl Iterator<Item = &Corner<2>> {
        self.corners.iter()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line<2>> {
        self.lines.iter()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface<2>> {
        self.surfaces.iter()
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

    pub fn component_type_of(&self, id: &Uuid) -> Option<ComponentType> {
        if self.corners.get(id).is_ok() {
            return Some(Corner::<2>::component_type());
        }
        if self.lines.get(id).is_ok() {
            return Some(Line::<2>::component_type());
        }
        if self.surfaces.get(id).is_ok() {
            return Some(Surface::<2>::component_type());
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
        None
    }
}

/// Scoped mutable access to a section.
pub struct SectionBuilder<'a> {
    model: &'a mut Section,
}

macro_rules! section_component {
    ($add:ident, $remove:ident, $set_name:ident, $mesh_builder:ident,
     $store:ident, $component:ty, $builder:ty, $make_builder:expr) => {
        pub fn $add(&mut self) -> Uuid {
            let id = Uuid::new();
            let component = <$component>::new(id);
            self.model
                .relationships
                .add_component(component.component_id())
                .expect("fresh uuid");
            self.model.$store.add(id, component).expect("fresh uuid");
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

macro_rules! section_meshless {
    ($add:ident, $remove:ident, $set_name:ident, $store:ident,
     $component:ty) => {
        pub fn $add(&mut self) -> Uuid {
            let id = Uuid::new();
            let component = <$component>::new(id);
            self.model
                .relationships
                .add_component(component.component_id())
                .expect("fresh uuid");
            self.model.$store.add(id, component).expect("fresh uuid");
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

impl<'a> SectionBuilder<'a> {
    pub fn new(model: &'a mut Section) -> Self {
        Self { model }
    }

    section_component!(
        add_corner,
        remove_corner,
        set_corner_name,
        corner_mesh_builder,
        corners,
        Corner<2>,
        PointSetBuilder<'_, 2>,
        PointSetBuilder::new
    );

    section_component!(
        add_line,
        remove_line,
        set_line_name,
        line_mesh_builder,
        lines,
        Line<2>,
        EdgedCurveBuilder<'_, 2>,
        EdgedCurveBuilder::new
    );

    section_component!(
        add_surface,
        remove_surface,
        set_surface_name,
        surface_mesh_builder,
        surfaces,
        Surface<2>,
        SurfaceBuilder<'_, 2>,
        SurfaceBuilder::new
    );

    section_meshless!(
        add_model_boundary,
        remove_model_boundary,
        set_model_boundary_name,
        model_boundaries,
        ModelBoundary
    );

    section_meshless!(
        add_corner_collection,
        remove_corner_collection,
        set_corner_collection_name,
        corner_collections,
        CornerCollection
    );

    section_meshless!(
        add_line_collection,
        remove_line_collection,
        set_line_collection_name,
        line_collections,
        LineCollection
    );

    section_meshless!(
        add_surface_collection,
        remove_surface_collection,
        set_surface_collection_name,
        surface_collections,
        SurfaceCollection
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
        self.check_kind(corner, Corner::<2>::component_type(), "boundary")?;
        self.check_kind(line, Line::<2>::component_type(), "boundary")?;
        self.model.relationships.add_boundary_relation(corner, line)
    }

    pub fn add_line_surface_boundary_relationship(
        &mut self,
        line: &Uuid,
        surface: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<2>::component_type(), "boundary")?;
        self.check_kind(surface, Surface::<2>::component_type(), "boundary")?;
        self.model.relationships.add_boundary_relation(line, surface)
    }

    pub fn add_corner_surface_internal_relationship(
        &mut self,
        corner: &Uuid,
        surface: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(corner, Corner::<2>::component_type(), "internal")?;
        self.check_kind(surface, Surface::<2>::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(corner, surface)
    }

    pub fn add_line_surface_internal_relationship(
        &mut self,
        line: &Uuid,
        surface: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<2>::component_type(), "internal")?;
        self.check_kind(surface, Surface::<2>::component_type(), "internal")?;
        self.model.relationships.add_internal_relation(line, surface)
    }

    pub fn add_line_in_model_boundary(
        &mut self,
        line: &Uuid,
        boundary: &Uuid,
    ) -> Result<u32, ModelError> {
        self.check_kind(line, Line::<2>::component_type(), "item")?;
        self.check_kind(boundary, ModelBoundary::component_type(), "item")?;
        self.model.relationships.add_item_in_collection(line, boundary)
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
}
