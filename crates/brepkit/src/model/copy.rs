//! Deep model copies through a uuid mapping.
//!
//! The mapping may pre-assign target uuids for some source components;
//! missing entries are allocated and written back, so a caller copying
//! several models can keep the identifications consistent. Component
//! meshes are independent, so their clones run in parallel under the
//! `rayon` feature; the relationship-graph rewrite is serial at the end.

use log::debug;
use rustc_hash::FxHashMap;

use super::brep::BRep;
use super::identifier::Uuid;
use super::section::Section;
use crate::error::ModelError;

#[cfg(feature = "rayon")]
fn clone_all<C: Clone + Send + Sync>(components: Vec<&C>) -> Vec<C> {
    use rayon::prelude::*;
    components.par_iter().map(|c| (*c).clone()).collect()
}

#[cfg(not(feature = "rayon"))]
fn clone_all<C: Clone>(components: Vec<&C>) -> Vec<C> {
    components.into_iter().cloned().collect()
}

fn target_uuid(mapping: &mut FxHashMap<Uuid, Uuid>, source: Uuid) -> Uuid {
    *mapping.entry(source).or_insert_with(Uuid::new)
}

macro_rules! copy_components {
    ($source:expr, $target:expr, $mapping:expr, $store:ident,
     $component:ty) => {{
        let ids: Vec<Uuid> = $source.$store.ids().copied().collect();
        let names: Vec<String> = $source
            .$store
            .iter()
            .map(|component| component.name().to_string())
            .collect();
        let meshes = clone_all(
            $source
                .$store
                .iter()
                .map(|component| component.mesh())
                .collect(),
        );
        for ((source_id, name), mesh) in
            ids.into_iter().zip(names).zip(meshes)
        {
            let id = target_uuid($mapping, source_id);
            let mut component = <$component>::new(id);
            component.set_name(name);
            component.replace_mesh(mesh);
            $target
                .relationships
                .add_component(component.component_id())?;
            $target.$store.add(id, component)?;
        }
    }};
}

macro_rules! copy_meshless {
    ($source:expr, $target:expr, $mapping:expr, $store:ident,
     $component:ty) => {{
        for source in $source.$store.iter() {
            let id = target_uuid($mapping, source.id());
            let mut component = <$component>::new(id);
            component.set_name(source.name());
            $target
                .relationships
                .add_component(component.component_id())?;
            $target.$store.add(id, component)?;
        }
    }};
}

fn copy_relationships(
    source: &super::relationships::Relationships,
    target: &mut super::relationships::Relationships,
    mapping: &FxHashMap<Uuid, Uuid>,
) -> Result<(), ModelError> {
    use super::relationships::RelationKind;
    let mut pairs = Vec::new();
    for (row, (from, to, kind)) in source.relation_entries().enumerate() {
        let from_id = mapping.get(&from.id).copied().unwrap_or(from.id);
        let to_id = mapping.get(&to.id).copied().unwrap_or(to.id);
        let target_row = match kind {
            RelationKind::Boundary => {
                target.add_boundary_relation(&from_id, &to_id)?
            }
            RelationKind::Internal => {
                target.add_internal_relation(&from_id, &to_id)?
            }
            RelationKind::Item => {
                target.add_item_in_collection(&from_id, &to_id)?
            }
            RelationKind::Generic => {
                target.add_generic_relation(&from_id, &to_id)?
            }
        };
        pairs.push((row as u32, target_row));
    }
    target
        .relation_attribute_manager_mut()
        .import_from(source.relation_attribute_manager(), &pairs)?;
    Ok(())
}

/// Deep copy of a B-Rep; `mapping` is filled with source -> target uuids.
pub fn copy_brep(
    source: &BRep,
    mapping: &mut FxHashMap<Uuid, Uuid>,
) -> Result<BRep, ModelError> {
    use super::component::{
        Block, BlockCollection, Corner, CornerCollection, Line,
        LineCollection, ModelBoundary, Surface, SurfaceCollection,
    };
    let mut target = BRep::new();
    copy_components!(source, target, mapping, corners, Corner<3>);
    copy_components!(source, target, mapping, lines, Line<3>);
    copy_components!(source, target, mapping, surfaces, Surface<3>);
    copy_components!(source, target, mapping, blocks, Block);
    copy_meshless!(source, target, mapping, model_boundaries, ModelBoundary);
    copy_meshless!(
        source,
        target,
        mapping,
        corner_collections,
        CornerCollection
    );
    copy_meshless!(source, target, mapping, line_collections, LineCollection);
    copy_meshless!(
        source,
        target,
        mapping,
        surface_collections,
        SurfaceCollection
    );
    copy_meshless!(
        source,
        target,
        mapping,
        block_collections,
        BlockCollection
    );
    copy_relationships(
        &source.relationships,
        &mut target.relationships,
        mapping,
    )?;
    target.vertex_identifier = source.vertex_identifier.clone();
    target.vertex_identifier.remap_components(mapping);
    debug!(
        "copied brep: {} corners, {} lines, {} surfaces, {} blocks",
        target.nb_corners(),
        target.nb_lines(),
        target.nb_surfaces(),
        target.nb_blocks()
    );
    Ok(target)
}

/// Deep copy of a section; `mapping` is filled with source -> target
/// uuids.
pub fn copy_section(
    source: &Section,
    mapping: &mut FxHashMap<Uuid, Uuid>,
) -> Result<Section, ModelError> {
    use super::component::{
        Corner, CornerCollection, Line, LineCollection, ModelBoundary,
        Surface, SurfaceCollection,
    };
    let mut target = Section::new();
    copy_components!(source, target, mapping, corners, Corner<2>);
    copy_components!(source, target, mapping, lines, Line<2>);
    copy_components!(source, target, mapping, surfaces, Surface<2>);
    copy_meshless!(source, target, mapping, model_boundaries, ModelBoundary);
    copy_meshless!(
        source,
        target,
        mapping,
        corner_collections,
        CornerCollection
    );
    copy_meshless!(source, target, mapping, line_collections, LineCollection);
    copy_meshless!(
        source,
        target,
        mapping,
        surface_collections,
        SurfaceCollection
    );
    copy_relationships(
        &source.relationships,
        &mut target.relationships,
        mapping,
    )?;
    target.vertex_identifier = source.vertex_identifier.clone();
    target.vertex_identifier.remap_components(mapping);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;
    use crate::model::brep::BRepBuilder;
    use crate::model::vertex_identifier::ComponentMeshVertex;

    #[test]
    fn copy_preserves_topology_under_fresh_uuids() {
        let mut source = BRep::new();
        let (corner, line, surface) = {
            let mut builder = BRepBuilder::new(&mut source);
            let corner = builder.add_corner();
            let line = builder.add_line();
            let surface = builder.add_surface();
            builder.set_corner_name(&corner, "origin").unwrap();
            builder
                .corner_mesh_builder(&corner)
                .unwrap()
                .create_point(Point3::new(1.0, 2.0, 3.0));
            builder
                .add_corner_line_boundary_relationship(&corner, &line)
                .unwrap();
            builder
                .add_line_surface_boundary_relationship(&line, &surface)
                .unwrap();
            (corner, line, surface)
        };
        let mut mapping = FxHashMap::default();
        let copy = copy_brep(&source, &mut mapping).unwrap();
        assert_eq!(copy.nb_corners(), 1);
        assert_eq!(copy.nb_lines(), 1);
        assert_eq!(copy.nb_surfaces(), 1);
        let copied_corner = mapping[&corner];
        let copied_line = mapping[&line];
        assert_ne!(copied_corner, corner);
        let corner_component = copy.corner(&copied_corner).unwrap();
        assert_eq!(corner_component.name(), "origin");
        assert_eq!(
            corner_component.mesh().point(0),
            Point3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(copy.nb_incidences(&copied_corner), 1);
        assert_eq!(
            copy.incidences(&copied_corner)[0].id,
            copied_line
        );
        assert_eq!(copy.nb_boundaries(&mapping[&surface]), 1);
        // The source is untouched.
        assert_eq!(source.nb_incidences(&corner), 1);
    }

    #[test]
    fn copy_remaps_unique_vertices() {
        let mut source = BRep::new();
        let line = {
            let mut builder = BRepBuilder::new(&mut source);
            let line = builder.add_line();
            builder
                .line_mesh_builder(&line)
                .unwrap()
                .create_point(Point3::new(0.0, 0.0, 0.0));
            let unique = builder.create_unique_vertex();
            let component_id = source.line(&line).unwrap().component_id();
            let mut builder = BRepBuilder::new(&mut source);
            builder
                .set_unique_vertex(
                    ComponentMeshVertex::new(component_id, 0),
                    unique,
                )
                .unwrap();
            line
        };
        let mut mapping = FxHashMap::default();
        let copy = copy_brep(&source, &mut mapping).unwrap();
        assert_eq!(copy.nb_unique_vertices(), 1);
        let members = copy.component_mesh_vertices(0);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].component.id, mapping[&line]);
    }

    #[test]
    fn prefilled_mapping_is_respected() {
        let mut source = BRep::new();
        let corner = BRepBuilder::new(&mut source).add_corner();
        let wanted = Uuid::new();
        let mut mapping = FxHashMap::default();
        mapping.insert(corner, wanted);
        let copy = copy_brep(&source, &mut mapping).unwrap();
        assert!(copy.corner(&wanted).is_ok());
    }
}
