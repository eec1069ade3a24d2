//! Serde snapshots of meshes and models.
//!
//! Snapshots capture what round-trips a mesh: the row count of every
//! attribute manager, each column's element type name, flags, default and
//! row values, the topology tables, and for models the labelled
//! relationship graph plus the unique-vertex triples. Column values go
//! through `serde_json::Value`, and restoration resolves the element type
//! name in a registry; the built-in value types are pre-registered, custom
//! types register with [`register_attribute_type`].

use std::fs::File;
use std::path::Path;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeManager, AttributeValue};
use crate::geometry::{Point, Point2, Point3};
use crate::mesh::{
    EdgedCurve, EdgedCurveBuilder, PointSet, PointSetBuilder, PolygonEdge,
    PolygonVertex, PolyhedronFacet, PolyhedronShape, PolyhedronVertex,
    SolidBuilder, SolidMesh, SurfaceBuilder, SurfaceMesh,
};
use crate::model::{
    BRep, BRepBuilder, ComponentId, ComponentMeshVertex, RelationKind, Uuid,
};

pub type IoError = Box<dyn std::error::Error>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeSnapshot {
    pub name: String,
    pub element_type: String,
    pub assignable: bool,
    pub interpolable: bool,
    pub transferable: bool,
    pub default: serde_json::Value,
    pub rows: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub nb_rows: u32,
    pub attributes: Vec<AttributeSnapshot>,
}

type RestoreFn = fn(
    &AttributeSnapshot,
    &mut AttributeManager,
) -> Result<(), IoError>;

static REGISTRY: Lazy<RwLock<FxHashMap<String, RestoreFn>>> =
    Lazy::new(|| {
        let mut registry: FxHashMap<String, RestoreFn> =
            FxHashMap::default();
        macro_rules! builtin {
            ($($t:ty),* $(,)?) => { $(
                registry.insert(
                    std::any::type_name::<$t>().to_string(),
                    restore_column::<$t>,
                );
            )* };
        }
        builtin!(
            bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64, String,
            [f64; 2], [f64; 3], [u32; 2], [u32; 3], Point2, Point3,
            PolygonVertex, PolygonEdge, PolyhedronVertex, PolyhedronFacet,
        );
        RwLock::new(registry)
    });

/// Registers a custom element type so snapshots referencing it restore.
pub fn register_attribute_type<T: AttributeValue>() {
    REGISTRY
        .write()
        .unwrap()
        .insert(std::any::type_name::<T>().to_string(), restore_column::<T>);
}

fn restore_column<T: AttributeValue>(
    snapshot: &AttributeSnapshot,
    manager: &mut AttributeManager,
) -> Result<(), IoError> {
    let default: T = serde_json::from_value(snapshot.default.clone())?;
    let values: Vec<T> = serde_json::from_value(snapshot.rows.clone())?;
    let attribute = manager.find_or_create_attribute_with_flags(
        &snapshot.name,
        default,
        crate::attributes::AttributeFlags {
            assignable: snapshot.assignable,
            interpolable: snapshot.interpolable,
            transferable: snapshot.transferable,
        },
    )?;
    for (row, value) in values.into_iter().enumerate() {
        attribute.set_value(row as u32, value)?;
    }
    Ok(())
}

pub fn snapshot_manager(manager: &AttributeManager) -> ManagerSnapshot {
    let attributes = manager
        .columns_with_names()
        .map(|(name, column)| {
            let guard = column.read().unwrap();
            let flags = guard.flags();
            AttributeSnapshot {
                name: name.to_string(),
                element_type: guard.element_type_name().to_string(),
                assignable: flags.assignable,
                interpolable: flags.interpolable,
                transferable: flags.transferable,
                default: guard.default_json(),
                rows: guard.rows_json(),
            }
        })
        .collect();
    ManagerSnapshot {
        nb_rows: manager.nb_rows(),
        attributes,
    }
}

pub fn restore_manager(
    snapshot: &ManagerSnapshot,
    manager: &mut AttributeManager,
) -> Result<(), IoError> {
    manager.resize(snapshot.nb_rows);
    let registry = REGISTRY.read().unwrap();
    for attribute in &snapshot.attributes {
        let Some(restore) = registry.get(&attribute.element_type) else {
            log::debug!(
                "skipping attribute {} of unregistered type {}",
                attribute.name,
                attribute.element_type
            );
            continue;
        };
        restore(attribute, manager)?;
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PointSetSnapshot {
    pub vertices: ManagerSnapshot,
}

pub fn snapshot_point_set<const D: usize>(
    mesh: &PointSet<D>,
) -> PointSetSnapshot {
    PointSetSnapshot {
        vertices: snapshot_manager(mesh.vertex_attribute_manager()),
    }
}

pub fn restore_point_set<const D: usize>(
    snapshot: &PointSetSnapshot,
) -> Result<PointSet<D>, IoError>
where
    Point<D>: AttributeValue,
{
    let mut mesh = PointSet::new();
    {
        let mut builder = PointSetBuilder::new(&mut mesh);
        for _ in 0..snapshot.vertices.nb_rows {
            builder.create_vertex();
        }
    }
    restore_manager(&snapshot.vertices, mesh.vertex_attribute_manager_mut())?;
    Ok(mesh)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurveSnapshot {
    pub vertices: ManagerSnapshot,
    pub edges: Vec<[u32; 2]>,
    pub edge_attributes: ManagerSnapshot,
}

pub fn snapshot_curve<const D: usize>(mesh: &EdgedCurve<D>) -> CurveSnapshot {
    CurveSnapshot {
        vertices: snapshot_manager(mesh.vertex_attribute_manager()),
        edges: (0..mesh.nb_edges())
            .map(|edge| mesh.edge_vertices(edge))
            .collect(),
        edge_attributes: snapshot_manager(mesh.edge_attribute_manager()),
    }
}

pub fn restore_curve<const D: usize>(
    snapshot: &CurveSnapshot,
) -> Result<EdgedCurve<D>, IoError>
where
    Point<D>: AttributeValue,
{
    let mut mesh = EdgedCurve::new();
    {
        let mut builder = EdgedCurveBuilder::new(&mut mesh);
        for _ in 0..snapshot.vertices.nb_rows {
            builder.create_vertex();
        }
        for &[v0, v1] in &snapshot.edges {
            builder.create_edge(v0, v1)?;
        }
    }
    restore_manager(&snapshot.vertices, mesh.vertex_attribute_manager_mut())?;
    restore_manager(
        &snapshot.edge_attributes,
        mesh.edge_attribute_manager_mut(),
    )?;
    Ok(mesh)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceSnapshot {
    pub vertices: ManagerSnapshot,
    pub polygons: Vec<Vec<u32>>,
    /// Per polygon edge, adjacent polygon or `NO_ID`.
    pub adjacents: Vec<Vec<u32>>,
    pub polygon_attributes: ManagerSnapshot,
    pub edges: Option<SurfaceEdgesSnapshot>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SurfaceEdgesSnapshot {
    pub edges: Vec<[u32; 2]>,
    pub edge_attributes: ManagerSnapshot,
}

pub fn snapshot_surface<const D: usize>(
    mesh: &SurfaceMesh<D>,
) -> SurfaceSnapshot {
    let polygons = (0..mesh.nb_polygons())
        .map(|polygon| mesh.polygon_vertices(polygon).to_vec())
        .collect();
    let adjacents = (0..mesh.nb_polygons())
        .map(|polygon| {
            (0..mesh.nb_polygon_edges(polygon) as u8)
                .map(|edge| {
                    mesh.polygon_adjacent(PolygonEdge::new(polygon, edge))
                        .unwrap_or(crate::NO_ID)
                })
                .collect()
        })
        .collect();
    let edges = mesh.are_edges_enabled().then(|| SurfaceEdgesSnapshot {
        edges: (0..mesh.nb_edges())
            .map(|edge| mesh.edge_vertices(edge))
            .collect(),
        edge_attributes: snapshot_manager(mesh.edge_attribute_manager()),
    });
    SurfaceSnapshot {
        vertices: snapshot_manager(mesh.vertex_attribute_manager()),
        polygons,
        adjacents,
        polygon_attributes: snapshot_manager(
            mesh.polygon_attribute_manager(),
        ),
        edges,
    }
}

pub fn restore_surface<const D: usize>(
    snapshot: &SurfaceSnapshot,
) -> Result<SurfaceMesh<D>, IoError>
where
    Point<D>: AttributeValue,
{
    let mut mesh = SurfaceMesh::new();
    {
        let mut builder = SurfaceBuilder::new(&mut mesh);
        for _ in 0..snapshot.vertices.nb_rows {
            builder.create_vertex();
        }
        for polygon in &snapshot.polygons {
            builder.create_polygon(polygon)?;
        }
        for (polygon, adjacents) in snapshot.adjacents.iter().enumerate() {
            for (edge, &adjacent) in adjacents.iter().enumerate() {
                if adjacent != crate::NO_ID {
                    builder.set_polygon_adjacent(
                        PolygonEdge::new(polygon as u32, edge as u8),
                        adjacent,
                    )?;
                }
            }
        }
    }
    restore_manager(&snapshot.vertices, mesh.vertex_attribute_manager_mut())?;
    restore_manager(
        &snapshot.polygon_attributes,
        mesh.polygon_attribute_manager_mut(),
    )?;
    if let Some(edges) = &snapshot.edges {
        mesh.enable_edges();
        // Rebuilt ids may differ from persisted order: remap rows.
        let pairs: Vec<(u32, u32)> = edges
            .edges
            .iter()
            .enumerate()
            .filter_map(|(row, &[v0, v1])| {
                mesh.edges()
                    .edge_from_vertices(v0, v1)
                    .map(|rebuilt| (row as u32, rebuilt))
            })
            .collect();
        let mut manager = AttributeManager::new(edges.edge_attributes.nb_rows);
        restore_manager(&edges.edge_attributes, &mut manager)?;
        mesh.edge_attribute_manager_mut()
            .import_from(&manager, &pairs)?;
    }
    Ok(mesh)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolidSnapshot {
    pub vertices: ManagerSnapshot,
    pub polyhedra: Vec<Vec<u32>>,
    pub shapes: Vec<PolyhedronShape>,
    pub general_facets: Vec<Option<Vec<Vec<u8>>>>,
    pub adjacents: Vec<Vec<u32>>,
    pub polyhedron_attributes: ManagerSnapshot,
}

pub fn snapshot_solid(mesh: &SolidMesh) -> SolidSnapshot {
    let polyhedra = (0..mesh.nb_polyhedra())
        .map(|polyhedron| mesh.polyhedron_vertices(polyhedron).to_vec())
        .collect();
    let shapes = (0..mesh.nb_polyhedra())
        .map(|polyhedron| mesh.polyhedron_shape(polyhedron))
        .collect();
    let general_facets = (0..mesh.nb_polyhedra())
        .map(|polyhedron| {
            (mesh.polyhedron_shape(polyhedron) == PolyhedronShape::General)
                .then(|| {
                    (0..mesh.nb_polyhedron_facets(polyhedron) as u8)
                        .map(|facet| {
                            mesh.facet_locals(PolyhedronFacet::new(
                                polyhedron, facet,
                            ))
                            .to_vec()
                        })
                        .collect()
                })
        })
        .collect();
    let adjacents = (0..mesh.nb_polyhedra())
        .map(|polyhedron| {
            (0..mesh.nb_polyhedron_facets(polyhedron) as u8)
                .map(|facet| {
                    mesh.polyhedron_adjacent(PolyhedronFacet::new(
                        polyhedron, facet,
                    ))
                    .unwrap_or(crate::NO_ID)
                })
                .collect()
        })
        .collect();
    SolidSnapshot {
        vertices: snapshot_manager(mesh.vertex_attribute_manager()),
        polyhedra,
        shapes,
        general_facets,
        adjacents,
        polyhedron_attributes: snapshot_manager(
            mesh.polyhedron_attribute_manager(),
        ),
    }
}

pub fn restore_solid(snapshot: &SolidSnapshot) -> Result<SolidMesh, IoError> {
    let mut mesh = SolidMesh::new();
    {
        let mut builder = SolidBuilder::new(&mut mesh);
        for _ in 0..snapshot.vertices.nb_rows {
            builder.create_vertex();
        }
        for (polyhedron, vertices) in snapshot.polyhedra.iter().enumerate() {
            match snapshot.shapes[polyhedron] {
                PolyhedronShape::Tetrahedron => {
                    builder.create_tetrahedron(
                        vertices.as_slice().try_into()?,
                    )?;
                }
                PolyhedronShape::Pyramid => {
                    builder
                        .create_pyramid(vertices.as_slice().try_into()?)?;
                }
                PolyhedronShape::Prism => {
                    builder.create_prism(vertices.as_slice().try_into()?)?;
                }
                PolyhedronShape::Hexahedron => {
                    builder.create_hexahedron(
                        vertices.as_slice().try_into()?,
                    )?;
                }
                PolyhedronShape::General => {
                    let facets = snapshot.general_facets[polyhedron]
                        .as_ref()
                        .ok_or("general polyhedron without facets")?;
                    builder.create_polyhedron(vertices, facets)?;
                }
            }
        }
        for (polyhedron, adjacents) in snapshot.adjacents.iter().enumerate()
        {
            for (facet, &adjacent) in adjacents.iter().enumerate() {
                if adjacent != crate::NO_ID {
                    builder.set_polyhedron_adjacent(
                        PolyhedronFacet::new(polyhedron as u32, facet as u8),
                        adjacent,
                    )?;
                }
            }
        }
    }
    restore_manager(&snapshot.vertices, mesh.vertex_attribute_manager_mut())?;
    restore_manager(
        &snapshot.polyhedron_attributes,
        mesh.polyhedron_attribute_manager_mut(),
    )?;
    Ok(mesh)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub from: ComponentId,
    pub to: ComponentId,
    pub kind: RelationKind,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UniqueVertexSnapshot {
    pub unique_vertex: u32,
    pub component: ComponentId,
    pub vertex: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BRepSnapshot {
    pub corners: Vec<(Uuid, String, PointSetSnapshot)>,
    pub lines: Vec<(Uuid, String, CurveSnapshot)>,
    pub surfaces: Vec<(Uuid, String, SurfaceSnapshot)>,
    pub blocks: Vec<(Uuid, String, SolidSnapshot)>,
    pub model_boundaries: Vec<(Uuid, String)>,
    pub relations: Vec<RelationSnapshot>,
    pub relation_attributes: ManagerSnapshot,
    pub nb_unique_vertices: u32,
    pub unique_vertices: Vec<UniqueVertexSnapshot>,
}

pub fn snapshot_brep(model: &BRep) -> BRepSnapshot {
    let unique_vertices = (0..model.nb_unique_vertices())
        .flat_map(|unique| {
            model.component_mesh_vertices(unique).iter().map(
                move |member| UniqueVertexSnapshot {
                    unique_vertex: unique,
                    component: member.component,
                    vertex: member.vertex,
                },
            )
        })
        .collect();
    BRepSnapshot {
        corners: model
            .corners()
            .map(|corner| {
                (
                    corner.id(),
                    corner.name().to_string(),
                    snapshot_point_set(corner.mesh()),
                )
            })
            .collect(),
        lines: model
            .lines()
            .map(|line| {
                (
                    line.id(),
                    line.name().to_string(),
                    snapshot_curve(line.mesh()),
                )
            })
            .collect(),
        surfaces: model
            .surfaces()
            .map(|surface| {
                (
                    surface.id(),
                    surface.name().to_string(),
                    snapshot_surface(surface.mesh()),
                )
            })
            .collect(),
        blocks: model
            .blocks()
            .map(|block| {
                (
                    block.id(),
                    block.name().to_string(),
                    snapshot_solid(block.mesh()),
                )
            })
            .collect(),
        model_boundaries: model
            .model_boundaries()
            .map(|boundary| (boundary.id(), boundary.name().to_string()))
            .collect(),
        relations: model
            .relationships()
            .relation_entries()
            .map(|(from, to, kind)| RelationSnapshot { from, to, kind })
            .collect(),
        relation_attributes: snapshot_manager(
            model.relationships().relation_attribute_manager(),
        ),
        nb_unique_vertices: model.nb_unique_vertices(),
        unique_vertices,
    }
}

pub fn restore_brep(snapshot: &BRepSnapshot) -> Result<BRep, IoError> {
    let mut model = BRep::new();
    // Components keep their persisted uuids, so a mapping from the
    // snapshot ids is the identity.
    let mut mapping: FxHashMap<Uuid, Uuid> = FxHashMap::default();
    {
        let mut builder = BRepBuilder::new(&mut model);
        for (id, name, _) in &snapshot.corners {
            let created = builder.add_corner();
            builder.set_corner_name(&created, name.clone())?;
            mapping.insert(*id, created);
        }
        for (id, name, _) in &snapshot.lines {
            let created = builder.add_line();
            builder.set_line_name(&created, name.clone())?;
            mapping.insert(*id, created);
        }
        for (id, name, _) in &snapshot.surfaces {
            let created = builder.add_surface();
            builder.set_surface_name(&created, name.clone())?;
            mapping.insert(*id, created);
        }
        for (id, name, _) in &snapshot.blocks {
            let created = builder.add_block();
            builder.set_block_name(&created, name.clone())?;
            mapping.insert(*id, created);
        }
        for (id, name) in &snapshot.model_boundaries {
            let created = builder.add_model_boundary();
            builder.set_model_boundary_name(&created, name.clone())?;
            mapping.insert(*id, created);
        }
    }
    for (id, _, mesh) in &snapshot.corners {
        model
            .corners
            .get_mut(&mapping[id])?
            .replace_mesh(restore_point_set(mesh)?);
    }
    for (id, _, mesh) in &snapshot.lines {
        model
            .lines
            .get_mut(&mapping[id])?
            .replace_mesh(restore_curve(mesh)?);
    }
    for (id, _, mesh) in &snapshot.surfaces {
        model
            .surfaces
            .get_mut(&mapping[id])?
            .replace_mesh(restore_surface(mesh)?);
    }
    for (id, _, mesh) in &snapshot.blocks {
        model
            .blocks
            .get_mut(&mapping[id])?
            .replace_mesh(restore_solid(mesh)?);
    }
    for relation in &snapshot.relations {
        let from = mapping[&relation.from.id];
        let to = mapping[&relation.to.id];
        match relation.kind {
            RelationKind::Boundary => {
                model.relationships.add_boundary_relation(&from, &to)?
            }
            RelationKind::Internal => {
                model.relationships.add_internal_relation(&from, &to)?
            }
            RelationKind::Item => {
                model.relationships.add_item_in_collection(&from, &to)?
            }
            RelationKind::Generic => {
                model.relationships.add_generic_relation(&from, &to)?
            }
        };
    }
    restore_manager(
        &snapshot.relation_attributes,
        model.relationships.relation_attribute_manager_mut(),
    )?;
    {
        let mut builder = BRepBuilder::new(&mut model);
        for _ in 0..snapshot.nb_unique_vertices {
            builder.create_unique_vertex();
        }
    }
    for record in &snapshot.unique_vertices {
        let component = ComponentId::new(
            record.component.component_type,
            mapping[&record.component.id],
        );
        model.vertex_identifier.set_unique_vertex(
            ComponentMeshVertex::new(component, record.vertex),
            record.unique_vertex,
        )?;
    }
    Ok(model)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

pub fn read_json<T: for<'de> Deserialize<'de>>(
    path: &Path,
) -> Result<T, IoError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), IoError> {
    let file = File::create(path)?;
    serde_yaml::to_writer(file, value)?;
    Ok(())
}

pub fn read_yaml<T: for<'de> Deserialize<'de>>(
    path: &Path,
) -> Result<T, IoError> {
    let file = File::open(path)?;
    Ok(serde_yaml::from_reader(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;

    #[test]
    fn surface_snapshot_round_trip() {
        let mut mesh = SurfaceMesh::<3>::new();
        mesh.enable_edges();
        {
            let mut builder = SurfaceBuilder::new(&mut mesh);
            builder.create_point(Point3::new(0.0, 0.0, 0.0));
            builder.create_point(Point3::new(1.0, 0.0, 0.0));
            builder.create_point(Point3::new(0.0, 1.0, 0.0));
            builder.create_point(Point3::new(1.0, 1.0, 0.0));
            builder.create_polygon(&[0, 1, 2]).unwrap();
            builder.create_polygon(&[1, 3, 2]).unwrap();
            builder.compute_polygon_adjacencies();
        }
        let tag = mesh
            .edge_attribute_manager_mut()
            .find_or_create_attribute("tag", 0u32)
            .unwrap();
        for edge in 0..mesh.nb_edges() {
            tag.set_value(edge, edge + 5).unwrap();
        }
        let snapshot = snapshot_surface(&mesh);
        let restored: SurfaceMesh<3> = restore_surface(&snapshot).unwrap();
        assert_eq!(restored.nb_vertices(), 4);
        assert_eq!(restored.nb_polygons(), 2);
        assert_eq!(restored.nb_edges(), 5);
        assert_eq!(restored.point(3), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(
            restored.polygon_adjacent(PolygonEdge::new(0, 1)),
            Some(1)
        );
        let restored_tag = restored
            .edge_attribute_manager()
            .find_attribute::<u32>("tag")
            .unwrap();
        for edge in 0..restored.nb_edges() {
            assert_eq!(restored_tag.value(edge), edge + 5);
        }
    }

    #[test]
    fn solid_snapshot_round_trip() {
        let mut mesh = SolidMesh::new();
        {
            let mut builder = SolidBuilder::new(&mut mesh);
            builder.create_point(Point3::new(0.0, 0.0, 0.0));
            builder.create_point(Point3::new(1.0, 0.0, 0.0));
            builder.create_point(Point3::new(0.0, 1.0, 0.0));
            builder.create_point(Point3::new(0.0, 0.0, 1.0));
            builder.create_tetrahedron([0, 1, 2, 3]).unwrap();
        }
        let snapshot = snapshot_solid(&mesh);
        let restored = restore_solid(&snapshot).unwrap();
        assert_eq!(restored.nb_polyhedra(), 1);
        assert_eq!(
            restored.polyhedron_shape(0),
            PolyhedronShape::Tetrahedron
        );
        assert_eq!(restored.point(3), Point3::new(0.0, 0.0, 1.0));
    }
}
