//! Merging several solid meshes into one.
//!
//! Vertices are welded spatially within a tolerance, polyhedra are
//! deduplicated by vertex multiset, and polyhedra degenerated by the
//! welding (a vertex repeated inside one polyhedron) are dropped.
//! Adjacencies are recomputed over the union, so facets shared across the
//! input parts are paired; unshared facets stay on border. Transferable
//! vertex and polyhedron attributes are imported into the result.

use itertools::Itertools;
use log::debug;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use rustc_hash::FxHashMap;

use crate::error::MeshError;
use crate::mesh::{PolyhedronShape, SolidBuilder, SolidMesh};

pub struct SolidMerger<'a> {
    meshes: Vec<&'a SolidMesh>,
    tolerance: f64,
}

impl<'a> SolidMerger<'a> {
    pub fn new(meshes: Vec<&'a SolidMesh>, tolerance: f64) -> Self {
        Self { meshes, tolerance }
    }

    pub fn merge(&self) -> Result<SolidMesh, MeshError> {
        let vertex_mapping = self.weld_vertices();
        let mut merged = SolidMesh::new();
        self.create_vertices(&mut merged, &vertex_mapping)?;
        self.create_polyhedra(&mut merged, &vertex_mapping)?;
        SolidBuilder::new(&mut merged).compute_polyhedron_adjacencies();
        debug!(
            "merged {} solids into {} vertices, {} polyhedra",
            self.meshes.len(),
            merged.nb_vertices(),
            merged.nb_polyhedra()
        );
        Ok(merged)
    }

    /// One entry per input mesh: old vertex -> merged vertex.
    fn weld_vertices(&self) -> Vec<Vec<u32>> {
        let mut offsets = vec![0usize];
        for mesh in &self.meshes {
            offsets.push(
                offsets.last().unwrap() + mesh.nb_vertices() as usize,
            );
        }
        let total = *offsets.last().unwrap();
        let points: Vec<GeomWithData<[f64; 3], usize>> = self
            .meshes
            .iter()
            .enumerate()
            .flat_map(|(part, mesh)| {
                let offset = offsets[part];
                (0..mesh.nb_vertices()).map(move |vertex| {
                    let point = mesh.point(vertex);
                    GeomWithData::new(
                        [point[0], point[1], point[2]],
                        offset + vertex as usize,
                    )
                })
            })
            .collect();
        let mut tree = RTree::bulk_load(points.clone());
        // Groups of welded global ids, representative first.
        let mut representative = vec![usize::MAX; total];
        for point in &points {
            let global = point.data;
            if representative[global] != usize::MAX {
                continue;
            }
            let group: Vec<usize> = tree
                .drain_within_distance(
                    *point.geom(),
                    self.tolerance * self.tolerance,
                )
                .map(|neighbor| neighbor.data)
                .sorted_unstable()
                .collect();
            if group.is_empty() {
                // Already drained through an earlier representative.
                continue;
            }
            let leader = group[0];
            for member in group {
                representative[member] = leader;
            }
        }
        // Compact representatives into merged vertex ids, in global order.
        let mut merged_id: FxHashMap<usize, u32> = FxHashMap::default();
        for global in 0..total {
            let leader = representative[global];
            let next = merged_id.len() as u32;
            merged_id.entry(leader).or_insert(next);
        }
        self.meshes
            .iter()
            .enumerate()
            .map(|(part, mesh)| {
                (0..mesh.nb_vertices() as usize)
                    .map(|vertex| {
                        merged_id[&representative[offsets[part] + vertex]]
                    })
                    .collect()
            })
            .collect()
    }

    fn create_vertices(
        &self,
        merged: &mut SolidMesh,
        vertex_mapping: &[Vec<u32>],
    ) -> Result<(), MeshError> {
        let nb_merged = vertex_mapping
            .iter()
            .flat_map(|mapping| mapping.iter().copied())
            .max()
            .map_or(0, |max| max + 1);
        {
            let mut builder = SolidBuilder::new(merged);
            for _ in 0..nb_merged {
                builder.create_vertex();
            }
        }
        // Last writer wins inside a welded group; coordinates agree within
        // the tolerance anyway.
        for (part, mesh) in self.meshes.iter().enumerate() {
            let mut builder = SolidBuilder::new(merged);
            for vertex in 0..mesh.nb_vertices() {
                builder.set_point(
                    vertex_mapping[part][vertex as usize],
                    mesh.point(vertex),
                )?;
            }
        }
        for (part, mesh) in self.meshes.iter().enumerate() {
            let pairs: Vec<(u32, u32)> = (0..mesh.nb_vertices())
                .map(|vertex| {
                    (vertex, vertex_mapping[part][vertex as usize])
                })
                .collect();
            merged
                .vertex_attribute_manager_mut()
                .import_from(mesh.vertex_attribute_manager(), &pairs)?;
        }
        Ok(())
    }

    fn create_polyhedra(
        &self,
        merged: &mut SolidMesh,
        vertex_mapping: &[Vec<u32>],
    ) -> Result<(), MeshError> {
        let mut seen: FxHashMap<Vec<u32>, u32> = FxHashMap::default();
        let mut imports: Vec<Vec<(u32, u32)>> =
            vec![Vec::new(); self.meshes.len()];
        for (part, mesh) in self.meshes.iter().enumerate() {
            for polyhedron in 0..mesh.nb_polyhedra() {
                let vertices: Vec<u32> = mesh
                    .polyhedron_vertices(polyhedron)
                    .iter()
                    .map(|&vertex| {
                        vertex_mapping[part][vertex as usize]
                    })
                    .collect();
                if vertices.iter().duplicates().next().is_some() {
                    debug!(
                        "dropping degenerate polyhedron {polyhedron} of part {part}"
                    );
                    continue;
                }
                let key: Vec<u32> =
                    vertices.iter().copied().sorted_unstable().collect();
                if let Some(&existing) = seen.get(&key) {
                    imports[part].push((polyhedron, existing));
                    continue;
                }
                let mut builder = SolidBuilder::new(merged);
                let created = match mesh.polyhedron_shape(polyhedron) {
                    PolyhedronShape::Tetrahedron => builder
                        .create_tetrahedron(
                            vertices.as_slice().try_into().expect("4 vertices"),
                        )?,
                    PolyhedronShape::Pyramid => builder.create_pyramid(
                        vertices.as_slice().try_into().expect("5 vertices"),
                    )?,
                    PolyhedronShape::Prism => builder.create_prism(
                        vertices.as_slice().try_into().expect("6 vertices"),
                    )?,
                    PolyhedronShape::Hexahedron => builder
                        .create_hexahedron(
                            vertices.as_slice().try_into().expect("8 vertices"),
                        )?,
                    PolyhedronShape::General => {
                        let facets: Vec<Vec<u8>> = (0..mesh
                            .nb_polyhedron_facets(polyhedron)
                            as u8)
                            .map(|facet| {
                                mesh.facet_locals(
                                    crate::mesh::PolyhedronFacet::new(
                                        polyhedron, facet,
                                    ),
                                )
                                .to_vec()
                            })
                            .collect();
                        builder.create_polyhedron(&vertices, &facets)?
                    }
                };
                seen.insert(key, created);
                imports[part].push((polyhedron, created));
            }
        }
        for (part, mesh) in self.meshes.iter().enumerate() {
            merged
                .polyhedron_attribute_manager_mut()
                .import_from(
                    mesh.polyhedron_attribute_manager(),
                    &imports[part],
                )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;
    use crate::mesh::PolyhedronFacet;

    fn unit_tetra(offset: f64) -> SolidMesh {
        let mut mesh = SolidMesh::new();
        let mut builder = SolidBuilder::new(&mut mesh);
        builder.create_point(Point3::new(offset, 0.0, 0.0));
        builder.create_point(Point3::new(offset + 1.0, 0.0, 0.0));
        builder.create_point(Point3::new(offset, 1.0, 0.0));
        builder.create_point(Point3::new(offset, 0.0, 1.0));
        builder.create_tetrahedron([0, 1, 2, 3]).unwrap();
        mesh
    }

    #[test]
    fn welding_fuses_coincident_vertices() {
        // Two tetrahedra sharing the facet x = 1... sharing vertices
        // within tolerance on their common face.
        let first = unit_tetra(0.0);
        let mut second = SolidMesh::new();
        {
            let mut builder = SolidBuilder::new(&mut second);
            builder.create_point(Point3::new(1.0, 0.0, 0.0));
            builder.create_point(Point3::new(0.0, 1.0, 0.0));
            builder.create_point(Point3::new(0.0, 0.0, 1.0));
            builder.create_point(Point3::new(1.0, 1.0, 1.0));
            builder.create_tetrahedron([0, 1, 2, 3]).unwrap();
        }
        let merged = SolidMerger::new(vec![&first, &second], 1e-6)
            .merge()
            .unwrap();
        assert_eq!(merged.nb_vertices(), 5);
        assert_eq!(merged.nb_polyhedra(), 2);
        // The shared facet pairs the two tetrahedra.
        let border0 = merged.polyhedron_facets_on_border(0).len();
        let border1 = merged.polyhedron_facets_on_border(1).len();
        assert_eq!(border0, 3);
        assert_eq!(border1, 3);
        assert!(
            (0..4u8).any(|facet| merged
                .polyhedron_adjacent(PolyhedronFacet::new(0, facet))
                == Some(1))
        );
    }

    #[test]
    fn duplicate_polyhedra_collapse() {
        let first = unit_tetra(0.0);
        let second = unit_tetra(0.0);
        let merged = SolidMerger::new(vec![&first, &second], 1e-6)
            .merge()
            .unwrap();
        assert_eq!(merged.nb_vertices(), 4);
        assert_eq!(merged.nb_polyhedra(), 1);
    }

    #[test]
    fn degenerate_polyhedra_are_dropped() {
        // A flat, tiny tetrahedron collapses onto one vertex of the first.
        let first = unit_tetra(0.0);
        let mut second = SolidMesh::new();
        {
            let mut builder = SolidBuilder::new(&mut second);
            builder.create_point(Point3::new(0.0, 0.0, 0.0));
            builder.create_point(Point3::new(1e-9, 0.0, 0.0));
            builder.create_point(Point3::new(0.0, 1e-9, 0.0));
            builder.create_point(Point3::new(5.0, 5.0, 5.0));
            builder.create_tetrahedron([0, 1, 2, 3]).unwrap();
        }
        let merged = SolidMerger::new(vec![&first, &second], 1e-6)
            .merge()
            .unwrap();
        assert_eq!(merged.nb_polyhedra(), 1);
        // The far vertex survives, welded vertices collapse to one.
        assert_eq!(merged.nb_vertices(), 5);
    }

    #[test]
    fn attributes_survive_the_merge() {
        let mut first = unit_tetra(0.0);
        let tag = first
            .polyhedron_attribute_manager_mut()
            .find_or_create_attribute("tag", 0u32)
            .unwrap();
        tag.set_value(0, 7).unwrap();
        let second = unit_tetra(10.0);
        let merged = SolidMerger::new(vec![&first, &second], 1e-6)
            .merge()
            .unwrap();
        assert_eq!(merged.nb_polyhedra(), 2);
        let merged_tag = merged
            .polyhedron_attribute_manager()
            .find_attribute::<u32>("tag")
            .unwrap();
        assert_eq!(merged_tag.value(0), 7);
        assert_eq!(merged_tag.value(1), 0);
    }
}
