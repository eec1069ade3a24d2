//! Conversions between mesh kinds.
//!
//! These are thin compositions of the builders that exercise the
//! attribute-transfer contracts: a structured grid explodes into an
//! unstructured mesh with its cell attributes imported, and a surface
//! border extracts into an edged curve.

use rustc_hash::FxHashMap;

use crate::error::MeshError;
use crate::mesh::{
    EdgedCurve, EdgedCurveBuilder, RegularGrid, SolidBuilder, SolidMesh,
    SurfaceBuilder, SurfaceMesh,
};

/// Quad surface with one polygon per grid cell, adjacencies computed.
pub fn grid_to_surface(grid: &RegularGrid<2>) -> Result<SurfaceMesh<2>, MeshError> {
    let mut surface = SurfaceMesh::new();
    let mut builder = SurfaceBuilder::new(&mut surface);
    for index in 0..grid.nb_grid_vertices() {
        builder.create_point(grid.grid_point(grid.vertex_indices(index)));
    }
    let mut pairs = Vec::with_capacity(grid.nb_cells() as usize);
    for cell in 0..grid.nb_cells() {
        let indices = grid.cell_indices(cell);
        // Corners 0, 1, 3, 2 wind the quad counterclockwise.
        let quad = [
            grid.vertex_index(grid.cell_vertex_indices(indices, 0)),
            grid.vertex_index(grid.cell_vertex_indices(indices, 1)),
            grid.vertex_index(grid.cell_vertex_indices(indices, 3)),
            grid.vertex_index(grid.cell_vertex_indices(indices, 2)),
        ];
        let polygon = builder.create_polygon(&quad)?;
        pairs.push((cell, polygon));
    }
    builder.compute_polygon_adjacencies();
    surface
        .polygon_attribute_manager_mut()
        .import_from(grid.cell_attribute_manager(), &pairs)?;
    Ok(surface)
}

/// Hexahedral solid with one polyhedron per grid cell, adjacencies
/// computed.
pub fn grid_to_solid(grid: &RegularGrid<3>) -> Result<SolidMesh, MeshError> {
    let mut solid = SolidMesh::new();
    let mut builder = SolidBuilder::new(&mut solid);
    for index in 0..grid.nb_grid_vertices() {
        builder.create_point(grid.grid_point(grid.vertex_indices(index)));
    }
    let mut pairs = Vec::with_capacity(grid.nb_cells() as usize);
    for cell in 0..grid.nb_cells() {
        let indices = grid.cell_indices(cell);
        let corner = |bits: u32| {
            grid.vertex_index(grid.cell_vertex_indices(indices, bits))
        };
        // Bottom quad counterclockwise, then the aligned top quad.
        let hexahedron = [
            corner(0),
            corner(1),
            corner(3),
            corner(2),
            corner(4),
            corner(5),
            corner(7),
            corner(6),
        ];
        let polyhedron = builder.create_hexahedron(hexahedron)?;
        pairs.push((cell, polyhedron));
    }
    builder.compute_polyhedron_adjacencies();
    solid
        .polyhedron_attribute_manager_mut()
        .import_from(grid.cell_attribute_manager(), &pairs)?;
    Ok(solid)
}

/// Extracts the border edges of a surface into an edged curve.
pub fn surface_border_to_curve<const D: usize>(
    surface: &SurfaceMesh<D>,
) -> Result<EdgedCurve<D>, MeshError> {
    let mut curve = EdgedCurve::new();
    let mut builder = EdgedCurveBuilder::new(&mut curve);
    let mut vertex_of: FxHashMap<u32, u32> = FxHashMap::default();
    for polygon in 0..surface.nb_polygons() {
        for edge in surface.polygon_edges_on_border(polygon) {
            let [from, to] = surface.polygon_edge_vertices(edge);
            let mut curve_vertex = |vertex: u32,
                                    builder: &mut EdgedCurveBuilder<D>|
             -> u32 {
                *vertex_of.entry(vertex).or_insert_with(|| {
                    builder.create_point(surface.point(vertex))
                })
            };
            let curve_from = curve_vertex(from, &mut builder);
            let curve_to = curve_vertex(to, &mut builder);
            builder.create_edge(curve_from, curve_to)?;
        }
    }
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point2, Point3};
    use crate::mesh::{PolygonEdge, PolyhedronFacet};

    #[test]
    fn grid_to_surface_topology() {
        let mut grid =
            RegularGrid::new(Point2::new(0.0, 0.0), [3, 2], [1.0, 1.0]);
        let values = grid
            .cell_attribute_manager_mut()
            .find_or_create_attribute("value", 0.0f64)
            .unwrap();
        for cell in 0..6 {
            values.set_value(cell, f64::from(cell)).unwrap();
        }
        let surface = grid_to_surface(&grid).unwrap();
        assert_eq!(surface.nb_vertices(), 12);
        assert_eq!(surface.nb_polygons(), 6);
        // Interior edge between cells 0 and 1.
        assert_eq!(
            surface.polygon_adjacent(PolygonEdge::new(0, 1)),
            Some(1)
        );
        assert!(surface.is_edge_on_border(PolygonEdge::new(0, 0)));
        assert_eq!(surface.polygon_area(0), 1.0);
        let imported = surface
            .polygon_attribute_manager()
            .find_attribute::<f64>("value")
            .unwrap();
        assert_eq!(imported.value(4), 4.0);
    }

    #[test]
    fn grid_to_solid_topology() {
        let grid = RegularGrid::new(
            Point3::new(0.0, 0.0, 0.0),
            [2, 2, 2],
            [1.0, 1.0, 1.0],
        );
        let solid = grid_to_solid(&grid).unwrap();
        assert_eq!(solid.nb_vertices(), 27);
        assert_eq!(solid.nb_polyhedra(), 8);
        // Every cell volume is one.
        for polyhedron in 0..8 {
            assert!((solid.polyhedron_volume(polyhedron) - 1.0).abs() < 1e-12);
        }
        // Cell 0 touches its three axis neighbors.
        let neighbors: Vec<Option<u32>> = (0..6u8)
            .map(|facet| {
                solid.polyhedron_adjacent(PolyhedronFacet::new(0, facet))
            })
            .collect();
        assert_eq!(
            neighbors.iter().filter(|n| n.is_some()).count(),
            3
        );
        assert!(neighbors.contains(&Some(1)));
        assert!(neighbors.contains(&Some(2)));
        assert!(neighbors.contains(&Some(4)));
    }

    #[test]
    fn border_extraction() {
        let mut grid =
            RegularGrid::new(Point2::new(0.0, 0.0), [2, 2], [1.0, 1.0]);
        let surface = grid_to_surface(&mut grid).unwrap();
        let curve = surface_border_to_curve(&surface).unwrap();
        assert_eq!(curve.nb_edges(), 8);
        assert_eq!(curve.nb_vertices(), 8);
    }
}
