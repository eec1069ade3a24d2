//! VTK export of surfaces and solids, as XML unstructured grids.

use std::path::Path;

use vtkio::model::*;

use crate::mesh::{PolyhedronShape, SolidMesh, SurfaceMesh};

type IoError = Box<dyn std::error::Error>;

fn surface_cell_type(arity: usize) -> CellType {
    match arity {
        3 => CellType::Triangle,
        4 => CellType::Quad,
        _ => CellType::Polygon,
    }
}

fn solid_cell_type(shape: PolyhedronShape) -> CellType {
    match shape {
        PolyhedronShape::Tetrahedron => CellType::Tetra,
        PolyhedronShape::Pyramid => CellType::Pyramid,
        PolyhedronShape::Prism => CellType::Wedge,
        PolyhedronShape::Hexahedron => CellType::Hexahedron,
        PolyhedronShape::General => CellType::Polyhedron,
    }
}

pub fn write_surface(
    path: &Path,
    mesh: &SurfaceMesh<3>,
) -> Result<(), IoError> {
    let coords: Vec<f64> = (0..mesh.nb_vertices())
        .flat_map(|vertex| {
            let point = mesh.point(vertex);
            [point[0], point[1], point[2]]
        })
        .collect();
    let connectivity: Vec<u64> = (0..mesh.nb_polygons())
        .flat_map(|polygon| {
            mesh.polygon_vertices(polygon)
                .iter()
                .map(|&vertex| u64::from(vertex))
                .collect::<Vec<_>>()
        })
        .collect();
    let offsets: Vec<u64> = (0..mesh.nb_polygons())
        .scan(0u64, |state, polygon| {
            *state += u64::from(mesh.nb_polygon_vertices(polygon));
            Some(*state)
        })
        .collect();
    let types: Vec<CellType> = (0..mesh.nb_polygons())
        .map(|polygon| {
            surface_cell_type(mesh.nb_polygon_vertices(polygon) as usize)
        })
        .collect();
    let vtk = Vtk {
        version: Version::XML { major: 1, minor: 0 },
        byte_order: ByteOrder::BigEndian,
        title: String::from("brepkit surface"),
        file_path: Some(path.into()),
        data: DataSet::inline(UnstructuredGridPiece {
            points: coords.into(),
            cells: Cells {
                cell_verts: VertexNumbers::XML {
                    connectivity,
                    offsets,
                },
                types,
            },
            data: Attributes::new(),
        }),
    };
    Ok(vtk.export(path)?)
}

pub fn write_solid(path: &Path, mesh: &SolidMesh) -> Result<(), IoError> {
    let coords: Vec<f64> = (0..mesh.nb_vertices())
        .flat_map(|vertex| {
            let point = mesh.point(vertex);
            [point[0], point[1], point[2]]
        })
        .collect();
    let connectivity: Vec<u64> = (0..mesh.nb_polyhedra())
        .flat_map(|polyhedron| {
            mesh.polyhedron_vertices(polyhedron)
                .iter()
                .map(|&vertex| u64::from(vertex))
                .collect::<Vec<_>>()
        })
        .collect();
    let offsets: Vec<u64> = (0..mesh.nb_polyhedra())
        .scan(0u64, |state, polyhedron| {
            *state += u64::from(mesh.nb_polyhedron_vertices(polyhedron));
            Some(*state)
        })
        .collect();
    let types: Vec<CellType> = (0..mesh.nb_polyhedra())
        .map(|polyhedron| solid_cell_type(mesh.polyhedron_shape(polyhedron)))
        .collect();
    let vtk = Vtk {
        version: Version::XML { major: 1, minor: 0 },
        byte_order: ByteOrder::BigEndian,
        title: String::from("brepkit solid"),
        file_path: Some(path.into()),
        data: DataSet::inline(UnstructuredGridPiece {
            points: coords.into(),
            cells: Cells {
                cell_verts: VertexNumbers::XML {
                    connectivity,
                    offsets,
                },
                types,
            },
            data: Attributes::new(),
        }),
    };
    Ok(vtk.export(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point3;
    use crate::mesh::{SolidBuilder, SurfaceBuilder};
    use std::path::PathBuf;

    #[test]
    fn surface_export_writes_a_file() {
        let mut mesh = SurfaceMesh::<3>::new();
        {
            let mut builder = SurfaceBuilder::new(&mut mesh);
            builder.create_point(Point3::new(0.0, 0.0, 0.0));
            builder.create_point(Point3::new(1.0, 0.0, 0.0));
            builder.create_point(Point3::new(0.0, 1.0, 0.0));
            builder.create_polygon(&[0, 1, 2]).unwrap();
        }
        let path = PathBuf::from("surface_export_test.vtu");
        assert!(write_surface(&path, &mesh).is_ok());
        std::fs::remove_file(path).unwrap(); // Clean up the test file
    }

    #[test]
    fn solid_export_writes_a_file() {
        let mut mesh = SolidMesh::new();
        {
            let mut builder = SolidBuilder::new(&mut mesh);
            builder.create_point(Point3::new(0.0, 0.0, 0.0));
            builder.create_point(Point3::new(1.0, 0.0, 0.0));
            builder.create_point(Point3::new(0.0, 1.0, 0.0));
            builder.create_point(Point3::new(0.0, 0.0, 1.0));
            builder.create_tetrahedron([0, 1, 2, 3]).unwrap();
        }
        let path = PathBuf::from("solid_export_test.vtu");
        assert!(write_solid(&path, &mesh).is_ok());
        std::fs::remove_file(path).unwrap(); // Clean up the test file
    }
}
