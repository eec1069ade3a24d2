//! Converts two overlapping grids into hexahedral solids and merges them.

use brepkit::geometry::Point3;
use brepkit::mesh::RegularGrid;
use brepkit::tools::{SolidMerger, grid_to_solid};

fn main() {
    let left = RegularGrid::new(
        Point3::new(0.0, 0.0, 0.0),
        [2, 2, 2],
        [1.0, 1.0, 1.0],
    );
    // Shares the x = 2 face with the first grid.
    let right = RegularGrid::new(
        Point3::new(2.0, 0.0, 0.0),
        [2, 2, 2],
        [1.0, 1.0, 1.0],
    );
    let first = grid_to_solid(&left).unwrap();
    let second = grid_to_solid(&right).unwrap();
    println!(
        "inputs: {} + {} vertices",
        first.nb_vertices(),
        second.nb_vertices()
    );
    let merged = SolidMerger::new(vec![&first, &second], 1e-9)
        .merge()
        .unwrap();
    println!(
        "merged: {} vertices, {} polyhedra",
        merged.nb_vertices(),
        merged.nb_polyhedra()
    );
    let on_border = (0..merged.nb_polyhedra())
        .filter(|&polyhedron| merged.is_polyhedron_on_border(polyhedron))
        .count();
    println!("{on_border} polyhedra touch the border");
}
