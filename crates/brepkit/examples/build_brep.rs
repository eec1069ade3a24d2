//! Builds a minimal B-Rep (two corners joined by a line), welds the
//! meshes through unique vertices and prints the relationship ranges.

use brepkit::geometry::Point3;
use brepkit::model::{BRep, BRepBuilder, ComponentMeshVertex};

fn main() {
    let mut model = BRep::new();
    let mut builder = BRepBuilder::new(&mut model);

    let start = builder.add_corner();
    let end = builder.add_corner();
    let line = builder.add_line();
    builder.set_corner_name(&start, "start").unwrap();
    builder.set_corner_name(&end, "end").unwrap();
    builder.set_line_name(&line, "axis").unwrap();

    builder
        .corner_mesh_builder(&start)
        .unwrap()
        .create_point(Point3::new(0.0, 0.0, 0.0));
    builder
        .corner_mesh_builder(&end)
        .unwrap()
        .create_point(Point3::new(1.0, 0.0, 0.0));
    {
        let mut line_mesh = builder.line_mesh_builder(&line).unwrap();
        line_mesh.create_point(Point3::new(0.0, 0.0, 0.0));
        line_mesh.create_point(Point3::new(1.0, 0.0, 0.0));
        line_mesh.create_edge(0, 1).unwrap();
    }

    builder
        .add_corner_line_boundary_relationship(&start, &line)
        .unwrap();
    builder
        .add_corner_line_boundary_relationship(&end, &line)
        .unwrap();

    let start_component = model.corner(&start).unwrap().component_id();
    let line_component = model.line(&line).unwrap().component_id();
    let mut builder = BRepBuilder::new(&mut model);
    let unique = builder.create_unique_vertex();
    builder
        .set_unique_vertex(ComponentMeshVertex::new(start_component, 0), unique)
        .unwrap();
    builder
        .set_unique_vertex(ComponentMeshVertex::new(line_component, 0), unique)
        .unwrap();

    println!(
        "model: {} corners, {} lines ({} relations)",
        model.nb_corners(),
        model.nb_lines(),
        model.relationships().nb_relations()
    );
    for boundary in model.boundaries(&line) {
        println!("boundary of axis: {boundary}");
    }
    println!(
        "unique vertex {unique} welds {} mesh vertices",
        model.component_mesh_vertices(unique).len()
    );
}
