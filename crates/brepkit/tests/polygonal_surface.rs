use brepkit::geometry::{Point3, Vector3};
use brepkit::mesh::{
    PolygonEdge, PolygonVertex, SurfaceBuilder, SurfaceMesh,
};

fn create_vertices(mesh: &mut SurfaceMesh<3>) {
    let mut builder = SurfaceBuilder::new(mesh);
    builder.create_point(Point3::new(0.1, 0.2, 0.3));
    builder.create_point(Point3::new(2.1, 9.4, 6.7));
    builder.create_point(Point3::new(7.5, 5.2, 6.3));
    builder.create_point(Point3::new(8.1, 1.4, 4.7));
    builder.create_point(Point3::new(4.7, 2.1, 1.3));
    builder.create_point(Point3::new(9.3, 5.3, 6.7));
    builder.create_point(Point3::new(7.5, 4.2, 2.8));
}

fn create_polygons(mesh: &mut SurfaceMesh<3>) {
    let mut builder = SurfaceBuilder::new(mesh);
    builder.create_polygon(&[0, 1, 2]).unwrap();
    builder.create_polygon(&[1, 3, 4, 2]).unwrap();
    builder.create_polygon(&[1, 5, 6, 3]).unwrap();
}

fn build() -> SurfaceMesh<3> {
    let mut mesh = SurfaceMesh::new();
    mesh.enable_edges();
    create_vertices(&mut mesh);
    assert!(mesh.is_vertex_isolated(0));
    assert_eq!(mesh.nb_vertices(), 7);
    create_polygons(&mut mesh);
    assert!(!mesh.is_vertex_isolated(0));
    assert_eq!(mesh.nb_polygons(), 3);
    assert_eq!(mesh.nb_edges(), 9);
    SurfaceBuilder::new(&mut mesh).compute_polygon_adjacencies();
    mesh
}

fn create_vertex_attribute(mesh: &mut SurfaceMesh<3>) {
    let attribute = mesh
        .vertex_attribute_manager_mut()
        .find_or_create_attribute("test", PolygonEdge::default())
        .unwrap();
    for vertex in 0..mesh.nb_vertices() {
        attribute
            .set_value(vertex, PolygonEdge::new(vertex, vertex as u8))
            .unwrap();
        assert_ne!(attribute.value(vertex), PolygonEdge::default());
    }
}

fn create_edge_attribute(mesh: &mut SurfaceMesh<3>) {
    let attribute = mesh
        .edge_attribute_manager_mut()
        .find_or_create_attribute("test", 0u32)
        .unwrap();
    for edge in 0..mesh.nb_edges() {
        attribute.set_value(edge, edge).unwrap();
    }
}

#[test]
fn bounding_box() {
    let mut mesh = SurfaceMesh::new();
    create_vertices(&mut mesh);
    let bbox = mesh.bounding_box();
    assert_eq!(bbox.min(), &Point3::new(0.1, 0.2, 0.3));
    assert_eq!(bbox.max(), &Point3::new(9.3, 9.4, 6.7));
}

#[test]
fn polygon_adjacencies() {
    let mesh = build();
    assert_eq!(mesh.polygon_adjacent(PolygonEdge::new(0, 0)), None);
    assert_eq!(mesh.polygon_adjacent(PolygonEdge::new(0, 1)), Some(1));
    assert_eq!(mesh.polygon_adjacent(PolygonEdge::new(1, 3)), Some(0));
    assert_eq!(
        mesh.polygon_adjacent_edge(PolygonEdge::new(0, 1)),
        Some(PolygonEdge::new(1, 3))
    );
    assert_eq!(
        mesh.polygon_edge(PolygonEdge::new(0, 1)),
        mesh.polygon_edge(PolygonEdge::new(1, 3))
    );
    assert_eq!(mesh.polygon_adjacent(PolygonEdge::new(2, 0)), None);
    assert_eq!(mesh.polygon_adjacent(PolygonEdge::new(2, 3)), Some(1));
    assert_eq!(mesh.polygons_around_vertex(1).len(), 3);
}

#[test]
fn polygon_edges_on_border() {
    let mesh = build();
    let border = mesh.polygon_edges_on_border(0);
    assert_eq!(border.len(), 2);
    assert!(border.contains(&PolygonEdge::new(0, 0)));
    assert!(border.contains(&PolygonEdge::new(0, 2)));
}

#[test]
fn previous_next_on_border() {
    let mesh = build();
    assert_eq!(
        mesh.previous_on_border(PolygonEdge::new(0, 0)),
        PolygonEdge::new(0, 2)
    );
    assert_eq!(
        mesh.next_on_border(PolygonEdge::new(0, 0)),
        PolygonEdge::new(2, 0)
    );
}

#[test]
fn polygon_edge_requests() {
    let mesh = build();
    let expected_length: f64 =
        (2.0f64 * 2.0 + 9.2 * 9.2 + 6.4 * 6.4).sqrt();
    assert_eq!(mesh.edge_length(0), expected_length);
    assert_eq!(mesh.edge_barycenter(0), Point3::new(1.1, 4.8, 3.5));
    assert_eq!(
        mesh.polygon_edge_vertex(PolygonEdge::new(0, 0), 1),
        1
    );
    assert_eq!(mesh.polygon_edge_from_vertices(3, 5), None);
    assert_eq!(
        mesh.polygon_edge_from_vertices(0, 1),
        Some(PolygonEdge::new(0, 0))
    );
    assert_eq!(mesh.polygon_edge_from_vertices(1, 0), None);
}

#[test]
fn polygon_barycenter() {
    let mesh = build();
    assert_eq!(
        mesh.polygon_barycenter(1),
        Point3::new(5.6, 4.525, 4.75)
    );
}

#[test]
fn polygon_area_2d() {
    let mut mesh = SurfaceMesh::<2>::new();
    let mut builder = SurfaceBuilder::new(&mut mesh);
    builder.create_point(brepkit::geometry::Point2::new(0.0, 0.0));
    builder.create_point(brepkit::geometry::Point2::new(6.0, 0.0));
    builder.create_point(brepkit::geometry::Point2::new(8.0, 4.0));
    builder.create_point(brepkit::geometry::Point2::new(0.0, 4.0));
    builder.create_polygon(&[0, 1, 2, 3]).unwrap();
    assert_eq!(mesh.polygon_area(0), 28.0);
}

#[test]
fn polygon_normal() {
    let mut mesh = SurfaceMesh::<3>::new();
    let mut builder = SurfaceBuilder::new(&mut mesh);
    builder.create_point(Point3::new(0.0, 0.0, 0.0));
    builder.create_point(Point3::new(6.0, 0.0, 0.0));
    builder.create_point(Point3::new(8.0, 4.0, 0.0));
    builder.create_point(Point3::new(0.0, 4.0, 0.0));
    builder.create_polygon(&[0, 1, 2, 3]).unwrap();
    assert_eq!(mesh.polygon_normal(0), Some(Vector3::new(0.0, 0.0, 1.0)));
}

#[test]
fn polygon_vertex_normal() {
    let mut mesh = SurfaceMesh::<3>::new();
    let mut builder = SurfaceBuilder::new(&mut mesh);
    builder.create_point(Point3::new(0.0, 0.0, 0.0));
    builder.create_point(Point3::new(1.0, 0.0, 0.0));
    builder.create_point(Point3::new(0.0, 1.0, 1.0));
    builder.create_point(Point3::new(0.0, -1.0, 1.0));
    builder.create_polygon(&[0, 1, 2]).unwrap();
    builder.create_polygon(&[0, 3, 1]).unwrap();
    builder.compute_polygon_adjacencies();
    assert_eq!(
        mesh.polygon_vertex_normal(0),
        Some(Vector3::new(0.0, 0.0, 1.0))
    );
}

#[test]
fn replace_vertex_round_trip() {
    let mut mesh = build();
    let new_id = SurfaceBuilder::new(&mut mesh).create_vertex();
    let corners = mesh.polygons_around_vertex(1);
    SurfaceBuilder::new(&mut mesh).replace_vertex(1, new_id).unwrap();
    for corner in &corners {
        assert_eq!(mesh.polygon_vertex(*corner), new_id);
    }
    assert!(mesh.is_vertex_isolated(1));
    SurfaceBuilder::new(&mut mesh).replace_vertex(new_id, 1).unwrap();
    for corner in &corners {
        assert_eq!(mesh.polygon_vertex(*corner), 1);
    }
    SurfaceBuilder::new(&mut mesh)
        .delete_isolated_vertices()
        .unwrap();
    assert_eq!(mesh.nb_vertices(), new_id);
}

/// The full editing sequence: attributes stay bound to their rows across
/// vertex and polygon deletions, and the edge table prunes itself.
#[test]
fn edit_sequence() {
    let mut mesh = build();
    create_vertex_attribute(&mut mesh);
    create_edge_attribute(&mut mesh);

    // Delete vertex 0: its triangle goes away, two edges with it.
    let mut to_delete = vec![false; mesh.nb_vertices() as usize];
    to_delete[0] = true;
    SurfaceBuilder::new(&mut mesh)
        .delete_vertices(&to_delete)
        .unwrap();
    assert_eq!(mesh.nb_vertices(), 6);
    assert_eq!(mesh.point(0), Point3::new(2.1, 9.4, 6.7));
    assert_eq!(mesh.nb_polygons(), 2);
    assert_eq!(mesh.polygon_adjacent(PolygonEdge::new(1, 3)), Some(0));
    assert_eq!(mesh.nb_edges(), 7);
    let edge_attribute = mesh
        .edge_attribute_manager()
        .find_attribute::<u32>("test")
        .unwrap();
    assert_eq!(edge_attribute.value(4), 6);
    assert_eq!(edge_attribute.value(5), 7);
    assert_eq!(edge_attribute.value(6), 8);
    assert_eq!(mesh.polygon_edge(PolygonEdge::new(1, 0)), 4);
    assert_eq!(mesh.polygon_edge(PolygonEdge::new(1, 3)), 1);

    // Delete the quad: the edge count drops to the last polygon's edges.
    SurfaceBuilder::new(&mut mesh)
        .delete_polygons(&[true, false])
        .unwrap();
    assert_eq!(mesh.nb_polygons(), 1);
    assert_eq!(
        mesh.polygon_vertices(0),
        &[0, 4, 5, 2]
    );
    assert_eq!(mesh.nb_edges(), 4);
    assert!(!mesh.is_edge_isolated(0));
    assert_eq!(edge_attribute.value(1), 6);
    assert_eq!(edge_attribute.value(2), 7);
    assert_eq!(edge_attribute.value(3), 8);
    assert_eq!(mesh.polygon_edge(PolygonEdge::new(0, 0)), 1);
    assert_eq!(mesh.polygon_edge(PolygonEdge::new(0, 3)), 0);

    // Clone: counts and attribute rows carry over.
    let clone = mesh.clone();
    assert_eq!(clone.nb_vertices(), 6);
    assert_eq!(clone.nb_edges(), 4);
    assert_eq!(clone.nb_polygons(), 1);
    let cloned_attribute = clone
        .vertex_attribute_manager()
        .find_attribute::<PolygonEdge>("test")
        .unwrap();
    for vertex in 0..clone.nb_vertices() {
        let expected = PolygonEdge::new(vertex + 1, (vertex + 1) as u8);
        assert_ne!(cloned_attribute.value(vertex), PolygonEdge::default());
        assert_eq!(cloned_attribute.value(vertex), expected);
    }

    // Rebind one polygon corner; stale edges wait for explicit cleanup.
    SurfaceBuilder::new(&mut mesh)
        .set_polygon_vertex(PolygonVertex::new(0, 2), 1)
        .unwrap();
    SurfaceBuilder::new(&mut mesh).delete_isolated_edges().unwrap();
    assert_eq!(mesh.polygon_vertex(PolygonVertex::new(0, 2)), 1);
    assert_eq!(mesh.nb_edges(), 4);
    assert_eq!(mesh.edge_vertices(2), [1, 2]);
    assert_eq!(mesh.edge_vertices(3), [1, 4]);

    // Delete everything.
    let nb_polygons = mesh.nb_polygons() as usize;
    SurfaceBuilder::new(&mut mesh)
        .delete_polygons(&vec![true; nb_polygons])
        .unwrap();
    assert_eq!(mesh.nb_vertices(), 6);
    assert_eq!(mesh.nb_edges(), 0);
    assert_eq!(mesh.nb_polygons(), 0);
    assert!(mesh.polygons_around_vertex(0).is_empty());
    SurfaceBuilder::new(&mut mesh)
        .delete_isolated_vertices()
        .unwrap();
    assert_eq!(mesh.nb_vertices(), 0);
}
