use brepkit::geometry::Point3;
use brepkit::mesh::{
    PolyhedronFacet, PolyhedronShape, PolyhedronVertex, SolidBuilder,
    SolidMesh,
};

fn create_vertices(mesh: &mut SolidMesh) {
    let mut builder = SolidBuilder::new(mesh);
    builder.create_point(Point3::new(0.0, 0.0, 0.0));
    builder.create_point(Point3::new(1.0, 0.0, 0.0));
    builder.create_point(Point3::new(2.0, 1.0, 0.0));
    builder.create_point(Point3::new(1.0, 2.0, 0.0));
    builder.create_point(Point3::new(0.0, 2.0, 0.0));
    builder.create_point(Point3::new(0.0, 0.0, 1.0));
    builder.create_point(Point3::new(1.0, 0.0, 1.0));
    builder.create_point(Point3::new(2.0, 1.0, 1.0));
    builder.create_point(Point3::new(1.0, 2.0, 1.0));
    builder.create_point(Point3::new(0.0, 2.0, 1.0));
    builder.create_point(Point3::new(1.0, 1.0, 2.0));
}

fn create_polyhedra(mesh: &mut SolidMesh) {
    let mut builder = SolidBuilder::new(mesh);
    builder.create_hexahedron([0, 1, 3, 4, 5, 6, 8, 9]).unwrap();
    builder.create_prism([1, 2, 3, 6, 7, 8]).unwrap();
    builder.create_pyramid([5, 6, 8, 9, 10]).unwrap();
    builder.create_tetrahedron([6, 7, 8, 10]).unwrap();
}

fn build() -> SolidMesh {
    let mut mesh = SolidMesh::new();
    mesh.enable_edges();
    mesh.enable_facets();
    create_vertices(&mut mesh);
    assert!(mesh.is_vertex_isolated(0));
    assert_eq!(mesh.nb_vertices(), 11);
    create_polyhedra(&mut mesh);
    mesh
}

#[test]
fn creation_counts_and_shapes() {
    let mesh = build();
    assert_eq!(mesh.nb_polyhedra(), 4);
    assert_eq!(mesh.polyhedron_shape(0), PolyhedronShape::Hexahedron);
    assert_eq!(mesh.polyhedron_shape(1), PolyhedronShape::Prism);
    assert_eq!(mesh.polyhedron_shape(2), PolyhedronShape::Pyramid);
    assert_eq!(mesh.polyhedron_shape(3), PolyhedronShape::Tetrahedron);
    assert_eq!(mesh.facets().nb_facets(), 16);
    assert_eq!(mesh.edges().nb_edges(), 22);
    assert!(!mesh.is_vertex_isolated(0));
}

#[test]
fn bounding_box() {
    let mut mesh = SolidMesh::new();
    create_vertices(&mut mesh);
    let bbox = mesh.bounding_box();
    assert_eq!(bbox.min(), &Point3::new(0.0, 0.0, 0.0));
    assert_eq!(bbox.max(), &Point3::new(2.0, 2.0, 2.0));
}

#[test]
fn derived_facets() {
    let mesh = build();
    assert_eq!(
        mesh.facets().facet_from_vertices(&[0, 1, 3, 4]),
        Some(0)
    );
    assert_eq!(mesh.facets().facet_from_vertices(&[8, 6, 7]), Some(7));
    let vertices = mesh.facets().facet_vertices(8).to_vec();
    assert_eq!(
        mesh.facet_barycenter(&vertices),
        Point3::new(1.5, 0.5, 0.5)
    );
}

#[test]
fn derived_edges() {
    let mesh = build();
    let vertices = mesh.edges().edge_vertices(0);
    assert_eq!(mesh.edge_barycenter(vertices), Point3::new(0.5, 0.0, 0.0));
    assert_eq!(mesh.edge_length(vertices), 1.0);
}

#[test]
fn polyhedron_adjacencies() {
    let mut mesh = build();
    SolidBuilder::new(&mut mesh).compute_polyhedron_adjacencies();
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(0, 0)),
        None
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(0, 1)),
        Some(2)
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(0, 2)),
        None
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(1, 1)),
        Some(3)
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(1, 4)),
        Some(0)
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(2, 2)),
        Some(3)
    );
    assert_eq!(mesh.polyhedra_around_vertex(6).len(), 4);
    assert_eq!(mesh.polyhedron_facets_on_border(0).len(), 4);
}

#[test]
fn around_edge_rings() {
    let mut mesh = build();
    SolidBuilder::new(&mut mesh).compute_polyhedron_adjacencies();
    // Edge (6, 8) is shared by all four polyhedra, as an interior cycle.
    let ring = mesh.polyhedra_around_edge(6, 8);
    assert_eq!(ring.len(), 4);
    assert_eq!(ring[0], 0);
    // Border edge (0, 1): only the hexahedron.
    assert_eq!(mesh.polyhedra_around_edge(0, 1), vec![0]);
    // Border edge (6, 7): prism and tetrahedron.
    let path = mesh.polyhedra_around_edge(6, 7);
    assert_eq!(path.len(), 2);
    assert!(path.contains(&1) && path.contains(&3));
}

#[test]
fn tetrahedron_edge_queries() {
    let mesh = build();
    let facets = mesh.edge_incident_facets(3, [6, 7]).unwrap();
    for facet in facets {
        assert!(
            mesh.polyhedron_facet_vertices(facet).contains(&6)
                && mesh.polyhedron_facet_vertices(facet).contains(&7)
        );
    }
    assert_eq!(mesh.opposite_edge_vertices(3, [6, 7]), Some([8, 10]));
    let opposite = mesh.opposite_edge_incident_facets(3, [6, 7]).unwrap();
    for facet in opposite {
        let vertices = mesh.polyhedron_facet_vertices(facet);
        assert!(vertices.contains(&8) && vertices.contains(&10));
    }
    assert_eq!(mesh.edge_incident_facets(0, [0, 1]), None);
}

#[test]
fn geometry_queries() {
    let mesh = build();
    // The hexahedron is a 1 x 2 x 1 box.
    assert!((mesh.polyhedron_volume(0) - 2.0).abs() < 1e-12);
    assert!(mesh.polyhedron_volume(3) > 0.0);
    let normal = mesh
        .polyhedron_facet_normal(PolyhedronFacet::new(0, 0))
        .unwrap();
    assert_eq!(normal, brepkit::geometry::Vector3::new(0.0, 0.0, -1.0));
    assert_eq!(
        mesh.polyhedron_facet_area(PolyhedronFacet::new(0, 1)),
        2.0
    );
}

fn permuted() -> SolidMesh {
    let mut mesh = build();
    SolidBuilder::new(&mut mesh).compute_polyhedron_adjacencies();
    SolidBuilder::new(&mut mesh)
        .permute_vertices(&[1, 7, 5, 4, 8, 6, 10, 2, 9, 3, 0])
        .unwrap();
    SolidBuilder::new(&mut mesh)
        .permute_polyhedra(&[3, 2, 0, 1])
        .unwrap();
    mesh
}

#[test]
fn permutations() {
    let mut mesh = build();
    SolidBuilder::new(&mut mesh).compute_polyhedron_adjacencies();
    SolidBuilder::new(&mut mesh)
        .permute_vertices(&[1, 7, 5, 4, 8, 6, 10, 2, 9, 3, 0])
        .unwrap();
    let hexahedron: Vec<u32> =
        mesh.polyhedron_vertices(0).to_vec();
    assert_eq!(hexahedron, vec![10, 0, 9, 3, 2, 5, 4, 8]);
    let prism: Vec<u32> = mesh.polyhedron_vertices(1).to_vec();
    assert_eq!(prism, vec![0, 7, 9, 5, 1, 4]);
    let pyramid: Vec<u32> = mesh.polyhedron_vertices(2).to_vec();
    assert_eq!(pyramid, vec![2, 5, 4, 8, 6]);
    let tetrahedron: Vec<u32> = mesh.polyhedron_vertices(3).to_vec();
    assert_eq!(tetrahedron, vec![5, 1, 4, 6]);

    SolidBuilder::new(&mut mesh)
        .permute_polyhedra(&[3, 2, 0, 1])
        .unwrap();
    assert_eq!(mesh.polyhedron_vertices(0), &[5, 1, 4, 6]);
    assert_eq!(mesh.polyhedron_vertices(1), &[2, 5, 4, 8, 6]);
    assert_eq!(
        mesh.polyhedron_vertices(2),
        &[10, 0, 9, 3, 2, 5, 4, 8]
    );
    assert_eq!(mesh.polyhedron_vertices(3), &[0, 7, 9, 5, 1, 4]);

    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(0, 1)),
        Some(1)
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(2, 1)),
        Some(1)
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(0, 3)),
        Some(3)
    );
    assert_eq!(
        mesh.polyhedron_adjacent(PolyhedronFacet::new(3, 4)),
        Some(2)
    );

    let around = mesh.polyhedra_around_vertex(5);
    assert_eq!(around.len(), 4);
    let polyhedra: Vec<u32> =
        around.iter().map(|pv| pv.polyhedron).collect();
    for polyhedron in 0..4 {
        assert!(polyhedra.contains(&polyhedron));
    }
    for corner in around {
        assert_eq!(mesh.polyhedron_vertex(corner), 5);
    }
}

#[test]
fn deletion_sequence() {
    let mut mesh = permuted();
    // Delete the tetrahedron, now in front.
    SolidBuilder::new(&mut mesh)
        .delete_polyhedra(&[true, false, false, false])
        .unwrap();
    assert_eq!(mesh.nb_polyhedra(), 3);
    assert_eq!(mesh.polyhedron_vertices(0), &[2, 5, 4, 8, 6]);
    SolidBuilder::new(&mut mesh).delete_isolated_edges().unwrap();
    SolidBuilder::new(&mut mesh).delete_isolated_facets().unwrap();
    assert_eq!(mesh.facets().nb_facets(), 14);
    assert_eq!(mesh.edges().nb_edges(), 21);

    let clone = mesh.clone();
    assert_eq!(clone.nb_vertices(), 11);
    assert_eq!(clone.nb_polyhedra(), 3);
    assert_eq!(clone.facets().nb_facets(), 14);
    assert_eq!(clone.edges().nb_edges(), 21);

    // Delete everything.
    SolidBuilder::new(&mut mesh)
        .delete_polyhedra(&[true, true, true])
        .unwrap();
    assert_eq!(mesh.nb_vertices(), 11);
    assert!(mesh.is_vertex_isolated(0));
    assert_eq!(mesh.nb_polyhedra(), 0);
    SolidBuilder::new(&mut mesh).delete_isolated_edges().unwrap();
    SolidBuilder::new(&mut mesh).delete_isolated_facets().unwrap();
    assert_eq!(mesh.facets().nb_facets(), 0);
    assert_eq!(mesh.edges().nb_edges(), 0);
    assert!(mesh.polyhedra_around_vertex(0).is_empty());
    SolidBuilder::new(&mut mesh)
        .delete_isolated_vertices()
        .unwrap();
    assert_eq!(mesh.nb_vertices(), 0);
}

#[test]
fn general_polyhedron() {
    let mut mesh = SolidMesh::new();
    let mut builder = SolidBuilder::new(&mut mesh);
    builder.create_point(Point3::new(0.0, 0.0, 0.0));
    builder.create_point(Point3::new(1.0, 0.0, 0.0));
    builder.create_point(Point3::new(0.0, 1.0, 0.0));
    builder.create_point(Point3::new(0.0, 0.0, 1.0));
    let created = builder
        .create_polyhedron(
            &[0, 1, 2, 3],
            &[
                vec![1, 2, 3],
                vec![0, 3, 2],
                vec![0, 1, 3],
                vec![0, 2, 1],
            ],
        )
        .unwrap();
    assert_eq!(mesh.polyhedron_shape(created), PolyhedronShape::General);
    assert_eq!(mesh.nb_polyhedron_facets(created), 4);
    assert_eq!(mesh.polyhedron_edges_vertices(created).len(), 6);
    assert!((mesh.polyhedron_volume(created) - 1.0 / 6.0).abs() < 1e-12);
}

#[test]
fn vertex_hint_rebinding() {
    let mut mesh = build();
    let corner = PolyhedronVertex::new(3, 0);
    SolidBuilder::new(&mut mesh)
        .associate_polyhedron_vertex_to_vertex(corner, 6)
        .unwrap();
    assert!(
        mesh.polyhedra_around_vertex(6)
            .iter()
            .any(|pv| *pv == corner)
    );
}
