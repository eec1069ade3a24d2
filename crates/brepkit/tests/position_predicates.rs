use brepkit::geometry::{
    Point2, Point3, Position, Side, point_segment_position_2d,
    point_side_to_segment, point_tetrahedron_position,
    point_triangle_position_2d,
};

#[test]
fn segment_classification() {
    let s0 = Point2::new(0.0, 0.0);
    let s1 = Point2::new(1.0, 0.0);
    let queries = [
        (Point2::new(0.5, 0.0), Position::Inside, Side::Zero),
        (Point2::new(10.0, 0.0), Position::Outside, Side::Zero),
        (Point2::new(0.3, 2.0), Position::Outside, Side::Positive),
        (Point2::new(12.0, -6.0), Position::Outside, Side::Negative),
        (Point2::new(0.0, -1e-10), Position::Outside, Side::Negative),
    ];
    for (query, position, side) in queries {
        assert_eq!(
            point_segment_position_2d(&query, &s0, &s1),
            position,
            "position of {query}"
        );
        assert_eq!(
            point_side_to_segment(&query, &s0, &s1),
            side,
            "side of {query}"
        );
    }
    assert_eq!(
        point_segment_position_2d(&s0, &s0, &s1),
        Position::Vertex(0)
    );
    assert_eq!(
        point_segment_position_2d(&s1, &s0, &s1),
        Position::Vertex(1)
    );
}

#[test]
fn triangle_classification_grid() {
    let triangle = [
        Point2::new(0.0, 0.0),
        Point2::new(4.0, 0.0),
        Point2::new(0.0, 4.0),
    ];
    assert_eq!(
        point_triangle_position_2d(&Point2::new(1.0, 1.0), &triangle),
        Position::Inside
    );
    assert_eq!(
        point_triangle_position_2d(&Point2::new(2.0, 0.0), &triangle),
        Position::Edge(0)
    );
    assert_eq!(
        point_triangle_position_2d(&Point2::new(2.0, 2.0), &triangle),
        Position::Edge(1)
    );
    assert_eq!(
        point_triangle_position_2d(&Point2::new(0.0, 2.0), &triangle),
        Position::Edge(2)
    );
    for (vertex, point) in triangle.iter().enumerate() {
        assert_eq!(
            point_triangle_position_2d(point, &triangle),
            Position::Vertex(vertex as u8)
        );
    }
    assert_eq!(
        point_triangle_position_2d(&Point2::new(4.0, 4.0), &triangle),
        Position::Outside
    );
    assert_eq!(
        point_triangle_position_2d(&Point2::new(-1e-12, 2.0), &triangle),
        Position::Outside
    );
}

#[test]
fn tetrahedron_classification() {
    let tet = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(0.0, 4.0, 0.0),
        Point3::new(0.0, 0.0, 4.0),
    ];
    assert_eq!(
        point_tetrahedron_position(&Point3::new(0.5, 0.5, 0.5), &tet),
        Position::Inside
    );
    assert_eq!(
        point_tetrahedron_position(&Point3::new(5.0, 5.0, 5.0), &tet),
        Position::Outside
    );
    for (vertex, point) in tet.iter().enumerate() {
        assert_eq!(
            point_tetrahedron_position(point, &tet),
            Position::Vertex(vertex as u8)
        );
    }
    // Interior of the base facet, opposite vertex 3.
    assert_eq!(
        point_tetrahedron_position(&Point3::new(1.0, 1.0, 0.0), &tet),
        Position::Facet(3)
    );
    // A point just off the base plane is strictly outside.
    assert_eq!(
        point_tetrahedron_position(&Point3::new(1.0, 1.0, -1e-12), &tet),
        Position::Outside
    );
}
