mod intersection;
mod point;
mod position;
mod predicates;

pub use self::intersection::{
    point_segment_distance, point_triangle_distance,
    segment_segment_distance, segment_segment_intersection,
    segment_segment_intersection_detection, segment_triangle_intersection,
    segment_triangle_intersection_detection,
};
pub use self::point::{
    BoundingBox, Point, Point2, Point3, Vector, Vector2, Vector3,
    try_normalize,
};
pub use self::position::{
    Position, point_segment_position_2d, point_segment_position_3d,
    point_side_to_line, point_side_to_plane, point_side_to_segment,
    point_side_to_triangle, point_tetrahedron_position,
    point_triangle_position_2d, point_triangle_position_3d,
};
pub use self::predicates::{
    Side, aligned_3d, dot_side_2d, dot_side_3d, in_circle_2d, in_sphere_3d,
    orient_2d, orient_3d,
};
