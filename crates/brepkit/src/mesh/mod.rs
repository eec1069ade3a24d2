mod edged_curve;
mod grid;
mod packed;
mod point_set;
mod solid;
mod surface;
mod vertex_set;

pub use self::edged_curve::{EdgedCurve, EdgedCurveBuilder};
pub use self::grid::RegularGrid;
pub use self::packed::PackedRows;
pub use self::point_set::{PointSet, PointSetBuilder};
pub use self::solid::{
    PolyhedronFacet, PolyhedronShape, PolyhedronVertex, SolidBuilder,
    SolidEdges, SolidFacets, SolidMesh,
};
pub use self::surface::{
    PolygonEdge, PolygonVertex, SurfaceBuilder, SurfaceEdges, SurfaceMesh,
};
pub use self::vertex_set::VertexSet;
