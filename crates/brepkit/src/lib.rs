//! Geometry and topology kernel for boundary-representation models.
//!
//! The crate is organized in layers. `attributes` provides typed columnar
//! storage attached to every element set, and every mesh edit goes through
//! it so that user data, coordinates and topology stay in lockstep.
//! `mesh` holds the unstructured kernels (point sets, curves, polygonal
//! surfaces, hybrid polyhedral solids) and the computed regular grid.
//! `model` assembles meshes into B-Rep / Section aggregates linked by a
//! relationship graph. `geometry` and `tools` provide the exact predicates
//! and the spatial query engines everything above relies on.

/// Typed columnar attributes: values, columns, and the per-element-set
/// manager that keeps every column sized to the element count.
pub mod attributes;
mod error;
/// Points, vectors, bounding boxes, exact predicates and the symbolic
/// position/intersection classifications built on them.
pub mod geometry;
/// File helpers behind the `io` feature: serde snapshots and VTK export.
#[cfg(feature = "io")]
pub mod io;
/// Mesh kernels: vertex/point sets, edged curves, polygonal surfaces,
/// hybrid solids and the storage-free regular grid.
pub mod mesh;
/// Model layer: component identifiers, typed component collections, the
/// relationship graph, unique vertices, and the B-Rep/Section aggregates.
pub mod model;
/// Algorithms operating on one or more meshes: AABB tree, ray tracing,
/// solid merging and mesh conversions.
pub mod tools;

pub use error::{AttributeError, Error, GeometryError, MeshError, ModelError};

/// Index type used in every element space.
pub type Index = u32;
/// Index type for intra-element positions (a vertex inside a polyhedron).
pub type LocalIndex = u8;

/// Reserved sentinel marking the absence of an element index.
pub const NO_ID: Index = Index::MAX;
/// Reserved sentinel marking the absence of a local index.
pub const NO_LID: LocalIndex = LocalIndex::MAX;
/// Tolerance used by non-exact geometric queries (grid containment, hit
/// deduplication). Exact predicates never use it.
pub const GLOBAL_EPSILON: f64 = 1e-8;

pub mod prelude {
    pub use crate::attributes::{
        Attribute, AttributeFlags, AttributeManager, AttributeValue,
    };
    pub use crate::geometry::{BoundingBox, Point, Position, Side, Vector};
    pub use crate::mesh::{
        EdgedCurve, PointSet, PolygonEdge, PolygonVertex, PolyhedronFacet,
        PolyhedronShape, PolyhedronVertex, RegularGrid, SolidMesh,
        SurfaceMesh, VertexSet,
    };
    pub use crate::model::{
        BRep, BRepBuilder, ComponentId, ComponentType, RelationKind, Section,
        SectionBuilder, Uuid,
    };
    pub use crate::tools::{AabbTree, RayTracing2D, RayTracing3D, SolidMerger};
    pub use crate::{GLOBAL_EPSILON, Index, LocalIndex, NO_ID, NO_LID};
}
