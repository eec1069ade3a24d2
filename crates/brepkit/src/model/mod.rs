mod brep;
mod component;
mod copy;
mod identifier;
mod relationships;
mod section;
mod vertex_identifier;

pub use self::brep::{BRep, BRepBuilder};
pub use self::component::{
    Block, BlockCollection, Corner, CornerCollection, Line, LineCollection,
    ModelBoundary, Surface, SurfaceCollection,
};
pub use self::copy::{copy_brep, copy_section};
pub use self::identifier::{ComponentId, ComponentType, Uuid};
pub use self::relationships::{RelationKind, Relationships};
pub use self::section::{Section, SectionBuilder};
pub use self::vertex_identifier::{ComponentMeshVertex, VertexIdentifier};
