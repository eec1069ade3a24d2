mod serde_io;
mod vtk_io;

pub use self::serde_io::{
    AttributeSnapshot, BRepSnapshot, CurveSnapshot, ManagerSnapshot,
    PointSetSnapshot, RelationSnapshot, SolidSnapshot, SurfaceSnapshot,
    UniqueVertexSnapshot, read_json, read_yaml, register_attribute_type,
    restore_brep, restore_curve, restore_point_set, restore_solid,
    restore_surface, snapshot_brep, snapshot_curve, snapshot_manager,
    snapshot_point_set, snapshot_solid, snapshot_surface, write_json,
    write_yaml,
};
pub use self::vtk_io::{write_solid, write_surface};
