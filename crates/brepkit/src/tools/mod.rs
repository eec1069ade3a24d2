mod aabb;
mod convert;
mod merger;
mod ray_tracing;

pub use self::aabb::AabbTree;
pub use self::convert::{
    grid_to_solid, grid_to_surface, surface_border_to_curve,
};
pub use self::merger::SolidMerger;
pub use self::ray_tracing::{RayHit, RayTracing2D, RayTracing3D};
