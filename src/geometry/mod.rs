pub mod model;
pub mod surface;

#[cfg(test)]
pub(crate) mod fixtures;

pub use model::{BoundarySide, Geometry};
pub use surface::{
    BoundaryType, Halfspace, Hits, Plane, Surface, SurfaceKind, SurfaceType, XPlane, YPlane,
    ZCylinder, ZPlane,
};
