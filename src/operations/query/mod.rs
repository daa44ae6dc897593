mod boundary_distance;
mod bounding_box;
mod find_cell;

pub use boundary_distance::BoundaryDistance;
pub use bounding_box::{Aabb, CellBounds, DomainBounds};
pub use find_cell::FindCell;
