use crate::geometry::surface::Halfspace;

use super::material::MaterialId;
use super::SurfaceId;

slotmap::new_key_type! {
    /// Unique identifier for a cell in the CSG store.
    pub struct CellId;
}

/// One halfspace term of a cell region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionTerm {
    pub surface: SurfaceId,
    pub halfspace: Halfspace,
}

/// Data associated with a cell.
///
/// A cell is the intersection of the halfspaces in `region`, filled with a
/// single material. Each cell maps to one flat source region.
#[derive(Debug, Clone)]
pub struct CellData {
    /// Process-unique sequential id.
    pub uid: usize,
    /// User-visible id.
    pub id: i32,
    pub name: String,
    pub material: MaterialId,
    pub region: Vec<RegionTerm>,
    /// Cells sharing a surface with this one on the opposite halfspace.
    pub neighbors: Vec<CellId>,
}
