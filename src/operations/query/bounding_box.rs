use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::math::Point3;
use crate::topology::{CellId, CsgStore};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// An inverted box that any union grows from.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

/// Computes the extent of a cell as the intersection of its halfspace extents.
pub struct CellBounds {
    cell: CellId,
}

impl CellBounds {
    /// Creates a new `CellBounds` query.
    #[must_use]
    pub fn new(cell: CellId) -> Self {
        Self { cell }
    }

    /// Executes the query. Unbounded directions come back infinite.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell or one of its surfaces is missing.
    pub fn execute(&self, store: &CsgStore) -> Result<Aabb> {
        let mut aabb = Aabb {
            min: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            max: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        };
        for term in &store.cell(self.cell)?.region {
            let s = store.surface(term.surface)?;
            let h = term.halfspace;
            aabb.min.x = aabb.min.x.max(s.min_x(h));
            aabb.min.y = aabb.min.y.max(s.min_y(h));
            aabb.min.z = aabb.min.z.max(s.min_z(h));
            aabb.max.x = aabb.max.x.min(s.max_x(h));
            aabb.max.y = aabb.max.y.min(s.max_y(h));
            aabb.max.z = aabb.max.z.min(s.max_z(h));
        }
        Ok(aabb)
    }
}

/// Computes the x/y extent of the whole geometry as the union of its cells.
pub struct DomainBounds;

impl DomainBounds {
    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has no cells or the union is unbounded
    /// in x or y. The z extent may stay infinite.
    pub fn execute(store: &CsgStore) -> Result<Aabb> {
        let mut domain = Aabb::empty();
        for (cell, _) in store.cells() {
            domain = domain.union(&CellBounds::new(cell).execute(store)?);
        }
        if !(domain.min.x.is_finite() && domain.max.x.is_finite()) {
            return Err(GeometryError::Unbounded("x").into());
        }
        if !(domain.min.y.is_finite() && domain.max.y.is_finite()) {
            return Err(GeometryError::Unbounded("y").into());
        }
        Ok(domain)
    }
}
