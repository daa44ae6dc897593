use crate::error::Result;
use crate::math::Point3;
use crate::topology::{CellId, CsgStore};

/// Finds the cell containing a point.
///
/// With a `previous` cell, the neighbors of that cell are searched first,
/// which is where a ray lands after crossing one of its surfaces. The full
/// cell list is the fallback.
pub struct FindCell {
    point: Point3,
    previous: Option<CellId>,
}

impl FindCell {
    /// Creates a new `FindCell` query.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            previous: None,
        }
    }

    /// Searches the neighbors of `previous` before the rest of the geometry.
    #[must_use]
    pub fn near(mut self, previous: CellId) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Executes the query, returning `None` when the point is outside every cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is inconsistent.
    pub fn execute(&self, store: &CsgStore) -> Result<Option<CellId>> {
        if let Some(previous) = self.previous {
            for &candidate in store.cell_neighbors(previous) {
                if store.cell_contains(candidate, &self.point)? {
                    return Ok(Some(candidate));
                }
            }
            if store.cell_contains(previous, &self.point)? {
                return Ok(Some(previous));
            }
        }

        for (cell, _) in store.cells() {
            if store.cell_contains(cell, &self.point)? {
                return Ok(Some(cell));
            }
        }
        Ok(None)
    }
}
