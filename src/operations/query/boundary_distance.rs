use crate::error::Result;
use crate::math::Point3;
use crate::topology::{CellId, CsgStore};

/// Distance from a point to the nearest surface of a cell along a ray.
pub struct BoundaryDistance {
    point: Point3,
    azim: f64,
    polar: f64,
}

impl BoundaryDistance {
    /// Creates a new `BoundaryDistance` query.
    #[must_use]
    pub fn new(point: Point3, azim: f64, polar: f64) -> Self {
        Self { point, azim, polar }
    }

    /// Executes the query, returning infinity when no surface lies ahead.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell or one of its surfaces is missing.
    pub fn execute(&self, store: &CsgStore, cell: CellId) -> Result<f64> {
        let mut nearest = f64::INFINITY;
        for term in &store.cell(cell)?.region {
            let surface = store.surface(term.surface)?;
            for hit in surface.intersection(&self.point, self.azim, self.polar) {
                nearest = nearest.min((hit - self.point).norm());
            }
        }
        Ok(nearest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::surface::{XPlane, ZCylinder};
    use crate::topology::Material;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn nearest_surface_wins() {
        let mut store = CsgStore::new();
        let m = store.add_material(Material::new(1, "water", vec![1.0]));
        let cyl = store.add_surface(0, "", ZCylinder::new(0.0, 0.0, 1.0).unwrap());
        let right = store.add_surface(0, "", XPlane::new(3.0));
        let outer = store.add_cell(0, "", m).unwrap();
        store.add_region_surface(outer, 1, cyl).unwrap();
        store.add_region_surface(outer, -1, right).unwrap();

        let toward_pin = BoundaryDistance::new(Point3::new(-2.0, 0.0, 0.0), 0.0, FRAC_PI_2)
            .execute(&store, outer)
            .unwrap();
        assert_abs_diff_eq!(toward_pin, 1.0, epsilon = 1e-12);

        let past_pin = BoundaryDistance::new(Point3::new(1.5, 0.0, 0.0), 0.0, FRAC_PI_2)
            .execute(&store, outer)
            .unwrap();
        assert_abs_diff_eq!(past_pin, 1.5, epsilon = 1e-12);
    }
}
