use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::geometry::surface::{BoundaryType, SurfaceKind};
use crate::math::{Point3, TOLERANCE};
use crate::operations::query::{Aabb, BoundaryDistance, DomainBounds, FindCell};
use crate::topology::{CellId, CsgStore, Material};

/// One of the four sides of the rectangular x/y domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundarySide {
    MinX,
    MaxX,
    MinY,
    MaxY,
}

impl BoundarySide {
    pub const ALL: [Self; 4] = [Self::MinX, Self::MaxX, Self::MinY, Self::MaxY];

    /// The side across the domain.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::MinX => Self::MaxX,
            Self::MaxX => Self::MinX,
            Self::MinY => Self::MaxY,
            Self::MaxY => Self::MinY,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::MinX => 0,
            Self::MaxX => 1,
            Self::MinY => 2,
            Self::MaxY => 3,
        }
    }
}

/// A finalized CSG model as seen by the track generator.
///
/// Construction fixes the domain extent, the boundary condition on each
/// side, and the flat source regions: every cell is one FSR, numbered
/// densely in cell creation order.
#[derive(Debug)]
pub struct Geometry {
    store: CsgStore,
    bounds: Aabb,
    boundaries: [BoundaryType; 4],
    fsr_cells: Vec<CellId>,
    cell_fsrs: SecondaryMap<CellId, usize>,
}

impl Geometry {
    /// Finalizes `store`.
    ///
    /// A side whose coincident axis plane carries no boundary condition
    /// (or has no axis plane at all) is treated as vacuum.
    ///
    /// # Errors
    ///
    /// Returns an error if the store has no cells, the domain is unbounded
    /// in x or y, or a periodic side faces a non-periodic one.
    pub fn new(store: CsgStore) -> Result<Self> {
        let bounds = DomainBounds::execute(&store)?;

        let mut cells: Vec<(usize, CellId)> = store.cells().map(|(id, c)| (c.uid, id)).collect();
        cells.sort_unstable_by_key(|&(uid, _)| uid);
        let fsr_cells: Vec<CellId> = cells.into_iter().map(|(_, id)| id).collect();
        let mut cell_fsrs = SecondaryMap::new();
        for (fsr, &cell) in fsr_cells.iter().enumerate() {
            cell_fsrs.insert(cell, fsr);
        }

        let mut boundaries = [BoundaryType::Vacuum; 4];
        for side in BoundarySide::ALL {
            boundaries[side.index()] = side_boundary(&store, &bounds, side);
        }

        let geometry = Self {
            store,
            bounds,
            boundaries,
            fsr_cells,
            cell_fsrs,
        };
        geometry.check_periodic_pairs()?;
        debug!(
            num_fsrs = geometry.num_fsrs(),
            width_x = geometry.width_x(),
            width_y = geometry.width_y(),
            "geometry finalized"
        );
        Ok(geometry)
    }

    #[must_use]
    pub fn store(&self) -> &CsgStore {
        &self.store
    }

    #[must_use]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[must_use]
    pub fn min_x(&self) -> f64 {
        self.bounds.min.x
    }

    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.bounds.max.x
    }

    #[must_use]
    pub fn min_y(&self) -> f64 {
        self.bounds.min.y
    }

    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.bounds.max.y
    }

    #[must_use]
    pub fn width_x(&self) -> f64 {
        self.bounds.max.x - self.bounds.min.x
    }

    #[must_use]
    pub fn width_y(&self) -> f64 {
        self.bounds.max.y - self.bounds.min.y
    }

    /// Boundary condition applied on `side`, never [`BoundaryType::None`].
    #[must_use]
    pub fn boundary_type(&self, side: BoundarySide) -> BoundaryType {
        self.boundaries[side.index()]
    }

    /// Returns `true` if any side is periodic.
    #[must_use]
    pub fn is_periodic(&self) -> bool {
        self.boundaries.contains(&BoundaryType::Periodic)
    }

    #[must_use]
    pub fn num_fsrs(&self) -> usize {
        self.fsr_cells.len()
    }

    /// FSR id of `cell`.
    #[must_use]
    pub fn fsr_of(&self, cell: CellId) -> Option<usize> {
        self.cell_fsrs.get(cell).copied()
    }

    /// Cell backing FSR `fsr`.
    #[must_use]
    pub fn fsr_cell(&self, fsr: usize) -> Option<CellId> {
        self.fsr_cells.get(fsr).copied()
    }

    /// Material filling FSR `fsr`.
    ///
    /// # Errors
    ///
    /// Returns an error if `fsr` is out of range.
    pub fn fsr_material(&self, fsr: usize) -> Result<&Material> {
        let cell = self
            .fsr_cell(fsr)
            .ok_or_else(|| GeometryError::EntityNotFound(format!("FSR {fsr}")))?;
        Ok(self.store.material(self.store.cell(cell)?.material)?)
    }

    /// Cell containing `point`, searching every cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is inconsistent.
    pub fn find_cell_containing(&self, point: &Point3) -> Result<Option<CellId>> {
        FindCell::new(*point).execute(&self.store)
    }

    /// Cell containing `point`, searching the neighbors of `previous` first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is inconsistent.
    pub fn find_next_cell(
        &self,
        point: &Point3,
        previous: Option<CellId>,
    ) -> Result<Option<CellId>> {
        let query = FindCell::new(*point);
        match previous {
            Some(cell) => query.near(cell).execute(&self.store),
            None => query.execute(&self.store),
        }
    }

    /// Returns `true` if `point` lies in `cell`, surfaces included.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell or one of its surfaces is missing.
    pub fn cell_contains(&self, cell: CellId, point: &Point3) -> Result<bool> {
        Ok(self.store.cell_contains(cell, point)?)
    }

    /// Distance from `point` to the nearest surface of `cell` along `(azim, polar)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell or one of its surfaces is missing.
    pub fn distance_to_boundary(
        &self,
        point: &Point3,
        cell: CellId,
        azim: f64,
        polar: f64,
    ) -> Result<f64> {
        BoundaryDistance::new(*point, azim, polar).execute(&self.store, cell)
    }

    /// Text identifying the geometry for the track cache.
    ///
    /// Built from the domain extent, the side boundary conditions, every
    /// surface description and every cell region, in uid order.
    #[must_use]
    pub fn signature(&self) -> String {
        let mut lines = vec![format!(
            "bounds = [{}, {}] x [{}, {}]",
            self.min_x(),
            self.max_x(),
            self.min_y(),
            self.max_y()
        )];
        lines.push(format!("boundaries = {:?}", self.boundaries));

        let mut surfaces: Vec<_> = self.store.surfaces().map(|(_, s)| s).collect();
        surfaces.sort_unstable_by_key(|s| s.uid());
        lines.extend(surfaces.iter().map(ToString::to_string));

        for &cell_id in &self.fsr_cells {
            let Ok(cell) = self.store.cell(cell_id) else {
                continue;
            };
            let material = self.store.material(cell.material).map_or(0, |m| m.id);
            let region: Vec<String> = cell
                .region
                .iter()
                .filter_map(|term| {
                    let surface = self.store.surface(term.surface).ok()?;
                    let sign = if term.halfspace.sign() < 0 { '-' } else { '+' };
                    Some(format!("{sign}{}", surface.id()))
                })
                .collect();
            lines.push(format!(
                "Cell ID = {}, material = {}, region = {}",
                cell.id,
                material,
                region.join(" ")
            ));
        }
        lines.join("\n")
    }

    fn check_periodic_pairs(&self) -> Result<()> {
        for (side, axis) in [(BoundarySide::MinX, "x"), (BoundarySide::MinY, "y")] {
            let near = self.boundary_type(side) == BoundaryType::Periodic;
            let far = self.boundary_type(side.opposite()) == BoundaryType::Periodic;
            if near != far {
                return Err(GeometryError::UnmatchedPeriodic(axis).into());
            }
        }
        Ok(())
    }
}

/// Boundary condition of the first axis plane lying on `side`.
fn side_boundary(store: &CsgStore, bounds: &Aabb, side: BoundarySide) -> BoundaryType {
    let found = store
        .surfaces()
        .filter(|(_, s)| {
            let (position, target) = match (s.kind(), side) {
                (SurfaceKind::XPlane(p), BoundarySide::MinX) => (p.x(), bounds.min.x),
                (SurfaceKind::XPlane(p), BoundarySide::MaxX) => (p.x(), bounds.max.x),
                (SurfaceKind::YPlane(p), BoundarySide::MinY) => (p.y(), bounds.min.y),
                (SurfaceKind::YPlane(p), BoundarySide::MaxY) => (p.y(), bounds.max.y),
                _ => return false,
            };
            (position - target).abs() < TOLERANCE
        })
        .map(|(_, s)| s.boundary_type())
        .find(|&b| b != BoundaryType::None);

    found.unwrap_or_else(|| {
        warn!(?side, "no boundary condition on domain side, using vacuum");
        BoundaryType::Vacuum
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::fixtures;
    use crate::geometry::surface::{XPlane, YPlane};

    #[test]
    fn pin_cell_domain_and_fsrs() {
        let geometry = fixtures::pin_cell(BoundaryType::Reflective);
        assert_eq!(geometry.num_fsrs(), 2);
        assert_eq!((geometry.min_x(), geometry.max_x()), (-1.0, 1.0));
        assert_eq!(geometry.width_y(), 2.0);
        for side in BoundarySide::ALL {
            assert_eq!(geometry.boundary_type(side), BoundaryType::Reflective);
        }
        assert!(!geometry.is_periodic());

        let fuel = geometry.fsr_material(0).unwrap();
        assert_eq!(fuel.name, "fuel");
        assert!(geometry.fsr_material(2).is_err());
    }

    #[test]
    fn cell_lookup_maps_to_fsrs() {
        let geometry = fixtures::pin_cell(BoundaryType::Vacuum);
        let center = geometry.find_cell_containing(&Point3::origin()).unwrap().unwrap();
        assert_eq!(geometry.fsr_of(center), Some(0));
        let corner = geometry
            .find_next_cell(&Point3::new(0.9, 0.9, 0.0), Some(center))
            .unwrap()
            .unwrap();
        assert_eq!(geometry.fsr_of(corner), Some(1));
        assert!(geometry
            .find_cell_containing(&Point3::new(1.5, 0.0, 0.0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn missing_boundary_condition_means_vacuum() {
        let geometry = fixtures::box_geometry(2.0, 1.0, BoundaryType::None);
        assert_eq!(geometry.boundary_type(BoundarySide::MaxY), BoundaryType::Vacuum);
    }

    #[test]
    fn one_sided_periodic_is_rejected() {
        let mut store = CsgStore::new();
        let m = store.add_material(Material::new(1, "water", vec![1.0]));
        let cell = store.add_cell(0, "", m).unwrap();
        let planes = [
            (1, store.add_surface(0, "", XPlane::new(0.0))),
            (-1, store.add_surface(0, "", XPlane::new(1.0))),
            (1, store.add_surface(0, "", YPlane::new(0.0))),
            (-1, store.add_surface(0, "", YPlane::new(1.0))),
        ];
        for (h, s) in planes {
            store.add_region_surface(cell, h, s).unwrap();
            store.surface_mut(s).unwrap().set_boundary_type(BoundaryType::Reflective);
        }
        store
            .surface_mut(planes[0].1)
            .unwrap()
            .set_boundary_type(BoundaryType::Periodic);

        let err = Geometry::new(store).unwrap_err();
        assert!(err.to_string().contains("periodic"));
    }

    #[test]
    fn signature_tracks_surface_changes() {
        let a = fixtures::pin_cell(BoundaryType::Reflective).signature();
        let b = fixtures::pin_cell(BoundaryType::Reflective).signature();
        let c = fixtures::pin_cell(BoundaryType::Periodic).signature();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.contains("ZCYLINDER"));
    }
}
