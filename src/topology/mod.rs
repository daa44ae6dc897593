pub mod cell;
pub mod ids;
pub mod material;

pub use cell::{CellData, CellId, RegionTerm};
pub use ids::{EntityIds, IdCounter, AUTO_ID_START};
pub use material::{Material, MaterialId};

use std::collections::{HashMap, HashSet, VecDeque};

use slotmap::SlotMap;

use crate::error::GeometryError;
use crate::geometry::surface::{Halfspace, Surface, SurfaceKind};
use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a surface in the CSG store.
    pub struct SurfaceId;
}

/// Central arena that owns surfaces, cells, and materials.
///
/// Entities reference each other via typed IDs. Surface/cell adjacency is
/// an index keyed by `(surface, halfspace)` rather than back-pointers.
#[derive(Debug, Default)]
pub struct CsgStore {
    ids: EntityIds,
    surfaces: SlotMap<SurfaceId, Surface>,
    cells: SlotMap<CellId, CellData>,
    materials: SlotMap<MaterialId, Material>,
    adjacency: HashMap<(SurfaceId, Halfspace), Vec<CellId>>,
}

impl CsgStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restarts automatic surface and cell ids at [`AUTO_ID_START`].
    pub fn reset_auto_ids(&mut self) {
        self.ids.reset();
    }

    // --- Surface operations ---

    /// Inserts a surface and returns its ID.
    ///
    /// An `id` of `0` requests an automatic id.
    pub fn add_surface(&mut self, id: i32, name: &str, kind: impl Into<SurfaceKind>) -> SurfaceId {
        let (uid, id) = self.ids.surfaces.allocate(id, "surface");
        self.surfaces.insert(Surface::new(uid, id, name, kind.into()))
    }

    /// Returns a reference to the surface, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface(&self, id: SurfaceId) -> Result<&Surface, GeometryError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| GeometryError::EntityNotFound("surface".into()))
    }

    /// Returns a mutable reference to the surface, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn surface_mut(&mut self, id: SurfaceId) -> Result<&mut Surface, GeometryError> {
        self.surfaces
            .get_mut(id)
            .ok_or_else(|| GeometryError::EntityNotFound("surface".into()))
    }

    /// Iterates over all surfaces.
    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &Surface)> {
        self.surfaces.iter()
    }

    // --- Material operations ---

    /// Inserts a material and returns its ID.
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.insert(material)
    }

    /// Returns a reference to the material, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn material(&self, id: MaterialId) -> Result<&Material, GeometryError> {
        self.materials
            .get(id)
            .ok_or_else(|| GeometryError::EntityNotFound("material".into()))
    }

    // --- Cell operations ---

    /// Inserts an empty-region cell filled with `material` and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the material is not in the store.
    pub fn add_cell(
        &mut self,
        id: i32,
        name: &str,
        material: MaterialId,
    ) -> Result<CellId, GeometryError> {
        self.material(material)?;
        let (uid, id) = self.ids.cells.allocate(id, "cell");
        Ok(self.cells.insert(CellData {
            uid,
            id,
            name: name.to_owned(),
            material,
            region: Vec::new(),
            neighbors: Vec::new(),
        }))
    }

    /// Returns a reference to the cell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn cell(&self, id: CellId) -> Result<&CellData, GeometryError> {
        self.cells
            .get(id)
            .ok_or_else(|| GeometryError::EntityNotFound("cell".into()))
    }

    /// Iterates over all cells.
    pub fn cells(&self) -> impl Iterator<Item = (CellId, &CellData)> {
        self.cells.iter()
    }

    /// Restricts `cell` to one `halfspace` (`-1` or `+1`) of `surface`.
    ///
    /// Also registers the cell as a neighbor of that surface halfspace.
    ///
    /// # Errors
    ///
    /// Returns an error if either entity is missing or the halfspace is invalid.
    pub fn add_region_surface(
        &mut self,
        cell: CellId,
        halfspace: i32,
        surface: SurfaceId,
    ) -> Result<(), GeometryError> {
        self.add_neighbor_cell(surface, halfspace, cell)?;
        let halfspace = self.checked_halfspace(surface, halfspace, cell)?;
        let data = self
            .cells
            .get_mut(cell)
            .ok_or_else(|| GeometryError::EntityNotFound("cell".into()))?;
        let term = RegionTerm { surface, halfspace };
        if !data.region.contains(&term) {
            data.region.push(term);
        }
        Ok(())
    }

    // --- Adjacency ---

    /// Registers `cell` as bordering the `halfspace` side of `surface`.
    ///
    /// Every cell already bordering the opposite side becomes a neighbor of
    /// `cell` and vice versa. Re-adding the same cell is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the halfspace is not `-1` or `+1`, or if either
    /// entity is not in the store.
    pub fn add_neighbor_cell(
        &mut self,
        surface: SurfaceId,
        halfspace: i32,
        cell: CellId,
    ) -> Result<(), GeometryError> {
        let halfspace = self.checked_halfspace(surface, halfspace, cell)?;

        let side = self.adjacency.entry((surface, halfspace)).or_default();
        if !side.contains(&cell) {
            side.push(cell);
        }

        let negative = self.neighbor_cells(surface, Halfspace::Negative).to_vec();
        let positive = self.neighbor_cells(surface, Halfspace::Positive).to_vec();
        for &a in &negative {
            for &b in &positive {
                self.link_cells(a, b);
                self.link_cells(b, a);
            }
        }
        Ok(())
    }

    /// Cells bordering the `halfspace` side of `surface`.
    #[must_use]
    pub fn neighbor_cells(&self, surface: SurfaceId, halfspace: Halfspace) -> &[CellId] {
        self.adjacency
            .get(&(surface, halfspace))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct neighbors of `cell`, in the order they were discovered.
    #[must_use]
    pub fn cell_neighbors(&self, cell: CellId) -> &[CellId] {
        self.cells
            .get(cell)
            .map(|c| c.neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Every cell reachable from `cell` through neighbor links, excluding `cell`.
    #[must_use]
    pub fn reachable_cells(&self, cell: CellId) -> Vec<CellId> {
        let mut seen = HashSet::from([cell]);
        let mut queue = VecDeque::from([cell]);
        let mut reached = Vec::new();
        while let Some(current) = queue.pop_front() {
            for &next in self.cell_neighbors(current) {
                if seen.insert(next) {
                    reached.push(next);
                    queue.push_back(next);
                }
            }
        }
        reached
    }

    /// Returns `true` if `point` lies in every halfspace of the cell region.
    ///
    /// Points within the on-surface tolerance of a bounding surface count
    /// as inside.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell or one of its surfaces is missing.
    pub fn cell_contains(&self, cell: CellId, point: &Point3) -> Result<bool, GeometryError> {
        for term in &self.cell(cell)?.region {
            let surface = self.surface(term.surface)?;
            if let Some(side) = surface.halfspace_of(point) {
                if side != term.halfspace {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn checked_halfspace(
        &self,
        surface: SurfaceId,
        halfspace: i32,
        cell: CellId,
    ) -> Result<Halfspace, GeometryError> {
        let surface_data = self.surface(surface)?;
        let cell_data = self.cell(cell)?;
        Halfspace::from_sign(halfspace).ok_or(GeometryError::InvalidHalfspace {
            cell: cell_data.id,
            surface: surface_data.id(),
            halfspace,
        })
    }

    fn link_cells(&mut self, cell: CellId, neighbor: CellId) {
        if cell == neighbor {
            return;
        }
        if let Some(data) = self.cells.get_mut(cell) {
            if !data.neighbors.contains(&neighbor) {
                data.neighbors.push(neighbor);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::surface::{XPlane, ZCylinder};

    fn store_with_material() -> (CsgStore, MaterialId) {
        let mut store = CsgStore::new();
        let m = store.add_material(Material::new(1, "water", vec![1.0]));
        (store, m)
    }

    #[test]
    fn invalid_halfspace_names_entities() {
        let (mut store, m) = store_with_material();
        let s = store.add_surface(3, "x", XPlane::new(0.0));
        let c = store.add_cell(8, "c", m).unwrap();
        let err = store.add_neighbor_cell(s, 0, c).unwrap_err();
        match err {
            GeometryError::InvalidHalfspace { cell, surface, halfspace } => {
                assert_eq!((cell, surface, halfspace), (8, 3, 0));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(store.add_region_surface(c, 2, s).is_err());
        assert!(store.cell(c).unwrap().region.is_empty());
    }

    #[test]
    fn opposite_halfspaces_become_neighbors() {
        let (mut store, m) = store_with_material();
        let s = store.add_surface(0, "", XPlane::new(0.0));
        let a = store.add_cell(0, "a", m).unwrap();
        let b = store.add_cell(0, "b", m).unwrap();
        store.add_neighbor_cell(s, -1, a).unwrap();
        store.add_neighbor_cell(s, 1, b).unwrap();

        assert_eq!(store.cell_neighbors(a), &[b]);
        assert_eq!(store.cell_neighbors(b), &[a]);
    }

    #[test]
    fn same_halfspace_is_not_adjacency() {
        let (mut store, m) = store_with_material();
        let s = store.add_surface(0, "", XPlane::new(0.0));
        let a = store.add_cell(0, "a", m).unwrap();
        let b = store.add_cell(0, "b", m).unwrap();
        store.add_neighbor_cell(s, 1, a).unwrap();
        store.add_neighbor_cell(s, 1, b).unwrap();
        assert!(store.cell_neighbors(a).is_empty());
    }

    #[test]
    fn re_adding_is_idempotent() {
        let (mut store, m) = store_with_material();
        let s = store.add_surface(0, "", XPlane::new(0.0));
        let a = store.add_cell(0, "a", m).unwrap();
        let b = store.add_cell(0, "b", m).unwrap();
        for _ in 0..3 {
            store.add_neighbor_cell(s, -1, a).unwrap();
            store.add_neighbor_cell(s, 1, b).unwrap();
        }
        assert_eq!(store.neighbor_cells(s, Halfspace::Negative), &[a]);
        assert_eq!(store.neighbor_cells(s, Halfspace::Positive), &[b]);
        assert_eq!(store.cell_neighbors(a).len(), 1);
    }

    #[test]
    fn adjacency_is_transitive_through_shared_cells() {
        let (mut store, m) = store_with_material();
        let s1 = store.add_surface(0, "", XPlane::new(0.0));
        let s2 = store.add_surface(0, "", XPlane::new(1.0));
        let a = store.add_cell(0, "a", m).unwrap();
        let b = store.add_cell(0, "b", m).unwrap();
        let c = store.add_cell(0, "c", m).unwrap();

        store.add_region_surface(a, -1, s1).unwrap();
        store.add_region_surface(b, 1, s1).unwrap();
        store.add_region_surface(b, -1, s2).unwrap();
        store.add_region_surface(c, 1, s2).unwrap();

        assert!(store.reachable_cells(a).contains(&c));
        assert!(store.reachable_cells(c).contains(&a));
        assert!(!store.cell_neighbors(a).contains(&c));
    }

    #[test]
    fn late_neighbor_is_propagated() {
        let (mut store, m) = store_with_material();
        let s = store.add_surface(0, "", XPlane::new(0.0));
        let a = store.add_cell(0, "a", m).unwrap();
        let b = store.add_cell(0, "b", m).unwrap();
        let c = store.add_cell(0, "c", m).unwrap();
        store.add_neighbor_cell(s, -1, a).unwrap();
        store.add_neighbor_cell(s, -1, b).unwrap();
        store.add_neighbor_cell(s, 1, c).unwrap();

        assert!(store.cell_neighbors(a).contains(&c));
        assert!(store.cell_neighbors(b).contains(&c));
        assert_eq!(store.cell_neighbors(c), &[a, b]);
    }

    #[test]
    fn cell_containment_uses_region() {
        let (mut store, m) = store_with_material();
        let cyl = store.add_surface(0, "", ZCylinder::new(0.0, 0.0, 1.0).unwrap());
        let fuel = store.add_cell(0, "fuel", m).unwrap();
        store.add_region_surface(fuel, -1, cyl).unwrap();

        assert!(store.cell_contains(fuel, &Point3::new(0.5, 0.0, 0.0)).unwrap());
        assert!(!store.cell_contains(fuel, &Point3::new(1.5, 0.0, 0.0)).unwrap());
        assert!(store.cell_contains(fuel, &Point3::new(1.0, 0.0, 0.0)).unwrap());
    }

    #[test]
    fn auto_ids_and_reset() {
        let mut store = CsgStore::new();
        let first = store.add_surface(0, "", XPlane::new(0.0));
        let second = store.add_surface(0, "", XPlane::new(1.0));
        assert_eq!(store.surface(first).unwrap().id(), AUTO_ID_START);
        assert_eq!(store.surface(second).unwrap().id(), AUTO_ID_START + 1);

        store.reset_auto_ids();
        let third = store.add_surface(0, "", XPlane::new(2.0));
        assert_eq!(store.surface(third).unwrap().id(), AUTO_ID_START);
        assert_eq!(store.surface(third).unwrap().uid(), 2);
    }
}
