//! Small geometries shared by tests.

#![allow(clippy::unwrap_used)]

use crate::geometry::surface::{BoundaryType, XPlane, YPlane, ZCylinder};
use crate::geometry::Geometry;
use crate::topology::{CsgStore, Material, SurfaceId};

/// Adds the four sides of `[x0, x1] x [y0, y1]` with `boundary` on each.
fn add_box(
    store: &mut CsgStore,
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
    boundary: BoundaryType,
) -> [(i32, SurfaceId); 4] {
    let sides = [
        (1, store.add_surface(0, "left", XPlane::new(x0))),
        (-1, store.add_surface(0, "right", XPlane::new(x1))),
        (1, store.add_surface(0, "bottom", YPlane::new(y0))),
        (-1, store.add_surface(0, "top", YPlane::new(y1))),
    ];
    for (_, s) in sides {
        store.surface_mut(s).unwrap().set_boundary_type(boundary);
    }
    sides
}

/// A single homogeneous cell filling `[0, width_x] x [0, width_y]`.
pub(crate) fn box_geometry(width_x: f64, width_y: f64, boundary: BoundaryType) -> Geometry {
    let mut store = CsgStore::new();
    let water = store.add_material(Material::new(1, "water", vec![0.5, 1.0]));
    let cell = store.add_cell(0, "water", water).unwrap();
    for (h, s) in add_box(&mut store, (0.0, width_x), (0.0, width_y), boundary) {
        store.add_region_surface(cell, h, s).unwrap();
    }
    Geometry::new(store).unwrap()
}

/// A fuel pin of radius 0.4 centered in the moderator box `[-1, 1]^2`.
pub(crate) fn pin_cell(boundary: BoundaryType) -> Geometry {
    let mut store = CsgStore::new();
    let fuel_mat = store.add_material(Material::new(1, "fuel", vec![0.4, 2.5]));
    let water = store.add_material(Material::new(2, "water", vec![0.3, 1.2]));
    let pin = store.add_surface(1, "pin", ZCylinder::new(0.0, 0.0, 0.4).unwrap());

    let fuel = store.add_cell(1, "fuel", fuel_mat).unwrap();
    store.add_region_surface(fuel, -1, pin).unwrap();

    let moderator = store.add_cell(2, "moderator", water).unwrap();
    store.add_region_surface(moderator, 1, pin).unwrap();
    for (h, s) in add_box(&mut store, (-1.0, 1.0), (-1.0, 1.0), boundary) {
        store.add_region_surface(moderator, h, s).unwrap();
    }
    Geometry::new(store).unwrap()
}
