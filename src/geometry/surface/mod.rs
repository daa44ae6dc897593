mod plane;
mod zcylinder;

pub use plane::{Plane, XPlane, YPlane, ZPlane};
pub use zcylinder::ZCylinder;

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::math::{Point3, ON_SURFACE_THRESH};

/// Intersection points of a ray with a surface, nearest root first for planes.
pub type Hits = SmallVec<[Point3; 2]>;

/// One of the two regions a surface divides space into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Halfspace {
    /// Where the surface equation is negative.
    Negative,
    /// Where the surface equation is positive.
    Positive,
}

impl Halfspace {
    /// Converts a `-1`/`+1` sign into a halfspace.
    #[must_use]
    pub fn from_sign(sign: i32) -> Option<Self> {
        match sign {
            -1 => Some(Self::Negative),
            1 => Some(Self::Positive),
            _ => None,
        }
    }

    /// The `-1`/`+1` sign of this halfspace.
    #[must_use]
    pub fn sign(self) -> i32 {
        match self {
            Self::Negative => -1,
            Self::Positive => 1,
        }
    }

    /// The halfspace on the other side of the surface.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Positive => Self::Negative,
        }
    }
}

/// Boundary condition carried by a surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryType {
    #[default]
    None,
    Vacuum,
    Reflective,
    Periodic,
}

/// Discriminator of the surface variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    Plane,
    XPlane,
    YPlane,
    ZPlane,
    ZCylinder,
}

/// The geometric primitive behind a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceKind {
    Plane(Plane),
    XPlane(XPlane),
    YPlane(YPlane),
    ZPlane(ZPlane),
    ZCylinder(ZCylinder),
}

impl SurfaceKind {
    /// Signed value of the implicit equation at `point`.
    #[must_use]
    pub fn evaluate(&self, point: &Point3) -> f64 {
        match self {
            Self::Plane(s) => s.evaluate(point),
            Self::XPlane(s) => s.plane().evaluate(point),
            Self::YPlane(s) => s.plane().evaluate(point),
            Self::ZPlane(s) => s.plane().evaluate(point),
            Self::ZCylinder(s) => s.evaluate(point),
        }
    }

    /// Points where the ray from `point` along `(azim, polar)` crosses the surface.
    #[must_use]
    pub fn intersection(&self, point: &Point3, azim: f64, polar: f64) -> Hits {
        match self {
            Self::Plane(s) => s.intersection(point, azim, polar),
            Self::XPlane(s) => s.plane().intersection(point, azim, polar),
            Self::YPlane(s) => s.plane().intersection(point, azim, polar),
            Self::ZPlane(s) => s.plane().intersection(point, azim, polar),
            Self::ZCylinder(s) => s.intersection(point, azim, polar),
        }
    }

    /// The variant tag.
    #[must_use]
    pub fn surface_type(&self) -> SurfaceType {
        match self {
            Self::Plane(_) => SurfaceType::Plane,
            Self::XPlane(_) => SurfaceType::XPlane,
            Self::YPlane(_) => SurfaceType::YPlane,
            Self::ZPlane(_) => SurfaceType::ZPlane,
            Self::ZCylinder(_) => SurfaceType::ZCylinder,
        }
    }

    #[must_use]
    pub fn min_x(&self, halfspace: Halfspace) -> f64 {
        match self {
            Self::XPlane(s) => s.min_x(halfspace),
            Self::ZCylinder(s) => s.min_x(halfspace),
            _ => f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn max_x(&self, halfspace: Halfspace) -> f64 {
        match self {
            Self::XPlane(s) => s.max_x(halfspace),
            Self::ZCylinder(s) => s.max_x(halfspace),
            _ => f64::INFINITY,
        }
    }

    #[must_use]
    pub fn min_y(&self, halfspace: Halfspace) -> f64 {
        match self {
            Self::YPlane(s) => s.min_y(halfspace),
            Self::ZCylinder(s) => s.min_y(halfspace),
            _ => f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn max_y(&self, halfspace: Halfspace) -> f64 {
        match self {
            Self::YPlane(s) => s.max_y(halfspace),
            Self::ZCylinder(s) => s.max_y(halfspace),
            _ => f64::INFINITY,
        }
    }

    #[must_use]
    pub fn min_z(&self, halfspace: Halfspace) -> f64 {
        match self {
            Self::ZPlane(s) => s.min_z(halfspace),
            _ => f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn max_z(&self, halfspace: Halfspace) -> f64 {
        match self {
            Self::ZPlane(s) => s.max_z(halfspace),
            _ => f64::INFINITY,
        }
    }
}

impl From<Plane> for SurfaceKind {
    fn from(s: Plane) -> Self {
        Self::Plane(s)
    }
}

impl From<XPlane> for SurfaceKind {
    fn from(s: XPlane) -> Self {
        Self::XPlane(s)
    }
}

impl From<YPlane> for SurfaceKind {
    fn from(s: YPlane) -> Self {
        Self::YPlane(s)
    }
}

impl From<ZPlane> for SurfaceKind {
    fn from(s: ZPlane) -> Self {
        Self::ZPlane(s)
    }
}

impl From<ZCylinder> for SurfaceKind {
    fn from(s: ZCylinder) -> Self {
        Self::ZCylinder(s)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plane(s) => fmt::Display::fmt(s, f),
            Self::XPlane(s) => fmt::Display::fmt(s, f),
            Self::YPlane(s) => fmt::Display::fmt(s, f),
            Self::ZPlane(s) => fmt::Display::fmt(s, f),
            Self::ZCylinder(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// A named surface with identity and boundary condition.
///
/// Neighbor cells are not stored here; the adjacency index lives in
/// [`CsgStore`](crate::topology::CsgStore).
#[derive(Debug, Clone)]
pub struct Surface {
    uid: usize,
    id: i32,
    name: String,
    boundary: BoundaryType,
    kind: SurfaceKind,
}

impl Surface {
    pub(crate) fn new(uid: usize, id: i32, name: &str, kind: SurfaceKind) -> Self {
        Self {
            uid,
            id,
            name: name.to_owned(),
            boundary: BoundaryType::None,
            kind,
        }
    }

    /// Process-unique sequential id.
    #[must_use]
    pub fn uid(&self) -> usize {
        self.uid
    }

    /// User-visible id.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        name.clone_into(&mut self.name);
    }

    #[must_use]
    pub fn boundary_type(&self) -> BoundaryType {
        self.boundary
    }

    pub fn set_boundary_type(&mut self, boundary: BoundaryType) {
        self.boundary = boundary;
    }

    #[must_use]
    pub fn kind(&self) -> &SurfaceKind {
        &self.kind
    }

    /// Mutable access to the primitive, e.g. to move an axis plane.
    pub fn kind_mut(&mut self) -> &mut SurfaceKind {
        &mut self.kind
    }

    #[must_use]
    pub fn surface_type(&self) -> SurfaceType {
        self.kind.surface_type()
    }

    /// Signed value of the implicit equation; the sign gives the halfspace.
    #[must_use]
    pub fn evaluate(&self, point: &Point3) -> f64 {
        self.kind.evaluate(point)
    }

    /// Returns `true` if `point` lies within [`ON_SURFACE_THRESH`] of the surface.
    #[must_use]
    pub fn is_point_on_surface(&self, point: &Point3) -> bool {
        self.evaluate(point).abs() < ON_SURFACE_THRESH
    }

    /// Classifies `point`, or `None` if it lies on the surface.
    #[must_use]
    pub fn halfspace_of(&self, point: &Point3) -> Option<Halfspace> {
        let value = self.evaluate(point);
        if value.abs() < ON_SURFACE_THRESH {
            None
        } else if value > 0.0 {
            Some(Halfspace::Positive)
        } else {
            Some(Halfspace::Negative)
        }
    }

    /// Points ahead of `point` where the ray along `(azim, polar)` crosses the surface.
    #[must_use]
    pub fn intersection(&self, point: &Point3, azim: f64, polar: f64) -> Hits {
        self.kind.intersection(point, azim, polar)
    }

    #[must_use]
    pub fn min_x(&self, halfspace: Halfspace) -> f64 {
        self.kind.min_x(halfspace)
    }

    #[must_use]
    pub fn max_x(&self, halfspace: Halfspace) -> f64 {
        self.kind.max_x(halfspace)
    }

    #[must_use]
    pub fn min_y(&self, halfspace: Halfspace) -> f64 {
        self.kind.min_y(halfspace)
    }

    #[must_use]
    pub fn max_y(&self, halfspace: Halfspace) -> f64 {
        self.kind.max_y(halfspace)
    }

    #[must_use]
    pub fn min_z(&self, halfspace: Halfspace) -> f64 {
        self.kind.min_z(halfspace)
    }

    #[must_use]
    pub fn max_z(&self, halfspace: Halfspace) -> f64 {
        self.kind.max_z(halfspace)
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surface ID = {}, name = {}, boundary = {:?}, {}",
            self.id, self.name, self.boundary, self.kind
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn halfspace_signs() {
        assert_eq!(Halfspace::from_sign(-1), Some(Halfspace::Negative));
        assert_eq!(Halfspace::from_sign(1), Some(Halfspace::Positive));
        assert_eq!(Halfspace::from_sign(0), None);
        assert_eq!(Halfspace::from_sign(2), None);
        assert_eq!(Halfspace::Negative.opposite().sign(), 1);
    }

    #[test]
    fn on_surface_is_stable_under_small_normal_moves() {
        let surface = Surface::new(0, 1, "x", XPlane::new(1.0).into());
        let on = p(1.0, 0.3, 0.0);
        assert!(surface.is_point_on_surface(&on));

        let nudged = on + Vector3::x() * (ON_SURFACE_THRESH * 0.5);
        assert!(surface.is_point_on_surface(&nudged));
        let nudged = on - Vector3::x() * (ON_SURFACE_THRESH * 0.5);
        assert!(surface.is_point_on_surface(&nudged));

        let off = on + Vector3::x() * (ON_SURFACE_THRESH * 10.0);
        assert!(!surface.is_point_on_surface(&off));
    }

    #[test]
    fn classifies_cylinder_points() {
        let cyl = ZCylinder::new(0.0, 0.0, 1.0).unwrap();
        let surface = Surface::new(0, 1, "", cyl.into());
        assert_eq!(surface.halfspace_of(&p(0.1, 0.1, 5.0)), Some(Halfspace::Negative));
        assert_eq!(surface.halfspace_of(&p(2.0, 0.0, 0.0)), Some(Halfspace::Positive));
        assert_eq!(surface.halfspace_of(&p(1.0, 0.0, 0.0)), None);
    }

    #[test]
    fn name_is_copied_on_set() {
        let mut surface = Surface::new(0, 1, "left", XPlane::new(0.0).into());
        let replacement = String::from("right");
        surface.set_name(&replacement);
        drop(replacement);
        assert_eq!(surface.name(), "right");
        assert_eq!(surface.boundary_type(), BoundaryType::None);
    }

    #[test]
    fn display_names_the_variant() {
        let cyl = ZCylinder::new(0.0, 0.0, 1.0).unwrap();
        let surface = Surface::new(0, 7, "cyl", cyl.into());
        let text = surface.to_string();
        assert!(text.contains("Surface ID = 7"));
        assert!(text.contains("ZCYLINDER"));
    }
}
