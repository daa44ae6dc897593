use std::fmt;

use crate::math::{direction, Point3, TOLERANCE};

use super::{Halfspace, Hits};

/// A general plane `A*x + B*y + C*z + D = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Plane {
    /// Creates a plane from its implicit-equation coefficients.
    #[must_use]
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Returns the coefficients `(A, B, C, D)`.
    #[must_use]
    pub fn coefficients(&self) -> (f64, f64, f64, f64) {
        (self.a, self.b, self.c, self.d)
    }

    /// Signed value of the plane equation at `point`.
    #[must_use]
    pub fn evaluate(&self, point: &Point3) -> f64 {
        self.a * point.x + self.b * point.y + self.c * point.z + self.d
    }

    /// Intersects the ray `point + l * dir(azim, polar)` with the plane.
    ///
    /// Returns at most one point, and only when it lies strictly ahead of
    /// the origin. A ray parallel to the plane has no intersection.
    #[must_use]
    pub fn intersection(&self, point: &Point3, azim: f64, polar: f64) -> Hits {
        let mut hits = Hits::new();
        let dir = direction(azim, polar);

        let denom = self.a * dir.x + self.b * dir.y + self.c * dir.z;
        if denom.abs() < TOLERANCE {
            return hits;
        }

        let l = -self.evaluate(point) / denom;
        if l > 0.0 {
            hits.push(point + dir * l);
        }
        hits
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type = PLANE, A = {}, B = {}, C = {}, D = {}",
            self.a, self.b, self.c, self.d
        )
    }
}

macro_rules! axis_plane {
    (
        $name:ident,
        $field:ident,
        $setter:ident,
        $tag:literal,
        $coeffs:expr,
        $min:ident,
        $max:ident
    ) => {
        #[doc = concat!("A plane perpendicular to the ", stringify!($field), "-axis.")]
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            $field: f64,
        }

        impl $name {
            #[doc = concat!("Creates the plane `", stringify!($field), " = value`.")]
            #[must_use]
            pub fn new($field: f64) -> Self {
                Self { $field }
            }

            /// Location of the plane along its axis.
            #[must_use]
            pub fn $field(&self) -> f64 {
                self.$field
            }

            /// Moves the plane along its axis.
            pub fn $setter(&mut self, $field: f64) {
                self.$field = $field;
            }

            /// The equivalent general plane.
            #[must_use]
            pub fn plane(&self) -> Plane {
                let (a, b, c) = $coeffs;
                Plane::new(a, b, c, -self.$field)
            }

            /// Lower bound of `halfspace` along this plane's axis.
            #[must_use]
            pub fn $min(&self, halfspace: Halfspace) -> f64 {
                match halfspace {
                    Halfspace::Positive => self.$field,
                    Halfspace::Negative => f64::NEG_INFINITY,
                }
            }

            /// Upper bound of `halfspace` along this plane's axis.
            #[must_use]
            pub fn $max(&self, halfspace: Halfspace) -> f64 {
                match halfspace {
                    Halfspace::Negative => self.$field,
                    Halfspace::Positive => f64::INFINITY,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let (a, b, c) = $coeffs;
                write!(
                    f,
                    concat!("type = ", $tag, ", A = {}, B = {}, C = {}, ", stringify!($field), " = {}"),
                    a, b, c, self.$field
                )
            }
        }
    };
}

axis_plane!(XPlane, x, set_x, "XPLANE", (1.0, 0.0, 0.0), min_x, max_x);
axis_plane!(YPlane, y, set_y, "YPLANE", (0.0, 1.0, 0.0), min_y, max_y);
axis_plane!(ZPlane, z, set_z, "ZPLANE", (0.0, 0.0, 1.0), min_z, max_z);
