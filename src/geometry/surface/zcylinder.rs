use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, TOLERANCE};

use super::{Halfspace, Hits};

/// An infinite cylinder parallel to the z-axis.
///
/// Implicit form: `A*x^2 + B*y^2 + C*x + D*y + E = 0` with `A = B = 1`,
/// `C = -2*x0`, `D = -2*y0` and `E = x0^2 + y0^2 - r^2`. The inside of the
/// cylinder is the negative halfspace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZCylinder {
    x0: f64,
    y0: f64,
    radius: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
}

impl ZCylinder {
    /// Creates a cylinder centered at `(x0, y0)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    pub fn new(x0: f64, y0: f64, radius: f64) -> Result<Self> {
        if radius <= 0.0 || !radius.is_finite() {
            return Err(GeometryError::Degenerate(format!(
                "cylinder radius must be positive, got {radius}"
            ))
            .into());
        }
        Ok(Self {
            x0,
            y0,
            radius,
            a: 1.0,
            b: 1.0,
            c: -2.0 * x0,
            d: -2.0 * y0,
            e: x0 * x0 + y0 * y0 - radius * radius,
        })
    }

    /// x-coordinate of the axis.
    #[must_use]
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// y-coordinate of the axis.
    #[must_use]
    pub fn y0(&self) -> f64 {
        self.y0
    }

    /// Radius of the cylinder.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Signed value of the cylinder equation at `point`.
    #[must_use]
    pub fn evaluate(&self, point: &Point3) -> f64 {
        let (x, y) = (point.x, point.y);
        self.a * x * x + self.b * y * y + self.c * x + self.d * y + self.e
    }

    /// Intersects the ray from `point` along `(azim, polar)` with the cylinder.
    ///
    /// The projected line is solved as a quadratic. Roots that do not lie in
    /// the travel direction of the ray are discarded, so 0, 1 or 2 points
    /// come back. A zero discriminant yields a single tangent point.
    #[must_use]
    pub fn intersection(&self, point: &Point3, azim: f64, polar: f64) -> Hits {
        let (x0, y0) = (point.x, point.y);
        let mut hits = Hits::new();

        let vertical = (azim - FRAC_PI_2).abs() < TOLERANCE
            || (azim - 3.0 * FRAC_PI_2).abs() < TOLERANCE;

        // Roots as (x, y) pairs on the projected line.
        let mut roots: [(f64, f64); 2] = [(0.0, 0.0); 2];
        let num_roots;

        if vertical {
            // x stays at x0: B*y^2 + D*y + (A*x0^2 + C*x0 + E) = 0
            let a = self.b;
            let b = self.d;
            let c = self.a * x0 * x0 + self.c * x0 + self.e;
            let discr = b * b - 4.0 * a * c;

            if discr < 0.0 {
                return hits;
            } else if discr == 0.0 {
                roots[0] = (x0, -b / (2.0 * a));
                num_roots = 1;
            } else {
                let sq = discr.sqrt();
                roots[0] = (x0, (-b + sq) / (2.0 * a));
                roots[1] = (x0, (-b - sq) / (2.0 * a));
                num_roots = 2;
            }
        } else {
            // y = m*x + q substituted into the cylinder equation
            let m = azim.sin() / azim.cos();
            let q = y0 - m * x0;
            let a = self.a + self.b * m * m;
            let b = 2.0 * self.b * m * q + self.c + self.d * m;
            let c = self.b * q * q + self.d * q + self.e;
            let discr = b * b - 4.0 * a * c;

            if discr < 0.0 {
                return hits;
            } else if discr == 0.0 {
                let x = -b / (2.0 * a);
                roots[0] = (x, y0 + m * (x - x0));
                num_roots = 1;
            } else {
                let sq = discr.sqrt();
                let xp = (-b + sq) / (2.0 * a);
                let xm = (-b - sq) / (2.0 * a);
                roots[0] = (xp, y0 + m * (xp - x0));
                roots[1] = (xm, y0 + m * (xm - x0));
                num_roots = 2;
            }
        }

        let rise = (FRAC_PI_2 - polar).tan();
        for &(x, y) in &roots[..num_roots] {
            let planar = ((y - y0).powi(2) + (x - x0).powi(2)).sqrt();
            let hit = Point3::new(x, y, point.z + planar * rise);
            if is_ahead(point, &hit, azim, polar) {
                hits.push(hit);
            }
        }
        hits
    }

    /// Lower x bound of `halfspace`.
    #[must_use]
    pub fn min_x(&self, halfspace: Halfspace) -> f64 {
        match halfspace {
            Halfspace::Negative => self.x0 - self.radius,
            Halfspace::Positive => f64::NEG_INFINITY,
        }
    }

    /// Upper x bound of `halfspace`.
    #[must_use]
    pub fn max_x(&self, halfspace: Halfspace) -> f64 {
        match halfspace {
            Halfspace::Negative => self.x0 + self.radius,
            Halfspace::Positive => f64::INFINITY,
        }
    }

    /// Lower y bound of `halfspace`.
    #[must_use]
    pub fn min_y(&self, halfspace: Halfspace) -> f64 {
        match halfspace {
            Halfspace::Negative => self.y0 - self.radius,
            Halfspace::Positive => f64::NEG_INFINITY,
        }
    }

    /// Upper y bound of `halfspace`.
    #[must_use]
    pub fn max_y(&self, halfspace: Halfspace) -> f64 {
        match halfspace {
            Halfspace::Negative => self.y0 + self.radius,
            Halfspace::Positive => f64::INFINITY,
        }
    }
}

/// Checks that `hit` lies in the travel direction of a ray leaving `origin`.
///
/// The in-plane test compares the y-delta against the azimuthal half-plane
/// (x-delta for rays along the x-axis). The vertical test compares the
/// z-delta against the polar hemisphere; a hit level with the origin on an
/// in-plane ray counts as a match.
fn is_ahead(origin: &Point3, hit: &Point3, azim: f64, polar: f64) -> bool {
    let planar = if azim.sin().abs() < TOLERANCE {
        (hit.x - origin.x) * azim.cos() > 0.0
    } else if azim < PI {
        hit.y > origin.y
    } else {
        hit.y < origin.y
    };

    planar
        && ((hit.z > origin.z && polar < FRAC_PI_2)
            || (hit.z < origin.z && polar > FRAC_PI_2)
            || ((hit.z - origin.z).abs() < TOLERANCE && (polar - FRAC_PI_2).abs() < TOLERANCE))
}

impl fmt::Display for ZCylinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type = ZCYLINDER, A = {}, B = {}, C = {}, D = {}, E = {}, x0 = {}, y0 = {}, radius = {}",
            self.a, self.b, self.c, self.d, self.e, self.x0, self.y0, self.radius
        )
    }
}
