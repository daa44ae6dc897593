use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};

/// Polar quadrature families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadratureType {
    /// Tabuchi-Yamamoto optimal set, 1 to 3 polar angles per half space.
    #[default]
    TabuchiYamamoto,
    /// Equally spaced polar angles weighted by the solid angle they span.
    EqualAngle,
}

/// Angular quadrature supplied to the track generator.
///
/// Azimuthal angles span `[0, 2*pi)`; polar angles cover one half space
/// (`(0, pi/2)`) with weights summing to one. The generator copies what it
/// needs and never mutates this set.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrature {
    kind: QuadratureType,
    num_azim: usize,
    sin_thetas: Vec<f64>,
    polar_weights: Vec<f64>,
}

const TY_SIN_THETAS: [&[f64]; 3] = [
    &[0.798_184],
    &[0.363_900, 0.899_900],
    &[0.166_648, 0.537_707, 0.932_954],
];

const TY_WEIGHTS: [&[f64]; 3] = [
    &[1.0],
    &[0.212_854, 0.787_146],
    &[0.046_233, 0.283_619, 0.670_148],
];

impl Quadrature {
    /// Builds a quadrature with `num_azim` azimuthal and `num_polar` polar angles.
    ///
    /// # Errors
    ///
    /// Returns an error if `num_azim` is not a positive multiple of 4, or the
    /// polar count is zero or unsupported by the chosen family.
    pub fn new(kind: QuadratureType, num_azim: usize, num_polar: usize) -> Result<Self> {
        if num_azim == 0 || num_azim % 4 != 0 {
            return Err(TrackError::InvalidAzimCount(num_azim).into());
        }
        if num_polar == 0 {
            let reason = "at least one polar angle is required".into();
            return Err(TrackError::InvalidPolar(reason).into());
        }

        let (sin_thetas, polar_weights) = match kind {
            QuadratureType::TabuchiYamamoto => {
                if num_polar > TY_SIN_THETAS.len() {
                    return Err(TrackError::InvalidPolar(format!(
                        "Tabuchi-Yamamoto supports 1 to 3 polar angles, got {num_polar}"
                    ))
                    .into());
                }
                (
                    TY_SIN_THETAS[num_polar - 1].to_vec(),
                    TY_WEIGHTS[num_polar - 1].to_vec(),
                )
            }
            QuadratureType::EqualAngle => equal_angle(num_polar),
        };

        Ok(Self {
            kind,
            num_azim,
            sin_thetas,
            polar_weights,
        })
    }

    #[must_use]
    pub fn kind(&self) -> QuadratureType {
        self.kind
    }

    /// Number of azimuthal angles in `[0, 2*pi)`.
    #[must_use]
    pub fn num_azim(&self) -> usize {
        self.num_azim
    }

    /// Number of polar angles in one half space.
    #[must_use]
    pub fn num_polar(&self) -> usize {
        self.sin_thetas.len()
    }

    /// Requested azimuthal angle `a`, before any spacing correction.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn azim_angle(&self, a: usize) -> f64 {
        2.0 * PI / self.num_azim as f64 * (0.5 + a as f64)
    }

    #[must_use]
    pub fn polar_weights(&self) -> &[f64] {
        &self.polar_weights
    }
}

#[allow(clippy::cast_precision_loss)]
fn equal_angle(num_polar: usize) -> (Vec<f64>, Vec<f64>) {
    let width = FRAC_PI_2 / num_polar as f64;
    (0..num_polar)
        .map(|p| {
            let lower = width * p as f64;
            let upper = lower + width;
            let theta = 0.5 * (lower + upper);
            // Weight is the fraction of the hemisphere between the cone edges.
            (theta.sin(), lower.cos() - upper.cos())
        })
        .unzip()
}
