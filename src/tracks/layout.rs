use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::geometry::BoundarySide;
use crate::math::{Point3, Vector3};
use crate::quadrature::Quadrature;

use super::Track;

/// Corrected layout of one azimuthal angle in `[0, pi)`.
///
/// Entry points are evenly spaced `dx` apart along the x sides and `dy`
/// apart along the y sides, so `num_x + num_y` tracks tile the domain and
/// every boundary crossing lands on another track's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AzimLayout {
    /// Effective angle, `atan(dy / dx)` or its complement.
    pub phi: f64,
    /// Tracks entering through a y side (crossing the x axis).
    pub num_x: usize,
    /// Tracks entering through an x side (crossing the y axis).
    pub num_y: usize,
    pub dx: f64,
    pub dy: f64,
    /// Perpendicular distance between neighboring tracks.
    pub spacing: f64,
    /// Fraction of `[0, pi)` this angle represents.
    pub weight: f64,
}

impl AzimLayout {
    #[must_use]
    pub fn num_tracks(&self) -> usize {
        self.num_x + self.num_y
    }
}

/// Corrects the quadrature's azimuthal angles so tracks tile a
/// `width_x` by `width_y` domain at roughly `spacing`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn compute_layouts(
    quadrature: &Quadrature,
    width_x: f64,
    width_y: f64,
    spacing: f64,
) -> Vec<AzimLayout> {
    let half = quadrature.num_azim() / 2;
    let quarter = half / 2;
    let mut layouts = vec![
        AzimLayout {
            phi: 0.0,
            num_x: 0,
            num_y: 0,
            dx: 0.0,
            dy: 0.0,
            spacing: 0.0,
            weight: 0.0,
        };
        half
    ];

    for a in 0..quarter {
        let requested = quadrature.azim_angle(a);
        let num_x = (width_x / spacing * requested.sin()).abs().floor() as usize + 1;
        let num_y = (width_y / spacing * requested.cos()).abs().floor() as usize + 1;
        let phi = ((width_y * num_x as f64) / (width_x * num_y as f64)).atan();
        let dx = width_x / num_x as f64;
        let dy = width_y / num_y as f64;
        let layout = AzimLayout {
            phi,
            num_x,
            num_y,
            dx,
            dy,
            spacing: dx * phi.sin(),
            weight: 0.0,
        };
        layouts[a] = layout;
        layouts[half - a - 1] = AzimLayout {
            phi: PI - phi,
            ..layout
        };
    }

    for a in 0..quarter {
        let lower = if a == 0 {
            0.0
        } else {
            0.5 * (layouts[a].phi + layouts[a - 1].phi)
        };
        let upper = if a + 1 == quarter {
            FRAC_PI_2
        } else {
            0.5 * (layouts[a + 1].phi + layouts[a].phi)
        };
        let weight = (upper - lower) / PI;
        layouts[a].weight = weight;
        layouts[half - a - 1].weight = weight;
    }
    layouts
}

/// Lays out the tracks of every angle in domain-local coordinates,
/// `[0, width_x] x [0, width_y]`.
///
/// For angles below `pi/2`, track `i` starts on the bottom side for
/// `i < num_x` (right to left) and on the left side otherwise (bottom to
/// top). Angles above `pi/2` mirror this from the bottom-left corner.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn lay_out_tracks(
    layouts: &[AzimLayout],
    width_x: f64,
    width_y: f64,
) -> Vec<Vec<Track>> {
    let quarter = layouts.len() / 2;
    layouts
        .iter()
        .enumerate()
        .map(|(a, l)| {
            let (nx, ny) = (l.num_x, l.num_y);
            (0..l.num_tracks())
                .map(|i| {
                    let mut track = Track::new(a, i, l.phi);
                    let fi = i as f64;
                    let (nxf, nyf) = (nx as f64, ny as f64);
                    if a < quarter {
                        (track.start, track.start_side) = if i < nx {
                            (Point3::new(l.dx * (nxf - fi - 0.5), 0.0, 0.0), BoundarySide::MinY)
                        } else {
                            (Point3::new(0.0, l.dy * (fi - nxf + 0.5), 0.0), BoundarySide::MinX)
                        };
                        (track.end, track.end_side) = if i < ny {
                            (Point3::new(width_x, l.dy * (fi + 0.5), 0.0), BoundarySide::MaxX)
                        } else {
                            let x = l.dx * (nxf + nyf - fi - 0.5);
                            (Point3::new(x, width_y, 0.0), BoundarySide::MaxY)
                        };
                    } else {
                        (track.start, track.start_side) = if i < nx {
                            (Point3::new(l.dx * (fi + 0.5), 0.0, 0.0), BoundarySide::MinY)
                        } else {
                            (Point3::new(width_x, l.dy * (fi - nxf + 0.5), 0.0), BoundarySide::MaxX)
                        };
                        (track.end, track.end_side) = if i < ny {
                            (Point3::new(0.0, l.dy * (fi + 0.5), 0.0), BoundarySide::MinX)
                        } else {
                            (Point3::new(l.dx * (fi + 0.5 - nyf), width_y, 0.0), BoundarySide::MaxY)
                        };
                    }
                    track
                })
                .collect()
        })
        .collect()
}

/// Moves every endpoint by `offset`.
pub(crate) fn translate_tracks(tracks: &mut [Vec<Track>], offset: &Vector3) {
    for track in tracks.iter_mut().flatten() {
        track.start += offset;
        track.end += offset;
    }
}
