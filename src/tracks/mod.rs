//! Cyclic track generation over a finalized [`Geometry`](crate::geometry::Geometry).
//!
//! Tracks are laid out per azimuthal angle in `[0, pi)`, linked at the
//! domain boundary into reflective or periodic cycles, then cut into
//! segments, one per flat source region crossed.

pub mod cache;
mod cycles;
pub mod generator;
mod layout;
mod segmentize;
pub mod settings;

pub use cycles::CycleStats;
pub use generator::{GenerationState, TrackGenerator};
pub use layout::AzimLayout;
pub use segmentize::FsrTally;
pub use settings::TrackSettings;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundarySide, BoundaryType};
use crate::math::{direction, Point3, Vector3};

/// Successor of a track end: the track entered next, and whether it is
/// traversed from start to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackLink {
    pub azim: usize,
    pub track: usize,
    pub forward: bool,
}

/// A piece of a track lying inside one flat source region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub length: f64,
    pub fsr: usize,
    /// User id of the material filling the region.
    pub material_id: i32,
    /// `length` times the largest total cross section of the material.
    pub optical_length: f64,
}

/// A 2D track between two sides of the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Position in the sweep order, contiguous within a parallel group.
    pub uid: usize,
    pub azim: usize,
    /// Index among the tracks of `azim`.
    pub index: usize,
    /// Effective azimuthal angle in `(0, pi)`.
    pub phi: f64,
    pub start: Point3,
    pub end: Point3,
    pub start_side: BoundarySide,
    pub end_side: BoundarySide,
    pub bc_start: BoundaryType,
    pub bc_end: BoundaryType,
    /// Track entered when leaving through `end`.
    pub next_fwd: Option<TrackLink>,
    /// Track entered when leaving through `start` in reverse.
    pub next_bwd: Option<TrackLink>,
    pub cycle_id: usize,
    /// Group of tracks joined by periodic links alone.
    pub periodic_cycle_id: usize,
    /// Group of tracks joined by reflective links alone.
    pub reflective_cycle_id: usize,
    /// Position along a chain of periodic links, `0` at the chain head.
    pub periodic_index: usize,
    pub parallel_group: usize,
    /// Azimuthal weight times spacing times polar weight, per polar angle.
    pub total_weights: Vec<f64>,
    pub segments: Vec<Segment>,
}

impl Track {
    pub(crate) fn new(azim: usize, index: usize, phi: f64) -> Self {
        Self {
            uid: 0,
            azim,
            index,
            phi,
            start: Point3::origin(),
            end: Point3::origin(),
            start_side: BoundarySide::MinY,
            end_side: BoundarySide::MaxY,
            bc_start: BoundaryType::Vacuum,
            bc_end: BoundaryType::Vacuum,
            next_fwd: None,
            next_bwd: None,
            cycle_id: 0,
            periodic_cycle_id: 0,
            reflective_cycle_id: 0,
            periodic_index: 0,
            parallel_group: 0,
            total_weights: Vec::new(),
            segments: Vec::new(),
        }
    }

    /// Geometric length between the endpoints.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit direction from `start` to `end`.
    #[must_use]
    pub fn direction(&self) -> Vector3 {
        direction(self.phi, std::f64::consts::FRAC_PI_2)
    }

    /// Weight applied to a unit of segment length in the FSR volume tally.
    #[must_use]
    pub fn volume_weight(&self) -> f64 {
        self.total_weights.iter().sum()
    }

    /// Successor when leaving in the given direction.
    #[must_use]
    pub fn next(&self, forward: bool) -> Option<TrackLink> {
        if forward {
            self.next_fwd
        } else {
            self.next_bwd
        }
    }
}
