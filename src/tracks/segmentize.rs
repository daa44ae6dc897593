use std::f64::consts::FRAC_PI_2;

use parking_lot::Mutex;

use crate::error::{GeometryError, Result, TrackError};
use crate::geometry::Geometry;
use crate::math::TINY_MOVE;

use super::{Segment, Track};

/// Per-FSR accumulator shared between segmentation workers.
///
/// Each region has its own lock, held only for a single addition.
#[derive(Debug)]
pub struct FsrTally {
    volumes: Vec<Mutex<f64>>,
}

impl FsrTally {
    #[must_use]
    pub fn new(num_fsrs: usize) -> Self {
        Self {
            volumes: (0..num_fsrs).map(|_| Mutex::new(0.0)).collect(),
        }
    }

    /// Adds `amount` to region `fsr`; out-of-range regions are ignored.
    pub fn add(&self, fsr: usize, amount: f64) {
        if let Some(volume) = self.volumes.get(fsr) {
            *volume.lock() += amount;
        }
    }

    /// Adds every segment of `track`, weighted by its volume weight.
    pub fn add_track(&self, track: &Track) {
        let weight = track.volume_weight();
        for segment in &track.segments {
            self.add(segment.fsr, segment.length * weight);
        }
    }

    #[must_use]
    pub fn into_volumes(self) -> Vec<f64> {
        self.volumes.into_iter().map(Mutex::into_inner).collect()
    }
}

/// Cuts `track` into one segment per cell crossing.
///
/// Each step nudges off the last crossing, finds the cell ahead, and moves
/// to the nearest surface of that cell. The final segment takes whatever
/// length remains, so the segments add up to the track length.
///
/// A nudged point can still sit on a surface when the track grazes it, and
/// then it counts as inside both cells. The cell is confirmed at the middle
/// of the step and looked up again there if it does not contain it.
///
/// # Errors
///
/// Returns [`TrackError::GeometryGap`] if some point of the track lies in
/// no cell.
pub(crate) fn segmentize_track(geometry: &Geometry, track: &Track) -> Result<Vec<Segment>> {
    let total = track.length();
    let dir = track.direction();
    let mut segments = Vec::new();
    let mut travelled = 0.0;
    let mut previous = None;

    while total - travelled > TINY_MOVE {
        let point = track.start + dir * travelled;
        let ahead = point + dir * TINY_MOVE;
        let Some(mut cell) = geometry.find_next_cell(&ahead, previous)? else {
            return Err(TrackError::GeometryGap {
                azim: track.azim,
                track: track.index,
                x: ahead.x,
                y: ahead.y,
                z: ahead.z,
            }
            .into());
        };

        let remaining = total - travelled;
        let mut step = geometry.distance_to_boundary(&ahead, cell, track.phi, FRAC_PI_2)?;
        let middle = ahead + dir * (0.5 * step.min(remaining));
        if !geometry.cell_contains(cell, &middle)? {
            if let Some(other) = geometry.find_next_cell(&middle, Some(cell))? {
                cell = other;
                step = geometry.distance_to_boundary(&ahead, cell, track.phi, FRAC_PI_2)?;
            }
        }

        let fsr = geometry
            .fsr_of(cell)
            .ok_or_else(|| GeometryError::EntityNotFound("cell has no FSR".into()))?;
        let material = geometry.fsr_material(fsr)?;
        let step = step + TINY_MOVE;
        let length = if step >= remaining - TINY_MOVE { remaining } else { step };

        segments.push(Segment {
            length,
            fsr,
            material_id: material.id,
            optical_length: length * material.max_sigma_t(),
        });
        travelled += length;
        previous = Some(cell);
    }
    Ok(segments)
}

/// Splits segments whose optical length exceeds `max_optical_length` into
/// equal pieces, the last one absorbing rounding.
pub(crate) fn split_track_segments(segments: &[Segment], max_optical_length: f64) -> Vec<Segment> {
    let mut split = Vec::with_capacity(segments.len());
    for segment in segments {
        if segment.optical_length <= max_optical_length {
            split.push(*segment);
            continue;
        }
        let sigma = segment.optical_length / segment.length;
        let pieces = num_pieces(segment.optical_length, max_optical_length);
        #[allow(clippy::cast_precision_loss)]
        let piece = segment.length / pieces as f64;
        let mut left = segment.length;
        for k in 0..pieces {
            let length = if k + 1 == pieces { left } else { piece };
            left -= length;
            split.push(Segment {
                length,
                optical_length: length * sigma,
                ..*segment
            });
        }
    }
    split
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn num_pieces(optical_length: f64, max_optical_length: f64) -> usize {
    ((optical_length / max_optical_length).ceil() as usize).max(1)
}
