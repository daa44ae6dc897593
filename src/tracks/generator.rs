use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, info_span, warn};

use crate::error::{GeometryError, MocError, Result, TrackError};
use crate::geometry::Geometry;
use crate::math::{Point3, Vector3};
use crate::quadrature::Quadrature;

use super::cache::{self, CacheSignature};
use super::cycles::{self, CycleStats};
use super::layout::{self, AzimLayout};
use super::segmentize::{self, FsrTally};
use super::{Track, TrackLink, TrackSettings};

/// Progress of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Uninitialized,
    TracksLaidOut,
    CyclesLinked,
    Segmented,
    LoadedFromCache,
}

/// Lays out, links and segments 2D cyclic tracks over a geometry.
///
/// The generator borrows the geometry and owns its copy of the quadrature
/// and settings. [`generate_tracks`](Self::generate_tracks) runs the whole
/// pipeline; the individual stages are public for callers that need to
/// inspect intermediate state.
#[derive(Debug)]
pub struct TrackGenerator<'g> {
    geometry: &'g Geometry,
    quadrature: Quadrature,
    settings: TrackSettings,
    pool: ThreadPool,
    state: GenerationState,
    recalibrated: bool,
    linked: bool,
    periodic: bool,
    layouts: Vec<AzimLayout>,
    tracks: Vec<Vec<Track>>,
    cycles: Vec<CycleStats>,
    num_cycles: usize,
    cycle_trains: Vec<Vec<Vec<TrackLink>>>,
    uid_order: Vec<(usize, usize)>,
    group_bounds: Vec<usize>,
    fsr_volumes: Vec<f64>,
    fsr_centroids: Vec<Point3>,
}

impl<'g> TrackGenerator<'g> {
    /// Creates a generator using the quadrature described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid.
    pub fn new(geometry: &'g Geometry, settings: TrackSettings) -> Result<Self> {
        settings.validate()?;
        let quadrature = settings.build_quadrature()?;
        Self::with_quadrature(geometry, quadrature, settings)
    }

    /// Creates a generator with an externally built quadrature.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid, their angle counts
    /// disagree with `quadrature`, or the thread pool cannot be built.
    pub fn with_quadrature(
        geometry: &'g Geometry,
        quadrature: Quadrature,
        settings: TrackSettings,
    ) -> Result<Self> {
        settings.validate()?;
        if quadrature.num_azim() != settings.num_azim {
            return Err(TrackError::InvalidAzimCount(quadrature.num_azim()).into());
        }
        if quadrature.num_polar() != settings.num_polar {
            return Err(TrackError::InvalidPolar(format!(
                "quadrature has {} polar angles, settings ask for {}",
                quadrature.num_polar(),
                settings.num_polar
            ))
            .into());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.num_threads)
            .build()
            .map_err(|_| TrackError::InvalidThreads(settings.num_threads))?;

        Ok(Self {
            geometry,
            quadrature,
            settings,
            pool,
            state: GenerationState::Uninitialized,
            recalibrated: false,
            linked: false,
            periodic: false,
            layouts: Vec::new(),
            tracks: Vec::new(),
            cycles: Vec::new(),
            num_cycles: 0,
            cycle_trains: Vec::new(),
            uid_order: Vec::new(),
            group_bounds: vec![0],
            fsr_volumes: Vec::new(),
            fsr_centroids: Vec::new(),
        })
    }

    // --- Pipeline ---

    /// Runs every stage: layout, recalibration, boundary checks, linking,
    /// cycle bookkeeping, grouping, weights, then segmentation or a cache
    /// load, optional splitting, FSR centroids and an optional cache dump.
    ///
    /// An unusable cache falls back to segmentation with a warning; a
    /// cache written for another configuration is an error.
    ///
    /// # Errors
    ///
    /// Returns the first error of any stage.
    pub fn generate_tracks(&mut self) -> Result<()> {
        let _span = info_span!("generate_tracks").entered();
        self.initialize_tracks()?;
        self.recalibrate_tracks_to_origin()?;
        self.check_boundary_conditions();
        self.initialize_track_reflections()?;
        self.initialize_track_cycles()?;
        self.initialize_track_cycle_ids()?;
        self.initialize_track_periodic_indices()?;
        self.set_total_weights()?;

        let mut loaded = false;
        if self.settings.use_input_file {
            match self.read_segments_from_file() {
                Ok(()) => loaded = true,
                Err(MocError::Cache(err)) if err.is_recoverable() => {
                    warn!(%err, "cannot use track cache, segmenting");
                }
                Err(err) => return Err(err),
            }
        }
        if !loaded {
            self.segmentize()?;
        }
        if let Some(max) = self.settings.max_optical_length {
            self.split_segments(max)?;
        }
        self.generate_fsr_centroids()?;
        if self.settings.dump_segments && !loaded {
            if let Err(err) = self.dump_segments_to_file() {
                warn!(%err, "cannot write track cache");
            }
        }

        info!(
            num_tracks = self.num_tracks(),
            num_segments = self.num_segments(),
            num_fsrs = self.fsr_volumes.len(),
            "track generation complete"
        );
        Ok(())
    }

    /// Computes the corrected layout of every azimuthal angle and lays out
    /// the tracks in domain-local coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the domain has no extent in x or y.
    pub fn initialize_tracks(&mut self) -> Result<()> {
        let _span = info_span!("initialize_tracks").entered();
        let (width_x, width_y) = (self.geometry.width_x(), self.geometry.width_y());
        if width_x <= 0.0 || width_y <= 0.0 {
            let shape = format!("domain is {width_x} by {width_y}");
            return Err(GeometryError::Degenerate(shape).into());
        }
        let spacing = self.settings.azim_spacing;
        self.layouts = layout::compute_layouts(&self.quadrature, width_x, width_y, spacing);
        self.tracks = layout::lay_out_tracks(&self.layouts, width_x, width_y);
        self.recalibrated = false;
        self.linked = false;
        self.state = GenerationState::TracksLaidOut;
        for (a, l) in self.layouts.iter().enumerate() {
            debug!(
                azim = a,
                phi = l.phi,
                num_x = l.num_x,
                num_y = l.num_y,
                spacing = l.spacing,
                "azimuthal layout"
            );
        }
        info!(num_tracks = self.num_tracks(), "tracks laid out");
        Ok(())
    }

    /// Moves tracks from domain-local coordinates onto the geometry, at
    /// height `z_coord`. Calling it again has no effect.
    ///
    /// # Errors
    ///
    /// Returns an error if tracks have not been laid out.
    pub fn recalibrate_tracks_to_origin(&mut self) -> Result<()> {
        self.require(self.contains_tracks(), "recalibrate tracks", "laying out tracks")?;
        if !self.recalibrated {
            let offset = Vector3::new(
                self.geometry.min_x(),
                self.geometry.min_y(),
                self.settings.z_coord,
            );
            layout::translate_tracks(&mut self.tracks, &offset);
            self.recalibrated = true;
        }
        Ok(())
    }

    /// Records whether the geometry is periodic.
    ///
    /// [`Geometry::new`] has already rejected periodic sides facing
    /// non-periodic ones.
    pub fn check_boundary_conditions(&mut self) {
        self.periodic = self.geometry.is_periodic();
    }

    /// Links both ends of every track to their successors.
    ///
    /// # Errors
    ///
    /// Returns an error if tracks have not been laid out.
    pub fn initialize_track_reflections(&mut self) -> Result<()> {
        self.require(self.contains_tracks(), "link tracks", "laying out tracks")?;
        cycles::link_tracks(&mut self.tracks, &self.layouts, self.geometry);
        self.linked = true;
        Ok(())
    }

    /// Computes tracks per cycle, cycles per angle and cycle lengths.
    ///
    /// # Errors
    ///
    /// Returns an error before linking, or if a cycle does not close.
    pub fn initialize_track_cycles(&mut self) -> Result<()> {
        self.require(self.linked, "follow cycles", "linking tracks")?;
        let _span = info_span!("initialize_track_cycles").entered();
        self.cycles = cycles::cycle_stats(&self.tracks)?;
        self.state = GenerationState::CyclesLinked;
        for (a, c) in self.cycles.iter().enumerate() {
            debug!(
                azim = a,
                tracks_per_cycle = c.tracks_per_cycle,
                cycles = c.cycles_per_azim,
                length = c.cycle_length,
                "cycle bookkeeping"
            );
        }
        Ok(())
    }

    /// Labels every track with the id of its connected cycle, and of the
    /// groups joined by periodic and by reflective links alone, then orders
    /// each cycle's tracks into a train.
    ///
    /// # Errors
    ///
    /// Returns an error before linking, or if a cycle does not close.
    pub fn initialize_track_cycle_ids(&mut self) -> Result<()> {
        self.require(self.linked, "assign cycle ids", "linking tracks")?;
        self.num_cycles = cycles::assign_cycle_ids(&mut self.tracks);
        let (num_periodic, num_reflective) = cycles::assign_boundary_cycle_ids(&mut self.tracks);
        self.cycle_trains = cycles::cycle_trains(&self.tracks)?;
        debug!(
            num_cycles = self.num_cycles,
            num_periodic,
            num_reflective,
            "cycle ids assigned"
        );
        Ok(())
    }

    /// Numbers tracks along periodic chains, then sorts them into parallel
    /// groups and assigns uids in sweep order.
    ///
    /// # Errors
    ///
    /// Returns an error before linking.
    pub fn initialize_track_periodic_indices(&mut self) -> Result<()> {
        self.require(self.linked, "assign periodic indices", "linking tracks")?;
        cycles::assign_periodic_indices(&mut self.tracks);
        self.initialize_tracks_array();
        Ok(())
    }

    fn initialize_tracks_array(&mut self) {
        let (order, bounds) = cycles::assign_parallel_groups(&mut self.tracks, self.periodic);
        self.uid_order = order;
        self.group_bounds = bounds;
        debug!(num_groups = self.num_parallel_track_groups(), "parallel groups built");
    }

    /// Sets each track's weight per polar angle to azimuthal weight times
    /// spacing times polar weight.
    ///
    /// # Errors
    ///
    /// Returns an error if tracks have not been laid out.
    pub fn set_total_weights(&mut self) -> Result<()> {
        self.require(self.contains_tracks(), "set track weights", "laying out tracks")?;
        let polar_weights = self.quadrature.polar_weights();
        for (angle, l) in self.tracks.iter_mut().zip(&self.layouts) {
            let base = l.weight * l.spacing;
            for track in angle.iter_mut() {
                track.total_weights = polar_weights.iter().map(|w| base * w).collect();
            }
        }
        Ok(())
    }

    /// Cuts every track into segments in parallel and tallies FSR volumes.
    ///
    /// Either every track is segmented or none keeps new segments.
    ///
    /// # Errors
    ///
    /// Returns an error before cycles are linked or if any track crosses a
    /// point outside every cell.
    pub fn segmentize(&mut self) -> Result<()> {
        self.require(self.cycles_linked(), "segmentize", "linking track cycles")?;
        let _span = info_span!("segmentize").entered();
        let geometry = self.geometry;
        let tracks = &self.tracks;
        let segments: Vec<Vec<Vec<_>>> = self.pool.install(|| {
            tracks
                .par_iter()
                .map(|angle| {
                    angle
                        .par_iter()
                        .map(|track| segmentize::segmentize_track(geometry, track))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()
        })?;

        for (angle, angle_segments) in self.tracks.iter_mut().zip(segments) {
            for (track, track_segments) in angle.iter_mut().zip(angle_segments) {
                track.segments = track_segments;
            }
        }
        self.tally_volumes();
        self.state = GenerationState::Segmented;
        info!(num_segments = self.num_segments(), "tracks segmented");
        Ok(())
    }

    /// Splits every segment longer than `max_optical_length` optically.
    ///
    /// # Errors
    ///
    /// Returns an error if the bound is not positive or tracks have no
    /// segments yet.
    pub fn split_segments(&mut self, max_optical_length: f64) -> Result<()> {
        if max_optical_length.is_nan() || max_optical_length <= 0.0 {
            return Err(TrackError::InvalidOpticalLength(max_optical_length).into());
        }
        self.require(self.contains_segments(), "split segments", "segmentation")?;
        let tracks = &mut self.tracks;
        self.pool.install(|| {
            tracks.par_iter_mut().flatten().for_each(|track| {
                track.segments =
                    segmentize::split_track_segments(&track.segments, max_optical_length);
            });
        });
        debug!(max_optical_length, num_segments = self.num_segments(), "segments split");
        Ok(())
    }

    /// Writes the segmented tracks to the cache file.
    ///
    /// # Errors
    ///
    /// Returns an error without segments or if the file cannot be written.
    pub fn dump_segments_to_file(&self) -> Result<()> {
        self.require(self.contains_segments(), "dump segments", "segmentation")?;
        let signature = self.cache_signature();
        cache::dump_segments(&self.cache_path(&signature), &signature, &self.tracks)?;
        Ok(())
    }

    /// Loads segments from the cache file and recomputes FSR volumes.
    ///
    /// # Errors
    ///
    /// Returns an error before cycles are linked, or any cache error.
    pub fn read_segments_from_file(&mut self) -> Result<()> {
        self.require(self.cycles_linked(), "read segments", "linking track cycles")?;
        let signature = self.cache_signature();
        cache::read_segments(&self.cache_path(&signature), &signature, &mut self.tracks)?;
        self.tally_volumes();
        self.state = GenerationState::LoadedFromCache;
        info!(num_segments = self.num_segments(), "segments loaded from cache");
        Ok(())
    }

    /// Path of the cache file for the current configuration.
    #[must_use]
    pub fn cache_file(&self) -> std::path::PathBuf {
        self.cache_path(&self.cache_signature())
    }

    fn cache_signature(&self) -> CacheSignature {
        CacheSignature {
            num_azim: self.quadrature.num_azim(),
            num_polar: self.quadrature.num_polar(),
            azim_spacing: self.settings.azim_spacing,
            z_coord: self.settings.z_coord,
            geometry: self.geometry.signature(),
        }
    }

    fn cache_path(&self, signature: &CacheSignature) -> std::path::PathBuf {
        signature.path_in(&self.settings.tracks_directory)
    }

    fn tally_volumes(&mut self) {
        let tally = FsrTally::new(self.geometry.num_fsrs());
        let tracks = &self.tracks;
        self.pool.install(|| {
            tracks.par_iter().flatten().for_each(|track| tally.add_track(track));
        });
        self.fsr_volumes = tally.into_volumes();
    }

    /// Sums `weight * length * midpoint` over the segments of every FSR and
    /// divides by its volume.
    ///
    /// An FSR that no segment crosses keeps the origin.
    ///
    /// # Errors
    ///
    /// Returns an error before segmentation.
    pub fn generate_fsr_centroids(&mut self) -> Result<()> {
        self.require(self.contains_segments(), "generate FSR centroids", "segmentation")?;
        let num_fsrs = self.fsr_volumes.len();
        let tracks = &self.tracks;
        let moments = self.pool.install(|| {
            tracks
                .par_iter()
                .flatten()
                .fold(
                    || vec![Vector3::zeros(); num_fsrs],
                    |mut moments, track| {
                        let weight = track.volume_weight();
                        let dir = track.direction();
                        let mut travelled = 0.0;
                        for segment in &track.segments {
                            let middle = track.start + dir * (travelled + 0.5 * segment.length);
                            if let Some(moment) = moments.get_mut(segment.fsr) {
                                *moment += middle.coords * (weight * segment.length);
                            }
                            travelled += segment.length;
                        }
                        moments
                    },
                )
                .reduce(
                    || vec![Vector3::zeros(); num_fsrs],
                    |mut total, part| {
                        for (t, p) in total.iter_mut().zip(part) {
                            *t += p;
                        }
                        total
                    },
                )
        });

        self.fsr_centroids = moments
            .into_iter()
            .zip(&self.fsr_volumes)
            .enumerate()
            .map(|(fsr, (moment, &volume))| {
                if volume > 0.0 {
                    Point3::from(moment / volume)
                } else {
                    warn!(fsr, "no segment crosses FSR, centroid left at the origin");
                    Point3::origin()
                }
            })
            .collect();
        debug!(num_fsrs, "FSR centroids generated");
        Ok(())
    }

    /// Copies the FSR volumes into `out`.
    ///
    /// # Errors
    ///
    /// Returns an error before segmentation, or
    /// [`TrackError::FsrCountMismatch`] if `out` does not hold exactly one
    /// entry per FSR.
    pub fn export_fsr_volumes(&self, out: &mut [f64]) -> Result<()> {
        self.require(self.contains_segments(), "export FSR volumes", "segmentation")?;
        if out.len() != self.fsr_volumes.len() {
            return Err(TrackError::FsrCountMismatch {
                expected: self.fsr_volumes.len(),
                found: out.len(),
            }
            .into());
        }
        out.copy_from_slice(&self.fsr_volumes);
        Ok(())
    }

    fn cycles_linked(&self) -> bool {
        !matches!(
            self.state,
            GenerationState::Uninitialized | GenerationState::TracksLaidOut
        )
    }

    fn require(&self, ready: bool, operation: &'static str, required: &'static str) -> Result<()> {
        if ready {
            Ok(())
        } else {
            Err(TrackError::InvalidStage { operation, required }.into())
        }
    }

    /// Runs `f` on every track, one parallel group at a time.
    ///
    /// Tracks of a group run concurrently on the generator's pool; the
    /// next group starts once the previous one has finished.
    pub fn for_each_track_by_group<F>(&self, f: F)
    where
        F: Fn(&Track) + Sync,
    {
        for group in self.group_bounds.windows(2) {
            let uids = &self.uid_order[group[0]..group[1]];
            self.pool.install(|| {
                uids.par_iter().for_each(|&(a, i)| f(&self.tracks[a][i]));
            });
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> GenerationState {
        self.state
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        self.geometry
    }

    #[must_use]
    pub fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    #[must_use]
    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }

    #[must_use]
    pub fn contains_tracks(&self) -> bool {
        self.state != GenerationState::Uninitialized
    }

    #[must_use]
    pub fn contains_segments(&self) -> bool {
        matches!(self.state, GenerationState::Segmented | GenerationState::LoadedFromCache)
    }

    /// Returns `true` if the geometry has periodic sides.
    #[must_use]
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Tracks indexed by azimuthal angle, then by index within the angle.
    #[must_use]
    pub fn tracks(&self) -> &[Vec<Track>] {
        &self.tracks
    }

    #[must_use]
    pub fn track(&self, azim: usize, index: usize) -> Option<&Track> {
        self.tracks.get(azim)?.get(index)
    }

    #[must_use]
    pub fn layouts(&self) -> &[AzimLayout] {
        &self.layouts
    }

    #[must_use]
    pub fn num_x(&self, azim: usize) -> Option<usize> {
        self.layouts.get(azim).map(|l| l.num_x)
    }

    #[must_use]
    pub fn num_y(&self, azim: usize) -> Option<usize> {
        self.layouts.get(azim).map(|l| l.num_y)
    }

    /// Effective azimuthal angle `azim` in `(0, pi)`.
    #[must_use]
    pub fn phi(&self, azim: usize) -> Option<f64> {
        self.layouts.get(azim).map(|l| l.phi)
    }

    /// Spacing actually used by angle `azim`.
    #[must_use]
    pub fn azim_spacing(&self, azim: usize) -> Option<f64> {
        self.layouts.get(azim).map(|l| l.spacing)
    }

    #[must_use]
    pub fn azim_weight(&self, azim: usize) -> Option<f64> {
        self.layouts.get(azim).map(|l| l.weight)
    }

    #[must_use]
    pub fn tracks_per_cycle(&self, azim: usize) -> Option<usize> {
        self.cycles.get(azim).map(|c| c.tracks_per_cycle)
    }

    #[must_use]
    pub fn cycles_per_azim(&self, azim: usize) -> Option<usize> {
        self.cycles.get(azim).map(|c| c.cycles_per_azim)
    }

    #[must_use]
    pub fn cycle_length(&self, azim: usize) -> Option<f64> {
        self.cycles.get(azim).map(|c| c.cycle_length)
    }

    /// Number of connected track cycles over all angles.
    #[must_use]
    pub fn num_cycles(&self) -> usize {
        self.num_cycles
    }

    #[must_use]
    pub fn num_tracks(&self) -> usize {
        self.tracks.iter().map(Vec::len).sum()
    }

    #[must_use]
    pub fn num_segments(&self) -> usize {
        self.tracks.iter().flatten().map(|t| t.segments.len()).sum()
    }

    /// Largest segment count of a single track.
    #[must_use]
    pub fn max_num_segments(&self) -> usize {
        self.tracks.iter().flatten().map(|t| t.segments.len()).max().unwrap_or(0)
    }

    #[must_use]
    pub fn fsr_volume(&self, fsr: usize) -> Option<f64> {
        self.fsr_volumes.get(fsr).copied()
    }

    #[must_use]
    pub fn fsr_volumes(&self) -> &[f64] {
        &self.fsr_volumes
    }

    #[must_use]
    pub fn fsr_centroid(&self, fsr: usize) -> Option<Point3> {
        self.fsr_centroids.get(fsr).copied()
    }

    #[must_use]
    pub fn fsr_centroids(&self) -> &[Point3] {
        &self.fsr_centroids
    }

    /// Tracks of cycle `cycle` through angle `azim`, in traversal order.
    #[must_use]
    pub fn cycle_train(&self, azim: usize, cycle: usize) -> Option<&[TrackLink]> {
        self.cycle_trains.get(azim)?.get(cycle).map(Vec::as_slice)
    }

    /// Track at position `train_index` of a cycle.
    #[must_use]
    pub fn cycle_track(&self, azim: usize, cycle: usize, train_index: usize) -> Option<&Track> {
        let link = self.cycle_train(azim, cycle)?.get(train_index)?;
        self.track(link.azim, link.track)
    }

    /// Whether the track at `train_index` of a cycle is traversed from
    /// start to end.
    #[must_use]
    pub fn cycle_direction(&self, azim: usize, cycle: usize, train_index: usize) -> Option<bool> {
        Some(self.cycle_train(azim, cycle)?.get(train_index)?.forward)
    }

    #[must_use]
    pub fn num_parallel_track_groups(&self) -> usize {
        self.group_bounds.len() - 1
    }

    /// Cumulative track counts per group: group `g` holds uids
    /// `bounds[g]..bounds[g + 1]`.
    #[must_use]
    pub fn tracks_by_parallel_group(&self) -> &[usize] {
        &self.group_bounds
    }

    #[must_use]
    pub fn track_by_uid(&self, uid: usize) -> Option<&Track> {
        let &(a, i) = self.uid_order.get(uid)?;
        self.track(a, i)
    }

    /// Start and end coordinates of every track in uid order.
    #[must_use]
    pub fn retrieve_track_coords(&self) -> Vec<[f64; 6]> {
        self.tracks_in_uid_order().map(endpoints).collect()
    }

    /// Track coordinates in uid order, each with the id of its group of
    /// periodically linked tracks.
    #[must_use]
    pub fn retrieve_periodic_cycle_coords(&self) -> Vec<([f64; 6], usize)> {
        self.tracks_in_uid_order()
            .map(|t| (endpoints(t), t.periodic_cycle_id))
            .collect()
    }

    /// Track coordinates in uid order, each with the id of its group of
    /// reflectively linked tracks.
    #[must_use]
    pub fn retrieve_reflective_cycle_coords(&self) -> Vec<([f64; 6], usize)> {
        self.tracks_in_uid_order()
            .map(|t| (endpoints(t), t.reflective_cycle_id))
            .collect()
    }

    /// Start and end coordinates of every segment, tracks in uid order.
    #[must_use]
    pub fn retrieve_segment_coords(&self) -> Vec<[f64; 6]> {
        let mut coords = Vec::with_capacity(self.num_segments());
        for track in self.tracks_in_uid_order() {
            let dir = track.direction();
            let mut point = track.start;
            for segment in &track.segments {
                let next = point + dir * segment.length;
                coords.push([point.x, point.y, point.z, next.x, next.y, next.z]);
                point = next;
            }
        }
        coords
    }

    /// Largest optical length of any segment.
    #[must_use]
    pub fn retrieve_max_optical_length(&self) -> f64 {
        self.tracks
            .iter()
            .flatten()
            .flat_map(|t| &t.segments)
            .map(|s| s.optical_length)
            .fold(0.0, f64::max)
    }

    fn tracks_in_uid_order(&self) -> impl Iterator<Item = &Track> {
        self.uid_order.iter().filter_map(|&(a, i)| self.track(a, i))
    }
}

fn endpoints(track: &Track) -> [f64; 6] {
    let (s, e) = (track.start, track.end);
    [s.x, s.y, s.z, e.x, e.y, e.z]
}
