//! On-disk cache of segmented tracks.
//!
//! The cache is a JSON document holding a signature of everything the
//! segments depend on, followed by the endpoints, boundary conditions and
//! segments of every track.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::CacheError;
use crate::geometry::BoundaryType;
use crate::math::{Point3, TOLERANCE};

use super::{Segment, Track};

/// Everything cached segments depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSignature {
    pub num_azim: usize,
    pub num_polar: usize,
    pub azim_spacing: f64,
    pub z_coord: f64,
    pub geometry: String,
}

impl CacheSignature {
    /// Cache file name for this signature.
    ///
    /// The geometry enters as an xxh3 digest, which is the same on every
    /// platform and toolchain.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{:016x}_{}_azim_{}_polar_{}_cm_spacing_z_{}.tracks.json",
            xxh3_64(self.geometry.as_bytes()),
            self.num_azim,
            self.num_polar,
            self.azim_spacing,
            self.z_coord
        )
    }

    /// Full path of the cache file inside `directory`.
    #[must_use]
    pub fn path_in(&self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CachedTrack {
    azim: usize,
    index: usize,
    phi: f64,
    start: Point3,
    end: Point3,
    bc_start: BoundaryType,
    bc_end: BoundaryType,
    segments: Vec<Segment>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    signature: CacheSignature,
    num_tracks: usize,
    tracks: Vec<CachedTrack>,
}

/// Writes the segments of `tracks` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn dump_segments(
    path: &Path,
    signature: &CacheSignature,
    tracks: &[Vec<Track>],
) -> Result<(), CacheError> {
    let _span = info_span!("dump_segments", path = %path.display()).entered();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let cached: Vec<CachedTrack> = tracks
        .iter()
        .flatten()
        .map(|t| CachedTrack {
            azim: t.azim,
            index: t.index,
            phi: t.phi,
            start: t.start,
            end: t.end,
            bc_start: t.bc_start,
            bc_end: t.bc_end,
            segments: t.segments.clone(),
        })
        .collect();
    let document = CacheFile {
        signature: signature.clone(),
        num_tracks: cached.len(),
        tracks: cached,
    };

    {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &document)?;
        writer.flush()?;
    }
    debug!(num_tracks = document.num_tracks, "track cache written");
    Ok(())
}

/// Reads cached segments from `path` into already laid out `tracks`.
///
/// Every laid out track must appear exactly once, at the same endpoints.
/// Nothing is modified unless the whole file is valid.
///
/// # Errors
///
/// Returns [`CacheError::SignatureMismatch`] if the file was written for a
/// different configuration. Entries that do not match the layout one to one
/// give [`CacheError::UnknownTrack`], [`CacheError::DuplicateTrack`],
/// [`CacheError::EndpointMismatch`] or [`CacheError::TrackCountMismatch`].
/// I/O and format errors are passed through.
pub fn read_segments(
    path: &Path,
    signature: &CacheSignature,
    tracks: &mut [Vec<Track>],
) -> Result<(), CacheError> {
    let _span = info_span!("read_segments", path = %path.display()).entered();
    let document: CacheFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;

    if document.signature != *signature {
        return Err(CacheError::SignatureMismatch {
            expected: format!("{signature:?}"),
            found: format!("{:?}", document.signature),
        });
    }

    let mut filled: Vec<Vec<bool>> = tracks.iter().map(|t| vec![false; t.len()]).collect();
    for cached in &document.tracks {
        let (azim, index) = (cached.azim, cached.index);
        let slot = filled
            .get_mut(azim)
            .and_then(|angle| angle.get_mut(index))
            .ok_or(CacheError::UnknownTrack { azim, index })?;
        if *slot {
            return Err(CacheError::DuplicateTrack { azim, index });
        }
        *slot = true;

        let track = &tracks[azim][index];
        let moved = (track.start - cached.start).norm() > TOLERANCE
            || (track.end - cached.end).norm() > TOLERANCE;
        if moved {
            return Err(CacheError::EndpointMismatch { azim, index });
        }
    }
    for (azim, angle) in filled.iter().enumerate() {
        let found = angle.iter().filter(|&&f| f).count();
        if found != angle.len() {
            return Err(CacheError::TrackCountMismatch {
                azim,
                expected: angle.len(),
                found,
            });
        }
    }

    for cached in document.tracks {
        tracks[cached.azim][cached.index].segments = cached.segments;
    }
    debug!(num_tracks = document.num_tracks, "track cache loaded");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::env;

    fn signature() -> CacheSignature {
        CacheSignature {
            num_azim: 4,
            num_polar: 1,
            azim_spacing: 0.1,
            z_coord: 0.0,
            geometry: "box".into(),
        }
    }

    fn tracks() -> Vec<Vec<Track>> {
        let mut track = Track::new(0, 0, 0.3);
        track.end = Point3::new(1.0, 0.1 / 3.0, 0.0);
        track.segments = vec![Segment {
            length: 0.1 + 0.2,
            fsr: 3,
            material_id: 7,
            optical_length: 0.7 / 3.0,
        }];
        vec![vec![track], vec![Track::new(1, 0, 2.8)]]
    }

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir()
            .join(format!("moctrack-cache-{}-{name}", std::process::id()))
            .join(signature().file_name())
    }

    #[test]
    fn segments_survive_a_round_trip() {
        let path = temp_path("round-trip");
        let original = tracks();
        dump_segments(&path, &signature(), &original).unwrap();

        let mut loaded = tracks();
        for t in loaded.iter_mut().flatten() {
            t.segments.clear();
        }
        read_segments(&path, &signature(), &mut loaded).unwrap();
        assert_eq!(loaded, original);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn other_signature_is_rejected() {
        let path = temp_path("signature");
        dump_segments(&path, &signature(), &tracks()).unwrap();

        let other = CacheSignature {
            azim_spacing: 0.05,
            ..signature()
        };
        let err = read_segments(&path, &other, &mut tracks()).unwrap_err();
        assert!(matches!(err, CacheError::SignatureMismatch { .. }));
        assert!(!err.is_recoverable());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn layout_change_is_recoverable() {
        let path = temp_path("layout");
        dump_segments(&path, &signature(), &tracks()).unwrap();

        let mut more = tracks();
        more[1].push(Track::new(1, 1, 2.8));
        let err = read_segments(&path, &signature(), &mut more).unwrap_err();
        assert!(matches!(err, CacheError::TrackCountMismatch { azim: 1, .. }));
        assert!(err.is_recoverable());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn repeated_entry_is_rejected() {
        let path = temp_path("repeated");
        let mut pair = tracks();
        let second = Track::new(0, 1, 0.3);
        pair[0].push(second);
        dump_segments(&path, &signature(), &pair).unwrap();

        let mut document: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        document["tracks"][1] = document["tracks"][0].clone();
        fs::write(&path, document.to_string()).unwrap();

        let mut loaded = pair.clone();
        for t in loaded.iter_mut().flatten() {
            t.segments.clear();
        }
        let err = read_segments(&path, &signature(), &mut loaded).unwrap_err();
        assert!(matches!(err, CacheError::DuplicateTrack { azim: 0, index: 0 }));
        assert!(err.is_recoverable());
        assert!(loaded.iter().flatten().all(|t| t.segments.is_empty()));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn moved_or_unknown_tracks_are_rejected() {
        let path = temp_path("moved");
        dump_segments(&path, &signature(), &tracks()).unwrap();

        let mut moved = tracks();
        moved[0][0].start.x += 0.5;
        let err = read_segments(&path, &signature(), &mut moved).unwrap_err();
        assert!(matches!(err, CacheError::EndpointMismatch { azim: 0, index: 0 }));

        let mut fewer = tracks();
        fewer[1].clear();
        let err = read_segments(&path, &signature(), &mut fewer).unwrap_err();
        assert!(matches!(err, CacheError::UnknownTrack { azim: 1, index: 0 }));
        assert!(err.is_recoverable());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_name_is_stable() {
        let name = signature().file_name();
        assert_eq!(name, signature().file_name());
        assert!(name.starts_with(&format!("{:016x}_", xxh3_64(b"box"))));
        assert!(name.ends_with("_4_azim_1_polar_0.1_cm_spacing_z_0.tracks.json"));
    }

    #[test]
    fn missing_file_is_recoverable() {
        let err = read_segments(&temp_path("missing"), &signature(), &mut tracks()).unwrap_err();
        assert!(matches!(err, CacheError::Io(_)));
        assert!(err.is_recoverable());
    }
}
