use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result, TrackError};
use crate::quadrature::{Quadrature, QuadratureType};

/// Track generation parameters.
///
/// Every field has a default, so a settings file only needs the values
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSettings {
    /// Azimuthal angles over `[0, 2*pi)`; a positive multiple of 4.
    pub num_azim: usize,
    /// Requested perpendicular distance between parallel tracks.
    pub azim_spacing: f64,
    /// Polar angles per half space.
    pub num_polar: usize,
    pub quadrature: QuadratureType,
    /// Worker threads for segmentation and group sweeps.
    pub num_threads: usize,
    /// Height of the 2D track plane.
    pub z_coord: f64,
    /// Segments with a longer optical length are split.
    pub max_optical_length: Option<f64>,
    /// Write the segmented tracks to the cache after generation.
    pub dump_segments: bool,
    /// Try the cache before segmenting.
    pub use_input_file: bool,
    pub tracks_directory: PathBuf,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            num_azim: 4,
            azim_spacing: 0.1,
            num_polar: 3,
            quadrature: QuadratureType::default(),
            num_threads: thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            z_coord: 0.0,
            max_optical_length: None,
            dump_segments: false,
            use_input_file: false,
            tracks_directory: PathBuf::from("tracks"),
        }
    }
}

impl TrackSettings {
    /// Loads settings from a JSON file and validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// values are invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(ConfigError::from)?;
        let settings: Self = serde_json::from_str(&text).map_err(ConfigError::from)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every value the generator relies on.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if self.num_azim == 0 || self.num_azim % 4 != 0 {
            return Err(TrackError::InvalidAzimCount(self.num_azim).into());
        }
        if self.azim_spacing.is_nan() || self.azim_spacing <= 0.0 {
            return Err(TrackError::InvalidSpacing(self.azim_spacing).into());
        }
        if self.num_polar == 0 {
            let reason = "at least one polar angle is required".into();
            return Err(TrackError::InvalidPolar(reason).into());
        }
        if self.num_threads == 0 {
            return Err(TrackError::InvalidThreads(0).into());
        }
        if let Some(max) = self.max_optical_length {
            if max.is_nan() || max <= 0.0 {
                return Err(TrackError::InvalidOpticalLength(max).into());
            }
        }
        Ok(())
    }

    /// Builds the quadrature these settings describe.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle counts are not supported.
    pub fn build_quadrature(&self) -> Result<Quadrature> {
        Quadrature::new(self.quadrature, self.num_azim, self.num_polar)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::MocError;

    #[test]
    fn defaults_are_valid() {
        let settings = TrackSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.num_azim, 4);
        assert!(settings.num_threads >= 1);
        assert_eq!(settings.build_quadrature().unwrap().num_polar(), 3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: TrackSettings =
            serde_json::from_str(r#"{ "num_azim": 16, "max_optical_length": 5.0 }"#).unwrap();
        assert_eq!(settings.num_azim, 16);
        assert_eq!(settings.max_optical_length, Some(5.0));
        assert_eq!(settings.azim_spacing, 0.1);
        assert_eq!(settings.tracks_directory, PathBuf::from("tracks"));
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_spacing = TrackSettings {
            azim_spacing: 0.0,
            ..TrackSettings::default()
        };
        assert!(matches!(
            bad_spacing.validate(),
            Err(MocError::Track(TrackError::InvalidSpacing(_)))
        ));

        let bad_azim = TrackSettings {
            num_azim: 10,
            ..TrackSettings::default()
        };
        assert!(bad_azim.validate().is_err());

        let bad_optical = TrackSettings {
            max_optical_length: Some(-1.0),
            ..TrackSettings::default()
        };
        assert!(matches!(
            bad_optical.validate(),
            Err(MocError::Track(TrackError::InvalidOpticalLength(_)))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = TrackSettings::from_file("/nonexistent/moctrack/settings.json").unwrap_err();
        assert!(matches!(err, MocError::Config(ConfigError::Io(_))));
    }
}
