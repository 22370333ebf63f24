//! Pipeline store addressing and the persistence trait.
//!
//! Stages never hand data to each other in memory: every intermediate result
//! is written to a [`PipelineStore`] under a [`StoreKey`] and read back by the
//! next stage. The store itself is an external collaborator (production
//! deployments back it with an HDF5-class container); this crate only defines
//! the addressing scheme and the access trait.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::types::WavelengthNm;

/// The kind of entity stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Raw simulated pressure recordings from the acoustic forward stage
    TimeSeries,
    /// Time series after additive noise
    TimeSeriesWithNoise,
    /// Beamformed image from the reconstruction stage
    Reconstruction,
    /// Reconstructed image after additive noise
    ReconstructionWithNoise,
    /// Per-voxel speed-of-sound map of the simulated medium
    SoundSpeed,
}

impl DataKind {
    /// Path segment used when rendering a key.
    #[must_use]
    pub const fn as_path_segment(&self) -> &'static str {
        match self {
            Self::TimeSeries => "time_series_data",
            Self::TimeSeriesWithNoise => "time_series_data_noise",
            Self::Reconstruction => "reconstructed_data",
            Self::ReconstructionWithNoise => "reconstructed_data_noise",
            Self::SoundSpeed => "sound_speed",
        }
    }
}

/// Resolution variant of the stored data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataVariant {
    /// Data on the native simulation grid
    #[default]
    Normal,
    /// Data on the upsampled acoustic grid
    Upsampled,
}

impl DataVariant {
    /// Path segment used when rendering a key.
    #[must_use]
    pub const fn as_path_segment(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Upsampled => "upsampled",
        }
    }
}

/// Semantic address of a blob in the pipeline store.
///
/// Keys render to slash-separated paths
/// (`simulations/<variant>/<kind>_<wavelength>`), matching the layout the
/// durable store uses for its groups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
    /// Entity kind
    pub kind: DataKind,
    /// Wavelength the data belongs to
    pub wavelength_nm: WavelengthNm,
    /// Grid variant
    pub variant: DataVariant,
}

impl StoreKey {
    /// Creates a key from its parts.
    #[must_use]
    pub const fn new(kind: DataKind, wavelength_nm: WavelengthNm, variant: DataVariant) -> Self {
        Self {
            kind,
            wavelength_nm,
            variant,
        }
    }

    /// Raw time series for a wavelength, on the native grid.
    #[must_use]
    pub const fn time_series(wavelength_nm: WavelengthNm) -> Self {
        Self::new(DataKind::TimeSeries, wavelength_nm, DataVariant::Normal)
    }

    /// Reconstructed image for a wavelength, on the native grid.
    #[must_use]
    pub const fn reconstruction(wavelength_nm: WavelengthNm) -> Self {
        Self::new(DataKind::Reconstruction, wavelength_nm, DataVariant::Normal)
    }

    /// Speed-of-sound map for a wavelength.
    ///
    /// The acoustic stages read the map from the upsampled grid.
    #[must_use]
    pub const fn sound_speed(wavelength_nm: WavelengthNm) -> Self {
        Self::new(DataKind::SoundSpeed, wavelength_nm, DataVariant::Upsampled)
    }

    /// Renders the key as a store path.
    #[must_use]
    pub fn path(&self) -> String {
        format!(
            "simulations/{}/{}_{}",
            self.variant.as_path_segment(),
            self.kind.as_path_segment(),
            self.wavelength_nm
        )
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Key/value access to persisted pipeline data.
///
/// Implementations own the blob format; the pipeline assumes
/// append/overwrite-by-key semantics with a single writer per key per run.
pub trait PipelineStore: Send + Sync {
    /// Reads the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::KeyNotFound`] if nothing is stored under the
    /// key, or [`StorageError::Backend`] for store-specific failures.
    fn read(&self, key: &StoreKey) -> Result<Array2<f64>, StorageError>;

    /// Writes `data` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] for store-specific failures.
    fn write(&self, key: &StoreKey, data: Array2<f64>) -> Result<(), StorageError>;

    /// Returns `true` if a blob is stored under `key`.
    fn contains(&self, key: &StoreKey) -> bool;

    /// Lists all keys currently stored.
    fn keys(&self) -> Vec<StoreKey>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_rendering() {
        let key = StoreKey::time_series(800);
        assert_eq!(key.path(), "simulations/normal/time_series_data_800");

        let key = StoreKey::new(DataKind::TimeSeriesWithNoise, 700, DataVariant::Upsampled);
        assert_eq!(key.path(), "simulations/upsampled/time_series_data_noise_700");
    }

    #[test]
    fn test_sound_speed_key_is_upsampled() {
        let key = StoreKey::sound_speed(800);
        assert_eq!(key.variant, DataVariant::Upsampled);
        assert_eq!(key.path(), "simulations/upsampled/sound_speed_800");
    }

    #[test]
    fn test_key_serde_round_trip() {
        let key = StoreKey::reconstruction(532);
        let json = serde_json::to_string(&key).unwrap();
        let back: StoreKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
