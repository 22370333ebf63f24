//! # Sonolux Recon
//!
//! Delay-and-sum image reconstruction for the sonolux photoacoustic
//! toolkit.
//!
//! The crate turns recorded pressure time series into beamformed images:
//!
//! - **Preprocessing**: envelope detection ([`bmode`]) and exact-bin
//!   frequency-domain bandpass filtering ([`bandpass`]).
//! - **Geometry**: resolution of imaging devices into pixel-space sensor
//!   coordinates ([`geometry`]).
//! - **Beamforming**: the delay-and-sum engine with apodization,
//!   multi-threaded row computation, and cooperative cancellation
//!   ([`das`]).
//! - **Pipeline integration**: the [`ReconstructionAdapter`] stage reading
//!   from and writing to the pipeline store ([`adapter`]).
//!
//! ## Example
//!
//! ```rust
//! use ndarray::{array, Array2};
//! use sonolux_core::{ReconstructionSettings, SensorGeometry, TimeSeries};
//! use sonolux_recon::{BeamformingEngine, ReconstructionConfig};
//!
//! let settings = ReconstructionSettings::with_physics(1500.0, 1e-8, 0.1);
//! let config = ReconstructionConfig::from_settings(&settings, None).unwrap();
//!
//! let series = TimeSeries::new(Array2::ones((4, 100))).unwrap();
//! let geometry =
//!     SensorGeometry::from_pixel_positions(array![[0, 0], [1, 0], [2, 0], [3, 0]]).unwrap();
//!
//! let image = BeamformingEngine::new(config)
//!     .reconstruct(&series, &geometry)
//!     .unwrap();
//! assert_eq!(image.x_pixels(), 4);
//! ```

#![deny(unsafe_code)]

use thiserror::Error;

use sonolux_core::{CoreError, StageError};

pub mod adapter;
pub mod bandpass;
pub mod bmode;
pub mod config;
pub mod das;
pub mod geometry;
pub mod windows;

// Re-export commonly used types at the crate root
pub use adapter::ReconstructionAdapter;
pub use bandpass::{frequency_grid, BandpassError, BandpassFilter};
pub use bmode::apply_bmode;
pub use config::ReconstructionConfig;
pub use das::{BeamformError, BeamformingEngine, CancelToken};
pub use geometry::GeometryResolver;
pub use windows::{apodization_weights, hamming_window, hann_window, tukey_window};

/// Unified error type for reconstruction operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReconError {
    /// Core-level failure (configuration, device, storage, validation)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Bandpass-filter construction failure
    #[error("Bandpass filter error: {0}")]
    Bandpass(#[from] BandpassError),

    /// Beamforming failure
    #[error("Beamforming error: {0}")]
    Beamforming(#[from] BeamformError),
}

/// A specialized `Result` type for reconstruction operations.
pub type Result<T> = std::result::Result<T, ReconError>;

impl From<ReconError> for StageError {
    fn from(err: ReconError) -> Self {
        match err {
            ReconError::Core(core) => Self::Core(core),
            other => Self::Reconstruction(other.to_string()),
        }
    }
}

impl From<BandpassError> for StageError {
    fn from(err: BandpassError) -> Self {
        Self::Reconstruction(err.to_string())
    }
}

impl From<BeamformError> for StageError {
    fn from(err: BeamformError) -> Self {
        Self::Reconstruction(err.to_string())
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```rust
/// use sonolux_recon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::ReconstructionAdapter;
    pub use crate::bandpass::{BandpassError, BandpassFilter};
    pub use crate::bmode::apply_bmode;
    pub use crate::config::ReconstructionConfig;
    pub use crate::das::{BeamformError, BeamformingEngine, CancelToken};
    pub use crate::geometry::GeometryResolver;
    pub use crate::{ReconError, Result};
}
