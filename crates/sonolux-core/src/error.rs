//! Error types for the sonolux photoacoustic toolkit.
//!
//! This module provides the shared error taxonomy using [`thiserror`] for
//! automatic `Display` and `Error` trait implementations.
//!
//! # Error Hierarchy
//!
//! - [`CoreError`]: Top-level error type that encompasses all subsystem errors
//! - [`DeviceError`]: Errors from device and detection-geometry resolution
//! - [`StorageError`]: Errors from pipeline-store access
//! - [`StageError`]: Errors surfaced by pipeline stages through their `run` contract
//!
//! # Example
//!
//! ```rust
//! use sonolux_core::error::{CoreError, DeviceError};
//!
//! fn resolve_device() -> Result<(), CoreError> {
//!     Err(DeviceError::UnsupportedDeviceType {
//!         requested: "ring_array".to_string(),
//!         known: vec!["linear_array_128".to_string()],
//!     }
//!     .into())
//! }
//! ```

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the sonolux toolkit.
///
/// This enum encompasses all possible errors that can occur within the core
/// vocabulary crate, providing a unified error type the downstream crates
/// compose into their own taxonomies.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// A required setting is absent or internally contradictory
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error, naming the offending settings
        message: String,
    },

    /// Device or detection-geometry resolution error
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// Pipeline store access error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Validation error for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if this error reflects a user configuration mistake.
    ///
    /// Configuration mistakes are never retried: the settings have to change
    /// before another attempt can succeed.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::Device(DeviceError::UnsupportedDeviceType { .. })
        )
    }
}

/// Errors from device and detection-geometry resolution.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeviceError {
    /// The device argument is neither a detection geometry nor a device wrapping one
    #[error("Device type `{requested}` is not supported for performing image reconstruction (known devices: {known:?})")]
    UnsupportedDeviceType {
        /// The requested device name or type
        requested: String,
        /// Names registered in the device catalog
        known: Vec<String>,
    },

    /// The device-specific settings prerequisites were not met
    #[error("Device `{device}` prerequisites not met: {message}")]
    PrerequisitesNotMet {
        /// Name of the device or geometry that rejected the settings
        device: String,
        /// Description of the unmet prerequisite
        message: String,
    },

    /// Geometry construction parameters were invalid
    #[error("Invalid geometry: {message}")]
    InvalidGeometry {
        /// Description of the invalid parameter
        message: String,
    },
}

/// Errors from pipeline-store access.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// No blob is stored under the requested key
    #[error("No data stored under `{key}`")]
    KeyNotFound {
        /// Rendered store path of the missing key
        key: String,
    },

    /// A backing-store operation failed
    #[error("Store backend error: {message}")]
    Backend {
        /// Description of the backend failure
        message: String,
    },
}

/// Errors surfaced by pipeline stages through their `run` contract.
///
/// Each concrete stage lowers its crate-local error into the variant matching
/// its domain; core-level failures pass through transparently.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StageError {
    /// A core-level failure (configuration, device, storage, validation)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The acoustic forward model failed
    #[error("Acoustic forward model failed: {0}")]
    ForwardModel(String),

    /// The noise model failed
    #[error("Noise model failed: {0}")]
    NoiseModel(String),

    /// Image reconstruction failed
    #[error("Image reconstruction failed: {0}")]
    Reconstruction(String),
}

impl From<StorageError> for StageError {
    fn from(err: StorageError) -> Self {
        Self::Core(err.into())
    }
}

impl From<DeviceError> for StageError {
    fn from(err: DeviceError) -> Self {
        Self::Core(err.into())
    }
}
