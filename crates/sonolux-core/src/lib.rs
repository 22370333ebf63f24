//! # Sonolux Core
//!
//! Core types, contracts, and utilities for the sonolux photoacoustic
//! simulation and reconstruction toolkit.
//!
//! This crate provides the foundational building blocks used throughout the
//! sonolux workspace, including:
//!
//! - **Core Data Types**: [`TimeSeries`], [`SensorGeometry`], and
//!   [`ReconstructedImage`] for representing recorded pressure data and
//!   beamformed images.
//!
//! - **Error Types**: The shared taxonomy in the [`error`] module:
//!   configuration, device, storage, and stage errors.
//!
//! - **Pipeline Contracts**: The [`Stage`] trait with its
//!   `Constructed -> Running -> Done` lifecycle, the [`PipelineStore`]
//!   persistence trait, and the [`StoreKey`] addressing scheme that carries
//!   all data between stages.
//!
//! - **Devices**: The [`DetectionGeometry`] trait, a concrete
//!   [`LinearArrayGeometry`], and the [`DeviceCatalog`] registry behind
//!   [`DeviceDescriptor`] resolution.
//!
//! - **Configuration**: Typed, validated settings ([`PipelineConfig`],
//!   [`ReconstructionSettings`]) with the toolkit defaults as named
//!   constants.
//!
//! ## Example
//!
//! ```rust
//! use sonolux_core::{DeviceDescriptor, PipelineConfig, ReconstructionSettings};
//!
//! let config = PipelineConfig::builder()
//!     .wavelengths(vec![700, 800])
//!     .device(DeviceDescriptor::Named("linear_array_128".to_string()))
//!     .reconstruction(ReconstructionSettings::with_physics(1500.0, 2.5e-8, 0.1))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.wavelengths_nm.len(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod device;
pub mod error;
pub mod stage;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{
    ApodizationKind, BmodeMethod, ForwardSettings, NoiseSettings, PipelineConfig,
    PipelineConfigBuilder, PointSource, ReconstructionSettings, DEFAULT_BANDPASS_CUTOFF_HIGH_HZ,
    DEFAULT_BANDPASS_CUTOFF_LOW_HZ, DEFAULT_NOISE_STD_DEV, DEFAULT_TUKEY_ALPHA,
};
pub use device::{
    DetectionGeometry, DeviceCatalog, DeviceDescriptor, LinearArrayGeometry, PhotoacousticDevice,
};
pub use error::{CoreError, CoreResult, DeviceError, StageError, StorageError};
pub use stage::{Stage, StageContext, StageKind, StageState};
pub use store::{DataKind, DataVariant, PipelineStore, StoreKey};
pub use types::{ReconstructedImage, SensorGeometry, TimeSeries, WavelengthNm};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```rust
/// use sonolux_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{
        ApodizationKind, BmodeMethod, NoiseSettings, PipelineConfig, ReconstructionSettings,
    };
    pub use crate::device::{DetectionGeometry, DeviceCatalog, DeviceDescriptor};
    pub use crate::error::{CoreError, CoreResult, StageError};
    pub use crate::stage::{Stage, StageContext, StageKind, StageState};
    pub use crate::store::{DataKind, DataVariant, PipelineStore, StoreKey};
    pub use crate::types::{ReconstructedImage, SensorGeometry, TimeSeries};
}
