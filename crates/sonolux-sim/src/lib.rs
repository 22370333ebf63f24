//! # Sonolux Sim
//!
//! Simulation pipeline executor and synthetic acoustic stages for the
//! sonolux photoacoustic toolkit.
//!
//! The crate assembles the full chain around the reconstruction stage from
//! [`sonolux_recon`]:
//!
//! - **Forward model**: time-of-flight recordings of point sources through
//!   a homogeneous medium ([`forward`]).
//! - **Noise**: additive Gaussian noise on the time series and on the
//!   reconstructed image ([`noise`]).
//! - **Execution**: the per-wavelength stage chain with lifecycle tracking
//!   and run reports ([`pipeline`]).
//! - **Storage**: an in-memory [`PipelineStore`](sonolux_core::PipelineStore)
//!   implementation ([`store`]).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sonolux_core::{
//!     DeviceDescriptor, ForwardSettings, LinearArrayGeometry, PipelineConfig, PipelineStore,
//!     PointSource, ReconstructionSettings, StoreKey,
//! };
//! use sonolux_sim::{simulate, InMemoryStore};
//!
//! let geometry = Arc::new(LinearArrayGeometry::new(8, 0.3).unwrap());
//! let config = PipelineConfig::builder()
//!     .wavelengths(vec![800])
//!     .device(DeviceDescriptor::Geometry(geometry))
//!     .reconstruction(ReconstructionSettings::with_physics(1500.0, 2.5e-8, 0.3))
//!     .forward(ForwardSettings {
//!         sources: vec![PointSource {
//!             x_mm: 1.2,
//!             y_mm: 3.0,
//!             amplitude: 1.0,
//!         }],
//!         ..ForwardSettings::default()
//!     })
//!     .build()
//!     .unwrap();
//!
//! let store = InMemoryStore::new();
//! let report = simulate(&config, &store).unwrap();
//! assert!(report.succeeded());
//! assert!(store.contains(&StoreKey::reconstruction(800)));
//! ```

#![forbid(unsafe_code)]

use thiserror::Error;

use sonolux_core::CoreError;

pub mod forward;
pub mod noise;
pub mod pipeline;
pub mod store;

// Re-export commonly used types at the crate root
pub use forward::SyntheticForwardStage;
pub use noise::{GaussianNoiseStage, NoiseTarget};
pub use pipeline::{build_stage, simulate, simulate_with_catalog, SimulationReport, StageRecord};
pub use store::InMemoryStore;

/// Unified error type for simulation runs.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SimError {
    /// The run configuration failed validation before any stage ran
    #[error("Invalid run configuration: {0}")]
    InvalidConfiguration(#[from] CoreError),
}

/// A specialized `Result` type for simulation runs.
pub type Result<T> = std::result::Result<T, SimError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```rust
/// use sonolux_sim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::forward::SyntheticForwardStage;
    pub use crate::noise::{GaussianNoiseStage, NoiseTarget};
    pub use crate::pipeline::{simulate, simulate_with_catalog, SimulationReport, StageRecord};
    pub use crate::store::InMemoryStore;
    pub use crate::{Result, SimError};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_valid() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_core_errors_wrap_as_invalid_configuration() {
        let err =
            SimError::from(CoreError::configuration("Please specify at least one wavelength"));
        let text = err.to_string();
        assert!(text.contains("Invalid run configuration"));
        assert!(text.contains("wavelength"));
    }
}
