//! The pipeline stage contract.
//!
//! Every simulation step (acoustic forward model, noise, reconstruction)
//! implements [`Stage`]: read inputs from the store, transform, write outputs
//! back. Stages never hand data to each other in memory and never mutate
//! their inputs, so each one is independently re-runnable.
//!
//! Concrete stages are selected through the [`StageKind`] tag rather than an
//! inheritance hierarchy; the executor tracks each execution through the
//! [`StageState`] lifecycle `Constructed -> Running -> Done` (or `Failed`).

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::store::PipelineStore;
use crate::types::WavelengthNm;

/// Lifecycle of a single stage execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Built, not yet run
    #[default]
    Constructed,
    /// `run` in progress
    Running,
    /// `run` returned successfully
    Done,
    /// `run` returned an error
    Failed,
}

/// Tags identifying the concrete pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Synthesize time-series pressure data from the tissue model
    AcousticForward,
    /// Additive noise on the simulated time series
    TimeSeriesNoise,
    /// Beamform the time series into an image
    Reconstruction,
    /// Additive noise on the reconstructed image
    ReconstructionNoise,
}

impl StageKind {
    /// The strict linear chain run for every wavelength.
    #[must_use]
    pub const fn default_chain() -> [StageKind; 4] {
        [
            Self::AcousticForward,
            Self::TimeSeriesNoise,
            Self::Reconstruction,
            Self::ReconstructionNoise,
        ]
    }

    /// Stable name used in logs and reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcousticForward => "acoustic_forward",
            Self::TimeSeriesNoise => "time_series_noise",
            Self::Reconstruction => "reconstruction",
            Self::ReconstructionNoise => "reconstruction_noise",
        }
    }
}

/// Per-wavelength view of the run handed to each stage.
///
/// The configuration is immutable for the whole run; the current wavelength
/// travels alongside it instead of being patched into a shared dictionary.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// The run configuration
    pub config: &'a PipelineConfig,
    /// Wavelength this chain iteration processes
    pub wavelength_nm: WavelengthNm,
}

impl<'a> StageContext<'a> {
    /// Creates a context for one wavelength of the run.
    #[must_use]
    pub const fn new(config: &'a PipelineConfig, wavelength_nm: WavelengthNm) -> Self {
        Self {
            config,
            wavelength_nm,
        }
    }
}

/// A pipeline stage.
///
/// Implementations read the inputs they need from the store, perform their
/// transform, and write their outputs back under derived keys. A stage that
/// depends on an optional feature flag degrades to a logged pass-through
/// when the flag is absent or false; that is a deliberate no-op, not an
/// error.
pub trait Stage: Send {
    /// Stage name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Executes the stage for the wavelength in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] naming the failing subsystem; errors are
    /// never retried.
    fn run(&mut self, store: &dyn PipelineStore, ctx: &StageContext<'_>) -> Result<(), StageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_order() {
        let chain = StageKind::default_chain();
        assert_eq!(
            chain,
            [
                StageKind::AcousticForward,
                StageKind::TimeSeriesNoise,
                StageKind::Reconstruction,
                StageKind::ReconstructionNoise,
            ]
        );
    }

    #[test]
    fn test_stage_state_starts_constructed() {
        assert_eq!(StageState::default(), StageState::Constructed);
    }

    #[test]
    fn test_stage_kind_names() {
        assert_eq!(StageKind::AcousticForward.as_str(), "acoustic_forward");
        assert_eq!(StageKind::Reconstruction.as_str(), "reconstruction");
    }
}
