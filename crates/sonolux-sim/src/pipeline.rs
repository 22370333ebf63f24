//! Pipeline executor.
//!
//! [`simulate`] drives the strict stage chain for every configured
//! wavelength: acoustic forward, time-series noise, reconstruction,
//! reconstruction noise. Stages only communicate through the store, so the
//! executor owns nothing but the chain order and the bookkeeping: each
//! execution is tracked through the [`StageState`] lifecycle and recorded in
//! a [`SimulationReport`]. The first stage failure aborts the run; errors
//! are never retried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sonolux_core::{
    DeviceCatalog, PipelineConfig, PipelineStore, Stage, StageContext, StageKind, StageState,
    WavelengthNm,
};
use sonolux_recon::{GeometryResolver, ReconstructionAdapter};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::forward::SyntheticForwardStage;
use crate::noise::GaussianNoiseStage;
use crate::SimError;

/// Builds the concrete stage for a chain position.
#[must_use]
pub fn build_stage(kind: StageKind, catalog: DeviceCatalog) -> Box<dyn Stage> {
    match kind {
        StageKind::AcousticForward => Box::new(SyntheticForwardStage::new(catalog)),
        StageKind::TimeSeriesNoise => Box::new(GaussianNoiseStage::for_time_series()),
        StageKind::Reconstruction => {
            Box::new(ReconstructionAdapter::new(GeometryResolver::new(catalog)))
        }
        StageKind::ReconstructionNoise => Box::new(GaussianNoiseStage::for_reconstruction()),
    }
}

/// Outcome of one stage execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Wavelength the chain iteration processed
    pub wavelength_nm: WavelengthNm,
    /// Which stage ran
    pub stage: StageKind,
    /// Terminal lifecycle state
    pub state: StageState,
    /// Rendered error for failed executions
    pub error: Option<String>,
}

/// Summary of a full simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run
    pub finished_at: DateTime<Utc>,
    /// Per-stage outcomes in execution order
    pub records: Vec<StageRecord>,
}

impl SimulationReport {
    /// Returns `true` when every executed stage finished [`StageState::Done`].
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.records
            .iter()
            .all(|record| record.state == StageState::Done)
    }

    /// The record of the failed stage, if the run aborted.
    #[must_use]
    pub fn failure(&self) -> Option<&StageRecord> {
        self.records
            .iter()
            .find(|record| record.state == StageState::Failed)
    }
}

/// Runs the default stage chain against the built-in device catalog.
///
/// # Errors
///
/// Returns [`SimError::InvalidConfiguration`] when the configuration fails
/// validation before any stage runs. Stage failures are not errors at this
/// level; they abort the run and land in the report.
pub fn simulate(
    config: &PipelineConfig,
    store: &dyn PipelineStore,
) -> Result<SimulationReport, SimError> {
    simulate_with_catalog(config, store, &DeviceCatalog::with_builtin_devices())
}

/// Runs the default stage chain for every configured wavelength.
///
/// # Errors
///
/// Returns [`SimError::InvalidConfiguration`] when the configuration fails
/// validation before any stage runs.
pub fn simulate_with_catalog(
    config: &PipelineConfig,
    store: &dyn PipelineStore,
    catalog: &DeviceCatalog,
) -> Result<SimulationReport, SimError> {
    config.validate()?;

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(
        %run_id,
        wavelengths = config.wavelengths_nm.len(),
        "starting simulation run"
    );

    let mut records = Vec::new();
    'run: for &wavelength_nm in &config.wavelengths_nm {
        let ctx = StageContext::new(config, wavelength_nm);
        for kind in StageKind::default_chain() {
            let mut stage = build_stage(kind, catalog.clone());
            debug!(stage = stage.name(), wavelength_nm, "stage running");
            match stage.run(store, &ctx) {
                Ok(()) => records.push(StageRecord {
                    wavelength_nm,
                    stage: kind,
                    state: StageState::Done,
                    error: None,
                }),
                Err(err) => {
                    error!(stage = stage.name(), wavelength_nm, error = %err, "stage failed");
                    records.push(StageRecord {
                        wavelength_nm,
                        stage: kind,
                        state: StageState::Failed,
                        error: Some(err.to_string()),
                    });
                    break 'run;
                }
            }
        }
    }

    let finished_at = Utc::now();
    let report = SimulationReport {
        run_id,
        started_at,
        finished_at,
        records,
    };
    info!(%run_id, succeeded = report.succeeded(), "simulation run finished");
    Ok(report)
}
