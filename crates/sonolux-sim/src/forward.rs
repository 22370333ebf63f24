//! Synthetic acoustic forward stage.
//!
//! A full wave solver is out of scope for this crate; the synthetic model
//! covers the pipeline contract instead. Every configured point source emits
//! a delta pulse at t = 0 through a homogeneous medium, and each sensor
//! element records the source amplitude at its time-of-flight sample. The
//! stage writes the raw recordings and the speed-of-sound map the
//! reconstruction falls back to when no explicit speed is configured.

use ndarray::Array2;
use sonolux_core::{DeviceCatalog, PipelineStore, Stage, StageContext, StageError, StoreKey};
use tracing::{debug, info};

/// Acoustic forward stage over a homogeneous medium of point sources.
#[derive(Debug)]
pub struct SyntheticForwardStage {
    catalog: DeviceCatalog,
}

impl SyntheticForwardStage {
    /// Creates the stage with the given device catalog.
    #[must_use]
    pub fn new(catalog: DeviceCatalog) -> Self {
        Self { catalog }
    }

    /// Creates the stage with the built-in device catalog.
    #[must_use]
    pub fn with_builtin_devices() -> Self {
        Self::new(DeviceCatalog::with_builtin_devices())
    }
}

impl Stage for SyntheticForwardStage {
    fn name(&self) -> &'static str {
        "acoustic_forward"
    }

    fn run(&mut self, store: &dyn PipelineStore, ctx: &StageContext<'_>) -> Result<(), StageError> {
        info!("Simulating the acoustic forward process...");

        let forward = &ctx.config.forward;
        let sample_count = forward.sample_count;
        if sample_count == 0 {
            return Err(StageError::ForwardModel(
                "cannot record a time series with zero samples".to_string(),
            ));
        }
        let speed_of_sound = forward.medium_sound_speed_m_per_s;
        if !speed_of_sound.is_finite() || speed_of_sound <= 0.0 {
            return Err(StageError::ForwardModel(format!(
                "medium speed of sound must be positive, got {speed_of_sound} m/s"
            )));
        }

        let geometry = ctx.config.device.resolve_geometry(&self.catalog)?;
        let positions_mm = geometry.element_positions_mm();
        let element_count = positions_mm.nrows();

        // Same sample clock the beamformer uses on the way back.
        let time_spacing_ms = ctx.config.reconstruction.resolve_time_spacing_s()? * 1000.0;
        let mm_per_sample = speed_of_sound * time_spacing_ms;

        let mut series = Array2::zeros((element_count, sample_count));
        let mut clipped = 0_usize;
        for source in &forward.sources {
            for j in 0..element_count {
                let dx_mm = positions_mm[(j, 0)] - source.x_mm;
                let dz_mm = positions_mm[(j, 2)] - source.y_mm;
                let sample = ((dx_mm * dx_mm + dz_mm * dz_mm).sqrt() / mm_per_sample)
                    .round_ties_even() as i64;
                if sample >= 0 && sample < sample_count as i64 {
                    series[(j, sample as usize)] += source.amplitude;
                } else {
                    clipped += 1;
                }
            }
        }
        if clipped > 0 {
            debug!(clipped, "time-of-flight beyond the recording window");
        }
        debug!(
            element_count,
            sample_count,
            sources = forward.sources.len(),
            "synthesized pressure recordings"
        );

        store.write(&StoreKey::time_series(ctx.wavelength_nm), series)?;
        // The synthetic medium is homogeneous, so its map collapses to one voxel.
        store.write(
            &StoreKey::sound_speed(ctx.wavelength_nm),
            Array2::from_elem((1, 1), speed_of_sound),
        )?;

        info!("Simulating the acoustic forward process...[Done]");
        Ok(())
    }
}
