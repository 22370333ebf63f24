//! The reconstruction pipeline stage.
//!
//! Reads the recorded time series for the current wavelength from the
//! store, runs envelope detection, configuration resolution, geometry
//! resolution, optional bandpass filtering, and delay-and-sum beamforming
//! in that order, then writes the image back under the reconstruction key.
//! When the noise model is enabled the stage reads the *noisy* series, so
//! the reconstruction sees what a real sensor would have recorded.

use ndarray::Array2;
use tracing::{info, warn};

use sonolux_core::{
    DataKind, PipelineStore, Stage, StageContext, StageError, StoreKey, TimeSeries,
};

use crate::bandpass::BandpassFilter;
use crate::bmode::apply_bmode;
use crate::config::ReconstructionConfig;
use crate::das::BeamformingEngine;
use crate::geometry::GeometryResolver;

/// Delay-and-sum reconstruction as a pipeline stage.
pub struct ReconstructionAdapter {
    resolver: GeometryResolver,
}

impl ReconstructionAdapter {
    /// Creates a stage resolving devices through the given resolver.
    #[must_use]
    pub fn new(resolver: GeometryResolver) -> Self {
        Self { resolver }
    }

    /// Creates a stage over the built-in device catalog.
    #[must_use]
    pub fn with_builtin_devices() -> Self {
        Self::new(GeometryResolver::with_builtin_devices())
    }

    fn input_key(ctx: &StageContext<'_>) -> StoreKey {
        if ctx.config.noise.apply_noise_model {
            StoreKey::new(
                DataKind::TimeSeriesWithNoise,
                ctx.wavelength_nm,
                ctx.config.noise_variant(),
            )
        } else {
            StoreKey::time_series(ctx.wavelength_nm)
        }
    }
}

impl Stage for ReconstructionAdapter {
    fn name(&self) -> &'static str {
        "reconstruction"
    }

    fn run(&mut self, store: &dyn PipelineStore, ctx: &StageContext<'_>) -> Result<(), StageError> {
        info!("Performing reconstruction...");
        let settings = &ctx.config.reconstruction;

        let series = TimeSeries::new(store.read(&Self::input_key(ctx))?)?;

        // envelope detection comes first, before any filtering
        let data = match settings.bmode_method {
            Some(method) => apply_bmode(series.data(), method),
            None => {
                warn!("You have not specified a B-mode method");
                series.data().clone()
            }
        };

        // resolve the physical constants; missing settings are fatal
        // before any sensor-position processing starts
        let sound_speed_field = if settings.explicit_speed_of_sound().is_none() {
            let key = StoreKey::sound_speed(ctx.wavelength_nm);
            if store.contains(&key) {
                Some(store.read(&key)?)
            } else {
                None
            }
        } else {
            None
        };
        let config = ReconstructionConfig::from_settings(
            settings,
            sound_speed_field.as_ref().map(Array2::view),
        )?;

        let geometry = self.resolver.resolve(&ctx.config.device, settings)?;

        let data = if config.bandpass_enabled {
            let filter = BandpassFilter::new(
                data.ncols(),
                config.time_spacing_s,
                config.bandpass_cutoff_low_hz,
                config.bandpass_cutoff_high_hz,
                config.tukey_alpha,
            )?;
            filter.apply(&data)
        } else {
            data
        };

        let engine = BeamformingEngine::new(config);
        let image = engine.reconstruct(&TimeSeries::new(data)?, &geometry)?;
        store.write(&StoreKey::reconstruction(ctx.wavelength_nm), image.into_inner())?;

        info!("Performing reconstruction...[Done]");
        Ok(())
    }
}
