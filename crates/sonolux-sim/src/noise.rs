//! Additive Gaussian noise stages.
//!
//! The same stage body serves both chain positions: one instance perturbs
//! the simulated time series, the other the reconstructed image. Raw inputs
//! are always read from the native grid; the noisy output lands on the grid
//! variant the run is configured for. With the noise model disabled the
//! stage is a logged pass-through, not an error.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sonolux_core::{
    DataKind, DataVariant, PipelineStore, Stage, StageContext, StageError, StoreKey,
};
use tracing::{debug, warn};

/// Which pipeline artifact the noise stage perturbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseTarget {
    /// Simulated pressure recordings
    TimeSeries,
    /// Beamformed image
    Reconstruction,
}

impl NoiseTarget {
    const fn input_kind(self) -> DataKind {
        match self {
            Self::TimeSeries => DataKind::TimeSeries,
            Self::Reconstruction => DataKind::Reconstruction,
        }
    }

    const fn output_kind(self) -> DataKind {
        match self {
            Self::TimeSeries => DataKind::TimeSeriesWithNoise,
            Self::Reconstruction => DataKind::ReconstructionWithNoise,
        }
    }

    const fn stage_name(self) -> &'static str {
        match self {
            Self::TimeSeries => "time_series_noise",
            Self::Reconstruction => "reconstruction_noise",
        }
    }
}

/// Additive Gaussian noise on one pipeline artifact.
#[derive(Debug)]
pub struct GaussianNoiseStage {
    target: NoiseTarget,
}

impl GaussianNoiseStage {
    /// Creates a noise stage for the given target.
    #[must_use]
    pub fn new(target: NoiseTarget) -> Self {
        Self { target }
    }

    /// Noise stage over the simulated time series.
    #[must_use]
    pub fn for_time_series() -> Self {
        Self::new(NoiseTarget::TimeSeries)
    }

    /// Noise stage over the reconstructed image.
    #[must_use]
    pub fn for_reconstruction() -> Self {
        Self::new(NoiseTarget::Reconstruction)
    }
}

impl Stage for GaussianNoiseStage {
    fn name(&self) -> &'static str {
        self.target.stage_name()
    }

    fn run(&mut self, store: &dyn PipelineStore, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let noise = &ctx.config.noise;
        if !noise.apply_noise_model {
            warn!("No noise model was applied.");
            return Ok(());
        }

        let input = StoreKey::new(
            self.target.input_kind(),
            ctx.wavelength_nm,
            DataVariant::Normal,
        );
        let mut data = store.read(&input)?;

        let distribution = Normal::new(noise.mean, noise.std_dev)
            .map_err(|err| StageError::NoiseModel(err.to_string()))?;
        let mut rng = match noise.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        for value in data.iter_mut() {
            *value += distribution.sample(&mut rng);
        }
        debug!(
            mean = noise.mean,
            std_dev = noise.std_dev,
            seeded = noise.seed.is_some(),
            "applied Gaussian noise"
        );

        let output = StoreKey::new(
            self.target.output_kind(),
            ctx.wavelength_nm,
            ctx.config.noise_variant(),
        );
        store.write(&output, data)?;
        Ok(())
    }
}
