//! Typed configuration for the simulation and reconstruction pipeline.
//!
//! Settings travel as typed structs instead of a loosely-typed dictionary
//! read at arbitrary points: every recognized option is a field on
//! [`ReconstructionSettings`] or [`NoiseSettings`], defaults are named
//! constants, and [`PipelineConfig`] is validated once at construction and
//! read-only afterwards.

use serde::{Deserialize, Serialize};

use crate::device::DeviceDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::store::DataVariant;
use crate::types::WavelengthNm;

/// Default low bandpass cutoff in Hz (high-pass edge).
pub const DEFAULT_BANDPASS_CUTOFF_LOW_HZ: f64 = 1e5;

/// Default high bandpass cutoff in Hz (low-pass edge).
pub const DEFAULT_BANDPASS_CUTOFF_HIGH_HZ: f64 = 8e6;

/// Default Tukey taper parameter for the bandpass window.
pub const DEFAULT_TUKEY_ALPHA: f64 = 0.5;

/// Default standard deviation of the additive Gaussian noise model.
pub const DEFAULT_NOISE_STD_DEV: f64 = 1.0;

/// Per-element weighting applied before the beamforming sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApodizationKind {
    /// Uniform weight 1.0 for every element
    #[default]
    Box,
    /// Periodic Hann window over the element count
    Hann,
    /// Periodic Hamming window over the element count
    Hamming,
}

/// Envelope-detection method applied to the time series before beamforming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BmodeMethod {
    /// No envelope detection
    #[default]
    None,
    /// Magnitude of the analytic signal (Hilbert transform along time)
    HilbertEnvelope,
    /// Elementwise absolute value
    AbsEnvelope,
}

/// The raw reconstruction configuration surface.
///
/// A field counts as supplied only when present *and* non-zero, so an
/// explicit zero falls through to the fallback source exactly like an
/// absent key. Resolution failures are fatal [`CoreError::Configuration`]
/// errors naming the missing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionSettings {
    /// Speed of sound in the medium, metres per second (preferred source)
    pub speed_of_sound_m_per_s: Option<f64>,
    /// Sensor sampling rate in Hz (preferred time-spacing source)
    pub sampling_rate_hz: Option<f64>,
    /// Simulator-native time step in seconds (fallback time-spacing source)
    pub simulator_time_step_s: Option<f64>,
    /// Pixel spacing in millimetres (mandatory)
    pub pixel_spacing_mm: Option<f64>,
    /// Apply the frequency-domain bandpass filter before beamforming
    pub bandpass_enabled: bool,
    /// Low bandpass cutoff in Hz
    pub bandpass_cutoff_low_hz: f64,
    /// High bandpass cutoff in Hz
    pub bandpass_cutoff_high_hz: f64,
    /// Tukey taper parameter of the pass window
    pub tukey_alpha: f64,
    /// Apodization window kind
    pub apodization: ApodizationKind,
    /// Envelope-detection method; unset logs a warning and applies none
    pub bmode_method: Option<BmodeMethod>,
    /// Force or forbid the accelerated beamforming path; unset uses it when available
    pub use_accelerator: Option<bool>,
}

impl Default for ReconstructionSettings {
    fn default() -> Self {
        Self {
            speed_of_sound_m_per_s: None,
            sampling_rate_hz: None,
            simulator_time_step_s: None,
            pixel_spacing_mm: None,
            bandpass_enabled: true,
            bandpass_cutoff_low_hz: DEFAULT_BANDPASS_CUTOFF_LOW_HZ,
            bandpass_cutoff_high_hz: DEFAULT_BANDPASS_CUTOFF_HIGH_HZ,
            tukey_alpha: DEFAULT_TUKEY_ALPHA,
            apodization: ApodizationKind::default(),
            bmode_method: None,
            use_accelerator: None,
        }
    }
}

impl ReconstructionSettings {
    /// Settings with the three mandatory physical constants preset.
    #[must_use]
    pub fn with_physics(
        speed_of_sound_m_per_s: f64,
        time_spacing_s: f64,
        pixel_spacing_mm: f64,
    ) -> Self {
        Self {
            speed_of_sound_m_per_s: Some(speed_of_sound_m_per_s),
            simulator_time_step_s: Some(time_spacing_s),
            pixel_spacing_mm: Some(pixel_spacing_mm),
            ..Self::default()
        }
    }

    /// The explicitly supplied speed of sound, if any.
    ///
    /// `None` means the caller must fall back to averaging the stored
    /// speed-of-sound map for the current wavelength.
    #[must_use]
    pub fn explicit_speed_of_sound(&self) -> Option<f64> {
        self.speed_of_sound_m_per_s.filter(|&c| c != 0.0)
    }

    /// Resolves the sampling interval in seconds.
    ///
    /// The sampling rate is preferred; the simulator-native time step is the
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] when neither source is supplied.
    pub fn resolve_time_spacing_s(&self) -> CoreResult<f64> {
        if let Some(rate) = self.sampling_rate_hz.filter(|&r| r != 0.0) {
            return Ok(1.0 / rate);
        }
        if let Some(dt) = self.simulator_time_step_s.filter(|&dt| dt != 0.0) {
            return Ok(dt);
        }
        Err(CoreError::configuration(
            "Please specify a value for sampling_rate_hz or simulator_time_step_s",
        ))
    }

    /// Resolves the mandatory pixel spacing in millimetres.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] when the spacing is not supplied.
    pub fn resolve_pixel_spacing_mm(&self) -> CoreResult<f64> {
        self.pixel_spacing_mm
            .filter(|&s| s != 0.0)
            .ok_or_else(|| CoreError::configuration("Please specify a value for pixel_spacing_mm"))
    }
}

/// Settings for the additive Gaussian noise stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Apply the noise model; when false the noise stages pass through
    pub apply_noise_model: bool,
    /// Mean of the additive noise
    pub mean: f64,
    /// Standard deviation of the additive noise
    pub std_dev: f64,
    /// Seed for the noise generator; unset draws from entropy
    pub seed: Option<u64>,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            apply_noise_model: false,
            mean: 0.0,
            std_dev: DEFAULT_NOISE_STD_DEV,
            seed: None,
        }
    }
}

/// Point acoustic source inside the simulated medium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSource {
    /// Lateral position in millimetres (imaging-plane x)
    pub x_mm: f64,
    /// Depth in millimetres (imaging-plane y)
    pub y_mm: f64,
    /// Initial pressure amplitude deposited at the time-of-flight sample
    pub amplitude: f64,
}

/// Settings for the synthetic acoustic forward stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardSettings {
    /// Point sources emitting a delta pulse at t = 0
    pub sources: Vec<PointSource>,
    /// Number of time samples to record per element
    pub sample_count: usize,
    /// Speed of sound of the simulated medium, metres per second
    pub medium_sound_speed_m_per_s: f64,
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            sample_count: 4000,
            medium_sound_speed_m_per_s: 1500.0,
        }
    }
}

/// Immutable per-run configuration shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Wavelengths to simulate and reconstruct, in nanometres
    pub wavelengths_nm: Vec<WavelengthNm>,
    /// The imaging device
    pub device: DeviceDescriptor,
    /// Reconstruction settings
    pub reconstruction: ReconstructionSettings,
    /// Noise-model settings
    pub noise: NoiseSettings,
    /// Forward-model settings
    pub forward: ForwardSettings,
    /// Whether the acoustic stages run on the upsampled grid
    pub perform_upsampling: bool,
}

impl PipelineConfig {
    /// Creates a new config builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// The grid variant noise outputs are written under.
    #[must_use]
    pub const fn noise_variant(&self) -> DataVariant {
        if self.perform_upsampling {
            DataVariant::Upsampled
        } else {
            DataVariant::Normal
        }
    }

    /// Validates cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] when no wavelengths are given or
    /// the noise model is enabled with a negative standard deviation.
    pub fn validate(&self) -> CoreResult<()> {
        if self.wavelengths_nm.is_empty() {
            return Err(CoreError::configuration(
                "Please specify at least one wavelength",
            ));
        }
        if self.noise.apply_noise_model && self.noise.std_dev < 0.0 {
            return Err(CoreError::configuration(
                "noise std_dev must not be negative",
            ));
        }
        Ok(())
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    wavelengths_nm: Vec<WavelengthNm>,
    device: Option<DeviceDescriptor>,
    reconstruction: ReconstructionSettings,
    noise: NoiseSettings,
    forward: ForwardSettings,
    perform_upsampling: bool,
}

impl PipelineConfigBuilder {
    /// Creates a builder with default settings and no wavelengths.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wavelengths_nm: Vec::new(),
            device: None,
            reconstruction: ReconstructionSettings::default(),
            noise: NoiseSettings::default(),
            forward: ForwardSettings::default(),
            perform_upsampling: false,
        }
    }

    /// Set the wavelengths to process.
    #[must_use]
    pub fn wavelengths(mut self, wavelengths_nm: Vec<WavelengthNm>) -> Self {
        self.wavelengths_nm = wavelengths_nm;
        self
    }

    /// Set the imaging device.
    #[must_use]
    pub fn device(mut self, device: DeviceDescriptor) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the reconstruction settings.
    #[must_use]
    pub fn reconstruction(mut self, settings: ReconstructionSettings) -> Self {
        self.reconstruction = settings;
        self
    }

    /// Set the noise settings.
    #[must_use]
    pub fn noise(mut self, settings: NoiseSettings) -> Self {
        self.noise = settings;
        self
    }

    /// Set the forward-model settings.
    #[must_use]
    pub fn forward(mut self, settings: ForwardSettings) -> Self {
        self.forward = settings;
        self
    }

    /// Run the acoustic stages on the upsampled grid.
    #[must_use]
    pub fn perform_upsampling(mut self, upsample: bool) -> Self {
        self.perform_upsampling = upsample;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] when no device was set or
    /// cross-field validation fails; see [`PipelineConfig::validate`].
    pub fn build(self) -> CoreResult<PipelineConfig> {
        let device = self
            .device
            .ok_or_else(|| CoreError::configuration("Please specify an imaging device"))?;
        let config = PipelineConfig {
            wavelengths_nm: self.wavelengths_nm,
            device,
            reconstruction: self.reconstruction,
            noise: self.noise,
            forward: self.forward,
            perform_upsampling: self.perform_upsampling,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
