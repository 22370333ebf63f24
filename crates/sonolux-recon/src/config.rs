//! Resolved reconstruction configuration.
//!
//! [`ReconstructionConfig`] is the fully-resolved counterpart of the raw
//! [`ReconstructionSettings`] surface: every physical constant is a plain
//! number, every fallback has been taken, and resolution failures have
//! already surfaced as configuration errors. The beamforming engine only
//! ever sees this type.

use ndarray::ArrayView2;
use sonolux_core::{ApodizationKind, BmodeMethod, CoreError, CoreResult, ReconstructionSettings};

/// Resolved per-run reconstruction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionConfig {
    /// Speed of sound in the medium, metres per second
    pub speed_of_sound_m_per_s: f64,
    /// Sampling interval of the recording, seconds
    pub time_spacing_s: f64,
    /// Pixel spacing of the output image, millimetres
    pub pixel_spacing_mm: f64,
    /// Apply the bandpass filter before beamforming
    pub bandpass_enabled: bool,
    /// Low bandpass cutoff in Hz
    pub bandpass_cutoff_low_hz: f64,
    /// High bandpass cutoff in Hz
    pub bandpass_cutoff_high_hz: f64,
    /// Tukey taper parameter of the pass window
    pub tukey_alpha: f64,
    /// Apodization window kind
    pub apodization: ApodizationKind,
    /// Envelope-detection method, `None` when the caller left it unset
    pub bmode_method: Option<BmodeMethod>,
    /// Use the multi-threaded beamforming path
    pub use_accelerator: bool,
}

impl ReconstructionConfig {
    /// Resolves raw settings into a complete configuration.
    ///
    /// The speed of sound comes from the explicit setting when supplied,
    /// otherwise from the mean of `sound_speed_field` (the per-voxel map of
    /// the simulated medium at the current wavelength). The time spacing
    /// prefers the sampling rate over the simulator time step; the pixel
    /// spacing is mandatory.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] when any of the three physical
    /// constants cannot be resolved.
    pub fn from_settings(
        settings: &ReconstructionSettings,
        sound_speed_field: Option<ArrayView2<'_, f64>>,
    ) -> CoreResult<Self> {
        let speed_of_sound_m_per_s = match settings.explicit_speed_of_sound() {
            Some(c) => c,
            None => sound_speed_field
                .and_then(|field| field.mean())
                .ok_or_else(|| {
                    CoreError::configuration(
                        "Please specify a value for speed_of_sound_m_per_s or a wavelength \
                         to obtain the average speed of sound",
                    )
                })?,
        };
        let time_spacing_s = settings.resolve_time_spacing_s()?;
        let pixel_spacing_mm = settings.resolve_pixel_spacing_mm()?;

        Ok(Self {
            speed_of_sound_m_per_s,
            time_spacing_s,
            pixel_spacing_mm,
            bandpass_enabled: settings.bandpass_enabled,
            bandpass_cutoff_low_hz: settings.bandpass_cutoff_low_hz,
            bandpass_cutoff_high_hz: settings.bandpass_cutoff_high_hz,
            tukey_alpha: settings.tukey_alpha,
            apodization: settings.apodization,
            bmode_method: settings.bmode_method,
            use_accelerator: settings.use_accelerator.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_explicit_speed_of_sound_wins() {
        let settings = ReconstructionSettings::with_physics(1540.0, 2.5e-8, 0.1);
        let field = array![[1400.0, 1600.0]];
        let config = ReconstructionConfig::from_settings(&settings, Some(field.view())).unwrap();
        assert_eq!(config.speed_of_sound_m_per_s, 1540.0);
    }

    #[test]
    fn test_speed_of_sound_falls_back_to_field_mean() {
        let mut settings = ReconstructionSettings::with_physics(1540.0, 2.5e-8, 0.1);
        settings.speed_of_sound_m_per_s = None;
        let field = array![[1400.0, 1600.0], [1500.0, 1500.0]];
        let config = ReconstructionConfig::from_settings(&settings, Some(field.view())).unwrap();
        assert_eq!(config.speed_of_sound_m_per_s, 1500.0);
    }

    #[test]
    fn test_zero_speed_of_sound_counts_as_missing() {
        let settings = ReconstructionSettings::with_physics(0.0, 2.5e-8, 0.1);
        let field = array![[1500.0]];
        let config = ReconstructionConfig::from_settings(&settings, Some(field.view())).unwrap();
        assert_eq!(config.speed_of_sound_m_per_s, 1500.0);
    }

    #[test]
    fn test_unresolvable_speed_of_sound_is_fatal() {
        let mut settings = ReconstructionSettings::with_physics(1540.0, 2.5e-8, 0.1);
        settings.speed_of_sound_m_per_s = None;
        let err = ReconstructionConfig::from_settings(&settings, None).unwrap_err();
        assert!(err.to_string().contains("speed_of_sound_m_per_s"));
        assert!(err.to_string().contains("average speed of sound"));
    }

    #[test]
    fn test_missing_time_spacing_is_fatal() {
        let mut settings = ReconstructionSettings::with_physics(1540.0, 2.5e-8, 0.1);
        settings.simulator_time_step_s = None;
        let err = ReconstructionConfig::from_settings(&settings, None).unwrap_err();
        assert!(err.to_string().contains("sampling_rate_hz"));
    }

    #[test]
    fn test_accelerator_defaults_on() {
        let settings = ReconstructionSettings::with_physics(1540.0, 2.5e-8, 0.1);
        let config = ReconstructionConfig::from_settings(&settings, None).unwrap();
        assert!(config.use_accelerator);

        let mut settings = ReconstructionSettings::with_physics(1540.0, 2.5e-8, 0.1);
        settings.use_accelerator = Some(false);
        let config = ReconstructionConfig::from_settings(&settings, None).unwrap();
        assert!(!config.use_accelerator);
    }
}
