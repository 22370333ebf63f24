//! Delay-and-sum beamforming.
//!
//! For every image pixel and sensor element the engine computes the
//! round-trip sample delay from the euclidean distance in pixel space,
//! gathers the recorded value at that delay, and averages the
//! contributions. Delays falling outside the recording are discarded, and
//! the per-pixel average divides by the number of *non-zero* contributions;
//! a pixel no element can reach comes out NaN rather than a silent zero.
//!
//! Sensor x coordinates enter the delay as their absolute value, so the
//! engine assumes a one-sided sensor layout along x. The finished image is
//! flipped along x into the display orientation downstream viewers expect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{Array2, Axis};
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use sonolux_core::{ReconstructedImage, SensorGeometry, TimeSeries};

use crate::config::ReconstructionConfig;
use crate::windows::apodization_weights;

/// Errors from the beamforming engine.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BeamformError {
    /// Geometry and time series disagree on the element count
    #[error("Sensor geometry has {geometry_elements} elements but the time series has {series_elements}")]
    GeometryMismatch {
        /// Elements in the sensor geometry
        geometry_elements: usize,
        /// Elements (rows) in the time series
        series_elements: usize,
    },

    /// The reconstruction was cancelled through its [`CancelToken`]
    #[error("Reconstruction was cancelled")]
    Cancelled,
}

/// Cooperative cancellation handle for long reconstructions.
///
/// Cloning shares the flag; the engine checks it between pixel rows, so
/// cancellation takes effect at row granularity.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Delay-and-sum reconstruction engine.
///
/// The engine is cheap to construct and holds only the resolved
/// configuration; one engine can reconstruct any number of recordings.
#[derive(Debug, Clone)]
pub struct BeamformingEngine {
    config: ReconstructionConfig,
}

impl BeamformingEngine {
    /// Creates an engine from a resolved configuration.
    #[must_use]
    pub fn new(config: ReconstructionConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstructs an image from a recording and its sensor geometry.
    ///
    /// # Errors
    ///
    /// Returns [`BeamformError::GeometryMismatch`] when the element counts
    /// disagree.
    pub fn reconstruct(
        &self,
        series: &TimeSeries,
        geometry: &SensorGeometry,
    ) -> Result<ReconstructedImage, BeamformError> {
        self.reconstruct_with_cancel(series, geometry, &CancelToken::new())
    }

    /// Reconstructs an image, checking `cancel` between pixel rows.
    ///
    /// The multi-threaded and single-threaded paths compute rows with the
    /// same scalar kernel and produce bit-identical images.
    ///
    /// # Errors
    ///
    /// Returns [`BeamformError::GeometryMismatch`] when the element counts
    /// disagree, or [`BeamformError::Cancelled`] when the token fires
    /// before the image is finished.
    pub fn reconstruct_with_cancel(
        &self,
        series: &TimeSeries,
        geometry: &SensorGeometry,
        cancel: &CancelToken,
    ) -> Result<ReconstructedImage, BeamformError> {
        let element_count = series.element_count();
        if geometry.element_count() != element_count {
            return Err(BeamformError::GeometryMismatch {
                geometry_elements: geometry.element_count(),
                series_elements: element_count,
            });
        }

        let sample_count = series.sample_count();
        let speed_of_sound = self.config.speed_of_sound_m_per_s;
        let time_spacing_ms = self.config.time_spacing_s * 1000.0;
        let spacing_mm = self.config.pixel_spacing_mm;

        let (min_x, max_x) = geometry.x_bounds();
        let x_pixels = (max_x - min_x) as usize + 1;
        let y_pixels = (sample_count as f64 * time_spacing_ms * speed_of_sound / spacing_mm)
            .round_ties_even() as usize;
        debug!(x_pixels, y_pixels, element_count, "beamformed image extent");

        let weights = apodization_weights(self.config.apodization, element_count);
        // sensor x enters the delay as its absolute value (one-sided layout)
        let sensors: Vec<(i64, i64)> = (0..element_count)
            .map(|j| (geometry.x_at(j).abs(), geometry.y_at(j)))
            .collect();

        let data = series.data();
        let mm_per_sample = speed_of_sound * time_spacing_ms;
        let max_delay = sample_count as i64;

        let compute_row = |x: usize| -> Vec<f64> {
            let mut row = vec![0.0; y_pixels];
            for (y, pixel) in row.iter_mut().enumerate() {
                let mut sum = 0.0;
                let mut contributing = 0_u32;
                for (j, &(sensor_x_abs, sensor_y)) in sensors.iter().enumerate() {
                    let dy_mm = (y as i64 - sensor_y) as f64 * spacing_mm;
                    let dx_mm = (x as i64 - sensor_x_abs) as f64 * spacing_mm;
                    let delay = ((dy_mm * dy_mm + dx_mm * dx_mm).sqrt() / mm_per_sample)
                        .round_ties_even() as i64;
                    if delay >= 0 && delay < max_delay {
                        let value = data[(j, delay as usize)] * weights[j];
                        sum += value;
                        if value != 0.0 {
                            contributing += 1;
                        }
                    }
                }
                // dividing by the non-zero count; no reachable element
                // leaves 0/0 = NaN
                *pixel = sum / f64::from(contributing);
            }
            row
        };

        let rows: Vec<Vec<f64>> = if self.config.use_accelerator {
            (0..x_pixels)
                .into_par_iter()
                .map(|x| {
                    if cancel.is_cancelled() {
                        return Err(BeamformError::Cancelled);
                    }
                    Ok(compute_row(x))
                })
                .collect::<Result<_, _>>()?
        } else {
            let mut rows = Vec::with_capacity(x_pixels);
            for x in 0..x_pixels {
                if cancel.is_cancelled() {
                    return Err(BeamformError::Cancelled);
                }
                rows.push(compute_row(x));
            }
            rows
        };

        let mut image = Array2::zeros((x_pixels, y_pixels));
        for (x, row) in rows.into_iter().enumerate() {
            for (y, value) in row.into_iter().enumerate() {
                image[(x, y)] = value;
            }
        }
        image.invert_axis(Axis(0));
        Ok(ReconstructedImage::new(image))
    }
}
