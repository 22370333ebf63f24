//! Frequency-domain bandpass filtering of recorded pressure data.
//!
//! The filter builds a Tukey-tapered pass window over the discrete FFT
//! frequency grid of the recording and multiplies every element's spectrum
//! with it. Cutoff frequencies must land *exactly* on grid bins: the grid
//! depends on the sample count and time spacing, so a cutoff that merely
//! comes close would silently shift the pass band. Off-grid cutoffs are
//! rejected with the nearest achievable value in the error.
//!
//! Only non-negative frequency bins are kept, so the output is the
//! magnitude of the filtered analytic-like signal, not a phase-preserving
//! band-limited waveform.

use ndarray::{s, Array1, Array2};
use num_complex::Complex64;
use rustfft::FftPlanner;
use thiserror::Error;
use tracing::debug;

use crate::windows::tukey_window;

/// Errors from bandpass-filter construction.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BandpassError {
    /// The cutoff values are inverted or equal
    #[error(
        "The bandpass filter high cutoff ({high_hz} Hz) must exceed the low cutoff ({low_hz} Hz)"
    )]
    CutoffOrder {
        /// Requested low cutoff in Hz
        low_hz: f64,
        /// Requested high cutoff in Hz
        high_hz: f64,
    },

    /// The low cutoff does not land on a frequency bin of the recording
    #[error("The low bandpass cutoff {requested_hz} Hz does not match any frequency bin of the recording; the nearest achievable cutoff is {nearest_hz} Hz")]
    LowCutoffOffGrid {
        /// Requested low cutoff in Hz
        requested_hz: f64,
        /// Closest bin frequency in Hz
        nearest_hz: f64,
    },

    /// The high cutoff does not land on a frequency bin of the recording
    #[error("The high bandpass cutoff {requested_hz} Hz does not match any frequency bin of the recording; the nearest achievable cutoff is {nearest_hz} Hz")]
    HighCutoffOffGrid {
        /// Requested high cutoff in Hz
        requested_hz: f64,
        /// Closest bin frequency in Hz
        nearest_hz: f64,
    },
}

/// The signed FFT frequency grid for a recording.
///
/// Bin `k` carries `k / (n * dt)` Hz for the non-negative half,
/// `(k - n) / (n * dt)` Hz for the negative half, matching the standard
/// FFT bin layout. Cutoff matching uses exact `f64` equality against
/// these values, so they are computed here in exactly one way.
#[must_use]
pub fn frequency_grid(sample_count: usize, time_spacing_s: f64) -> Array1<f64> {
    let n = sample_count;
    let mut frequencies = Array1::zeros(n);
    if n == 0 {
        return frequencies;
    }
    let val = 1.0 / (n as f64 * time_spacing_s);
    let half = (n - 1) / 2;
    for k in 0..=half {
        frequencies[k] = k as f64 * val;
    }
    for k in (half + 1)..n {
        frequencies[k] = (k as i64 - n as i64) as f64 * val;
    }
    frequencies
}

fn nearest_bin_hz(frequencies: &Array1<f64>, requested_hz: f64) -> f64 {
    let mut nearest = 0.0;
    let mut best = f64::INFINITY;
    for &f in frequencies {
        let distance = (f - requested_hz).abs();
        if distance < best {
            best = distance;
            nearest = f;
        }
    }
    nearest
}

/// A bandpass filter bound to one recording shape.
///
/// Construction resolves the cutoffs to grid bins and builds the tapered
/// pass window once; [`apply`](Self::apply) then filters any number of
/// recordings with that shape.
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    window: Array1<f64>,
    low_index: usize,
    high_index: usize,
}

impl BandpassFilter {
    /// Builds a filter for recordings of `sample_count` samples at
    /// `time_spacing_s` seconds per sample.
    ///
    /// The Tukey pass window covers the bins `[low, high)` of the two
    /// cutoffs, tapered by `tukey_alpha`.
    ///
    /// # Errors
    ///
    /// Returns [`BandpassError::CutoffOrder`] when the high cutoff does not
    /// exceed the low one, and an off-grid error when either cutoff does
    /// not match a frequency bin exactly.
    pub fn new(
        sample_count: usize,
        time_spacing_s: f64,
        cutoff_low_hz: f64,
        cutoff_high_hz: f64,
        tukey_alpha: f64,
    ) -> Result<Self, BandpassError> {
        if cutoff_high_hz <= cutoff_low_hz {
            return Err(BandpassError::CutoffOrder {
                low_hz: cutoff_low_hz,
                high_hz: cutoff_high_hz,
            });
        }

        let frequencies = frequency_grid(sample_count, time_spacing_s);
        let low_index = frequencies
            .iter()
            .position(|&f| f == cutoff_low_hz)
            .ok_or_else(|| BandpassError::LowCutoffOffGrid {
                requested_hz: cutoff_low_hz,
                nearest_hz: nearest_bin_hz(&frequencies, cutoff_low_hz),
            })?;
        let high_index = frequencies
            .iter()
            .position(|&f| f == cutoff_high_hz)
            .ok_or_else(|| BandpassError::HighCutoffOffGrid {
                requested_hz: cutoff_high_hz,
                nearest_hz: nearest_bin_hz(&frequencies, cutoff_high_hz),
            })?;

        // Cutoff values are ordered, but a negative cutoff resolves to a
        // bin in the upper half of the grid, leaving no pass band.
        let span = high_index.saturating_sub(low_index);
        let taper = tukey_window(span, tukey_alpha);
        let mut window = Array1::zeros(sample_count);
        window.slice_mut(s![low_index..low_index + span]).assign(&taper);
        debug!(low_index, high_index, span, "bandpass window placed");

        Ok(Self {
            window,
            low_index,
            high_index,
        })
    }

    /// Index of the bin carrying the low cutoff.
    #[must_use]
    pub fn low_index(&self) -> usize {
        self.low_index
    }

    /// Index of the bin carrying the high cutoff (exclusive end of the
    /// pass window).
    #[must_use]
    pub fn high_index(&self) -> usize {
        self.high_index
    }

    /// The pass window over the full frequency grid.
    #[must_use]
    pub fn window(&self) -> &Array1<f64> {
        &self.window
    }

    /// Filters a recording of shape `(element_count, sample_count)`.
    ///
    /// Each row is transformed, multiplied with the pass window, and
    /// transformed back; the output holds the magnitude of the result.
    /// The sample count must match the one the filter was built for.
    #[must_use]
    pub fn apply(&self, series: &Array2<f64>) -> Array2<f64> {
        let n = series.ncols();
        debug_assert_eq!(n, self.window.len());

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        let ifft = planner.plan_fft_inverse(n);
        let scale = 1.0 / n as f64;

        let mut filtered = Array2::zeros(series.raw_dim());
        for (i, row) in series.outer_iter().enumerate() {
            let mut buffer: Vec<Complex64> =
                row.iter().map(|&sample| Complex64::new(sample, 0.0)).collect();
            fft.process(&mut buffer);
            for (bin, &weight) in buffer.iter_mut().zip(self.window.iter()) {
                *bin *= weight;
            }
            ifft.process(&mut buffer);
            for (j, bin) in buffer.iter().enumerate() {
                filtered[(i, j)] = (*bin * scale).norm();
            }
        }
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_grid_even_length() {
        let grid = frequency_grid(8, 0.5);
        let expected = [0.0, 0.25, 0.5, 0.75, -1.0, -0.75, -0.5, -0.25];
        for (g, e) in grid.iter().zip(&expected) {
            assert_eq!(g, e);
        }
    }

    #[test]
    fn test_frequency_grid_odd_length() {
        let grid = frequency_grid(5, 1.0);
        let expected = [0.0, 0.2, 0.4, -0.4, -0.2];
        for (g, e) in grid.iter().zip(&expected) {
            assert_eq!(g, e);
        }
    }

    #[test]
    fn test_frequency_grid_single_sample() {
        let grid = frequency_grid(1, 1e-8);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid[0], 0.0);
    }

    #[test]
    fn test_inverted_cutoffs_are_rejected() {
        let err = BandpassFilter::new(4000, 2.5e-8, 8e6, 1e5, 0.5).unwrap_err();
        assert!(matches!(err, BandpassError::CutoffOrder { .. }));
        // equal cutoffs leave no pass band either
        let err = BandpassFilter::new(4000, 2.5e-8, 1e5, 1e5, 0.5).unwrap_err();
        assert!(matches!(err, BandpassError::CutoffOrder { .. }));
    }

    #[test]
    fn test_off_grid_cutoff_reports_nearest_bin() {
        // bins of a 4000-sample, 40 MHz recording sit every 10 kHz
        let err = BandpassFilter::new(4000, 2.5e-8, 1.7e4, 8e6, 0.5).unwrap_err();
        match err {
            BandpassError::LowCutoffOffGrid {
                requested_hz,
                nearest_hz,
            } => {
                assert_eq!(requested_hz, 1.7e4);
                assert_eq!(nearest_hz, 2e4);
            }
            other => panic!("expected LowCutoffOffGrid, got {other:?}"),
        }
        assert!(err_text_contains(
            BandpassFilter::new(4000, 2.5e-8, 1e5, 8.003e6, 0.5),
            "nearest achievable"
        ));
    }

    fn err_text_contains(
        result: Result<BandpassFilter, BandpassError>,
        needle: &str,
    ) -> bool {
        match result {
            Err(err) => err.to_string().contains(needle),
            Ok(_) => false,
        }
    }

    #[test]
    fn test_default_cutoffs_land_on_exact_bins() {
        let filter = BandpassFilter::new(4000, 2.5e-8, 1e5, 8e6, 0.5).unwrap();
        assert_eq!(filter.low_index(), 10);
        assert_eq!(filter.high_index(), 800);
        assert_eq!(filter.window().len(), 4000);
        // window is zero outside the pass band
        assert_eq!(filter.window()[9], 0.0);
        assert_eq!(filter.window()[800], 0.0);
    }

    #[test]
    fn test_full_band_window_preserves_constant_series() {
        // DC through the highest positive bin with no taper keeps a
        // constant recording intact
        let filter = BandpassFilter::new(4000, 2.5e-8, 0.0, 19_990_000.0, 0.0).unwrap();
        let series = Array2::from_elem((2, 4000), 3.0);
        let filtered = filter.apply(&series);
        for &v in &filtered {
            assert!((v - 3.0).abs() < 1e-9, "got {v}");
        }
    }

    #[test]
    fn test_in_band_tone_survives_as_half_amplitude_envelope() {
        use std::f64::consts::TAU;
        // bin 100 of the 4000-sample grid = 1 MHz, inside [0.1, 8] MHz;
        // one-sided filtering yields the analytic magnitude, half the
        // cosine amplitude
        let n = 4000;
        let series = Array2::from_shape_fn((1, n), |(_, t)| {
            (TAU * 100.0 * t as f64 / n as f64).cos()
        });
        let filter = BandpassFilter::new(n, 2.5e-8, 1e5, 8e6, 0.0).unwrap();
        let filtered = filter.apply(&series);
        for &v in &filtered {
            assert!((v - 0.5).abs() < 1e-9, "got {v}");
        }
    }

    #[test]
    fn test_out_of_band_tone_is_suppressed() {
        use std::f64::consts::TAU;
        // bin 1500 = 15 MHz, above the 8 MHz cutoff
        let n = 4000;
        let series = Array2::from_shape_fn((1, n), |(_, t)| {
            (TAU * 1500.0 * t as f64 / n as f64).cos()
        });
        let filter = BandpassFilter::new(n, 2.5e-8, 1e5, 8e6, 0.0).unwrap();
        let filtered = filter.apply(&series);
        for &v in &filtered {
            assert!(v.abs() < 1e-9, "got {v}");
        }
    }
}
