//! Envelope detection (B-mode processing) of recorded pressure data.
//!
//! Applied per sensor element along the time axis, before any filtering or
//! beamforming. The Hilbert method computes the magnitude of the analytic
//! signal by zeroing negative-frequency bins; the absolute method is a
//! plain elementwise magnitude.

use ndarray::Array2;
use num_complex::Complex64;
use rustfft::FftPlanner;
use sonolux_core::BmodeMethod;

/// Applies the selected envelope detection to a recording of shape
/// `(element_count, sample_count)`.
#[must_use]
pub fn apply_bmode(series: &Array2<f64>, method: BmodeMethod) -> Array2<f64> {
    match method {
        BmodeMethod::None => series.clone(),
        BmodeMethod::AbsEnvelope => series.mapv(f64::abs),
        BmodeMethod::HilbertEnvelope => hilbert_envelope(series),
    }
}

/// Row-wise magnitude of the analytic signal, FFT method.
fn hilbert_envelope(series: &Array2<f64>) -> Array2<f64> {
    let n = series.ncols();
    if n == 0 {
        return series.clone();
    }
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);
    let scale = 1.0 / n as f64;

    // analytic-signal weights: DC (and Nyquist for even n) kept once,
    // positive bins doubled, negative bins dropped
    let mut weights = vec![0.0_f64; n];
    weights[0] = 1.0;
    if n % 2 == 0 {
        for w in weights.iter_mut().take(n / 2).skip(1) {
            *w = 2.0;
        }
        weights[n / 2] = 1.0;
    } else {
        for w in weights.iter_mut().take((n - 1) / 2 + 1).skip(1) {
            *w = 2.0;
        }
    }

    let mut envelope = Array2::zeros(series.raw_dim());
    for (i, row) in series.outer_iter().enumerate() {
        let mut buffer: Vec<Complex64> =
            row.iter().map(|&sample| Complex64::new(sample, 0.0)).collect();
        fft.process(&mut buffer);
        for (bin, &weight) in buffer.iter_mut().zip(weights.iter()) {
            *bin *= weight;
        }
        ifft.process(&mut buffer);
        for (j, bin) in buffer.iter().enumerate() {
            envelope[(i, j)] = (*bin * scale).norm();
        }
    }
    envelope
}
