//! Window functions used for filtering and apodization.
//!
//! Two conventions deliberately coexist here. The Tukey window for the
//! bandpass filter is *symmetric* (endpoints included, denominator
//! `len - 1`), while the Hann and Hamming apodization windows are
//! *periodic* (denominator `len`). Mixing the conventions changes the
//! reconstruction output, so resist the urge to unify them.

use std::f64::consts::PI;

use ndarray::Array1;
use sonolux_core::ApodizationKind;

/// Symmetric Tukey (tapered cosine) window of the given length.
///
/// `alpha` is the fraction of the window inside the cosine tapers:
/// `alpha <= 0` degenerates to a rectangular window, `alpha >= 1` to a
/// symmetric Hann window. Lengths 0 and 1 return an empty window and
/// `[1.0]` respectively.
#[must_use]
pub fn tukey_window(len: usize, alpha: f64) -> Array1<f64> {
    if len == 0 {
        return Array1::zeros(0);
    }
    if len == 1 {
        return Array1::ones(1);
    }
    if alpha <= 0.0 {
        return Array1::ones(len);
    }
    let span = (len - 1) as f64;
    if alpha >= 1.0 {
        return Array1::from_shape_fn(len, |n| {
            0.5 * (1.0 - (2.0 * PI * n as f64 / span).cos())
        });
    }

    let width = (alpha * span / 2.0).floor() as usize;
    let mut window = Array1::ones(len);
    for n in 0..=width {
        window[n] = 0.5 * (1.0 + (PI * (-1.0 + 2.0 * n as f64 / (alpha * span))).cos());
    }
    for n in (len - width - 1)..len {
        window[n] =
            0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * n as f64 / (alpha * span))).cos());
    }
    window
}

/// Periodic Hann window of the given length.
#[must_use]
pub fn hann_window(len: usize) -> Array1<f64> {
    if len == 1 {
        return Array1::ones(1);
    }
    Array1::from_shape_fn(len, |n| {
        0.5 - 0.5 * (2.0 * PI * n as f64 / len as f64).cos()
    })
}

/// Periodic Hamming window of the given length.
#[must_use]
pub fn hamming_window(len: usize) -> Array1<f64> {
    if len == 1 {
        return Array1::ones(1);
    }
    Array1::from_shape_fn(len, |n| {
        0.54 - 0.46 * (2.0 * PI * n as f64 / len as f64).cos()
    })
}

/// Per-element beamforming weights for the given apodization kind.
#[must_use]
pub fn apodization_weights(kind: ApodizationKind, element_count: usize) -> Array1<f64> {
    match kind {
        ApodizationKind::Box => Array1::ones(element_count),
        ApodizationKind::Hann => hann_window(element_count),
        ApodizationKind::Hamming => hamming_window(element_count),
    }
}
