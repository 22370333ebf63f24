//! Core data types for photoacoustic simulation and reconstruction.
//!
//! The three value types exchanged between pipeline stages:
//!
//! - [`TimeSeries`]: recorded pressure per sensor element over time
//! - [`SensorGeometry`]: per-element pixel coordinates in the imaging plane
//! - [`ReconstructedImage`]: the beamformed output image
//!
//! All three wrap [`ndarray`] arrays and validate their structural invariants
//! at construction, so downstream code can rely on non-empty, well-shaped
//! data.

use ndarray::{Array2, ArrayView2};

use crate::error::{CoreError, CoreResult};

/// Wavelength in nanometres, used to key per-wavelength pipeline data.
pub type WavelengthNm = u32;

/// A 2-D pressure recording: one row per sensor element, one column per time
/// sample, contiguous sampling at a fixed interval.
///
/// The sampling interval itself is configuration, not data; see
/// `ReconstructionSettings`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    data: Array2<f64>,
}

impl TimeSeries {
    /// Creates a time series from raw sensor data of shape
    /// `(sensor_element_count, time_sample_count)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if either dimension is zero.
    pub fn new(data: Array2<f64>) -> CoreResult<Self> {
        if data.nrows() == 0 {
            return Err(CoreError::validation(
                "time series must contain at least one sensor element",
            ));
        }
        if data.ncols() == 0 {
            return Err(CoreError::validation(
                "time series must contain at least one time sample",
            ));
        }
        Ok(Self { data })
    }

    /// Number of sensor elements (rows).
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.data.nrows()
    }

    /// Number of time samples per element (columns).
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.data.ncols()
    }

    /// Borrows the underlying array.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consumes the series, returning the underlying array.
    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

/// Ordered per-element pixel coordinates in the imaging plane.
///
/// Derived from physical device positions (millimetres) divided by the pixel
/// spacing and rounded to nearest. Row `j` holds `(x, y)` for sensor element
/// `j`; agreement with a [`TimeSeries`] element count is checked by the
/// beamforming engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorGeometry {
    positions: Array2<i64>,
}

impl SensorGeometry {
    /// Creates a geometry from integer pixel positions of shape
    /// `(element_count, 2)` with columns `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the array is empty or does not
    /// have exactly two columns.
    pub fn from_pixel_positions(positions: Array2<i64>) -> CoreResult<Self> {
        if positions.nrows() == 0 {
            return Err(CoreError::validation(
                "sensor geometry must contain at least one element",
            ));
        }
        if positions.ncols() != 2 {
            return Err(CoreError::validation(format!(
                "sensor geometry positions must have 2 columns (x, y), got {}",
                positions.ncols()
            )));
        }
        Ok(Self { positions })
    }

    /// Number of sensor elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.positions.nrows()
    }

    /// Pixel x coordinate of element `j`.
    #[must_use]
    pub fn x_at(&self, j: usize) -> i64 {
        self.positions[(j, 0)]
    }

    /// Pixel y coordinate of element `j`.
    #[must_use]
    pub fn y_at(&self, j: usize) -> i64 {
        self.positions[(j, 1)]
    }

    /// Minimum and maximum x coordinate over all elements.
    #[must_use]
    pub fn x_bounds(&self) -> (i64, i64) {
        let mut min = i64::MAX;
        let mut max = i64::MIN;
        for &x in self.positions.column(0) {
            min = min.min(x);
            max = max.max(x);
        }
        (min, max)
    }

    /// Borrows the `(element_count, 2)` position array.
    #[must_use]
    pub fn positions(&self) -> ArrayView2<'_, i64> {
        self.positions.view()
    }
}

/// A beamformed image of shape `(x_pixels, y_pixels)`.
///
/// Produced once per reconstruction call and immutable afterwards. Pixels
/// with no contributing sensor elements are non-finite (NaN or infinite) and
/// are to be treated as "no data" by consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedImage {
    data: Array2<f64>,
}

impl ReconstructedImage {
    /// Wraps a finished image array.
    #[must_use]
    pub fn new(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Image extent along the sensor axis.
    #[must_use]
    pub fn x_pixels(&self) -> usize {
        self.data.nrows()
    }

    /// Image extent along the depth axis.
    #[must_use]
    pub fn y_pixels(&self) -> usize {
        self.data.ncols()
    }

    /// Number of pixels that carry no data (NaN or infinite).
    #[must_use]
    pub fn non_finite_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_finite()).count()
    }

    /// Borrows the underlying array.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consumes the image, returning the underlying array.
    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}
