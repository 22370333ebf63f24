//! Imaging devices and detection geometries.
//!
//! A reconstruction needs to know where the sensor elements sit. That
//! knowledge arrives as a [`DeviceDescriptor`]: either a detection geometry
//! directly, a [`PhotoacousticDevice`] wrapping one, or the name of a device
//! registered in a [`DeviceCatalog`]. Anything else is not supported for
//! image reconstruction and fails with
//! [`DeviceError::UnsupportedDeviceType`](crate::error::DeviceError::UnsupportedDeviceType).
//!
//! The full device catalog of a production deployment is an external
//! collaborator; this module ships the trait, one concrete linear-array
//! geometry, and the registry machinery.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;

use crate::config::ReconstructionSettings;
use crate::error::{CoreResult, DeviceError};

/// Sensor-element layout of an imaging device.
///
/// Implementations return element positions in millimetres, already
/// accounting for the device position, and get a chance to reject settings
/// they cannot work with before any position processing starts.
pub trait DetectionGeometry: fmt::Debug + Send + Sync {
    /// Geometry name used in diagnostics.
    fn name(&self) -> &str;

    /// Number of sensor elements.
    fn element_count(&self) -> usize;

    /// Element positions in millimetres, shape `(element_count, 3)` with
    /// columns `(x, y, z)`; the imaging plane is `(x, z)`.
    fn element_positions_mm(&self) -> Array2<f64>;

    /// Device-specific settings prerequisites, checked before any position
    /// processing.
    ///
    /// # Errors
    ///
    /// Returns a device error when the settings cannot be used with this
    /// geometry.
    fn check_prerequisites(&self, settings: &ReconstructionSettings) -> CoreResult<()>;
}

/// A linear transducer array along the x axis.
///
/// Elements sit at `device_position + i * pitch` on x, sharing the device's
/// y and z. With a non-negative device x position this is a one-sided
/// layout, matching the assumption the beamforming engine makes about
/// sensor x coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearArrayGeometry {
    element_count: usize,
    pitch_mm: f64,
    device_position_mm: [f64; 3],
}

impl LinearArrayGeometry {
    /// Creates a linear array with the given element count and pitch.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidGeometry`] when the element count is
    /// zero or the pitch is not strictly positive.
    pub fn new(element_count: usize, pitch_mm: f64) -> Result<Self, DeviceError> {
        if element_count == 0 {
            return Err(DeviceError::InvalidGeometry {
                message: "linear array needs at least one element".to_string(),
            });
        }
        if pitch_mm <= 0.0 {
            return Err(DeviceError::InvalidGeometry {
                message: format!("linear array pitch must be positive, got {pitch_mm} mm"),
            });
        }
        Ok(Self {
            element_count,
            pitch_mm,
            device_position_mm: [0.0; 3],
        })
    }

    /// Moves the device to the given position in millimetres.
    #[must_use]
    pub fn with_device_position(mut self, position_mm: [f64; 3]) -> Self {
        self.device_position_mm = position_mm;
        self
    }

    /// Element pitch in millimetres.
    #[must_use]
    pub fn pitch_mm(&self) -> f64 {
        self.pitch_mm
    }
}

impl DetectionGeometry for LinearArrayGeometry {
    fn name(&self) -> &str {
        "linear_array"
    }

    fn element_count(&self) -> usize {
        self.element_count
    }

    fn element_positions_mm(&self) -> Array2<f64> {
        let mut positions = Array2::zeros((self.element_count, 3));
        for i in 0..self.element_count {
            positions[(i, 0)] = self.device_position_mm[0] + i as f64 * self.pitch_mm;
            positions[(i, 1)] = self.device_position_mm[1];
            positions[(i, 2)] = self.device_position_mm[2];
        }
        positions
    }

    fn check_prerequisites(&self, settings: &ReconstructionSettings) -> CoreResult<()> {
        // A spacing coarser than the pitch folds adjacent elements onto the
        // same pixel and the delay grid loses them.
        if let Some(spacing) = settings.pixel_spacing_mm.filter(|&s| s != 0.0) {
            if spacing > self.pitch_mm {
                return Err(DeviceError::PrerequisitesNotMet {
                    device: self.name().to_string(),
                    message: format!(
                        "pixel spacing {spacing} mm exceeds the element pitch {} mm",
                        self.pitch_mm
                    ),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// A named imaging device wrapping a detection geometry.
#[derive(Debug, Clone)]
pub struct PhotoacousticDevice {
    name: String,
    geometry: Arc<dyn DetectionGeometry>,
}

impl PhotoacousticDevice {
    /// Creates a device from a name and a detection geometry.
    #[must_use]
    pub fn new(name: impl Into<String>, geometry: Arc<dyn DetectionGeometry>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped detection geometry.
    #[must_use]
    pub fn detection_geometry(&self) -> Arc<dyn DetectionGeometry> {
        Arc::clone(&self.geometry)
    }
}

/// How a reconstruction identifies its imaging device.
#[derive(Debug, Clone)]
pub enum DeviceDescriptor {
    /// A detection geometry, used directly
    Geometry(Arc<dyn DetectionGeometry>),
    /// A device wrapping a detection geometry
    Device(PhotoacousticDevice),
    /// The name of a device registered in the catalog
    Named(String),
}

impl DeviceDescriptor {
    /// Resolves the descriptor to a detection geometry.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::UnsupportedDeviceType`] when a named device is
    /// not present in the catalog.
    pub fn resolve_geometry(
        &self,
        catalog: &DeviceCatalog,
    ) -> Result<Arc<dyn DetectionGeometry>, DeviceError> {
        match self {
            Self::Geometry(geometry) => Ok(Arc::clone(geometry)),
            Self::Device(device) => Ok(device.detection_geometry()),
            Self::Named(name) => catalog
                .get(name)
                .map(PhotoacousticDevice::detection_geometry)
                .ok_or_else(|| DeviceError::UnsupportedDeviceType {
                    requested: name.clone(),
                    known: catalog.device_names(),
                }),
        }
    }
}

/// Registry of known imaging devices, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: HashMap<String, PhotoacousticDevice>,
}

impl DeviceCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog populated with the built-in devices.
    ///
    /// Currently a single 128-element linear array with 0.3 mm pitch.
    #[must_use]
    pub fn with_builtin_devices() -> Self {
        let mut catalog = Self::new();
        let geometry = Arc::new(LinearArrayGeometry {
            element_count: 128,
            pitch_mm: 0.3,
            device_position_mm: [0.0; 3],
        });
        catalog.register(PhotoacousticDevice::new("linear_array_128", geometry));
        catalog
    }

    /// Registers a device under its name, replacing any previous entry.
    pub fn register(&mut self, device: PhotoacousticDevice) {
        self.devices.insert(device.name().to_string(), device);
    }

    /// Looks up a device by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PhotoacousticDevice> {
        self.devices.get(name)
    }

    /// Names of all registered devices, sorted.
    #[must_use]
    pub fn device_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.devices.keys().cloned().collect();
        names.sort();
        names
    }
}
