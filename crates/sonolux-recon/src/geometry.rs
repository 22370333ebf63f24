//! Resolution of imaging devices into pixel-space sensor geometry.
//!
//! The resolver turns a [`DeviceDescriptor`] into the integer pixel
//! coordinates the beamforming engine works with: physical element
//! positions in millimetres divided by the pixel spacing and rounded
//! half-to-even. The device's own prerequisites are checked first, before
//! any position processing.

use ndarray::Array2;
use sonolux_core::{
    CoreResult, DeviceCatalog, DeviceDescriptor, ReconstructionSettings, SensorGeometry,
};

/// Resolves device descriptors against a device catalog.
#[derive(Debug, Clone, Default)]
pub struct GeometryResolver {
    catalog: DeviceCatalog,
}

impl GeometryResolver {
    /// Creates a resolver over the given catalog.
    #[must_use]
    pub fn new(catalog: DeviceCatalog) -> Self {
        Self { catalog }
    }

    /// Creates a resolver over the built-in device catalog.
    #[must_use]
    pub fn with_builtin_devices() -> Self {
        Self::new(DeviceCatalog::with_builtin_devices())
    }

    /// The catalog this resolver consults.
    #[must_use]
    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// Resolves a descriptor to pixel-space sensor geometry.
    ///
    /// Element positions project onto the imaging plane as `(x, z)`; the
    /// out-of-plane coordinate is dropped.
    ///
    /// # Errors
    ///
    /// Returns a device error when the descriptor cannot be resolved or
    /// the geometry rejects the settings, and a configuration error when
    /// the pixel spacing is missing.
    pub fn resolve(
        &self,
        device: &DeviceDescriptor,
        settings: &ReconstructionSettings,
    ) -> CoreResult<SensorGeometry> {
        let geometry = device.resolve_geometry(&self.catalog)?;
        geometry.check_prerequisites(settings)?;

        let spacing_mm = settings.resolve_pixel_spacing_mm()?;
        let positions_mm = geometry.element_positions_mm();
        let element_count = positions_mm.nrows();

        let mut pixels = Array2::zeros((element_count, 2));
        for j in 0..element_count {
            pixels[(j, 0)] = (positions_mm[(j, 0)] / spacing_mm).round_ties_even() as i64;
            pixels[(j, 1)] = (positions_mm[(j, 2)] / spacing_mm).round_ties_even() as i64;
        }
        SensorGeometry::from_pixel_positions(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonolux_core::{DeviceError, LinearArrayGeometry};
    use std::sync::Arc;

    fn settings_with_spacing(spacing_mm: f64) -> ReconstructionSettings {
        ReconstructionSettings::with_physics(1500.0, 2.5e-8, spacing_mm)
    }

    #[test]
    fn test_linear_array_maps_to_pixel_grid() {
        let geometry = Arc::new(LinearArrayGeometry::new(4, 0.3).unwrap());
        let resolver = GeometryResolver::new(DeviceCatalog::new());
        let resolved = resolver
            .resolve(
                &DeviceDescriptor::Geometry(geometry),
                &settings_with_spacing(0.3),
            )
            .unwrap();
        assert_eq!(resolved.element_count(), 4);
        for j in 0..4 {
            assert_eq!(resolved.x_at(j), j as i64);
            assert_eq!(resolved.y_at(j), 0);
        }
    }

    #[test]
    fn test_positions_round_half_to_even() {
        // element x in mm: 0.125, 0.375, 0.625, 0.875; spacing 0.25 puts
        // every element exactly between two pixels
        let geometry = Arc::new(
            LinearArrayGeometry::new(4, 0.25)
                .unwrap()
                .with_device_position([0.125, 0.0, 0.0]),
        );
        let resolver = GeometryResolver::new(DeviceCatalog::new());
        let resolved = resolver
            .resolve(
                &DeviceDescriptor::Geometry(geometry),
                &settings_with_spacing(0.25),
            )
            .unwrap();
        let xs: Vec<i64> = (0..4).map(|j| resolved.x_at(j)).collect();
        assert_eq!(xs, vec![0, 2, 2, 4]);
    }

    #[test]
    fn test_unknown_named_device_is_unsupported() {
        let resolver = GeometryResolver::with_builtin_devices();
        let err = resolver
            .resolve(
                &DeviceDescriptor::Named("ring_array".to_string()),
                &settings_with_spacing(0.1),
            )
            .unwrap_err();
        assert!(err.to_string().contains("not supported for performing image reconstruction"));
    }

    #[test]
    fn test_prerequisites_checked_before_positions() {
        let geometry = Arc::new(LinearArrayGeometry::new(4, 0.1).unwrap());
        let resolver = GeometryResolver::new(DeviceCatalog::new());
        let err = resolver
            .resolve(
                &DeviceDescriptor::Geometry(geometry),
                &settings_with_spacing(0.2),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            sonolux_core::CoreError::Device(DeviceError::PrerequisitesNotMet { .. })
        ));
    }

    #[test]
    fn test_missing_spacing_is_fatal() {
        let geometry = Arc::new(LinearArrayGeometry::new(4, 0.1).unwrap());
        let resolver = GeometryResolver::new(DeviceCatalog::new());
        let mut settings = settings_with_spacing(0.1);
        settings.pixel_spacing_mm = None;
        let err = resolver
            .resolve(&DeviceDescriptor::Geometry(geometry), &settings)
            .unwrap_err();
        assert!(err.to_string().contains("pixel_spacing_mm"));
    }
}
