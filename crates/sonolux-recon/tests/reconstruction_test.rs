//! End-to-end tests of the reconstruction stage against a pipeline store
//!
//! These tests drive the full stage path: store read, envelope detection,
//! configuration resolution, device resolution, bandpass filtering, and
//! delay-and-sum beamforming.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::{Arc, RwLock};

use ndarray::{array, Array2};
use sonolux_core::{
    BmodeMethod, CoreError, DataKind, DataVariant, DeviceDescriptor, LinearArrayGeometry,
    PipelineConfig, PipelineStore, ReconstructionSettings, Stage, StageContext, StageError,
    StorageError, StoreKey,
};
use sonolux_recon::ReconstructionAdapter;

/// Minimal in-memory store standing in for the durable pipeline store.
#[derive(Default)]
struct MemoryStore {
    blobs: RwLock<HashMap<StoreKey, Array2<f64>>>,
}

impl PipelineStore for MemoryStore {
    fn read(&self, key: &StoreKey) -> Result<Array2<f64>, StorageError> {
        self.blobs
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound { key: key.path() })
    }

    fn write(&self, key: &StoreKey, data: Array2<f64>) -> Result<(), StorageError> {
        self.blobs.write().unwrap().insert(key.clone(), data);
        Ok(())
    }

    fn contains(&self, key: &StoreKey) -> bool {
        self.blobs.read().unwrap().contains_key(key)
    }

    fn keys(&self) -> Vec<StoreKey> {
        self.blobs.read().unwrap().keys().cloned().collect()
    }
}

fn four_element_device() -> DeviceDescriptor {
    DeviceDescriptor::Geometry(Arc::new(LinearArrayGeometry::new(4, 0.1).unwrap()))
}

fn config_with(
    settings: ReconstructionSettings,
    device: DeviceDescriptor,
    apply_noise: bool,
) -> PipelineConfig {
    let noise = sonolux_core::NoiseSettings {
        apply_noise_model: apply_noise,
        ..sonolux_core::NoiseSettings::default()
    };
    PipelineConfig::builder()
        .wavelengths(vec![700])
        .device(device)
        .reconstruction(settings)
        .noise(noise)
        .build()
        .unwrap()
}

/// The stage reads the recording, bandpass-filters it with the default
/// cutoffs, beamforms, and writes the image under the wavelength's
/// reconstruction key.
#[test]
fn reconstruction_stage_round_trips_in_band_tone() {
    let store = MemoryStore::default();
    // 4 MHz tone on bin 400 of the 40 MHz, 4000-sample grid; the default
    // [0.1, 8] MHz pass band tapers its outer 197 bins, bin 400 sits in
    // the flat middle
    let n = 4000;
    let series = Array2::from_shape_fn((4, n), |(_, t)| (TAU * 400.0 * t as f64 / n as f64).cos());
    store.write(&StoreKey::time_series(700), series).unwrap();

    let settings = ReconstructionSettings::with_physics(1500.0, 2.5e-8, 0.1);
    let config = config_with(settings, four_element_device(), false);
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    stage.run(&store, &ctx).unwrap();

    assert!(store.contains(&StoreKey::reconstruction(700)));
    assert!(!store.contains(&StoreKey::reconstruction(800)));

    let image = store.read(&StoreKey::reconstruction(700)).unwrap();
    println!("reconstructed image shape: {:?}", image.dim());
    assert_eq!(image.dim(), (4, 1500));

    // the filtered tone is a flat 0.5 envelope, so every reachable pixel
    // averages to 0.5
    for &(x, y) in &[(0, 0), (3, 0), (1, 700), (2, 1499)] {
        let value = image[(x, y)];
        assert!(
            (value - 0.5).abs() < 1e-6,
            "pixel ({x}, {y}) expected 0.5, got {value}"
        );
    }
}

/// With the noise model enabled the stage must reconstruct the noisy
/// recording, not the raw one.
#[test]
fn stage_prefers_noisy_recording_when_noise_enabled() {
    let store = MemoryStore::default();
    store
        .write(&StoreKey::time_series(700), Array2::ones((4, 100)))
        .unwrap();
    // a silent noisy recording: every value zero, so every pixel divides
    // by a zero contribution count
    store
        .write(
            &StoreKey::new(DataKind::TimeSeriesWithNoise, 700, DataVariant::Normal),
            Array2::zeros((4, 100)),
        )
        .unwrap();

    let mut settings = ReconstructionSettings::with_physics(1500.0, 1e-8, 0.1);
    settings.bandpass_enabled = false;
    let config = config_with(settings, four_element_device(), true);
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    stage.run(&store, &ctx).unwrap();

    let image = store.read(&StoreKey::reconstruction(700)).unwrap();
    assert_eq!(image.dim(), (4, 15));
    let nan_pixels = image.iter().filter(|v| v.is_nan()).count();
    println!("NaN pixels from silent recording: {nan_pixels} of {}", image.len());
    assert_eq!(nan_pixels, image.len(), "silent recording must yield no data");
}

/// Missing configuration fails before the device is even looked at.
#[test]
fn missing_pixel_spacing_fails_before_device_lookup() {
    let store = MemoryStore::default();
    store
        .write(&StoreKey::time_series(700), Array2::ones((4, 100)))
        .unwrap();

    let settings = ReconstructionSettings {
        speed_of_sound_m_per_s: Some(1500.0),
        simulator_time_step_s: Some(1e-8),
        ..ReconstructionSettings::default()
    };
    // pixel spacing left unset, device unknown: the spacing error wins
    let config = config_with(
        settings,
        DeviceDescriptor::Named("missing_probe".to_string()),
        false,
    );
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    let err = stage.run(&store, &ctx).unwrap_err();
    match err {
        StageError::Core(core @ CoreError::Configuration { .. }) => {
            assert!(core.to_string().contains("pixel_spacing_mm"));
            assert!(core.is_configuration());
        }
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

/// An unknown device name is reported with the catalog contents.
#[test]
fn unknown_device_is_not_supported_for_reconstruction() {
    let store = MemoryStore::default();
    store
        .write(&StoreKey::time_series(700), Array2::ones((4, 100)))
        .unwrap();

    let mut settings = ReconstructionSettings::with_physics(1500.0, 1e-8, 0.1);
    settings.bandpass_enabled = false;
    let config = config_with(
        settings,
        DeviceDescriptor::Named("ring_array".to_string()),
        false,
    );
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    let err = stage.run(&store, &ctx).unwrap_err();
    let text = err.to_string();
    println!("unknown device error: {text}");
    assert!(text.contains("not supported for performing image reconstruction"));
    assert!(text.contains("linear_array_128"));
}

/// Without an explicit speed of sound the stage averages the stored
/// speed-of-sound map of the current wavelength.
#[test]
fn speed_of_sound_falls_back_to_stored_map() {
    let store = MemoryStore::default();
    store
        .write(&StoreKey::time_series(700), Array2::ones((4, 100)))
        .unwrap();
    store
        .write(
            &StoreKey::sound_speed(700),
            array![[1400.0, 1600.0], [1500.0, 1500.0]],
        )
        .unwrap();

    let mut settings = ReconstructionSettings::with_physics(1500.0, 1e-8, 0.1);
    settings.speed_of_sound_m_per_s = None;
    settings.bandpass_enabled = false;
    let config = config_with(settings, four_element_device(), false);
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    stage.run(&store, &ctx).unwrap();

    // mean sound speed is 1500 m/s, so the extent matches the explicit case
    let image = store.read(&StoreKey::reconstruction(700)).unwrap();
    assert_eq!(image.dim(), (4, 15));
    let value = image[(3, 0)];
    assert!((value - 1.0).abs() < 1e-12, "got {value}");
}

/// Envelope detection runs before beamforming: a negative recording
/// reconstructs like its absolute value.
#[test]
fn abs_envelope_runs_before_beamforming() {
    let store = MemoryStore::default();
    store
        .write(&StoreKey::time_series(700), Array2::from_elem((4, 100), -1.0))
        .unwrap();

    let mut settings = ReconstructionSettings::with_physics(1500.0, 1e-8, 0.1);
    settings.bandpass_enabled = false;
    settings.bmode_method = Some(BmodeMethod::AbsEnvelope);
    let config = config_with(settings, four_element_device(), false);
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    stage.run(&store, &ctx).unwrap();

    let image = store.read(&StoreKey::reconstruction(700)).unwrap();
    let value = image[(3, 0)];
    assert!((value - 1.0).abs() < 1e-12, "expected 1.0 after abs envelope, got {value}");
}

/// A missing recording surfaces as a storage error naming the key.
#[test]
fn missing_recording_is_a_storage_error() {
    let store = MemoryStore::default();
    let settings = ReconstructionSettings::with_physics(1500.0, 1e-8, 0.1);
    let config = config_with(settings, four_element_device(), false);
    let ctx = StageContext::new(&config, 700);

    let mut stage = ReconstructionAdapter::with_builtin_devices();
    let err = stage.run(&store, &ctx).unwrap_err();
    assert!(matches!(err, StageError::Core(CoreError::Storage(_))));
    assert!(err.to_string().contains("time_series_data_700"));
}
