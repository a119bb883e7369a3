//! Integration tests for the tubemat binary.
//!
//! Tests drive the full workflow: configuration, simulated through and sample
//! recordings, calibration, processing, and the persisted result.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use tubemat_analysis::ToneSpacing;
use tubemat_config::MeasurementConfig;
use tubemat_core::{BinStatus, CylindricalPores, Layer};
use tubemat_io::{load_calibration, load_result, read_channels, read_wav_info};

/// Helper to get the path to the `tubemat` binary built by cargo.
fn tubemat_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tubemat"))
}

fn run(args: &[&str]) -> Output {
    tubemat_bin()
        .args(args)
        .output()
        .expect("failed to run tubemat")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "tubemat failed\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Write a short, coarse configuration into `dir`.
fn quick_config(dir: &Path) -> PathBuf {
    let mut config = MeasurementConfig::default();
    config.excitation.duration_secs = 0.5;
    config.excitation.settle_secs = 0.1;
    config.excitation.f_low = 100.0;
    config.excitation.spacing = ToneSpacing::Linear { step_hz: 10.0 };
    config.analysis.block_len = 4800;
    let path = dir.join("run.toml");
    config.save(&path).unwrap();
    path
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

// ---------------------------------------------------------------------------
// init-config / generate
// ---------------------------------------------------------------------------

#[test]
fn init_config_writes_loadable_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("measurement.toml");
    assert_success(&run(&["init-config", s(&path)]));

    let config = MeasurementConfig::load(&path).unwrap();
    assert_eq!(config, MeasurementConfig::default());

    // Refuses to clobber without --force
    assert!(!run(&["init-config", s(&path)]).status.success());
    assert_success(&run(&["init-config", s(&path), "--force"]));
}

#[test]
fn generate_writes_stimulus_of_configured_length() {
    let dir = TempDir::new().unwrap();
    let config = quick_config(dir.path());
    let wav = dir.path().join("stimulus.wav");
    assert_success(&run(&["generate", s(&wav), "--config", s(&config)]));

    let info = read_wav_info(&wav).unwrap();
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 48000);
    assert_eq!(info.num_frames, 28800);
}

#[test]
fn generate_rejects_odd_bit_depth() {
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("stimulus.wav");
    let output = run(&["generate", s(&wav), "--bit-depth", "12"]);
    assert!(!output.status.success());
    assert!(!wav.exists());
}

// ---------------------------------------------------------------------------
// Full workflow
// ---------------------------------------------------------------------------

#[test]
fn calibrated_measurement_matches_analytic_sample() {
    let dir = TempDir::new().unwrap();
    let config = quick_config(dir.path());
    let through = dir.path().join("through.wav");
    let scan = dir.path().join("scan.wav");
    let calibration = dir.path().join("calibration.toml");
    let result = dir.path().join("result.toml");
    let csv = dir.path().join("result.csv");

    assert_success(&run(&[
        "simulate", s(&through), "--config", s(&config), "--through", "--mismatch",
    ]));
    assert_success(&run(&[
        "simulate", s(&scan), "--config", s(&config), "--mismatch",
        "--pore-radius", "0.0003", "--porosity", "0.6",
    ]));
    assert_eq!(read_channels(&scan).unwrap().len(), 28800);

    assert_success(&run(&[
        "calibrate", s(&through), "-o", s(&calibration), "--config", s(&config),
    ]));
    assert_eq!(load_calibration(&calibration).unwrap().len(), 2401);

    let output = run(&[
        "process", s(&scan), "--calibration", s(&calibration), "-o", s(&result),
        "--csv", s(&csv), "--config", s(&config),
    ]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("alpha"));
    assert!(csv.exists());

    let record = load_result(&result).unwrap();
    let loaded = MeasurementConfig::load(&config).unwrap();
    let air = loaded.air().unwrap();
    let sample = Layer::new(
        CylindricalPores {
            radius: 0.3e-3,
            porosity: 0.6,
        },
        loaded.tube.thickness,
    );
    for freq in [500.0, 1000.0, 2000.0] {
        let i = record.frequencies.nearest_bin(freq).unwrap();
        assert_eq!(record.properties.status[i], BinStatus::Reliable);
        let measured = record.properties.reflection[i].norm();
        let expected = sample.rigid_backed_reflection(freq, &air).norm();
        assert!(
            (measured - expected).abs() < 0.01 * expected,
            "{freq} Hz: |R| {measured} vs {expected}"
        );
    }
}

#[test]
fn calibration_from_other_grid_produces_no_result() {
    let dir = TempDir::new().unwrap();
    let config = quick_config(dir.path());
    let scan = dir.path().join("scan.wav");
    let calibration = dir.path().join("calibration.toml");
    let result = dir.path().join("result.toml");

    assert_success(&run(&["simulate", s(&scan), "--config", s(&config)]));
    // Calibrate with the default configuration: 48000-sample blocks
    let long = dir.path().join("long.wav");
    assert_success(&run(&["simulate", s(&long), "--through"]));
    assert_success(&run(&["calibrate", s(&long), "-o", s(&calibration)]));

    let output = run(&[
        "process", s(&scan), "--calibration", s(&calibration), "-o", s(&result),
        "--config", s(&config),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("length mismatch"));
    assert!(!result.exists());
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let wav = dir.path().join("stimulus.wav");
    let output = run(&["generate", s(&wav), "--config", "/nonexistent/run.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read file"));
}
