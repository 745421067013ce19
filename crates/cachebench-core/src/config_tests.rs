//! Tests for `config` module.

use figment::Jail;

use crate::config::{BenchConfig, MandelbrotConfig};
use crate::error::Error;

#[test]
fn test_defaults() {
    let config = BenchConfig::default();
    assert_eq!(config.iterate.passes, 200_000);
    assert_eq!(config.mandelbrot.max_iterations, 1500);
    assert_eq!(config.logging.level, "info");
    config.validate().unwrap();
}

#[test]
fn test_default_viewport_is_named() {
    let viewport = MandelbrotConfig::default().viewport().unwrap();
    assert_eq!(viewport.label(), "mandelbrot");
    assert_eq!(viewport.width(), 1920);
}

#[test]
fn test_toml_overrides_defaults() {
    let config = BenchConfig::from_toml_str(
        r#"
        [iterate]
        passes = 10
        sizes = [64]

        [mandelbrot]
        radius = 0.00025
        "#,
    )
    .unwrap();

    assert_eq!(config.iterate.passes, 10);
    assert_eq!(config.iterate.sizes, vec![64]);
    // Untouched keys keep their defaults.
    assert_eq!(config.iterate.workers, vec![2, 4, 8, 14]);
    assert_eq!(config.mandelbrot.viewport().unwrap().label(), "shells");
}

#[test]
fn test_validation_rejects_zero_passes() {
    let err = BenchConfig::from_toml_str("[iterate]\npasses = 0\n").unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("iterate.passes")));
}

#[test]
fn test_validation_rejects_zero_workers() {
    let err = BenchConfig::from_toml_str("[matrix]\nworkers = [4, 0]\n").unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("matrix.workers")));
}

#[test]
fn test_validation_rejects_empty_sizes() {
    let err = BenchConfig::from_toml_str("[iterate]\nsizes = []\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_validation_rejects_bad_viewport() {
    let mut config = BenchConfig::default();
    config.mandelbrot.radius = -1.0;
    assert!(config.validate().is_err());

    let mut config = BenchConfig::default();
    config.mandelbrot.height = 0;
    assert!(config.validate().is_err());

    let mut config = BenchConfig::default();
    config.mandelbrot.max_iterations = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_malformed_toml_is_config_error() {
    let err = BenchConfig::from_toml_str("[iterate\npasses = ").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_toml_serialization_roundtrip() {
    let config = BenchConfig::default();
    let text = config.to_toml_string().unwrap();
    assert_eq!(BenchConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_load_layers_file_then_env() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "cachebench.toml",
            r#"
            [iterate]
            passes = 50

            [mandelbrot]
            width = 64
            height = 48
            "#,
        )?;
        jail.set_env("CACHEBENCH_ITERATE__PASSES", "7");
        jail.set_env("CACHEBENCH_LOGGING__LEVEL", "debug");

        let config = BenchConfig::load().map_err(|e| e.to_string())?;
        assert_eq!(config.iterate.passes, 7);
        assert_eq!(config.mandelbrot.width, 64);
        assert_eq!(config.mandelbrot.height, 48);
        assert_eq!(config.logging.level, "debug");
        Ok(())
    });
}

#[test]
fn test_load_without_file_uses_defaults() {
    Jail::expect_with(|_jail| {
        let config = BenchConfig::load_from("missing.toml").map_err(|e| e.to_string())?;
        assert_eq!(config, BenchConfig::default());
        Ok(())
    });
}
