//! Tests for kernel configuration loading.

use std::io::Write;

use serial_test::serial;

use crate::config::{self, ConfigError, KernelConfig};
use crate::cpu::{self, SimdLevel};

#[test]
fn test_default_config_has_no_cap() {
    let config = KernelConfig::default();
    assert_eq!(config.max_level, None);
    assert!(!config.disable_fma);
}

#[test]
fn test_from_toml_str() {
    let config = KernelConfig::from_toml_str(
        r#"
        max_level = "sse2"
        disable_fma = true
        "#,
    )
    .expect("valid toml");
    assert_eq!(config.max_level, Some(SimdLevel::Sse2));
    assert!(config.disable_fma);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = KernelConfig::from_toml_str("disable_fma = true").expect("valid toml");
    assert_eq!(config.max_level, None);
    assert!(config.disable_fma);
}

#[test]
fn test_unknown_level_is_rejected() {
    let err = KernelConfig::from_toml_str("max_level = \"avx512\"").unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
    assert!(err.to_string().starts_with("invalid kernel configuration"));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "max_level = \"avx\"").expect("write");

    let config = KernelConfig::load_from(file.path()).expect("load");
    assert_eq!(config.max_level, Some(SimdLevel::Avx));
    assert!(!config.disable_fma);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = KernelConfig::load_from(dir.path().join("absent.toml")).expect("load");
    assert_eq!(config, KernelConfig::default());
}

#[test]
#[serial]
fn test_environment_overrides() {
    // Fix the probe before touching the environment so concurrent tests
    // keep seeing the same dispatch tier.
    let _ = cpu::simd_level();

    std::env::set_var("NNKERN_MAX_LEVEL", "sse3");
    std::env::set_var("NNKERN_DISABLE_FMA", "true");
    let config = KernelConfig::from_env();
    std::env::remove_var("NNKERN_MAX_LEVEL");
    std::env::remove_var("NNKERN_DISABLE_FMA");

    let config = config.expect("env config");
    assert_eq!(config.max_level, Some(SimdLevel::Sse3));
    assert!(config.disable_fma);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let _ = cpu::simd_level();

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "max_level = \"avx2\"").expect("write");

    std::env::set_var("NNKERN_MAX_LEVEL", "sse");
    let config = KernelConfig::load_from(file.path());
    std::env::remove_var("NNKERN_MAX_LEVEL");

    assert_eq!(config.expect("load").max_level, Some(SimdLevel::Sse));
}

#[test]
fn test_install_after_probe_fails() {
    let _ = cpu::simd_level();
    let err = config::install(KernelConfig::default()).unwrap_err();
    assert!(matches!(err, ConfigError::AlreadyInitialized));
    assert_eq!(err.to_string(), "kernel configuration already initialized");
}

#[test]
fn test_active_config_is_stable() {
    let first = config::active().clone();
    assert_eq!(config::active(), &first);
}
