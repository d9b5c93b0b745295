//! Kernel configuration.
//!
//! Configuration is layered with `figment`: built-in defaults, then an optional
//! TOML file, then `NNKERN_`-prefixed environment variables.
//!
//! ```toml
//! # nnkern.toml
//! max_level = "avx2"
//! disable_fma = true
//! ```
//!
//! The CPU probe reads the configuration exactly once, the first time any
//! kernel is dispatched. [`install`] must therefore run before that point.

use std::path::Path;
use std::sync::OnceLock;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpu::SimdLevel;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "nnkern.toml";

/// Prefix for environment overrides (`NNKERN_MAX_LEVEL`, `NNKERN_DISABLE_FMA`).
pub const ENV_PREFIX: &str = "NNKERN_";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A provider could not be read or a value could not be parsed.
    #[error("invalid kernel configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// The CPU probe already read its configuration.
    #[error("kernel configuration already initialized")]
    AlreadyInitialized,
}

/// Dispatch configuration for the kernel layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Highest tier the dispatcher may select. `None` means no cap.
    pub max_level: Option<SimdLevel>,
    /// Drop FMA from the enabled feature set, keeping GEMM results
    /// bit-identical to the non-fused kernels.
    pub disable_fma: bool,
}

impl KernelConfig {
    /// Loads defaults, then [`DEFAULT_CONFIG_FILE`] if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads defaults, then the TOML file at `path` if present, then the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::extract(
            Self::base()
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Loads defaults overridden by the environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::extract(Self::base().merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Parses a TOML document on top of the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::extract(Self::base().merge(Toml::string(toml)))
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::from(Box::new(e)))
    }
}

static INSTALLED: OnceLock<KernelConfig> = OnceLock::new();

/// Fixes the process-wide kernel configuration.
///
/// Fails with [`ConfigError::AlreadyInitialized`] once a configuration has been
/// installed or the CPU probe has read the environment.
pub fn install(config: KernelConfig) -> Result<(), ConfigError> {
    tracing::debug!(?config, "installing kernel configuration");
    INSTALLED
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)
}

/// Returns the process-wide configuration, reading the environment on first use.
pub fn active() -> &'static KernelConfig {
    INSTALLED.get_or_init(|| match KernelConfig::from_env() {
        Ok(config) => {
            tracing::debug!(?config, "kernel configuration loaded from environment");
            config
        }
        Err(err) => {
            tracing::warn!(error = %err, "ignoring invalid kernel configuration in environment");
            KernelConfig::default()
        }
    })
}
