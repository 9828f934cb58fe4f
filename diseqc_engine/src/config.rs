//! Configuration loading for the rotor controller.
//!
//! Parses and validates [`RotorConfig`] and derives the runtime parameters
//! the engine, supervisor and tick runner are built from.

use std::path::Path;
use std::time::Duration;

use diseqc_common::config::{ConfigError, ConfigLoader, RotorConfig};
use tracing::{debug, info};

// ─── Runtime Parameters ─────────────────────────────────────────────

/// Values derived from a validated configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeParams {
    /// PWM compare value for carrier-on segments [timer ticks].
    pub duty_ticks: u16,
    /// PWM period [timer ticks].
    pub period_ticks: u16,
    /// GotoX travel limit [°].
    pub max_angle: f32,
    /// Motor startup allowance [ms].
    pub motor_startup_ms: u32,
    /// Tick runner period.
    pub tick_interval: Duration,
}

impl RuntimeParams {
    /// Derive from a configuration that already passed validation.
    pub fn from_config(config: &RotorConfig) -> Self {
        Self {
            duty_ticks: config.carrier.duty_ticks(),
            period_ticks: config.carrier.period_ticks(),
            max_angle: config.rotor.max_angle,
            motor_startup_ms: config.rotor.motor_startup_ms,
            tick_interval: Duration::from_millis(config.rotor.tick_interval_ms as u64),
        }
    }
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the configuration file at `path`.
///
/// A missing file falls back to the built-in defaults when `allow_missing`
/// is set; any other failure is returned.
pub fn load_config(path: &Path, allow_missing: bool) -> Result<RotorConfig, ConfigError> {
    let config = match RotorConfig::load(path) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound) if allow_missing => {
            info!("No config at {}, using defaults", path.display());
            RotorConfig::default()
        }
        Err(e) => return Err(e),
    };
    config.validate()?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

/// Parse and validate configuration from a TOML string.
pub fn load_config_from_str(toml_str: &str) -> Result<RotorConfig, ConfigError> {
    let config = RotorConfig::from_toml(toml_str)?;
    config.validate()?;
    Ok(config)
}
