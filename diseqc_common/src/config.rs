//! Configuration loading traits and types.
//!
//! This module provides the TOML configuration of the rotor controller and a
//! standardized loader for it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use diseqc_common::config::{ConfigLoader, ConfigError, RotorConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = RotorConfig::load(Path::new("rotor.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::consts::{
    CARRIER_DUTY_CYCLE, CARRIER_FREQ_HZ, DEFAULT_MAX_ANGLE, GOTOX_MAX_ANGLE, MOTOR_STARTUP_MS,
    TICK_INTERVAL_MS, TIMER_CLOCK_HZ,
};

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-frame tracing.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for rejected commands.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "diseqc-rotor-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "diseqc-rotor".to_string(),
        }
    }
}

/// 22 kHz carrier generator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarrierConfig {
    /// Carrier frequency [Hz].
    pub frequency_hz: u32,
    /// PWM timer input clock [Hz].
    pub timer_clock_hz: u32,
    /// Fraction of the carrier period the output is high.
    pub duty_cycle: f32,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            frequency_hz: CARRIER_FREQ_HZ,
            timer_clock_hz: TIMER_CLOCK_HZ,
            duty_cycle: CARRIER_DUTY_CYCLE,
        }
    }
}

impl CarrierConfig {
    /// PWM period in timer ticks (45 at 1 MHz / 22 kHz).
    pub fn period_ticks(&self) -> u16 {
        let period = (self.timer_clock_hz as f64 / self.frequency_hz.max(1) as f64).round();
        period.clamp(0.0, u16::MAX as f64) as u16
    }

    /// PWM compare value for carrier-on segments (22 at the defaults).
    pub fn duty_ticks(&self) -> u16 {
        let duty = (self.period_ticks() as f32 * self.duty_cycle).floor();
        duty.clamp(1.0, u16::MAX as f32) as u16
    }

    /// Validate carrier parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // DiSEqC tolerates ±20 % around 22 kHz.
        if !(17_600..=26_400).contains(&self.frequency_hz) {
            return Err(ConfigError::ValidationError(format!(
                "carrier.frequency_hz {} outside 17600-26400",
                self.frequency_hz
            )));
        }
        if self.timer_clock_hz < 100_000 {
            return Err(ConfigError::ValidationError(format!(
                "carrier.timer_clock_hz {} below 100 kHz",
                self.timer_clock_hz
            )));
        }
        if !(self.duty_cycle > 0.0 && self.duty_cycle < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "carrier.duty_cycle {} must be in (0, 1)",
                self.duty_cycle
            )));
        }
        if self.period_ticks() < 2 {
            return Err(ConfigError::ValidationError(
                "carrier period shorter than 2 timer ticks".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rotor travel and motor power settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotorSection {
    /// Mechanical travel limit, symmetric around 0 [°].
    pub max_angle: f32,
    /// Motor power-up delay before the GotoX frame is sent [ms].
    pub motor_startup_ms: u32,
    /// Supervisor tick period [ms].
    pub tick_interval_ms: u32,
}

impl Default for RotorSection {
    fn default() -> Self {
        Self {
            max_angle: DEFAULT_MAX_ANGLE,
            motor_startup_ms: MOTOR_STARTUP_MS,
            tick_interval_ms: TICK_INTERVAL_MS,
        }
    }
}

impl RotorSection {
    /// Validate rotor parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_angle > 0.0 && self.max_angle <= GOTOX_MAX_ANGLE) {
            return Err(ConfigError::ValidationError(format!(
                "rotor.max_angle {} must be in (0, {GOTOX_MAX_ANGLE}]",
                self.max_angle
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "rotor.tick_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete rotor controller configuration.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "diseqc-rotor"
///
/// [carrier]
/// frequency_hz = 22000
///
/// [rotor]
/// max_angle = 75.0
/// motor_startup_ms = 1500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotorConfig {
    /// Logging and instance identity.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Carrier generator.
    #[serde(default)]
    pub carrier: CarrierConfig,
    /// Rotor limits and motor timing.
    #[serde(default)]
    pub rotor: RotorSection,
}

impl RotorConfig {
    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.carrier.validate()?;
        self.rotor.validate()?;
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        debug!("Parsing configuration from {}", path.display());

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
