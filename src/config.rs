//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! ```toml
//! [transport]
//! device_paths = ["/dev/hidraw2"]
//! response_timeout_ms = 300
//!
//! [profile]
//! mode = "wasd"
//! vibration = { left = 80, right = 80 }
//!
//! [[profile.bindings]]
//! button = "a"
//! action = "kb_space"
//!
//! [[profile.deadzones]]
//! axis = "xy_left"
//! inner = 5
//! outer = 60
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{AllyError, Result, ValidationError};
use crate::gamepad::state::GamepadConfig;
use crate::gamepad::types::{Axis, ButtonPair, Mode, Side, Slot};
use crate::hid::layout::PERCENT_MAX;
use crate::hid::protocol::{DualPercent, Rgb, LED_ZONES};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Report channel configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Hidraw nodes to try, in order
    #[serde(default = "default_device_paths")]
    pub device_paths: Vec<String>,

    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// Log reports instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

/// Settings pushed to the gamepad at startup
#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    #[serde(default = "default_mode")]
    pub mode: Mode,

    #[serde(default)]
    pub bindings: Vec<BindingEntry>,

    #[serde(default)]
    pub deadzones: Vec<DeadzoneEntry>,

    #[serde(default)]
    pub curves: Vec<CurveEntry>,

    #[serde(default)]
    pub turbo: Vec<TurboEntry>,

    #[serde(default)]
    pub vibration: Option<PercentPair>,

    #[serde(default)]
    pub anti_deadzone: Option<PercentPair>,

    /// One `[r, g, b]` per zone
    #[serde(default)]
    pub leds: Option<Vec<[u8; 3]>>,
}

/// Button binding; `mode` defaults to the profile mode
#[derive(Debug, Deserialize, Clone)]
pub struct BindingEntry {
    #[serde(default)]
    pub mode: Option<Mode>,

    pub button: String,

    #[serde(default = "default_slot")]
    pub slot: Slot,

    pub action: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeadzoneEntry {
    #[serde(default)]
    pub mode: Option<Mode>,
    pub axis: Axis,
    pub inner: u8,
    pub outer: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurveEntry {
    #[serde(default)]
    pub mode: Option<Mode>,
    pub side: Side,
    pub point: usize,
    pub input: u8,
    pub output: u8,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TurboEntry {
    pub button: String,
    pub interval: u8,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PercentPair {
    pub left: u8,
    pub right: u8,
}

// Default value functions
fn default_device_paths() -> Vec<String> { vec!["/dev/hidraw0".to_string()] }
fn default_response_timeout_ms() -> u64 { 500 }
fn default_mode() -> Mode { Mode::Game }
fn default_slot() -> Slot { Slot::Primary }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            device_paths: default_device_paths(),
            response_timeout_ms: default_response_timeout_ms(),
            dry_run: false,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            bindings: Vec::new(),
            deadzones: Vec::new(),
            curves: Vec::new(),
            turbo: Vec::new(),
            vibration: None,
            anti_deadzone: None,
            leds: None,
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

fn find_button(name: &str) -> std::result::Result<(ButtonPair, Side), ValidationError> {
    ButtonPair::from_button_name(name).ok_or_else(|| ValidationError::Malformed {
        field: "button",
        input: name.to_string(),
    })
}

fn percent_pair(
    field: &'static str,
    pair: PercentPair,
) -> std::result::Result<DualPercent, ValidationError> {
    for value in [pair.left, pair.right] {
        if u16::from(value) > PERCENT_MAX {
            return Err(ValidationError::OutOfRange {
                field,
                value: i64::from(value),
                min: 0,
                max: i64::from(PERCENT_MAX),
            });
        }
    }
    Ok(DualPercent {
        left: pair.left,
        right: pair.right,
    })
}

impl ProfileConfig {
    /// Applies the profile on top of `config`
    ///
    /// # Errors
    ///
    /// Returns the first entry that fails validation; `config` may then be
    /// partially updated, so callers apply profiles to a staged copy.
    pub fn apply_to(&self, config: &mut GamepadConfig) -> std::result::Result<(), ValidationError> {
        config.mode = self.mode;

        for binding in &self.bindings {
            let (pair, side) = find_button(&binding.button)?;
            let mode = binding.mode.unwrap_or(self.mode);
            config
                .mappings
                .set_binding(mode, pair, side, binding.slot, &binding.action)?;
        }

        for dz in &self.deadzones {
            let mode = dz.mode.unwrap_or(self.mode);
            config.tuning.set_deadzone(mode, dz.axis, dz.inner, dz.outer);
        }

        for curve in &self.curves {
            let mode = curve.mode.unwrap_or(self.mode);
            config
                .tuning
                .set_curve_point(mode, curve.side, curve.point, curve.input, curve.output)?;
        }

        for turbo in &self.turbo {
            let (pair, side) = find_button(&turbo.button)?;
            config.turbo.set_interval(pair, side, turbo.interval)?;
        }

        if let Some(vibration) = self.vibration {
            config.vibration = percent_pair("vibration", vibration)?;
        }
        if let Some(adz) = self.anti_deadzone {
            config.anti_deadzone = percent_pair("anti_deadzone", adz)?;
        }

        if let Some(leds) = &self.leds {
            if leds.len() != LED_ZONES {
                return Err(ValidationError::Malformed {
                    field: "leds",
                    input: format!("{} zones", leds.len()),
                });
            }
            for (zone, [red, green, blue]) in config.leds.iter_mut().zip(leds) {
                *zone = Rgb {
                    red: *red,
                    green: *green,
                    blue: *blue,
                };
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ally_gamepad::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// The profile is applied to a factory configuration, so a bad action
    /// name or range fails here rather than on the device.
    fn validate(&self) -> Result<()> {
        if self.transport.response_timeout_ms == 0 || self.transport.response_timeout_ms > 10000 {
            return Err(AllyError::Config(toml::de::Error::custom(
                "response_timeout_ms must be between 1 and 10000",
            )));
        }

        if !self.transport.dry_run && self.transport.device_paths.is_empty() {
            return Err(AllyError::Config(toml::de::Error::custom(
                "device_paths cannot be empty unless dry_run is set",
            )));
        }

        let mut scratch = GamepadConfig::default();
        self.profile
            .apply_to(&mut scratch)
            .map_err(|e| AllyError::Config(toml::de::Error::custom(format!("profile: {}", e))))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}
