//! # Gamepad Configuration
//!
//! The complete host-side copy of what the MCU should hold. One value per
//! device; the device handle stages changes on a clone and swaps it in once
//! the MCU acknowledged them.

use crate::gamepad::calibration::TuningStore;
use crate::gamepad::mapping::{MappingTable, TurboTable};
use crate::gamepad::types::Mode;
use crate::hid::protocol::{DualPercent, Rgb, LED_ZONES};

/// Motor strength after initialization
pub const DEFAULT_VIBRATION: DualPercent = DualPercent {
    left: 100,
    right: 100,
};

/// Everything configurable on the gamepad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadConfig {
    /// Mode the MCU is currently in
    pub mode: Mode,

    /// Button bindings per mode
    pub mappings: MappingTable,

    /// Turbo intervals (all modes)
    pub turbo: TurboTable,

    /// Deadzones, response curves, calibration
    pub tuning: TuningStore,

    /// Vibration intensity per motor (percent)
    pub vibration: DualPercent,

    /// Anti-deadzone per stick (percent)
    pub anti_deadzone: DualPercent,

    /// LED zone colors
    pub leds: [Rgb; LED_ZONES],
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self::seeded(Mode::Game)
    }
}

impl GamepadConfig {
    /// Factory configuration with `mode` active.
    #[must_use]
    pub fn seeded(mode: Mode) -> Self {
        Self {
            mode,
            mappings: MappingTable::from_presets(),
            turbo: TurboTable::default(),
            tuning: TuningStore::default(),
            vibration: DEFAULT_VIBRATION,
            anti_deadzone: DualPercent::default(),
            leds: [Rgb::default(); LED_ZONES],
        }
    }

    #[must_use]
    pub fn is_active(&self, mode: Mode) -> bool {
        self.mode == mode
    }
}
