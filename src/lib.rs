//! # Ally Gamepad Library
//!
//! Host-side configuration of the ROG Ally gamepad MCU.
//!
//! This library encodes button remaps, deadzones, response curves, turbo,
//! calibration and the remaining gamepad settings into 64-byte HID feature
//! reports, and keeps a host copy of the configuration that only changes
//! once the MCU has acknowledged every command.

pub mod config;
pub mod device;
pub mod error;
pub mod gamepad;
pub mod hid;
pub mod transport;
