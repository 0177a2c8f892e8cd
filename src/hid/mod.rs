//! # Gamepad HID Protocol Module
//!
//! Wire format of the vendor configuration reports.
//!
//! This module handles:
//! - Action records (11-byte button actions) and the name table
//! - Fixed-length block layouts shared by encoder and decoder
//! - Command envelopes and 64-byte report framing
//! - Acknowledgement checks
//! - Factory mapping presets

pub mod actions;
pub mod decoder;
pub mod encoder;
pub mod layout;
pub mod presets;
pub mod protocol;
