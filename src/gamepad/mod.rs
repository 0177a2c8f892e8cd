//! # Gamepad Module
//!
//! Host-side model of the gamepad configuration.
//!
//! This module handles:
//! - Modes, button pairs, sides and axes
//! - Button bindings per mode with dirty tracking
//! - Turbo intervals
//! - Deadzones, response curves and axis calibration
//! - The aggregate configuration owned by each device

pub mod calibration;
pub mod mapping;
pub mod state;
pub mod types;
