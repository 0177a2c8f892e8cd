//! # Attributes
//!
//! Text interface to a device, one path per setting (`btn_a/remap`,
//! `axis_xy_left/deadzone`, ...). Every attribute addresses the active mode,
//! resolved under the same lock as the read or write itself.
//!
//! Paths are generated from the [`Attribute`] table, so parsing and printing
//! cannot drift apart.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::gamepad::calibration::{parse_curve_point, parse_deadzone, AxisCalibration};
use crate::gamepad::types::{parse_ranged, parse_ranged_list, Axis, ButtonPair, Mode, Side, Slot};
use crate::hid::layout::{PERCENT_MAX, TURBO_MAX_INTERVAL};
use crate::hid::protocol::{Rgb, CURVE_POINTS, LED_ZONES};
use crate::transport::Transport;

use super::{stage_binding, stage_curve_point, stage_deadzone, Device};

/// One text attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    GamepadMode,
    Remap {
        pair: ButtonPair,
        side: Side,
        slot: Slot,
    },
    Turbo {
        pair: ButtonPair,
        side: Side,
    },
    Deadzone(Axis),
    ResponseCurvePoint {
        side: Side,
        point: usize,
    },
    Calibration(Axis),
    CalibrationReset(Axis),
    VibrationIntensity,
    AntiDeadzone,
    RgbLeds,
    ResetButtonMapping,
    ApplyAll,
}

impl Attribute {
    /// Every attribute, in a stable order
    #[must_use]
    pub fn all() -> Vec<Attribute> {
        let mut all = vec![Attribute::GamepadMode];
        for pair in ButtonPair::ALL {
            for side in Side::ALL {
                for slot in [Slot::Primary, Slot::Macro] {
                    all.push(Attribute::Remap { pair, side, slot });
                }
                if pair != ButtonPair::Triggers {
                    all.push(Attribute::Turbo { pair, side });
                }
            }
        }
        for axis in Axis::ALL {
            all.push(Attribute::Deadzone(axis));
            if !axis.is_trigger() {
                for point in 1..=CURVE_POINTS {
                    all.push(Attribute::ResponseCurvePoint {
                        side: axis.side(),
                        point,
                    });
                }
            }
            all.push(Attribute::Calibration(axis));
            all.push(Attribute::CalibrationReset(axis));
        }
        all.extend([
            Attribute::VibrationIntensity,
            Attribute::AntiDeadzone,
            Attribute::RgbLeds,
            Attribute::ResetButtonMapping,
            Attribute::ApplyAll,
        ]);
        all
    }

    #[must_use]
    pub fn path(&self) -> String {
        match *self {
            Attribute::GamepadMode => "gamepad_mode".to_string(),
            Attribute::Remap { pair, side, slot } => {
                let leaf = match slot {
                    Slot::Primary => "remap",
                    Slot::Macro => "macro_remap",
                };
                format!("btn_{}/{}", pair.button_name(side), leaf)
            }
            Attribute::Turbo { pair, side } => format!("btn_{}/turbo", pair.button_name(side)),
            Attribute::Deadzone(axis) => format!("axis_{}/deadzone", axis.name()),
            Attribute::ResponseCurvePoint { side, point } => {
                format!("axis_xy_{}/response_curve_point_{}", side.name(), point)
            }
            Attribute::Calibration(axis) => format!("axis_{}/calibration", axis.name()),
            Attribute::CalibrationReset(axis) => {
                format!("axis_{}/calibration_reset", axis.name())
            }
            Attribute::VibrationIntensity => "vibration_intensity".to_string(),
            Attribute::AntiDeadzone => "anti_deadzone".to_string(),
            Attribute::RgbLeds => "rgb_leds".to_string(),
            Attribute::ResetButtonMapping => "reset_btn_mapping".to_string(),
            Attribute::ApplyAll => "apply_all".to_string(),
        }
    }

    /// Attributes that only accept a store.
    #[must_use]
    pub fn is_write_only(&self) -> bool {
        matches!(
            self,
            Attribute::CalibrationReset(_) | Attribute::ResetButtonMapping | Attribute::ApplyAll
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Attribute {
    type Err = ValidationError;

    fn from_str(path: &str) -> std::result::Result<Self, Self::Err> {
        let path = path.trim().trim_matches('/');
        Attribute::all()
            .into_iter()
            .find(|attr| attr.path() == path)
            .ok_or_else(|| ValidationError::UnknownAttribute(path.to_string()))
    }
}

fn parse_mode(text: &str) -> std::result::Result<Mode, ValidationError> {
    let text = text.trim();
    if let Some(mode) = Mode::ALL
        .into_iter()
        .find(|mode| mode.name().eq_ignore_ascii_case(text))
    {
        return Ok(mode);
    }
    let wire = parse_ranged("gamepad_mode", text, 1, 3)?;
    Mode::from_wire(wire as u8).ok_or_else(|| ValidationError::Malformed {
        field: "gamepad_mode",
        input: text.to_string(),
    })
}

/// Write-only attributes take `1`.
fn parse_trigger(field: &'static str, text: &str) -> std::result::Result<(), ValidationError> {
    parse_ranged(field, text, 1, 1).map(|_| ())
}

fn parse_percent_pair(
    field: &'static str,
    text: &str,
) -> std::result::Result<(u8, u8), ValidationError> {
    let [left, right] = parse_ranged_list::<2>(field, text, 0, i64::from(PERCENT_MAX))?;
    Ok((left as u8, right as u8))
}

fn parse_leds(text: &str) -> std::result::Result<[Rgb; LED_ZONES], ValidationError> {
    let values = parse_ranged_list::<{ LED_ZONES * 3 }>("rgb_leds", text, 0, 255)?;
    let mut zones = [Rgb::default(); LED_ZONES];
    for (zone, rgb) in zones.iter_mut().zip(values.chunks_exact(3)) {
        *zone = Rgb {
            red: rgb[0] as u8,
            green: rgb[1] as u8,
            blue: rgb[2] as u8,
        };
    }
    Ok(zones)
}

impl<T: Transport> Device<T> {
    /// Writes an attribute from text
    ///
    /// # Arguments
    ///
    /// * `attr` - Attribute to write
    /// * `text` - Value in the attribute's text format
    ///
    /// # Errors
    ///
    /// Malformed text fails with a validation error before anything is
    /// staged; the rest follows the corresponding setter.
    pub async fn store(&self, attr: Attribute, text: &str) -> Result<()> {
        match attr {
            Attribute::GamepadMode => self.set_mode(parse_mode(text)?).await,
            Attribute::Remap { pair, side, slot } => {
                self.transact("store_binding", |cfg| {
                    let mode = cfg.mode;
                    stage_binding(cfg, mode, pair, side, slot, text)
                })
                .await
            }
            Attribute::Turbo { pair, side } => {
                let interval =
                    parse_ranged("turbo", text, 0, i64::from(TURBO_MAX_INTERVAL))? as u8;
                self.set_turbo_interval(pair, side, interval).await
            }
            Attribute::Deadzone(axis) => {
                let dz = parse_deadzone(text)?;
                self.transact("store_deadzone", |cfg| {
                    let mode = cfg.mode;
                    Ok(stage_deadzone(cfg, mode, axis, dz.inner, dz.outer))
                })
                .await
            }
            Attribute::ResponseCurvePoint { side, point } => {
                let p = parse_curve_point(text)?;
                self.transact("store_response_curve", |cfg| {
                    let mode = cfg.mode;
                    stage_curve_point(cfg, mode, side, point, p.input, p.output)
                })
                .await
            }
            Attribute::Calibration(axis) => {
                let calibration = AxisCalibration::parse(axis, text)?;
                self.set_calibration(axis, calibration).await
            }
            Attribute::CalibrationReset(axis) => {
                parse_trigger("calibration_reset", text)?;
                self.reset_calibration(axis).await
            }
            Attribute::VibrationIntensity => {
                let (left, right) = parse_percent_pair("vibration_intensity", text)?;
                self.set_vibration_intensity(left, right).await
            }
            Attribute::AntiDeadzone => {
                let (left, right) = parse_percent_pair("anti_deadzone", text)?;
                self.set_anti_deadzone(left, right).await
            }
            Attribute::RgbLeds => self.set_leds(parse_leds(text)?).await,
            Attribute::ResetButtonMapping => {
                parse_trigger("reset_btn_mapping", text)?;
                self.reset_mappings().await
            }
            Attribute::ApplyAll => {
                parse_trigger("apply_all", text)?;
                self.apply_all().await
            }
        }
    }

    /// Reads an attribute as text
    ///
    /// # Errors
    ///
    /// Write-only attributes fail with `ValidationError::WriteOnly`.
    pub async fn show(&self, attr: Attribute) -> Result<String> {
        let text = match attr {
            Attribute::GamepadMode => self.mode().await?.wire().to_string(),
            Attribute::Remap { pair, side, slot } => {
                self.read(|cfg| cfg.mappings.binding_name(cfg.mode, pair, side, slot))
                    .await?
            }
            Attribute::Turbo { pair, side } => self.turbo_interval(pair, side).await?.to_string(),
            Attribute::Deadzone(axis) => {
                let dz = self.read(|cfg| cfg.tuning.deadzone(cfg.mode, axis)).await?;
                format!("{} {}", dz.inner, dz.outer)
            }
            Attribute::ResponseCurvePoint { side, point } => {
                let p = self
                    .read(|cfg| cfg.tuning.curve_point(cfg.mode, side, point))
                    .await??;
                format!("{} {}", p.input, p.output)
            }
            Attribute::Calibration(axis) => self.calibration(axis).await?.to_string(),
            Attribute::VibrationIntensity => {
                let v = self.vibration_intensity().await?;
                format!("{} {}", v.left, v.right)
            }
            Attribute::AntiDeadzone => {
                let adz = self.anti_deadzone().await?;
                format!("{} {}", adz.left, adz.right)
            }
            Attribute::RgbLeds => self
                .leds()
                .await?
                .iter()
                .map(|rgb| format!("{} {} {}", rgb.red, rgb.green, rgb.blue))
                .collect::<Vec<_>>()
                .join(" "),
            Attribute::CalibrationReset(_)
            | Attribute::ResetButtonMapping
            | Attribute::ApplyAll => {
                return Err(ValidationError::WriteOnly(attr.path()).into());
            }
        };
        Ok(text)
    }
}
