//! # Deadzones, Response Curves and Calibration
//!
//! Analog tuning values as the MCU stores them.
//!
//! ## Deadzones
//!
//! Each axis has an inner and outer deadzone (0-255). Sticks and triggers are
//! written with separate commands, each carrying both sides.
//!
//! ## Response Curves
//!
//! Each stick has a 4-point curve of (input, output) percentages, point 1
//! lowest. The default curve is linear.
//!
//! ## Calibration
//!
//! Raw ADC reference values per axis. Sticks carry x and y ranges
//! (stable/min/max), triggers a stable and max value. Calibration does not
//! depend on the gamepad mode.
//!
//! ```
//! use ally_gamepad::gamepad::calibration::TuningStore;
//! use ally_gamepad::gamepad::types::{Axis, Mode};
//!
//! let mut tuning = TuningStore::default();
//! tuning.set_deadzone(Mode::Game, Axis::XyLeft, 5, 60);
//! assert_eq!(tuning.deadzone(Mode::Game, Axis::XyLeft).outer, 60);
//! ```

use std::fmt;

use crate::error::ValidationError;
use crate::gamepad::types::{parse_ranged_list, Axis, Mode, Side};
use crate::hid::layout::PERCENT_MAX;
use crate::hid::protocol::{
    CalibrationBlock, CalibrationOp, CurvePoint, DeadzoneBlock, DeadzonePair, ResponseCurveBlock,
    CALIBRATION_VALUES, CURVE_POINTS,
};

/// Default inner deadzone
pub const DEFAULT_INNER_DEADZONE: u8 = 0;

/// Default outer deadzone
pub const DEFAULT_OUTER_DEADZONE: u8 = 64;

/// Straight-line response curve
pub const LINEAR_CURVE: [CurvePoint; CURVE_POINTS] = [
    CurvePoint { input: 25, output: 25 },
    CurvePoint { input: 50, output: 50 },
    CurvePoint { input: 75, output: 75 },
    CurvePoint { input: 100, output: 100 },
];

/// Stick center written by a calibration reset
pub const NEUTRAL_STICK_CENTER: u16 = 0x0800;

/// Full-scale raw reading
pub const RAW_FULL_SCALE: u16 = 0x0fff;

const MODES: usize = Mode::ALL.len();

const DEFAULT_DEADZONE: DeadzonePair = DeadzonePair {
    inner: DEFAULT_INNER_DEADZONE,
    outer: DEFAULT_OUTER_DEADZONE,
};

/// Stable/min/max reading of one stick direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub stable: u16,
    pub min: u16,
    pub max: u16,
}

/// Calibration of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisCalibration {
    Stick { x: AxisRange, y: AxisRange },
    Trigger { stable: u16, max: u16 },
}

impl AxisCalibration {
    /// Value written by a reset.
    #[must_use]
    pub fn neutral(axis: Axis) -> Self {
        if axis.is_trigger() {
            AxisCalibration::Trigger {
                stable: 0,
                max: RAW_FULL_SCALE,
            }
        } else {
            let range = AxisRange {
                stable: NEUTRAL_STICK_CENTER,
                min: 0,
                max: RAW_FULL_SCALE,
            };
            AxisCalibration::Stick { x: range, y: range }
        }
    }

    /// Parses `"xs xmin xmax ys ymin ymax"` for sticks or `"stable max"` for
    /// triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] on a wrong value count or a
    /// non-numeric value, and `OutOfRange` for values above `u16::MAX`.
    pub fn parse(axis: Axis, text: &str) -> Result<Self, ValidationError> {
        let max = i64::from(u16::MAX);
        if axis.is_trigger() {
            let [stable, top] = parse_ranged_list::<2>("trigger calibration", text, 0, max)?;
            Ok(AxisCalibration::Trigger {
                stable: stable as u16,
                max: top as u16,
            })
        } else {
            let v = parse_ranged_list::<6>("stick calibration", text, 0, max)?;
            Ok(AxisCalibration::Stick {
                x: AxisRange {
                    stable: v[0] as u16,
                    min: v[1] as u16,
                    max: v[2] as u16,
                },
                y: AxisRange {
                    stable: v[3] as u16,
                    min: v[4] as u16,
                    max: v[5] as u16,
                },
            })
        }
    }

    /// Whether this calibration has the shape expected for `axis`.
    #[must_use]
    pub fn fits(&self, axis: Axis) -> bool {
        matches!(self, AxisCalibration::Trigger { .. }) == axis.is_trigger()
    }

    #[must_use]
    pub fn to_values(&self) -> [u16; CALIBRATION_VALUES] {
        match *self {
            AxisCalibration::Stick { x, y } => [x.stable, x.min, x.max, y.stable, y.min, y.max],
            AxisCalibration::Trigger { stable, max } => [stable, max, 0, 0, 0, 0],
        }
    }

    #[must_use]
    pub fn to_block(&self, op: CalibrationOp, axis: Axis) -> CalibrationBlock {
        CalibrationBlock {
            op,
            axis,
            values: self.to_values(),
        }
    }
}

impl fmt::Display for AxisCalibration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisCalibration::Stick { x, y } => write!(
                f,
                "{} {} {} {} {} {}",
                x.stable, x.min, x.max, y.stable, y.min, y.max
            ),
            AxisCalibration::Trigger { stable, max } => write!(f, "{} {}", stable, max),
        }
    }
}

/// Parses `"inner outer"`, each 0-255.
pub fn parse_deadzone(text: &str) -> Result<DeadzonePair, ValidationError> {
    let [inner, outer] = parse_ranged_list::<2>("deadzone", text, 0, 255)?;
    Ok(DeadzonePair {
        inner: inner as u8,
        outer: outer as u8,
    })
}

/// Parses `"input output"`, each 0-100.
pub fn parse_curve_point(text: &str) -> Result<CurvePoint, ValidationError> {
    let [input, output] =
        parse_ranged_list::<2>("response curve point", text, 0, i64::from(PERCENT_MAX))?;
    Ok(CurvePoint {
        input: input as u8,
        output: output as u8,
    })
}

/// Deadzones and curves per mode, calibration per axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TuningStore {
    // [mode][sticks, triggers][left, right]
    deadzones: [[[DeadzonePair; 2]; 2]; MODES],
    // [mode][left, right]
    curves: [[[CurvePoint; CURVE_POINTS]; 2]; MODES],
    calibration: [AxisCalibration; 4],
}

impl Default for TuningStore {
    fn default() -> Self {
        Self {
            deadzones: [[[DEFAULT_DEADZONE; 2]; 2]; MODES],
            curves: [[LINEAR_CURVE; 2]; MODES],
            calibration: Axis::ALL.map(AxisCalibration::neutral),
        }
    }
}

impl TuningStore {
    #[must_use]
    pub fn deadzone(&self, mode: Mode, axis: Axis) -> DeadzonePair {
        self.deadzones[mode.index()][usize::from(axis.is_trigger())][axis.side().index()]
    }

    pub fn set_deadzone(&mut self, mode: Mode, axis: Axis, inner: u8, outer: u8) {
        self.deadzones[mode.index()][usize::from(axis.is_trigger())][axis.side().index()] =
            DeadzonePair { inner, outer };
    }

    /// Both sides of the stick (or trigger) group, as sent to the device.
    #[must_use]
    pub fn deadzone_block(&self, mode: Mode, triggers: bool) -> DeadzoneBlock {
        let [left, right] = self.deadzones[mode.index()][usize::from(triggers)];
        DeadzoneBlock { left, right }
    }

    fn point_index(point: usize) -> Result<usize, ValidationError> {
        if !(1..=CURVE_POINTS).contains(&point) {
            return Err(ValidationError::Bounds {
                what: "response curve point",
                index: point,
            });
        }
        Ok(point - 1)
    }

    /// Point `1..=4` of a stick's curve.
    pub fn curve_point(
        &self,
        mode: Mode,
        side: Side,
        point: usize,
    ) -> Result<CurvePoint, ValidationError> {
        Ok(self.curves[mode.index()][side.index()][Self::point_index(point)?])
    }

    /// Sets point `1..=4` of a stick's curve.
    ///
    /// # Errors
    ///
    /// * [`ValidationError::Bounds`] - point outside 1..=4
    /// * [`ValidationError::OutOfRange`] - input or output above 100
    pub fn set_curve_point(
        &mut self,
        mode: Mode,
        side: Side,
        point: usize,
        input: u8,
        output: u8,
    ) -> Result<(), ValidationError> {
        let index = Self::point_index(point)?;
        for (field, value) in [("curve input", input), ("curve output", output)] {
            if u16::from(value) > PERCENT_MAX {
                return Err(ValidationError::OutOfRange {
                    field,
                    value: i64::from(value),
                    min: 0,
                    max: i64::from(PERCENT_MAX),
                });
            }
        }
        self.curves[mode.index()][side.index()][index] = CurvePoint { input, output };
        Ok(())
    }

    #[must_use]
    pub fn curve_block(&self, mode: Mode, side: Side) -> ResponseCurveBlock {
        ResponseCurveBlock {
            side,
            points: self.curves[mode.index()][side.index()],
        }
    }

    #[must_use]
    pub fn calibration(&self, axis: Axis) -> AxisCalibration {
        self.calibration[axis.index()]
    }

    /// Stores a calibration for `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Malformed`] when a stick calibration is
    /// given for a trigger or the other way around.
    pub fn set_calibration(
        &mut self,
        axis: Axis,
        calibration: AxisCalibration,
    ) -> Result<(), ValidationError> {
        if !calibration.fits(axis) {
            return Err(ValidationError::Malformed {
                field: "calibration",
                input: calibration.to_string(),
            });
        }
        self.calibration[axis.index()] = calibration;
        Ok(())
    }

    /// Drops the stored calibration in favour of the neutral value.
    pub fn reset_calibration(&mut self, axis: Axis) {
        self.calibration[axis.index()] = AxisCalibration::neutral(axis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tuning = TuningStore::default();
        for mode in Mode::ALL {
            for axis in Axis::ALL {
                assert_eq!(tuning.deadzone(mode, axis), DEFAULT_DEADZONE);
            }
            assert_eq!(tuning.curve_block(mode, Side::Left).points, LINEAR_CURVE);
        }
        assert_eq!(tuning.calibration(Axis::ZLeft), AxisCalibration::neutral(Axis::ZLeft));
    }

    #[test]
    fn test_deadzone_set_get() {
        let mut tuning = TuningStore::default();
        for value in [0u8, 100, 255] {
            tuning.set_deadzone(Mode::Wasd, Axis::ZRight, value, value);
            let dz = tuning.deadzone(Mode::Wasd, Axis::ZRight);
            assert_eq!((dz.inner, dz.outer), (value, value));
        }
        // Other modes and axes untouched
        assert_eq!(tuning.deadzone(Mode::Game, Axis::ZRight), DEFAULT_DEADZONE);
        assert_eq!(tuning.deadzone(Mode::Wasd, Axis::ZLeft), DEFAULT_DEADZONE);
        assert_eq!(tuning.deadzone(Mode::Wasd, Axis::XyRight), DEFAULT_DEADZONE);
    }

    #[test]
    fn test_deadzone_block_groups() {
        let mut tuning = TuningStore::default();
        tuning.set_deadzone(Mode::Game, Axis::XyRight, 3, 4);
        tuning.set_deadzone(Mode::Game, Axis::ZLeft, 7, 8);

        let sticks = tuning.deadzone_block(Mode::Game, false);
        assert_eq!(sticks.right, DeadzonePair { inner: 3, outer: 4 });
        assert_eq!(sticks.left, DEFAULT_DEADZONE);

        let triggers = tuning.deadzone_block(Mode::Game, true);
        assert_eq!(triggers.left, DeadzonePair { inner: 7, outer: 8 });
    }

    #[test]
    fn test_parse_deadzone() {
        assert_eq!(parse_deadzone("0 255").unwrap(), DeadzonePair { inner: 0, outer: 255 });
        assert!(parse_deadzone("0 256").is_err());
        assert!(parse_deadzone("10").is_err());
    }

    #[test]
    fn test_curve_point_bounds() {
        let mut tuning = TuningStore::default();
        assert_eq!(
            tuning.set_curve_point(Mode::Game, Side::Left, 5, 10, 10),
            Err(ValidationError::Bounds {
                what: "response curve point",
                index: 5
            })
        );
        assert!(matches!(
            tuning.set_curve_point(Mode::Game, Side::Left, 0, 10, 10),
            Err(ValidationError::Bounds { index: 0, .. })
        ));
        assert!(matches!(
            tuning.set_curve_point(Mode::Game, Side::Left, 1, 10, 101),
            Err(ValidationError::OutOfRange { field: "curve output", .. })
        ));

        tuning.set_curve_point(Mode::Game, Side::Right, 2, 40, 30).unwrap();
        assert_eq!(
            tuning.curve_point(Mode::Game, Side::Right, 2).unwrap(),
            CurvePoint { input: 40, output: 30 }
        );
        assert_eq!(
            tuning.curve_point(Mode::Game, Side::Left, 2).unwrap(),
            LINEAR_CURVE[1]
        );
    }

    #[test]
    fn test_calibration_parse_and_display() {
        let stick = AxisCalibration::parse(Axis::XyLeft, "2048 10 4080 2040 12 4090").unwrap();
        assert_eq!(stick.to_string(), "2048 10 4080 2040 12 4090");
        assert_eq!(stick.to_values(), [2048, 10, 4080, 2040, 12, 4090]);

        let trigger = AxisCalibration::parse(Axis::ZRight, "30 4000").unwrap();
        assert_eq!(trigger.to_values(), [30, 4000, 0, 0, 0, 0]);

        assert!(AxisCalibration::parse(Axis::ZRight, "1 2 3 4 5 6").is_err());
        assert!(AxisCalibration::parse(Axis::XyLeft, "1 2").is_err());
        assert!(AxisCalibration::parse(Axis::XyLeft, "1 2 3 4 5 65536").is_err());
    }

    #[test]
    fn test_calibration_shape_and_reset() {
        let mut tuning = TuningStore::default();
        let trigger = AxisCalibration::Trigger { stable: 5, max: 4000 };
        assert!(tuning.set_calibration(Axis::XyLeft, trigger).is_err());

        tuning.set_calibration(Axis::ZLeft, trigger).unwrap();
        assert_eq!(tuning.calibration(Axis::ZLeft), trigger);

        tuning.reset_calibration(Axis::ZLeft);
        assert_eq!(
            tuning.calibration(Axis::ZLeft),
            AxisCalibration::Trigger {
                stable: 0,
                max: RAW_FULL_SCALE
            }
        );
    }
}
