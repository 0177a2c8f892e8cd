//! # Gamepad HID Protocol Constants and Types
//!
//! Core definitions for the configuration feature reports understood by the
//! gamepad MCU.
//!
//! A report is always 64 bytes:
//!
//! ```text
//! [0x5a][0xd1][command][length][argument?][payload ...][zero padding]
//! ```
//!
//! `length` is the byte the firmware expects for the command, which does not
//! always equal the payload size (a mapping command carries the button pair
//! as an argument in front of its 44-byte block).

use super::actions::ActionCode;
use super::layout::{BlockKind, TURBO_SLOTS};
use crate::error::ProtocolError;
use crate::gamepad::types::{Axis, Mode, Side};

/// Feature report id
pub const REPORT_ID: u8 = 0x5a;

/// Vendor code page following the report id
pub const CODE_PAGE: u8 = 0xd1;

/// Size of every request and response report
pub const REPORT_SIZE: usize = 64;

/// Bytes before the argument/payload: id, code page, command, length
pub const HEADER_SIZE: usize = 4;

/// Number of LED zones
pub const LED_ZONES: usize = 4;

/// Points per response curve
pub const CURVE_POINTS: usize = 4;

/// Values carried by a calibration block
pub const CALIBRATION_VALUES: usize = 6;

/// Configuration commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    SetMode = 0x01,
    SetMapping = 0x02,
    SetStickDeadzone = 0x04,
    SetTriggerDeadzone = 0x05,
    SetVibrationIntensity = 0x06,
    SetLeds = 0x08,
    CheckReady = 0x0a,
    SetCalibration = 0x0d,
    SetTurbo = 0x0f,
    SetResponseCurve = 0x13,
    SetAntiDeadzone = 0x18,
}

impl CommandId {
    pub const ALL: [CommandId; 11] = [
        CommandId::SetMode,
        CommandId::SetMapping,
        CommandId::SetStickDeadzone,
        CommandId::SetTriggerDeadzone,
        CommandId::SetVibrationIntensity,
        CommandId::SetLeds,
        CommandId::CheckReady,
        CommandId::SetCalibration,
        CommandId::SetTurbo,
        CommandId::SetResponseCurve,
        CommandId::SetAntiDeadzone,
    ];

    #[must_use]
    pub fn wire(self) -> u8 {
        self as u8
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|cmd| cmd.wire() == value)
    }

    /// Length byte written into the report header.
    #[must_use]
    pub fn declared_length(self) -> u8 {
        match self {
            CommandId::SetMode => 0x01,
            CommandId::SetMapping => 0x2c,
            CommandId::SetStickDeadzone | CommandId::SetTriggerDeadzone => 0x04,
            CommandId::SetVibrationIntensity => 0x02,
            CommandId::SetLeds => 0x0c,
            CommandId::CheckReady => 0x01,
            CommandId::SetCalibration => 0x0e,
            CommandId::SetTurbo => 0x20,
            CommandId::SetResponseCurve => 0x09,
            CommandId::SetAntiDeadzone => 0x02,
        }
    }

    /// Block carried by this command.
    #[must_use]
    pub fn block_kind(self) -> BlockKind {
        match self {
            CommandId::SetMode => BlockKind::Mode,
            CommandId::SetMapping => BlockKind::Mapping,
            CommandId::SetStickDeadzone | CommandId::SetTriggerDeadzone => BlockKind::Deadzone,
            CommandId::SetVibrationIntensity => BlockKind::Vibration,
            CommandId::SetLeds => BlockKind::Leds,
            CommandId::CheckReady => BlockKind::Ready,
            CommandId::SetCalibration => BlockKind::Calibration,
            CommandId::SetTurbo => BlockKind::Turbo,
            CommandId::SetResponseCurve => BlockKind::ResponseCurve,
            CommandId::SetAntiDeadzone => BlockKind::AntiDeadzone,
        }
    }

    /// Exact payload size, excluding the argument byte.
    #[must_use]
    pub fn payload_len(self) -> usize {
        self.block_kind().len()
    }

    /// Only the mapping command carries an argument (the button pair).
    #[must_use]
    pub fn takes_argument(self) -> bool {
        self == CommandId::SetMapping
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CommandId::SetMode => "set_mode",
            CommandId::SetMapping => "set_mapping",
            CommandId::SetStickDeadzone => "set_stick_deadzone",
            CommandId::SetTriggerDeadzone => "set_trigger_deadzone",
            CommandId::SetVibrationIntensity => "set_vibration_intensity",
            CommandId::SetLeds => "set_leds",
            CommandId::CheckReady => "check_ready",
            CommandId::SetCalibration => "set_calibration",
            CommandId::SetTurbo => "set_turbo",
            CommandId::SetResponseCurve => "set_response_curve",
            CommandId::SetAntiDeadzone => "set_anti_deadzone",
        }
    }
}

/// A validated command ready to be framed.
///
/// Construction enforces the fixed payload size and argument rules of the
/// command, so a mismatched envelope never reaches a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEnvelope {
    command: CommandId,
    argument: Option<u8>,
    payload: Vec<u8>,
}

impl CommandEnvelope {
    /// Creates an envelope for a command without argument.
    ///
    /// # Errors
    ///
    /// * [`ProtocolError::Argument`] - the command requires an argument
    /// * [`ProtocolError::PayloadLength`] - payload size differs from the command's
    pub fn new(command: CommandId, payload: Vec<u8>) -> Result<Self, ProtocolError> {
        if command.takes_argument() {
            return Err(ProtocolError::Argument { command });
        }
        Self::build(command, None, payload)
    }

    /// Creates an envelope for a command that carries an argument byte.
    ///
    /// # Errors
    ///
    /// Same as [`CommandEnvelope::new`], with the argument rule reversed.
    pub fn with_argument(
        command: CommandId,
        argument: u8,
        payload: Vec<u8>,
    ) -> Result<Self, ProtocolError> {
        if !command.takes_argument() {
            return Err(ProtocolError::Argument { command });
        }
        Self::build(command, Some(argument), payload)
    }

    fn build(
        command: CommandId,
        argument: Option<u8>,
        payload: Vec<u8>,
    ) -> Result<Self, ProtocolError> {
        if payload.len() != command.payload_len() {
            return Err(ProtocolError::PayloadLength {
                command,
                expected: command.payload_len(),
                actual: payload.len(),
            });
        }
        Ok(Self {
            command,
            argument,
            payload,
        })
    }

    #[must_use]
    pub fn command(&self) -> CommandId {
        self.command
    }

    #[must_use]
    pub fn argument(&self) -> Option<u8> {
        self.argument
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Primary and macro action of one physical button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonBinding {
    /// Emitted on press
    pub primary: ActionCode,

    /// Emitted while the macro modifier is held
    pub macro_action: ActionCode,
}

impl ButtonBinding {
    #[must_use]
    pub const fn new(primary: ActionCode, macro_action: ActionCode) -> Self {
        Self {
            primary,
            macro_action,
        }
    }
}

/// 44-byte mapping block of one button pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingBlock {
    pub left: ButtonBinding,
    pub right: ButtonBinding,
}

impl MappingBlock {
    #[must_use]
    pub fn side(&self, side: Side) -> &ButtonBinding {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut ButtonBinding {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// Inner/outer deadzone of one stick or trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeadzonePair {
    pub inner: u8,
    pub outer: u8,
}

/// Deadzones of the left and right stick (or trigger).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeadzoneBlock {
    pub left: DeadzonePair,
    pub right: DeadzonePair,
}

/// Per-slot turbo repeat intervals; 0 disables turbo for the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurboBlock {
    pub intervals: [u8; TURBO_SLOTS],
}

/// One (input, output) point of a response curve, both in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurvePoint {
    pub input: u8,
    pub output: u8,
}

/// Response curve of one stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCurveBlock {
    pub side: Side,
    pub points: [CurvePoint; CURVE_POINTS],
}

/// Calibration sub-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOp {
    Write = 0x01,
    Reset = 0x02,
    Apply = 0x03,
}

impl CalibrationOp {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(CalibrationOp::Write),
            0x02 => Some(CalibrationOp::Reset),
            0x03 => Some(CalibrationOp::Apply),
            _ => None,
        }
    }
}

/// Calibration block for one axis.
///
/// Sticks use all six values (x stable/min/max, y stable/min/max); triggers
/// use the first two (stable, max) and leave the rest zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationBlock {
    pub op: CalibrationOp,
    pub axis: Axis,
    pub values: [u16; CALIBRATION_VALUES],
}

/// Left/right percentage pair (vibration motors, anti-deadzone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DualPercent {
    pub left: u8,
    pub right: u8,
}

/// Color of one LED zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Typed payload of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Mode(Mode),
    Mapping(MappingBlock),
    Deadzone(DeadzoneBlock),
    Vibration(DualPercent),
    Leds([Rgb; LED_ZONES]),
    Ready,
    Calibration(CalibrationBlock),
    Turbo(TurboBlock),
    ResponseCurve(ResponseCurveBlock),
    AntiDeadzone(DualPercent),
}

impl Block {
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Mode(_) => BlockKind::Mode,
            Block::Mapping(_) => BlockKind::Mapping,
            Block::Deadzone(_) => BlockKind::Deadzone,
            Block::Vibration(_) => BlockKind::Vibration,
            Block::Leds(_) => BlockKind::Leds,
            Block::Ready => BlockKind::Ready,
            Block::Calibration(_) => BlockKind::Calibration,
            Block::Turbo(_) => BlockKind::Turbo,
            Block::ResponseCurve(_) => BlockKind::ResponseCurve,
            Block::AntiDeadzone(_) => BlockKind::AntiDeadzone,
        }
    }
}
