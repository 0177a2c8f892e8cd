//! # Report Decoder
//!
//! Parses fixed-length blocks and framed reports, and checks device
//! acknowledgements.

use super::layout::{BlockKind, FieldValue};
use super::protocol::*;
use crate::error::{DecodeError, ProtocolError};
use crate::gamepad::types::{Axis, Mode, Side};

/// A request report split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedReport {
    pub command: CommandId,
    pub argument: Option<u8>,
    pub block: Block,
}

/// Decode a block of the given kind
///
/// # Arguments
///
/// * `kind` - Expected block kind
/// * `bytes` - Raw block bytes
///
/// # Returns
///
/// * `Ok(Block)` - Typed block
/// * `Err(DecodeError)` - Length, range, reserved-byte or action error
pub fn decode_block(kind: BlockKind, bytes: &[u8]) -> Result<Block, DecodeError> {
    let layout = kind.layout();
    let values = layout.unpack(bytes)?;
    // unpack guarantees one value per field, in table order
    let num = |i: usize| values[i].num();
    let byte = |i: usize| values[i].num() as u8;

    let block = match kind {
        BlockKind::Mode => Block::Mode(Mode::from_wire(byte(0)).ok_or(DecodeError::OutOfRange {
            field: "mode",
            value: num(0),
            min: 1,
            max: 3,
        })?),
        BlockKind::Mapping => Block::Mapping(MappingBlock {
            left: ButtonBinding::new(values[0].action(), values[1].action()),
            right: ButtonBinding::new(values[2].action(), values[3].action()),
        }),
        BlockKind::Deadzone => Block::Deadzone(DeadzoneBlock {
            left: DeadzonePair {
                inner: byte(0),
                outer: byte(1),
            },
            right: DeadzonePair {
                inner: byte(2),
                outer: byte(3),
            },
        }),
        BlockKind::Vibration => Block::Vibration(DualPercent {
            left: byte(0),
            right: byte(1),
        }),
        BlockKind::AntiDeadzone => Block::AntiDeadzone(DualPercent {
            left: byte(0),
            right: byte(1),
        }),
        BlockKind::Leds => {
            let mut zones = [Rgb::default(); LED_ZONES];
            for (i, zone) in zones.iter_mut().enumerate() {
                *zone = Rgb {
                    red: byte(i * 3),
                    green: byte(i * 3 + 1),
                    blue: byte(i * 3 + 2),
                };
            }
            Block::Leds(zones)
        }
        BlockKind::Ready => Block::Ready,
        BlockKind::Calibration => {
            let op = CalibrationOp::from_wire(byte(0)).ok_or(DecodeError::OutOfRange {
                field: "operation",
                value: num(0),
                min: 1,
                max: 3,
            })?;
            let axis = Axis::from_wire(byte(1)).ok_or(DecodeError::OutOfRange {
                field: "axis",
                value: num(1),
                min: 1,
                max: 4,
            })?;
            let mut cal = [0u16; CALIBRATION_VALUES];
            for (i, value) in cal.iter_mut().enumerate() {
                *value = num(i + 2);
            }
            Block::Calibration(CalibrationBlock {
                op,
                axis,
                values: cal,
            })
        }
        BlockKind::Turbo => {
            let mut turbo = TurboBlock::default();
            for (interval, value) in turbo.intervals.iter_mut().zip(&values) {
                *interval = value.num() as u8;
            }
            Block::Turbo(turbo)
        }
        BlockKind::ResponseCurve => {
            let side = Side::from_curve_selector(byte(0)).ok_or(DecodeError::OutOfRange {
                field: "side",
                value: num(0),
                min: 1,
                max: 2,
            })?;
            let mut points = [CurvePoint::default(); CURVE_POINTS];
            for (i, point) in points.iter_mut().enumerate() {
                *point = CurvePoint {
                    input: byte(1 + i * 2),
                    output: byte(2 + i * 2),
                };
            }
            Block::ResponseCurve(ResponseCurveBlock { side, points })
        }
    };
    Ok(block)
}

/// Decode a complete 64-byte request report.
///
/// # Errors
///
/// * [`DecodeError::Length`] - report is not 64 bytes, or the length byte
///   differs from the command's declared length
/// * [`DecodeError::Header`] - wrong report id / code page
/// * [`DecodeError::UnknownCommand`] - command id not in the table
/// * any block decoding error
pub fn decode_report(report: &[u8]) -> Result<DecodedReport, DecodeError> {
    if report.len() != REPORT_SIZE {
        return Err(DecodeError::Length {
            what: "report",
            expected: REPORT_SIZE,
            actual: report.len(),
        });
    }
    if report[0] != REPORT_ID || report[1] != CODE_PAGE {
        return Err(DecodeError::Header([report[0], report[1]]));
    }

    let command = CommandId::from_wire(report[2]).ok_or(DecodeError::UnknownCommand(report[2]))?;
    if report[3] != command.declared_length() {
        return Err(DecodeError::Length {
            what: "length byte",
            expected: usize::from(command.declared_length()),
            actual: usize::from(report[3]),
        });
    }

    let mut cursor = HEADER_SIZE;
    let argument = if command.takes_argument() {
        cursor += 1;
        Some(report[HEADER_SIZE])
    } else {
        None
    };
    let payload = &report[cursor..cursor + command.payload_len()];
    let block = decode_block(command.block_kind(), payload)?;

    Ok(DecodedReport {
        command,
        argument,
        block,
    })
}

/// Check that `response` acknowledges `command`
///
/// A response acknowledges when it is a full report that echoes the report
/// id, code page and command id.
///
/// # Errors
///
/// Returns [`ProtocolError::Nack`] otherwise.
pub fn check_ack(command: CommandId, response: &[u8]) -> Result<(), ProtocolError> {
    let acked = response.len() == REPORT_SIZE
        && response[0] == REPORT_ID
        && response[1] == CODE_PAGE
        && response[2] == command.wire();
    if acked {
        Ok(())
    } else {
        Err(ProtocolError::Nack { command })
    }
}

/// Check a response against the request it answers
///
/// A bare acknowledgement (length byte zero) carries nothing to compare. Any
/// other response must echo the request: it is decoded like a request and
/// its argument and payload must match byte for byte.
///
/// # Returns
///
/// * `Ok(Some(block))` - the echoed block, equal to the one sent
/// * `Ok(None)` - bare acknowledgement
///
/// # Errors
///
/// * [`ProtocolError::Nack`] - see [`check_ack`]
/// * [`ProtocolError::Decode`] - the echo does not decode
/// * [`ProtocolError::EchoMismatch`] - the echo differs from the request
pub fn check_response(
    envelope: &CommandEnvelope,
    response: &[u8],
) -> Result<Option<Block>, ProtocolError> {
    let command = envelope.command();
    check_ack(command, response)?;
    if response[3] == 0 {
        return Ok(None);
    }

    let echoed = decode_report(response)?;
    let start = HEADER_SIZE + usize::from(echoed.argument.is_some());
    let payload = &response[start..start + command.payload_len()];
    if echoed.argument != envelope.argument() || payload != envelope.payload() {
        return Err(ProtocolError::EchoMismatch { command });
    }
    Ok(Some(echoed.block))
}

/// Build the response a device sends for `report`: the request echoed back.
///
/// Used by dry-run transports and tests.
#[must_use]
pub fn ack_for(report: &[u8]) -> Vec<u8> {
    let mut response = vec![0u8; REPORT_SIZE];
    let echoed = report.len().min(REPORT_SIZE);
    response[..echoed].copy_from_slice(&report[..echoed]);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::actions::ActionCode;
    use crate::hid::encoder::{encode_block, encode_report};
    use crate::hid::layout::{TURBO_BLOCK_LEN, TURBO_BLOCK_STEP, TURBO_MAX_INTERVAL, TURBO_SLOTS};

    #[test]
    fn test_block_round_trip_each_kind() {
        let blocks = [
            Block::Mode(Mode::Mouse),
            Block::Mapping(MappingBlock {
                left: ButtonBinding::new(ActionCode::Keyboard(0x1d), ActionCode::None),
                right: ButtonBinding::new(
                    ActionCode::Pad(0x02),
                    ActionCode::from_name("kb_lctl+kb_c").unwrap(),
                ),
            }),
            Block::Deadzone(DeadzoneBlock {
                left: DeadzonePair { inner: 0, outer: 100 },
                right: DeadzonePair { inner: 255, outer: 255 },
            }),
            Block::Vibration(DualPercent { left: 100, right: 0 }),
            Block::Leds([
                Rgb { red: 255, green: 0, blue: 0 },
                Rgb { red: 0, green: 255, blue: 0 },
                Rgb { red: 0, green: 0, blue: 255 },
                Rgb { red: 1, green: 2, blue: 3 },
            ]),
            Block::Ready,
            Block::Calibration(CalibrationBlock {
                op: CalibrationOp::Apply,
                axis: Axis::XyRight,
                values: [0x0800, 0, 0x0fff, 0x07f0, 0x0010, 0x0ff0],
            }),
            Block::ResponseCurve(ResponseCurveBlock {
                side: Side::Left,
                points: [
                    CurvePoint { input: 25, output: 25 },
                    CurvePoint { input: 50, output: 50 },
                    CurvePoint { input: 75, output: 75 },
                    CurvePoint { input: 100, output: 100 },
                ],
            }),
            Block::AntiDeadzone(DualPercent { left: 5, right: 10 }),
        ];
        for block in blocks {
            let bytes = encode_block(&block).unwrap();
            assert_eq!(bytes.len(), block.kind().len());
            assert_eq!(decode_block(block.kind(), &bytes).unwrap(), block);
        }
    }

    #[test]
    fn test_turbo_block_round_trip() {
        let mut intervals = [0u8; TURBO_SLOTS];
        intervals[0] = 1;
        intervals[7] = 9;
        intervals[TURBO_SLOTS - 1] = TURBO_MAX_INTERVAL as u8;
        let block = Block::Turbo(TurboBlock { intervals });

        let bytes = encode_block(&block).unwrap();
        assert_eq!(bytes.len(), TURBO_BLOCK_LEN);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[14], 9);
        assert_eq!(bytes[30], 16);
        assert!(bytes.iter().skip(1).step_by(TURBO_BLOCK_STEP).all(|&b| b == 0));
        assert_eq!(decode_block(BlockKind::Turbo, &bytes).unwrap(), block);
    }

    #[test]
    fn test_boundary_values_round_trip() {
        let floor = [
            Block::Mode(Mode::Game),
            Block::Deadzone(DeadzoneBlock::default()),
            Block::Vibration(DualPercent { left: 0, right: 0 }),
            Block::Leds([Rgb::default(); LED_ZONES]),
            Block::Calibration(CalibrationBlock {
                op: CalibrationOp::Write,
                axis: Axis::XyLeft,
                values: [0; CALIBRATION_VALUES],
            }),
            Block::Turbo(TurboBlock::default()),
            Block::ResponseCurve(ResponseCurveBlock {
                side: Side::Left,
                points: [CurvePoint::default(); CURVE_POINTS],
            }),
            Block::AntiDeadzone(DualPercent::default()),
        ];
        let ceiling = [
            Block::Mode(Mode::Mouse),
            Block::Deadzone(DeadzoneBlock {
                left: DeadzonePair { inner: 255, outer: 255 },
                right: DeadzonePair { inner: 255, outer: 255 },
            }),
            Block::Vibration(DualPercent { left: 100, right: 100 }),
            Block::Leds([Rgb { red: 255, green: 255, blue: 255 }; LED_ZONES]),
            Block::Calibration(CalibrationBlock {
                op: CalibrationOp::Apply,
                axis: Axis::ZRight,
                values: [u16::MAX; CALIBRATION_VALUES],
            }),
            Block::Turbo(TurboBlock {
                intervals: [TURBO_MAX_INTERVAL as u8; TURBO_SLOTS],
            }),
            Block::ResponseCurve(ResponseCurveBlock {
                side: Side::Right,
                points: [CurvePoint { input: 100, output: 100 }; CURVE_POINTS],
            }),
            Block::AntiDeadzone(DualPercent { left: 100, right: 100 }),
        ];
        for block in floor.into_iter().chain(ceiling) {
            let bytes = encode_block(&block).unwrap();
            assert_eq!(decode_block(block.kind(), &bytes).unwrap(), block, "{block:?}");
        }
    }

    #[test]
    fn test_decode_rejects_values_past_each_bound() {
        let mut curve = [0u8; 9];
        curve[0] = 1;
        curve[4] = 101;
        let mut calibration_op = [0u8; 14];
        calibration_op[1] = 1;
        let mut calibration_axis = [0u8; 14];
        calibration_axis[0] = 1;
        calibration_axis[1] = 5;
        let mut turbo = [0u8; TURBO_BLOCK_LEN];
        turbo[30] = 17;

        let cases: [(BlockKind, Vec<u8>, &str, u16); 9] = [
            (BlockKind::Mode, vec![0], "mode", 0),
            (BlockKind::Mode, vec![4], "mode", 4),
            (BlockKind::Vibration, vec![100, 101], "right", 101),
            (BlockKind::AntiDeadzone, vec![101, 0], "left", 101),
            (BlockKind::ResponseCurve, vec![3, 0, 0, 0, 0, 0, 0, 0, 0], "side", 3),
            (BlockKind::ResponseCurve, curve.to_vec(), "point_2_out", 101),
            (BlockKind::Calibration, calibration_op.to_vec(), "operation", 0),
            (BlockKind::Calibration, calibration_axis.to_vec(), "axis", 5),
            (BlockKind::Turbo, turbo.to_vec(), "slot_15", 17),
        ];
        for (kind, bytes, field, value) in cases {
            match decode_block(kind, &bytes) {
                Err(DecodeError::OutOfRange { field: f, value: v, .. }) => {
                    assert_eq!((f, v), (field, value), "{kind:?}");
                }
                other => panic!("{kind:?}: expected OutOfRange, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_rejects_reserved_bytes() {
        let mut turbo = [0u8; TURBO_BLOCK_LEN];
        turbo[TURBO_BLOCK_LEN - 1] = 0x01;
        assert_eq!(
            decode_block(BlockKind::Turbo, &turbo),
            Err(DecodeError::Reserved {
                what: "turbo block",
                offset: TURBO_BLOCK_LEN - 1,
                value: 0x01
            })
        );

        assert_eq!(
            decode_block(BlockKind::Ready, &[0xff]),
            Err(DecodeError::Reserved {
                what: "ready block",
                offset: 0,
                value: 0xff
            })
        );
        assert_eq!(decode_block(BlockKind::Ready, &[0x00]), Ok(Block::Ready));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let err = decode_block(BlockKind::Mapping, &[0u8; 43]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::Length {
                what: "mapping block",
                expected: 44,
                actual: 43
            }
        );
    }

    #[test]
    fn test_decode_unknown_action_in_mapping() {
        let mut bytes = [0u8; 44];
        bytes[0] = 0x01;
        bytes[1] = 0x7f;
        assert!(matches!(
            decode_block(BlockKind::Mapping, &bytes),
            Err(DecodeError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_decode_report_round_trip() {
        let payload = encode_block(&Block::Deadzone(DeadzoneBlock::default())).unwrap();
        let env = CommandEnvelope::new(CommandId::SetTriggerDeadzone, payload).unwrap();
        let decoded = decode_report(&encode_report(&env)).unwrap();
        assert_eq!(decoded.command, CommandId::SetTriggerDeadzone);
        assert_eq!(decoded.argument, None);
        assert_eq!(decoded.block, Block::Deadzone(DeadzoneBlock::default()));
    }

    #[test]
    fn test_decode_report_errors() {
        assert!(matches!(
            decode_report(&[0u8; 10]),
            Err(DecodeError::Length { what: "report", .. })
        ));

        let mut report = [0u8; REPORT_SIZE];
        assert_eq!(decode_report(&report), Err(DecodeError::Header([0, 0])));

        report[0] = REPORT_ID;
        report[1] = CODE_PAGE;
        report[2] = 0x03;
        assert_eq!(decode_report(&report), Err(DecodeError::UnknownCommand(0x03)));

        report[2] = CommandId::SetMode.wire();
        report[3] = 0x05;
        assert!(matches!(
            decode_report(&report),
            Err(DecodeError::Length { what: "length byte", .. })
        ));
    }

    #[test]
    fn test_check_ack() {
        let env = CommandEnvelope::new(CommandId::SetMode, vec![1]).unwrap();
        let report = encode_report(&env);
        assert!(check_ack(CommandId::SetMode, &ack_for(&report)).is_ok());
        assert_eq!(
            check_ack(CommandId::SetTurbo, &ack_for(&report)),
            Err(ProtocolError::Nack {
                command: CommandId::SetTurbo
            })
        );
        assert!(check_ack(CommandId::SetMode, &report[..10]).is_err());
        assert!(check_ack(CommandId::SetMode, &[]).is_err());
    }

    fn vibration_envelope(left: u8, right: u8) -> CommandEnvelope {
        let payload = encode_block(&Block::Vibration(DualPercent { left, right })).unwrap();
        CommandEnvelope::new(CommandId::SetVibrationIntensity, payload).unwrap()
    }

    #[test]
    fn test_check_response_returns_echoed_block() {
        let env = vibration_envelope(40, 60);
        let echo = ack_for(&encode_report(&env));
        assert_eq!(
            check_response(&env, &echo),
            Ok(Some(Block::Vibration(DualPercent { left: 40, right: 60 })))
        );

        let payload = encode_block(&Block::Mapping(MappingBlock::default())).unwrap();
        let mapping = CommandEnvelope::with_argument(CommandId::SetMapping, 0x07, payload).unwrap();
        let echo = ack_for(&encode_report(&mapping));
        assert_eq!(
            check_response(&mapping, &echo),
            Ok(Some(Block::Mapping(MappingBlock::default())))
        );
    }

    #[test]
    fn test_check_response_accepts_bare_ack() {
        let env = vibration_envelope(40, 60);
        let mut bare = vec![0u8; REPORT_SIZE];
        bare[..3].copy_from_slice(&[REPORT_ID, CODE_PAGE, CommandId::SetVibrationIntensity.wire()]);
        assert_eq!(check_response(&env, &bare), Ok(None));
    }

    #[test]
    fn test_check_response_rejects_different_echo() {
        let env = vibration_envelope(40, 60);
        let echo = ack_for(&encode_report(&vibration_envelope(40, 61)));
        assert_eq!(
            check_response(&env, &echo),
            Err(ProtocolError::EchoMismatch {
                command: CommandId::SetVibrationIntensity
            })
        );

        let payload = encode_block(&Block::Mapping(MappingBlock::default())).unwrap();
        let sent = CommandEnvelope::with_argument(CommandId::SetMapping, 0x07, payload.clone()).unwrap();
        let other = CommandEnvelope::with_argument(CommandId::SetMapping, 0x08, payload).unwrap();
        assert_eq!(
            check_response(&sent, &ack_for(&encode_report(&other))),
            Err(ProtocolError::EchoMismatch {
                command: CommandId::SetMapping
            })
        );
    }

    #[test]
    fn test_check_response_rejects_undecodable_echo() {
        let env = vibration_envelope(40, 60);
        let mut echo = ack_for(&encode_report(&env));
        echo[HEADER_SIZE] = 101;
        assert!(matches!(
            check_response(&env, &echo),
            Err(ProtocolError::Decode(DecodeError::OutOfRange { field: "left", value: 101, .. }))
        ));

        let mut echo = ack_for(&encode_report(&env));
        echo[3] = 0x05;
        assert!(matches!(
            check_response(&env, &echo),
            Err(ProtocolError::Decode(DecodeError::Length { what: "length byte", .. }))
        ));
    }
}
