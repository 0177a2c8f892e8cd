//! # Report Encoder
//!
//! Serializes typed blocks through the layout table and frames command
//! envelopes into 64-byte feature reports.

use bytes::{BufMut, Bytes, BytesMut};

use super::layout::FieldValue;
use super::protocol::*;
use crate::error::ValidationError;

/// Encode a typed block into its fixed-length byte form
///
/// # Arguments
///
/// * `block` - Block to serialize
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - Exactly `block.kind().len()` bytes
/// * `Err(ValidationError)` - A field is outside its range
///
/// # Examples
///
/// ```no_run
/// use ally_gamepad::hid::encoder::encode_block;
/// use ally_gamepad::hid::protocol::{Block, DualPercent};
///
/// let bytes = encode_block(&Block::Vibration(DualPercent { left: 80, right: 40 })).unwrap();
/// assert_eq!(bytes, vec![80, 40]);
/// ```
pub fn encode_block(block: &Block) -> Result<Vec<u8>, ValidationError> {
    block.kind().layout().pack(&block_values(block))
}

fn num(value: impl Into<u16>) -> FieldValue {
    FieldValue::Num(value.into())
}

fn block_values(block: &Block) -> Vec<FieldValue> {
    match block {
        Block::Mode(mode) => vec![num(mode.wire())],
        Block::Mapping(mapping) => vec![
            FieldValue::Action(mapping.left.primary),
            FieldValue::Action(mapping.left.macro_action),
            FieldValue::Action(mapping.right.primary),
            FieldValue::Action(mapping.right.macro_action),
        ],
        Block::Deadzone(dz) => vec![
            num(dz.left.inner),
            num(dz.left.outer),
            num(dz.right.inner),
            num(dz.right.outer),
        ],
        Block::Vibration(pair) | Block::AntiDeadzone(pair) => vec![num(pair.left), num(pair.right)],
        Block::Leds(zones) => zones
            .iter()
            .flat_map(|rgb| [num(rgb.red), num(rgb.green), num(rgb.blue)])
            .collect(),
        Block::Ready => Vec::new(),
        Block::Calibration(cal) => {
            let mut values = vec![num(cal.op as u8), num(cal.axis.wire())];
            values.extend(cal.values.iter().map(|&v| num(v)));
            values
        }
        Block::Turbo(turbo) => turbo.intervals.iter().map(|&i| num(i)).collect(),
        Block::ResponseCurve(curve) => {
            let mut values = vec![num(curve.side.curve_selector())];
            values.extend(
                curve
                    .points
                    .iter()
                    .flat_map(|p| [num(p.input), num(p.output)]),
            );
            values
        }
    }
}

/// Frame an envelope into a complete 64-byte report
///
/// Layout: report id, code page, command, declared length, optional
/// argument, payload, zero padding.
#[must_use]
pub fn encode_report(envelope: &CommandEnvelope) -> Bytes {
    let command = envelope.command();
    let mut report = BytesMut::with_capacity(REPORT_SIZE);
    report.put_u8(REPORT_ID);
    report.put_u8(CODE_PAGE);
    report.put_u8(command.wire());
    report.put_u8(command.declared_length());
    if let Some(argument) = envelope.argument() {
        report.put_u8(argument);
    }
    report.put_slice(envelope.payload());
    report.resize(REPORT_SIZE, 0);
    report.freeze()
}
