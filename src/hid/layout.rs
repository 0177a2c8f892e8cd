//! # Block Layouts
//!
//! Single source of truth for where every field of every block lives.
//! The encoder and decoder both walk these tables, so an offset can only be
//! wrong in one place.
//!
//! | Block | Length | Fields |
//! |-------|--------|--------|
//! | Mode | 1 | mode |
//! | Mapping | 44 | 4 × 11-byte action records |
//! | Deadzone | 4 | inner/outer × left/right |
//! | Vibration | 2 | left/right motor % |
//! | LEDs | 12 | 4 zones × RGB |
//! | Ready | 1 | reserved |
//! | Calibration | 14 | operation, axis, 6 × u16 (big-endian) |
//! | Turbo | 32 | 16 × 2-byte slots, interval in the first byte |
//! | Response curve | 9 | side, 4 × (in, out) |
//! | Anti-deadzone | 2 | left/right stick % |

use super::actions::{ActionCode, BTN_CODE_LEN};
use crate::error::{DecodeError, ValidationError};

/// Storage width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWidth {
    /// One byte
    Byte,
    /// Big-endian u16
    Word,
    /// 11-byte action record
    Record,
}

impl FieldWidth {
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            FieldWidth::Byte => 1,
            FieldWidth::Word => 2,
            FieldWidth::Record => BTN_CODE_LEN,
        }
    }
}

/// One field of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub width: FieldWidth,
    pub min: u16,
    pub max: u16,
}

const fn byte(name: &'static str, offset: usize, min: u16, max: u16) -> Field {
    Field {
        name,
        offset,
        width: FieldWidth::Byte,
        min,
        max,
    }
}

const fn word(name: &'static str, offset: usize) -> Field {
    Field {
        name,
        offset,
        width: FieldWidth::Word,
        min: 0,
        max: u16::MAX,
    }
}

const fn record(name: &'static str, offset: usize) -> Field {
    Field {
        name,
        offset,
        width: FieldWidth::Record,
        min: 0,
        max: 0,
    }
}

/// Kinds of fixed-length blocks carried by commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Mode,
    Mapping,
    Deadzone,
    Vibration,
    Leds,
    Ready,
    Calibration,
    Turbo,
    ResponseCurve,
    AntiDeadzone,
}

/// Fixed layout of a block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub name: &'static str,
    pub len: usize,
    pub fields: &'static [Field],
}

/// Mapping block length
pub const MAPPING_BLOCK_LEN: usize = 44;

/// Turbo block length
pub const TURBO_BLOCK_LEN: usize = 32;

/// Bytes per turbo slot
pub const TURBO_BLOCK_STEP: usize = 2;

/// Number of turbo slots
pub const TURBO_SLOTS: usize = TURBO_BLOCK_LEN / TURBO_BLOCK_STEP;

/// Longest turbo repeat interval
pub const TURBO_MAX_INTERVAL: u16 = 16;

/// Percent ceiling shared by curves, vibration and anti-deadzone
pub const PERCENT_MAX: u16 = 100;

const MODE: BlockLayout = BlockLayout {
    name: "mode block",
    len: 1,
    fields: &[byte("mode", 0, 1, 3)],
};

const MAPPING: BlockLayout = BlockLayout {
    name: "mapping block",
    len: MAPPING_BLOCK_LEN,
    fields: &[
        record("left_primary", 0),
        record("left_macro", BTN_CODE_LEN),
        record("right_primary", 2 * BTN_CODE_LEN),
        record("right_macro", 3 * BTN_CODE_LEN),
    ],
};

const DEADZONE: BlockLayout = BlockLayout {
    name: "deadzone block",
    len: 4,
    fields: &[
        byte("left_inner", 0, 0, 255),
        byte("left_outer", 1, 0, 255),
        byte("right_inner", 2, 0, 255),
        byte("right_outer", 3, 0, 255),
    ],
};

const VIBRATION: BlockLayout = BlockLayout {
    name: "vibration block",
    len: 2,
    fields: &[
        byte("left", 0, 0, PERCENT_MAX),
        byte("right", 1, 0, PERCENT_MAX),
    ],
};

const LEDS: BlockLayout = BlockLayout {
    name: "led block",
    len: 12,
    fields: &[
        byte("zone1_red", 0, 0, 255),
        byte("zone1_green", 1, 0, 255),
        byte("zone1_blue", 2, 0, 255),
        byte("zone2_red", 3, 0, 255),
        byte("zone2_green", 4, 0, 255),
        byte("zone2_blue", 5, 0, 255),
        byte("zone3_red", 6, 0, 255),
        byte("zone3_green", 7, 0, 255),
        byte("zone3_blue", 8, 0, 255),
        byte("zone4_red", 9, 0, 255),
        byte("zone4_green", 10, 0, 255),
        byte("zone4_blue", 11, 0, 255),
    ],
};

const READY: BlockLayout = BlockLayout {
    name: "ready block",
    len: 1,
    fields: &[],
};

const CALIBRATION: BlockLayout = BlockLayout {
    name: "calibration block",
    len: 14,
    fields: &[
        byte("operation", 0, 1, 3),
        byte("axis", 1, 1, 4),
        word("value_1", 2),
        word("value_2", 4),
        word("value_3", 6),
        word("value_4", 8),
        word("value_5", 10),
        word("value_6", 12),
    ],
};

const TURBO: BlockLayout = BlockLayout {
    name: "turbo block",
    len: TURBO_BLOCK_LEN,
    fields: &[
        byte("slot_0", 0, 0, TURBO_MAX_INTERVAL),
        byte("slot_1", 2, 0, TURBO_MAX_INTERVAL),
        byte("slot_2", 4, 0, TURBO_MAX_INTERVAL),
        byte("slot_3", 6, 0, TURBO_MAX_INTERVAL),
        byte("slot_4", 8, 0, TURBO_MAX_INTERVAL),
        byte("slot_5", 10, 0, TURBO_MAX_INTERVAL),
        byte("slot_6", 12, 0, TURBO_MAX_INTERVAL),
        byte("slot_7", 14, 0, TURBO_MAX_INTERVAL),
        byte("slot_8", 16, 0, TURBO_MAX_INTERVAL),
        byte("slot_9", 18, 0, TURBO_MAX_INTERVAL),
        byte("slot_10", 20, 0, TURBO_MAX_INTERVAL),
        byte("slot_11", 22, 0, TURBO_MAX_INTERVAL),
        byte("slot_12", 24, 0, TURBO_MAX_INTERVAL),
        byte("slot_13", 26, 0, TURBO_MAX_INTERVAL),
        byte("slot_14", 28, 0, TURBO_MAX_INTERVAL),
        byte("slot_15", 30, 0, TURBO_MAX_INTERVAL),
    ],
};

const RESPONSE_CURVE: BlockLayout = BlockLayout {
    name: "response curve block",
    len: 9,
    fields: &[
        byte("side", 0, 1, 2),
        byte("point_1_in", 1, 0, PERCENT_MAX),
        byte("point_1_out", 2, 0, PERCENT_MAX),
        byte("point_2_in", 3, 0, PERCENT_MAX),
        byte("point_2_out", 4, 0, PERCENT_MAX),
        byte("point_3_in", 5, 0, PERCENT_MAX),
        byte("point_3_out", 6, 0, PERCENT_MAX),
        byte("point_4_in", 7, 0, PERCENT_MAX),
        byte("point_4_out", 8, 0, PERCENT_MAX),
    ],
};

const ANTI_DEADZONE: BlockLayout = BlockLayout {
    name: "anti-deadzone block",
    len: 2,
    fields: &[
        byte("left", 0, 0, PERCENT_MAX),
        byte("right", 1, 0, PERCENT_MAX),
    ],
};

impl BlockKind {
    pub const ALL: [BlockKind; 10] = [
        BlockKind::Mode,
        BlockKind::Mapping,
        BlockKind::Deadzone,
        BlockKind::Vibration,
        BlockKind::Leds,
        BlockKind::Ready,
        BlockKind::Calibration,
        BlockKind::Turbo,
        BlockKind::ResponseCurve,
        BlockKind::AntiDeadzone,
    ];

    #[must_use]
    pub fn layout(self) -> &'static BlockLayout {
        match self {
            BlockKind::Mode => &MODE,
            BlockKind::Mapping => &MAPPING,
            BlockKind::Deadzone => &DEADZONE,
            BlockKind::Vibration => &VIBRATION,
            BlockKind::Leds => &LEDS,
            BlockKind::Ready => &READY,
            BlockKind::Calibration => &CALIBRATION,
            BlockKind::Turbo => &TURBO,
            BlockKind::ResponseCurve => &RESPONSE_CURVE,
            BlockKind::AntiDeadzone => &ANTI_DEADZONE,
        }
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.layout().len
    }
}

/// Value of a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Num(u16),
    Action(ActionCode),
}

impl FieldValue {
    /// Numeric value, or 0 for an action record.
    #[must_use]
    pub fn num(self) -> u16 {
        match self {
            FieldValue::Num(value) => value,
            FieldValue::Action(_) => 0,
        }
    }

    #[must_use]
    pub fn action(self) -> ActionCode {
        match self {
            FieldValue::Action(action) => action,
            FieldValue::Num(_) => ActionCode::None,
        }
    }
}

impl BlockLayout {
    /// Serializes `values` (one per field, in table order).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] when a value is outside its
    /// field range and [`ValidationError::Malformed`] when the values do not
    /// line up with the fields.
    pub fn pack(&self, values: &[FieldValue]) -> Result<Vec<u8>, ValidationError> {
        if values.len() != self.fields.len() {
            return Err(ValidationError::Malformed {
                field: self.name,
                input: format!("{} values for {} fields", values.len(), self.fields.len()),
            });
        }

        let mut block = vec![0u8; self.len];
        for (field, value) in self.fields.iter().zip(values) {
            let slot = &mut block[field.offset..field.offset + field.width.bytes()];
            match (field.width, *value) {
                (FieldWidth::Record, FieldValue::Action(action)) => {
                    slot.copy_from_slice(&action.to_record());
                }
                (FieldWidth::Byte | FieldWidth::Word, FieldValue::Num(num)) => {
                    if num < field.min || num > field.max {
                        return Err(ValidationError::OutOfRange {
                            field: field.name,
                            value: i64::from(num),
                            min: i64::from(field.min),
                            max: i64::from(field.max),
                        });
                    }
                    if field.width == FieldWidth::Byte {
                        slot[0] = num as u8;
                    } else {
                        slot.copy_from_slice(&num.to_be_bytes());
                    }
                }
                _ => {
                    return Err(ValidationError::Malformed {
                        field: field.name,
                        input: format!("{:?}", value),
                    })
                }
            }
        }
        Ok(block)
    }

    /// Parses a block into one value per field.
    ///
    /// # Errors
    ///
    /// A length mismatch is reported as [`DecodeError::Length`] before any
    /// field is looked at; range and reserved-byte violations follow.
    pub fn unpack(&self, bytes: &[u8]) -> Result<Vec<FieldValue>, DecodeError> {
        if bytes.len() != self.len {
            return Err(DecodeError::Length {
                what: self.name,
                expected: self.len,
                actual: bytes.len(),
            });
        }

        let mut covered = vec![false; self.len];
        let mut values = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let end = field.offset + field.width.bytes();
            let raw = &bytes[field.offset..end];
            covered[field.offset..end].iter_mut().for_each(|c| *c = true);

            let value = match field.width {
                FieldWidth::Record => FieldValue::Action(ActionCode::from_record(raw)?),
                FieldWidth::Byte | FieldWidth::Word => {
                    let num = if field.width == FieldWidth::Byte {
                        u16::from(raw[0])
                    } else {
                        u16::from_be_bytes([raw[0], raw[1]])
                    };
                    if num < field.min || num > field.max {
                        return Err(DecodeError::OutOfRange {
                            field: field.name,
                            value: num,
                            min: field.min,
                            max: field.max,
                        });
                    }
                    FieldValue::Num(num)
                }
            };
            values.push(value);
        }

        if let Some(offset) = covered
            .iter()
            .zip(bytes)
            .position(|(&covered, &byte)| !covered && byte != 0)
        {
            return Err(DecodeError::Reserved {
                what: self.name,
                offset,
                value: bytes[offset],
            });
        }

        Ok(values)
    }
}
