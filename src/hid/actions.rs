//! # Action Codes
//!
//! Every remappable action (gamepad button, keyboard key, mouse button,
//! media key, key combination) and its 11-byte wire record.
//!
//! ## Record Layout
//!
//! ```text
//! Byte 0     : kind (0 none, 1 pad, 2 keyboard, 3 mouse, 4 combo, 5 media)
//! Byte 1     : pad code
//! Byte 2     : keyboard code
//! Byte 3     : media code
//! Byte 4     : mouse code
//! Byte 5     : combo key count (2-5)
//! Byte 6..11 : combo keyboard codes
//! ```
//!
//! Only the byte belonging to the kind is set, every other byte is zero.

use std::fmt;

use crate::error::{DecodeError, ValidationError};

/// Length of one action record
pub const BTN_CODE_LEN: usize = 11;

/// Maximum number of keys in a combination record
pub const COMBO_MAX_KEYS: usize = 5;

const KIND_NONE: u8 = 0x00;
const KIND_PAD: u8 = 0x01;
const KIND_KEYBOARD: u8 = 0x02;
const KIND_MOUSE: u8 = 0x03;
const KIND_COMBO: u8 = 0x04;
const KIND_MEDIA: u8 = 0x05;

const PAD_OFFSET: usize = 1;
const KEYBOARD_OFFSET: usize = 2;
const MEDIA_OFFSET: usize = 3;
const MOUSE_OFFSET: usize = 4;
const COMBO_COUNT_OFFSET: usize = 5;
const COMBO_KEYS_OFFSET: usize = 6;

/// A chord of 2 to 5 keyboard keys pressed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    len: u8,
    keys: [u8; COMBO_MAX_KEYS],
}

impl KeyCombo {
    /// Builds a combination from keyboard codes.
    ///
    /// Returns `None` unless there are 2 to 5 known keyboard codes.
    pub fn new(codes: &[u8]) -> Option<Self> {
        if codes.len() < 2 || codes.len() > COMBO_MAX_KEYS {
            return None;
        }
        if !codes
            .iter()
            .all(|&code| lookup_code(ActionCode::Keyboard(code)).is_some())
        {
            return None;
        }
        let mut keys = [0u8; COMBO_MAX_KEYS];
        keys[..codes.len()].copy_from_slice(codes);
        Some(Self {
            len: codes.len() as u8,
            keys,
        })
    }

    /// Unchecked constructor for built-in tables.
    pub(crate) const fn from_codes(codes: &[u8]) -> Self {
        let mut keys = [0u8; COMBO_MAX_KEYS];
        let mut i = 0;
        while i < codes.len() {
            keys[i] = codes[i];
            i += 1;
        }
        Self {
            len: codes.len() as u8,
            keys,
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[u8] {
        &self.keys[..usize::from(self.len)]
    }
}

/// One remappable action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ActionCode {
    #[default]
    None,
    Pad(u8),
    Keyboard(u8),
    Mouse(u8),
    Media(u8),
    Combo(KeyCombo),
}

/// Name ⇄ code table. Names are the canonical lowercase spelling.
const ACTIONS: &[(&str, ActionCode)] = &[
    ("none", ActionCode::None),
    // Gamepad
    ("pad_a", ActionCode::Pad(0x01)),
    ("pad_b", ActionCode::Pad(0x02)),
    ("pad_x", ActionCode::Pad(0x03)),
    ("pad_y", ActionCode::Pad(0x04)),
    ("pad_lb", ActionCode::Pad(0x05)),
    ("pad_rb", ActionCode::Pad(0x06)),
    ("pad_ls", ActionCode::Pad(0x07)),
    ("pad_rs", ActionCode::Pad(0x08)),
    ("pad_dpad_up", ActionCode::Pad(0x09)),
    ("pad_dpad_down", ActionCode::Pad(0x0a)),
    ("pad_dpad_left", ActionCode::Pad(0x0b)),
    ("pad_dpad_right", ActionCode::Pad(0x0c)),
    ("pad_lt", ActionCode::Pad(0x0d)),
    ("pad_rt", ActionCode::Pad(0x0e)),
    ("pad_view", ActionCode::Pad(0x11)),
    ("pad_menu", ActionCode::Pad(0x12)),
    ("pad_xbox", ActionCode::Pad(0x13)),
    // Keyboard: function row
    ("kb_m2", ActionCode::Keyboard(0x8e)),
    ("kb_m1", ActionCode::Keyboard(0x8f)),
    ("kb_esc", ActionCode::Keyboard(0x76)),
    ("kb_f1", ActionCode::Keyboard(0x50)),
    ("kb_f2", ActionCode::Keyboard(0x60)),
    ("kb_f3", ActionCode::Keyboard(0x40)),
    ("kb_f4", ActionCode::Keyboard(0x0c)),
    ("kb_f5", ActionCode::Keyboard(0x03)),
    ("kb_f6", ActionCode::Keyboard(0x0b)),
    ("kb_f7", ActionCode::Keyboard(0x80)),
    ("kb_f8", ActionCode::Keyboard(0x0a)),
    ("kb_f9", ActionCode::Keyboard(0x01)),
    ("kb_f10", ActionCode::Keyboard(0x09)),
    ("kb_f11", ActionCode::Keyboard(0x78)),
    ("kb_f12", ActionCode::Keyboard(0x07)),
    ("kb_f14", ActionCode::Keyboard(0x10)),
    ("kb_f15", ActionCode::Keyboard(0x18)),
    // Keyboard: number row
    ("kb_backtick", ActionCode::Keyboard(0x0e)),
    ("kb_1", ActionCode::Keyboard(0x16)),
    ("kb_2", ActionCode::Keyboard(0x1e)),
    ("kb_3", ActionCode::Keyboard(0x26)),
    ("kb_4", ActionCode::Keyboard(0x25)),
    ("kb_5", ActionCode::Keyboard(0x2e)),
    ("kb_6", ActionCode::Keyboard(0x36)),
    ("kb_7", ActionCode::Keyboard(0x3d)),
    ("kb_8", ActionCode::Keyboard(0x3e)),
    ("kb_9", ActionCode::Keyboard(0x46)),
    ("kb_0", ActionCode::Keyboard(0x45)),
    ("kb_hyphen", ActionCode::Keyboard(0x4e)),
    ("kb_equals", ActionCode::Keyboard(0x55)),
    ("kb_backspace", ActionCode::Keyboard(0x66)),
    // Keyboard: top letter row
    ("kb_tab", ActionCode::Keyboard(0x0d)),
    ("kb_q", ActionCode::Keyboard(0x15)),
    ("kb_w", ActionCode::Keyboard(0x1d)),
    ("kb_e", ActionCode::Keyboard(0x24)),
    ("kb_r", ActionCode::Keyboard(0x2d)),
    ("kb_t", ActionCode::Keyboard(0x2c)),
    ("kb_y", ActionCode::Keyboard(0x35)),
    ("kb_u", ActionCode::Keyboard(0x3c)),
    ("kb_i", ActionCode::Keyboard(0x43)),
    ("kb_o", ActionCode::Keyboard(0x44)),
    ("kb_p", ActionCode::Keyboard(0x4d)),
    ("kb_lbracket", ActionCode::Keyboard(0x54)),
    ("kb_rbracket", ActionCode::Keyboard(0x5b)),
    ("kb_bkslash", ActionCode::Keyboard(0x5d)),
    // Keyboard: home row
    ("kb_caps", ActionCode::Keyboard(0x58)),
    ("kb_a", ActionCode::Keyboard(0x1c)),
    ("kb_s", ActionCode::Keyboard(0x1b)),
    ("kb_d", ActionCode::Keyboard(0x23)),
    ("kb_f", ActionCode::Keyboard(0x2b)),
    ("kb_g", ActionCode::Keyboard(0x34)),
    ("kb_h", ActionCode::Keyboard(0x33)),
    ("kb_j", ActionCode::Keyboard(0x3b)),
    ("kb_k", ActionCode::Keyboard(0x42)),
    ("kb_l", ActionCode::Keyboard(0x4b)),
    ("kb_semicolon", ActionCode::Keyboard(0x4c)),
    ("kb_quote", ActionCode::Keyboard(0x52)),
    ("kb_enter", ActionCode::Keyboard(0x5a)),
    // Keyboard: bottom row
    ("kb_lshift", ActionCode::Keyboard(0x88)),
    ("kb_z", ActionCode::Keyboard(0x1a)),
    ("kb_x", ActionCode::Keyboard(0x22)),
    ("kb_c", ActionCode::Keyboard(0x21)),
    ("kb_v", ActionCode::Keyboard(0x2a)),
    ("kb_b", ActionCode::Keyboard(0x32)),
    ("kb_n", ActionCode::Keyboard(0x31)),
    ("kb_m", ActionCode::Keyboard(0x3a)),
    ("kb_comma", ActionCode::Keyboard(0x41)),
    ("kb_period", ActionCode::Keyboard(0x49)),
    ("kb_fwdslash", ActionCode::Keyboard(0x4a)),
    ("kb_rshift", ActionCode::Keyboard(0x89)),
    // Keyboard: modifiers
    ("kb_lctl", ActionCode::Keyboard(0x8c)),
    ("kb_meta", ActionCode::Keyboard(0x82)),
    ("kb_lalt", ActionCode::Keyboard(0x8a)),
    ("kb_space", ActionCode::Keyboard(0x29)),
    ("kb_ralt", ActionCode::Keyboard(0x8b)),
    ("kb_menu", ActionCode::Keyboard(0x84)),
    ("kb_rctl", ActionCode::Keyboard(0x8d)),
    // Keyboard: navigation
    ("kb_prntscn", ActionCode::Keyboard(0xc3)),
    ("kb_scrlck", ActionCode::Keyboard(0x7e)),
    ("kb_pause", ActionCode::Keyboard(0x91)),
    ("kb_ins", ActionCode::Keyboard(0xc2)),
    ("kb_home", ActionCode::Keyboard(0x94)),
    ("kb_pgup", ActionCode::Keyboard(0x96)),
    ("kb_del", ActionCode::Keyboard(0xc0)),
    ("kb_end", ActionCode::Keyboard(0x95)),
    ("kb_pgdwn", ActionCode::Keyboard(0x97)),
    ("kb_up_arrow", ActionCode::Keyboard(0x98)),
    ("kb_down_arrow", ActionCode::Keyboard(0x99)),
    ("kb_left_arrow", ActionCode::Keyboard(0x9a)),
    ("kb_right_arrow", ActionCode::Keyboard(0x9b)),
    // Numpad
    ("numpad_lock", ActionCode::Keyboard(0x77)),
    ("numpad_fwdslash", ActionCode::Keyboard(0x90)),
    ("numpad_asterisk", ActionCode::Keyboard(0x7c)),
    ("numpad_hyphen", ActionCode::Keyboard(0x7b)),
    ("numpad_0", ActionCode::Keyboard(0x70)),
    ("numpad_1", ActionCode::Keyboard(0x69)),
    ("numpad_2", ActionCode::Keyboard(0x72)),
    ("numpad_3", ActionCode::Keyboard(0x7a)),
    ("numpad_4", ActionCode::Keyboard(0x6b)),
    ("numpad_5", ActionCode::Keyboard(0x73)),
    ("numpad_6", ActionCode::Keyboard(0x74)),
    ("numpad_7", ActionCode::Keyboard(0x6c)),
    ("numpad_8", ActionCode::Keyboard(0x75)),
    ("numpad_9", ActionCode::Keyboard(0x7d)),
    ("numpad_plus", ActionCode::Keyboard(0x79)),
    ("numpad_enter", ActionCode::Keyboard(0x81)),
    ("numpad_.", ActionCode::Keyboard(0x71)),
    // Mouse
    ("rat_lclick", ActionCode::Mouse(0x01)),
    ("rat_rclick", ActionCode::Mouse(0x02)),
    ("rat_mclick", ActionCode::Mouse(0x03)),
    ("rat_wheel_up", ActionCode::Mouse(0x04)),
    ("rat_wheel_down", ActionCode::Mouse(0x05)),
    // Media
    ("media_screenshot", ActionCode::Media(0x16)),
    ("media_show_keyboard", ActionCode::Media(0x19)),
    ("media_show_desktop", ActionCode::Media(0x1c)),
    ("media_start_recording", ActionCode::Media(0x1e)),
    ("media_mic_off", ActionCode::Media(0x01)),
    ("media_vol_down", ActionCode::Media(0x20)),
    ("media_vol_up", ActionCode::Media(0x21)),
];

fn lookup_name(name: &str) -> Option<ActionCode> {
    ACTIONS
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
        .map(|&(_, code)| code)
}

fn lookup_code(code: ActionCode) -> Option<&'static str> {
    ACTIONS
        .iter()
        .find(|(_, entry)| *entry == code)
        .map(|&(name, _)| name)
}

impl ActionCode {
    /// Parses an action name, case-insensitively.
    ///
    /// Key combinations are written as keyboard names joined with `+`,
    /// e.g. `kb_lctl+kb_lshift+kb_esc`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownAction`] for names missing from the
    /// table and [`ValidationError::InvalidCombo`] for malformed combinations.
    pub fn from_name(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if !name.contains('+') {
            return lookup_name(name)
                .ok_or_else(|| ValidationError::UnknownAction(name.to_string()));
        }

        let mut codes = Vec::with_capacity(COMBO_MAX_KEYS);
        for part in name.split('+') {
            match lookup_name(part.trim()) {
                Some(ActionCode::Keyboard(code)) => codes.push(code),
                Some(_) => return Err(ValidationError::InvalidCombo(name.to_string())),
                None => return Err(ValidationError::UnknownAction(part.trim().to_string())),
            }
        }
        KeyCombo::new(&codes)
            .map(ActionCode::Combo)
            .ok_or_else(|| ValidationError::InvalidCombo(name.to_string()))
    }

    /// Canonical name of this action, if it is part of the table.
    #[must_use]
    pub fn canonical_name(&self) -> Option<String> {
        match self {
            ActionCode::Combo(combo) => combo
                .keys()
                .iter()
                .map(|&code| lookup_code(ActionCode::Keyboard(code)))
                .collect::<Option<Vec<_>>>()
                .map(|names| names.join("+")),
            other => lookup_code(*other).map(str::to_string),
        }
    }

    /// Writes the 11-byte record for this action.
    #[must_use]
    pub fn to_record(&self) -> [u8; BTN_CODE_LEN] {
        let mut record = [0u8; BTN_CODE_LEN];
        match *self {
            ActionCode::None => {}
            ActionCode::Pad(code) => {
                record[0] = KIND_PAD;
                record[PAD_OFFSET] = code;
            }
            ActionCode::Keyboard(code) => {
                record[0] = KIND_KEYBOARD;
                record[KEYBOARD_OFFSET] = code;
            }
            ActionCode::Mouse(code) => {
                record[0] = KIND_MOUSE;
                record[MOUSE_OFFSET] = code;
            }
            ActionCode::Media(code) => {
                record[0] = KIND_MEDIA;
                record[MEDIA_OFFSET] = code;
            }
            ActionCode::Combo(combo) => {
                record[0] = KIND_COMBO;
                record[COMBO_COUNT_OFFSET] = combo.len;
                let keys = combo.keys();
                record[COMBO_KEYS_OFFSET..COMBO_KEYS_OFFSET + keys.len()].copy_from_slice(keys);
            }
        }
        record
    }

    /// Reads an 11-byte record.
    ///
    /// # Errors
    ///
    /// Fails on a wrong length, a non-zero reserved byte or a code that is
    /// not in the action table.
    pub fn from_record(record: &[u8]) -> Result<Self, DecodeError> {
        if record.len() != BTN_CODE_LEN {
            return Err(DecodeError::Length {
                what: "action record",
                expected: BTN_CODE_LEN,
                actual: record.len(),
            });
        }

        let unknown = || DecodeError::UnknownAction(record.to_vec());
        let (action, used): (ActionCode, &[usize]) = match record[0] {
            KIND_NONE => (ActionCode::None, &[][..]),
            KIND_PAD => (ActionCode::Pad(record[PAD_OFFSET]), &[PAD_OFFSET][..]),
            KIND_KEYBOARD => (
                ActionCode::Keyboard(record[KEYBOARD_OFFSET]),
                &[KEYBOARD_OFFSET][..],
            ),
            KIND_MOUSE => (ActionCode::Mouse(record[MOUSE_OFFSET]), &[MOUSE_OFFSET][..]),
            KIND_MEDIA => (ActionCode::Media(record[MEDIA_OFFSET]), &[MEDIA_OFFSET][..]),
            KIND_COMBO => {
                let count = usize::from(record[COMBO_COUNT_OFFSET]);
                if count > COMBO_MAX_KEYS {
                    return Err(unknown());
                }
                let keys = &record[COMBO_KEYS_OFFSET..COMBO_KEYS_OFFSET + count];
                let combo = KeyCombo::new(keys).ok_or_else(unknown)?;
                check_reserved(record, COMBO_KEYS_OFFSET + count)?;
                return Ok(ActionCode::Combo(combo));
            }
            _ => return Err(unknown()),
        };

        for (offset, &value) in record.iter().enumerate().skip(1) {
            if value != 0 && !used.contains(&offset) {
                return Err(DecodeError::Reserved {
                    what: "action record",
                    offset,
                    value,
                });
            }
        }

        if lookup_code(action).is_none() {
            return Err(unknown());
        }
        Ok(action)
    }
}

/// Bytes 1..=4 of a combo record and everything past its last key are zero.
fn check_reserved(record: &[u8], keys_end: usize) -> Result<(), DecodeError> {
    let reserved = (1..COMBO_COUNT_OFFSET).chain(keys_end..BTN_CODE_LEN);
    for offset in reserved {
        if record[offset] != 0 {
            return Err(DecodeError::Reserved {
                what: "action record",
                offset,
                value: record[offset],
            });
        }
    }
    Ok(())
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical_name() {
            Some(name) => f.write_str(&name),
            None => write!(f, "unknown({:02x?})", self.to_record()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_names_and_codes_are_unique() {
        let mut names = HashSet::new();
        let mut codes = HashSet::new();
        for &(name, code) in ACTIONS {
            assert!(names.insert(name), "duplicate name {}", name);
            assert!(codes.insert(code), "duplicate code for {}", name);
        }
    }

    #[test]
    fn test_every_named_action_survives_its_record() {
        for &(name, code) in ACTIONS {
            let record = code.to_record();
            assert_eq!(ActionCode::from_record(&record).unwrap(), code, "{}", name);
            assert_eq!(ActionCode::from_name(name).unwrap(), code);
            assert_eq!(code.canonical_name().as_deref(), Some(name));
        }
    }

    #[test]
    fn test_record_layout_per_kind() {
        assert_eq!(ActionCode::Pad(0x09).to_record()[..2], [0x01, 0x09]);
        assert_eq!(ActionCode::Keyboard(0x98).to_record()[..3], [0x02, 0x00, 0x98]);
        assert_eq!(ActionCode::Media(0x19).to_record()[..4], [0x05, 0x00, 0x00, 0x19]);
        assert_eq!(
            ActionCode::Mouse(0x01).to_record()[..5],
            [0x03, 0x00, 0x00, 0x00, 0x01]
        );
        assert_eq!(ActionCode::None.to_record(), [0u8; BTN_CODE_LEN]);
    }

    #[test]
    fn test_combo_record() {
        let combo = ActionCode::from_name("kb_lctl+kb_lshift+kb_esc").unwrap();
        assert_eq!(
            combo.to_record(),
            [0x04, 0x00, 0x00, 0x00, 0x00, 0x03, 0x8c, 0x88, 0x76, 0x00, 0x00]
        );
        assert_eq!(
            combo.canonical_name().as_deref(),
            Some("kb_lctl+kb_lshift+kb_esc")
        );
    }

    #[test]
    fn test_name_parsing_is_case_insensitive() {
        assert_eq!(
            ActionCode::from_name("KB_F15").unwrap(),
            ActionCode::Keyboard(0x18)
        );
        assert_eq!(ActionCode::from_name(" pad_a\n").unwrap(), ActionCode::Pad(0x01));
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(
            ActionCode::from_name("kb_f13"),
            Err(ValidationError::UnknownAction("kb_f13".to_string()))
        );
        assert!(matches!(
            ActionCode::from_name("kb_a+pad_b"),
            Err(ValidationError::InvalidCombo(_))
        ));
        assert!(matches!(
            ActionCode::from_name("kb_a+kb_b+kb_c+kb_d+kb_e+kb_f"),
            Err(ValidationError::InvalidCombo(_))
        ));
    }

    #[test]
    fn test_record_decode_errors() {
        assert!(matches!(
            ActionCode::from_record(&[0x01, 0x09]),
            Err(DecodeError::Length { expected: 11, actual: 2, .. })
        ));

        let mut reserved = ActionCode::Pad(0x01).to_record();
        reserved[7] = 0xff;
        assert!(matches!(
            ActionCode::from_record(&reserved),
            Err(DecodeError::Reserved { offset: 7, .. })
        ));

        let mut unknown_kind = [0u8; BTN_CODE_LEN];
        unknown_kind[0] = 0x07;
        assert!(matches!(
            ActionCode::from_record(&unknown_kind),
            Err(DecodeError::UnknownAction(_))
        ));

        // 0x0f is not a gamepad code
        let mut unknown_code = [0u8; BTN_CODE_LEN];
        unknown_code[0] = 0x01;
        unknown_code[1] = 0x0f;
        assert!(matches!(
            ActionCode::from_record(&unknown_code),
            Err(DecodeError::UnknownAction(_))
        ));
    }
}
