//! # Mapping Presets
//!
//! Factory button layouts for game (xpad) and WASD mode, one mapping block
//! per button pair in pair order. Mouse mode starts from the game layout.

use super::actions::{ActionCode, KeyCombo};
use super::protocol::{ButtonBinding, MappingBlock};
use crate::gamepad::types::{ButtonPair, Mode};

/// Number of mapping blocks in a preset
pub const PRESET_BLOCKS: usize = 9;

const NONE: ActionCode = ActionCode::None;

const fn pad(code: u8) -> ActionCode {
    ActionCode::Pad(code)
}

const fn kb(code: u8) -> ActionCode {
    ActionCode::Keyboard(code)
}

const fn mouse(code: u8) -> ActionCode {
    ActionCode::Mouse(code)
}

const fn media(code: u8) -> ActionCode {
    ActionCode::Media(code)
}

const fn combo(codes: &[u8]) -> ActionCode {
    ActionCode::Combo(KeyCombo::from_codes(codes))
}

const fn block(
    left: ActionCode,
    left_macro: ActionCode,
    right: ActionCode,
    right_macro: ActionCode,
) -> MappingBlock {
    MappingBlock {
        left: ButtonBinding::new(left, left_macro),
        right: ButtonBinding::new(right, right_macro),
    }
}

// Shared macro layer: keyboard overlay, task view, screenshot, etc.
const CTRL_SHIFT_ESC: ActionCode = combo(&[0x8c, 0x88, 0x76]);
const META_D: ActionCode = combo(&[0x82, 0x23]);
const META_TAB: ActionCode = combo(&[0x82, 0x0d]);
const META_N: ActionCode = combo(&[0x82, 0x31]);
const META_P: ActionCode = combo(&[0x82, 0x4d]);
const SHOW_KEYBOARD: ActionCode = media(0x19);
const SCREENSHOT: ActionCode = media(0x16);
const START_RECORDING: ActionCode = media(0x1e);

/// Game (xpad) mode layout
pub const GAME_PRESET: [MappingBlock; PRESET_BLOCKS] = [
    block(pad(0x09), SHOW_KEYBOARD, pad(0x0a), CTRL_SHIFT_ESC),
    block(pad(0x0b), META_D, pad(0x0c), META_TAB),
    block(pad(0x07), NONE, pad(0x08), NONE),
    block(pad(0x05), NONE, pad(0x06), NONE),
    block(pad(0x01), SCREENSHOT, pad(0x02), META_N),
    block(pad(0x03), META_P, pad(0x04), START_RECORDING),
    block(pad(0x11), NONE, pad(0x12), NONE),
    block(kb(0x8e), kb(0x8e), kb(0x8f), kb(0x8f)),
    block(pad(0x0d), NONE, pad(0x0e), NONE),
];

/// WASD mode layout
pub const WASD_PRESET: [MappingBlock; PRESET_BLOCKS] = [
    block(kb(0x98), SHOW_KEYBOARD, kb(0x99), CTRL_SHIFT_ESC),
    block(kb(0x9a), META_D, kb(0x9b), META_TAB),
    block(kb(0x88), NONE, mouse(0x01), NONE),
    block(kb(0x0d), NONE, mouse(0x01), NONE),
    block(kb(0x5a), SCREENSHOT, kb(0x76), META_N),
    block(kb(0x97), META_P, kb(0x96), START_RECORDING),
    block(pad(0x11), NONE, pad(0x12), NONE),
    block(kb(0x8e), kb(0x8e), kb(0x8f), kb(0x8f)),
    block(combo(&[0x88, 0x0d]), NONE, mouse(0x02), NONE),
];

/// Factory layout of `mode`.
#[must_use]
pub fn preset(mode: Mode) -> &'static [MappingBlock; PRESET_BLOCKS] {
    match mode {
        Mode::Game | Mode::Mouse => &GAME_PRESET,
        Mode::Wasd => &WASD_PRESET,
    }
}

/// Factory block of one button pair in `mode`.
#[must_use]
pub fn preset_block(mode: Mode, pair: ButtonPair) -> MappingBlock {
    preset(mode)[pair.index()]
}
