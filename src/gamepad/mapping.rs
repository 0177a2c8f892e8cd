//! # Button Mapping
//!
//! Per-mode button bindings and the mode-independent turbo table.
//!
//! Every (mode, pair) block tracks whether it changed since it was last
//! written to the device, so a mode switch only has to push what moved.

use crate::error::ValidationError;
use crate::gamepad::types::{ButtonPair, Mode, Side, Slot};
use crate::hid::actions::ActionCode;
use crate::hid::layout::{TURBO_MAX_INTERVAL, TURBO_SLOTS};
use crate::hid::presets::{self, PRESET_BLOCKS};
use crate::hid::protocol::{MappingBlock, TurboBlock};

/// Repeat interval used when turbo is switched on without one
pub const DEFAULT_TURBO_INTERVAL: u8 = 1;

const MODES: usize = Mode::ALL.len();

/// Bindings of every button pair in every mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    blocks: [[MappingBlock; PRESET_BLOCKS]; MODES],
    dirty: [[bool; PRESET_BLOCKS]; MODES],
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::from_presets()
    }
}

impl MappingTable {
    /// Table seeded with the factory layout of every mode.
    ///
    /// Nothing has been written to the device yet, so every block starts
    /// dirty.
    #[must_use]
    pub fn from_presets() -> Self {
        let mut blocks = [[MappingBlock::default(); PRESET_BLOCKS]; MODES];
        for mode in Mode::ALL {
            blocks[mode.index()] = *presets::preset(mode);
        }
        Self {
            blocks,
            dirty: [[true; PRESET_BLOCKS]; MODES],
        }
    }

    #[must_use]
    pub fn block(&self, mode: Mode, pair: ButtonPair) -> &MappingBlock {
        &self.blocks[mode.index()][pair.index()]
    }

    #[must_use]
    pub fn action(&self, mode: Mode, pair: ButtonPair, side: Side, slot: Slot) -> ActionCode {
        let binding = self.block(mode, pair).side(side);
        match slot {
            Slot::Primary => binding.primary,
            Slot::Macro => binding.macro_action,
        }
    }

    /// Canonical name of a stored action.
    #[must_use]
    pub fn binding_name(&self, mode: Mode, pair: ButtonPair, side: Side, slot: Slot) -> String {
        self.action(mode, pair, side, slot).to_string()
    }

    /// Stores an action by name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownAction`] (or `InvalidCombo`) without
    /// touching the table when the name does not resolve.
    pub fn set_binding(
        &mut self,
        mode: Mode,
        pair: ButtonPair,
        side: Side,
        slot: Slot,
        name: &str,
    ) -> Result<ActionCode, ValidationError> {
        let action = ActionCode::from_name(name)?;
        self.set_action(mode, pair, side, slot, action);
        Ok(action)
    }

    pub fn set_action(
        &mut self,
        mode: Mode,
        pair: ButtonPair,
        side: Side,
        slot: Slot,
        action: ActionCode,
    ) {
        let binding = self.blocks[mode.index()][pair.index()].side_mut(side);
        match slot {
            Slot::Primary => binding.primary = action,
            Slot::Macro => binding.macro_action = action,
        }
        self.dirty[mode.index()][pair.index()] = true;
    }

    /// Reloads the factory layout of `mode` and marks every pair dirty.
    pub fn load_preset(&mut self, mode: Mode) {
        self.blocks[mode.index()] = *presets::preset(mode);
        self.dirty[mode.index()] = [true; PRESET_BLOCKS];
    }

    #[must_use]
    pub fn is_dirty(&self, mode: Mode, pair: ButtonPair) -> bool {
        self.dirty[mode.index()][pair.index()]
    }

    /// Pairs of `mode` changed since they were last written.
    #[must_use]
    pub fn dirty_pairs(&self, mode: Mode) -> Vec<ButtonPair> {
        ButtonPair::ALL
            .into_iter()
            .filter(|&pair| self.is_dirty(mode, pair))
            .collect()
    }

    pub fn mark_clean(&mut self, mode: Mode, pair: ButtonPair) {
        self.dirty[mode.index()][pair.index()] = false;
    }
}

/// Turbo repeat intervals, shared by all modes.
///
/// Slot `n` belongs to pair `n / 2 + 1`, side `n % 2`. The trigger pair has
/// no slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurboTable {
    intervals: [u8; TURBO_SLOTS],
}

impl TurboTable {
    /// Slot index of a button.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TurboUnsupported`] for the trigger pair.
    pub fn slot(pair: ButtonPair, side: Side) -> Result<usize, ValidationError> {
        let slot = pair.index() * 2 + side.index();
        if slot >= TURBO_SLOTS {
            return Err(ValidationError::TurboUnsupported(pair.name()));
        }
        Ok(slot)
    }

    pub fn interval(&self, pair: ButtonPair, side: Side) -> Result<u8, ValidationError> {
        Ok(self.intervals[Self::slot(pair, side)?])
    }

    pub fn is_enabled(&self, pair: ButtonPair, side: Side) -> Result<bool, ValidationError> {
        Ok(self.interval(pair, side)? != 0)
    }

    /// Sets the repeat interval of a button; 0 turns turbo off.
    pub fn set_interval(
        &mut self,
        pair: ButtonPair,
        side: Side,
        interval: u8,
    ) -> Result<(), ValidationError> {
        if u16::from(interval) > TURBO_MAX_INTERVAL {
            return Err(ValidationError::OutOfRange {
                field: "turbo interval",
                value: i64::from(interval),
                min: 0,
                max: i64::from(TURBO_MAX_INTERVAL),
            });
        }
        let slot = Self::slot(pair, side)?;
        self.intervals[slot] = interval;
        Ok(())
    }

    /// Switches turbo on (with the default interval) or off.
    pub fn set_turbo(
        &mut self,
        pair: ButtonPair,
        side: Side,
        enabled: bool,
    ) -> Result<(), ValidationError> {
        let interval = if enabled { DEFAULT_TURBO_INTERVAL } else { 0 };
        self.set_interval(pair, side, interval)
    }

    #[must_use]
    pub fn to_block(&self) -> TurboBlock {
        TurboBlock {
            intervals: self.intervals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Table as it stands once every block was written.
    fn written_table() -> MappingTable {
        let mut table = MappingTable::from_presets();
        for mode in Mode::ALL {
            for pair in ButtonPair::ALL {
                table.mark_clean(mode, pair);
            }
        }
        table
    }

    #[test]
    fn test_from_presets_is_unwritten() {
        let table = MappingTable::from_presets();
        for mode in Mode::ALL {
            assert_eq!(table.dirty_pairs(mode), ButtonPair::ALL.to_vec());
        }
        assert_eq!(
            table.binding_name(Mode::Wasd, ButtonPair::DpadUpDown, Side::Left, Slot::Primary),
            "kb_up_arrow"
        );
    }

    #[test]
    fn test_set_binding_marks_only_that_block_dirty() {
        let mut table = written_table();
        let action = table
            .set_binding(Mode::Wasd, ButtonPair::AB, Side::Left, Slot::Primary, "KB_W")
            .unwrap();
        assert_eq!(action, ActionCode::Keyboard(0x1d));
        assert_eq!(table.dirty_pairs(Mode::Wasd), vec![ButtonPair::AB]);
        assert!(table.dirty_pairs(Mode::Game).is_empty());
        assert_eq!(
            table.binding_name(Mode::Wasd, ButtonPair::AB, Side::Left, Slot::Primary),
            "kb_w"
        );

        table.mark_clean(Mode::Wasd, ButtonPair::AB);
        assert!(!table.is_dirty(Mode::Wasd, ButtonPair::AB));
    }

    #[test]
    fn test_unknown_action_leaves_table_unchanged() {
        let mut table = MappingTable::from_presets();
        let before = table.clone();
        let err = table
            .set_binding(Mode::Game, ButtonPair::XY, Side::Right, Slot::Macro, "kb_nope")
            .unwrap_err();
        assert_eq!(err, ValidationError::UnknownAction("kb_nope".to_string()));
        assert_eq!(table, before);
    }

    #[test]
    fn test_load_preset_marks_all_dirty() {
        let mut table = written_table();
        table.set_action(
            Mode::Game,
            ButtonPair::AB,
            Side::Left,
            Slot::Primary,
            ActionCode::Pad(0x02),
        );
        table.load_preset(Mode::Game);
        assert_eq!(table.dirty_pairs(Mode::Game).len(), PRESET_BLOCKS);
        assert_eq!(
            table.action(Mode::Game, ButtonPair::AB, Side::Left, Slot::Primary),
            ActionCode::Pad(0x01)
        );
    }

    #[test]
    fn test_turbo_slots() {
        assert_eq!(TurboTable::slot(ButtonPair::DpadUpDown, Side::Left).unwrap(), 0);
        assert_eq!(TurboTable::slot(ButtonPair::AB, Side::Right).unwrap(), 9);
        assert_eq!(TurboTable::slot(ButtonPair::M1M2, Side::Right).unwrap(), 15);
        assert_eq!(
            TurboTable::slot(ButtonPair::Triggers, Side::Left),
            Err(ValidationError::TurboUnsupported("lt_rt"))
        );
    }

    #[test]
    fn test_turbo_isolation() {
        let mut turbo = TurboTable::default();
        turbo.set_turbo(ButtonPair::AB, Side::Left, true).unwrap();

        for pair in ButtonPair::ALL.into_iter().filter(|&p| p != ButtonPair::Triggers) {
            for side in Side::ALL {
                let expected = pair == ButtonPair::AB && side == Side::Left;
                assert_eq!(turbo.is_enabled(pair, side).unwrap(), expected);
            }
        }

        let block = turbo.to_block();
        assert_eq!(block.intervals[8], DEFAULT_TURBO_INTERVAL);
        assert_eq!(block.intervals.iter().filter(|&&i| i != 0).count(), 1);
    }

    #[test]
    fn test_turbo_interval_range() {
        let mut turbo = TurboTable::default();
        turbo.set_interval(ButtonPair::XY, Side::Right, 16).unwrap();
        assert_eq!(turbo.interval(ButtonPair::XY, Side::Right).unwrap(), 16);
        assert!(matches!(
            turbo.set_interval(ButtonPair::XY, Side::Right, 17),
            Err(ValidationError::OutOfRange { value: 17, .. })
        ));
        assert_eq!(turbo.interval(ButtonPair::XY, Side::Right).unwrap(), 16);
    }
}
