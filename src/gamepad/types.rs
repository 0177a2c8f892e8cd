//! # Gamepad Identifiers
//!
//! Modes, button pairs, sides and axes as they appear on the wire.

use serde::Deserialize;

use crate::error::ValidationError;

/// Operating mode of the gamepad MCU.
///
/// The wire value starts at 1; tables are indexed with `value - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Game = 0x01,
    Wasd = 0x02,
    Mouse = 0x03,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Game, Mode::Wasd, Mode::Mouse];

    #[must_use]
    pub fn wire(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize - 1
    }

    /// Parses the wire value (1..=3).
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Mode::Game),
            0x02 => Some(Mode::Wasd),
            0x03 => Some(Mode::Mouse),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Mode::Game => "game",
            Mode::Wasd => "wasd",
            Mode::Mouse => "mouse",
        }
    }
}

/// Physical buttons are configured two at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonPair {
    DpadUpDown = 0x01,
    DpadLeftRight = 0x02,
    StickClicks = 0x03,
    Bumpers = 0x04,
    AB = 0x05,
    XY = 0x06,
    ViewMenu = 0x07,
    M1M2 = 0x08,
    Triggers = 0x09,
}

impl ButtonPair {
    pub const ALL: [ButtonPair; 9] = [
        ButtonPair::DpadUpDown,
        ButtonPair::DpadLeftRight,
        ButtonPair::StickClicks,
        ButtonPair::Bumpers,
        ButtonPair::AB,
        ButtonPair::XY,
        ButtonPair::ViewMenu,
        ButtonPair::M1M2,
        ButtonPair::Triggers,
    ];

    #[must_use]
    pub fn wire(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value).checked_sub(1)?).copied()
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ButtonPair::DpadUpDown => "dpad_u_d",
            ButtonPair::DpadLeftRight => "dpad_l_r",
            ButtonPair::StickClicks => "ls_rs",
            ButtonPair::Bumpers => "lb_rb",
            ButtonPair::AB => "a_b",
            ButtonPair::XY => "x_y",
            ButtonPair::ViewMenu => "view_menu",
            ButtonPair::M1M2 => "m1_m2",
            ButtonPair::Triggers => "lt_rt",
        }
    }

    /// Name of the physical button on one side of the pair.
    #[must_use]
    pub fn button_name(self, side: Side) -> &'static str {
        let (left, right) = match self {
            ButtonPair::DpadUpDown => ("dpad_up", "dpad_down"),
            ButtonPair::DpadLeftRight => ("dpad_left", "dpad_right"),
            ButtonPair::StickClicks => ("l3", "r3"),
            ButtonPair::Bumpers => ("lb", "rb"),
            ButtonPair::AB => ("a", "b"),
            ButtonPair::XY => ("x", "y"),
            ButtonPair::ViewMenu => ("view", "menu"),
            ButtonPair::M1M2 => ("m1", "m2"),
            ButtonPair::Triggers => ("lt", "rt"),
        };
        match side {
            Side::Left => left,
            Side::Right => right,
        }
    }

    /// Finds the pair and side of a physical button, case-insensitively.
    pub fn from_button_name(name: &str) -> Option<(ButtonPair, Side)> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .flat_map(|pair| Side::ALL.map(|side| (pair, side)))
            .find(|&(pair, side)| pair.button_name(side) == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left = 0x00,
    Right = 0x01,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Selector byte used by the response curve command (1 left, 2 right).
    #[must_use]
    pub fn curve_selector(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_curve_selector(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Side::Left),
            0x02 => Some(Side::Right),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Analog axes. Sticks are 1 and 2, triggers 3 and 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    XyLeft = 0x01,
    XyRight = 0x02,
    ZLeft = 0x03,
    ZRight = 0x04,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::XyLeft, Axis::XyRight, Axis::ZLeft, Axis::ZRight];

    #[must_use]
    pub fn wire(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize - 1
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value).checked_sub(1)?).copied()
    }

    /// Trigger axes live in the second deadzone group.
    #[must_use]
    pub fn is_trigger(self) -> bool {
        self as u8 > Axis::XyRight as u8
    }

    #[must_use]
    pub fn side(self) -> Side {
        match self {
            Axis::XyLeft | Axis::ZLeft => Side::Left,
            Axis::XyRight | Axis::ZRight => Side::Right,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Axis::XyLeft => "xy_left",
            Axis::XyRight => "xy_right",
            Axis::ZLeft => "z_left",
            Axis::ZRight => "z_right",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.name() == name)
    }
}

/// Which of the two actions of a button is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Primary,
    Macro,
}

/// Parses an integer attribute value into `min..=max`.
pub(crate) fn parse_ranged(
    field: &'static str,
    input: &str,
    min: i64,
    max: i64,
) -> Result<i64, ValidationError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| ValidationError::Malformed {
            field,
            input: input.to_string(),
        })?;
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Parses exactly `N` whitespace-separated integers, each within `min..=max`.
pub(crate) fn parse_ranged_list<const N: usize>(
    field: &'static str,
    input: &str,
    min: i64,
    max: i64,
) -> Result<[i64; N], ValidationError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != N {
        return Err(ValidationError::Malformed {
            field,
            input: input.to_string(),
        });
    }
    let mut values = [0i64; N];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = parse_ranged(field, part, min, max)?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_index_is_wire_minus_one() {
        for mode in Mode::ALL {
            assert_eq!(mode.index(), mode.wire() as usize - 1);
            assert_eq!(Mode::from_wire(mode.wire()), Some(mode));
        }
        assert_eq!(Mode::from_wire(0), None);
        assert_eq!(Mode::from_wire(4), None);
    }

    #[test]
    fn test_button_pair_wire_ids() {
        assert_eq!(ButtonPair::DpadUpDown.wire(), 0x01);
        assert_eq!(ButtonPair::Triggers.wire(), 0x09);
        assert_eq!(ButtonPair::from_wire(5), Some(ButtonPair::AB));
        assert_eq!(ButtonPair::from_wire(0), None);
        assert_eq!(ButtonPair::from_wire(10), None);
    }

    #[test]
    fn test_button_lookup() {
        assert_eq!(
            ButtonPair::from_button_name("A"),
            Some((ButtonPair::AB, Side::Left))
        );
        assert_eq!(
            ButtonPair::from_button_name("dpad_down"),
            Some((ButtonPair::DpadUpDown, Side::Right))
        );
        assert_eq!(
            ButtonPair::from_button_name("rt"),
            Some((ButtonPair::Triggers, Side::Right))
        );
        assert_eq!(ButtonPair::from_button_name("start"), None);
        for pair in ButtonPair::ALL {
            for side in Side::ALL {
                assert_eq!(
                    ButtonPair::from_button_name(pair.button_name(side)),
                    Some((pair, side))
                );
            }
        }
    }

    #[test]
    fn test_axis_groups() {
        assert!(!Axis::XyLeft.is_trigger());
        assert!(!Axis::XyRight.is_trigger());
        assert!(Axis::ZLeft.is_trigger());
        assert!(Axis::ZRight.is_trigger());
        assert_eq!(Axis::ZRight.side(), Side::Right);
        assert_eq!(Axis::XyLeft.side(), Side::Left);
    }

    #[test]
    fn test_curve_selector() {
        assert_eq!(Side::Left.curve_selector(), 1);
        assert_eq!(Side::Right.curve_selector(), 2);
        assert_eq!(Side::from_curve_selector(2), Some(Side::Right));
        assert_eq!(Side::from_curve_selector(0), None);
    }

    #[test]
    fn test_parse_ranged_list() {
        assert_eq!(parse_ranged_list::<2>("dz", "5 10", 0, 255).unwrap(), [5, 10]);
        assert_eq!(parse_ranged_list::<2>("dz", "  0\t255\n", 0, 255).unwrap(), [0, 255]);
        assert!(matches!(
            parse_ranged_list::<2>("dz", "5", 0, 255),
            Err(ValidationError::Malformed { .. })
        ));
        assert!(matches!(
            parse_ranged_list::<2>("dz", "5 256", 0, 255),
            Err(ValidationError::OutOfRange { value: 256, .. })
        ));
        assert!(matches!(
            parse_ranged_list::<2>("dz", "a b", 0, 255),
            Err(ValidationError::Malformed { .. })
        ));
    }
}
