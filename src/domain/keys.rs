//! Trigger keys and physical key classification
//!
//! Keys are identified by hardware scan code plus the extended-key flag, so
//! the left/right distinction holds regardless of keyboard layout.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Which half of the keyboard a key sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySide {
    Left,
    Right,
}

/// Physical key as reported by the low-level keyboard hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalKey {
    LeftCtrl,
    RightCtrl,
    LeftShift,
    RightShift,
    LeftAlt,
    RightAlt,
    LeftWin,
    RightWin,
    Escape,
    Other,
}

impl PhysicalKey {
    const SCAN_ESCAPE: u32 = 0x01;
    const SCAN_CTRL: u32 = 0x1D;
    const SCAN_LEFT_SHIFT: u32 = 0x2A;
    const SCAN_RIGHT_SHIFT: u32 = 0x36;
    const SCAN_ALT: u32 = 0x38;
    const SCAN_LEFT_WIN: u32 = 0x5B;
    const SCAN_RIGHT_WIN: u32 = 0x5C;

    /// Classifies a scan code and its extended flag
    pub fn from_scan_code(scan_code: u32, extended: bool) -> Self {
        match (scan_code, extended) {
            (Self::SCAN_ESCAPE, false) => PhysicalKey::Escape,
            (Self::SCAN_CTRL, false) => PhysicalKey::LeftCtrl,
            (Self::SCAN_CTRL, true) => PhysicalKey::RightCtrl,
            (Self::SCAN_ALT, false) => PhysicalKey::LeftAlt,
            (Self::SCAN_ALT, true) => PhysicalKey::RightAlt,
            // Extended 0x2A is the fake shift some drivers inject around
            // navigation keys, not a real key press
            (Self::SCAN_LEFT_SHIFT, false) => PhysicalKey::LeftShift,
            (Self::SCAN_RIGHT_SHIFT, _) => PhysicalKey::RightShift,
            (Self::SCAN_LEFT_WIN, _) => PhysicalKey::LeftWin,
            (Self::SCAN_RIGHT_WIN, _) => PhysicalKey::RightWin,
            _ => PhysicalKey::Other,
        }
    }

    pub fn side(self) -> Option<KeySide> {
        match self {
            PhysicalKey::LeftCtrl
            | PhysicalKey::LeftShift
            | PhysicalKey::LeftAlt
            | PhysicalKey::LeftWin => Some(KeySide::Left),
            PhysicalKey::RightCtrl
            | PhysicalKey::RightShift
            | PhysicalKey::RightAlt
            | PhysicalKey::RightWin => Some(KeySide::Right),
            PhysicalKey::Escape | PhysicalKey::Other => None,
        }
    }
}

/// Key whose double-tap opens the informational panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TriggerKey {
    LeftCtrl = 0,
    RightCtrl = 1,
    #[default]
    LeftShift = 2,
    RightShift = 3,
    LeftAlt = 4,
    RightAlt = 5,
    LeftWin = 6,
    RightWin = 7,
    Ctrl = 8,
    Shift = 9,
    Alt = 10,
}

impl TriggerKey {
    pub const ALL: [TriggerKey; 11] = [
        TriggerKey::LeftCtrl,
        TriggerKey::RightCtrl,
        TriggerKey::LeftShift,
        TriggerKey::RightShift,
        TriggerKey::LeftAlt,
        TriggerKey::RightAlt,
        TriggerKey::LeftWin,
        TriggerKey::RightWin,
        TriggerKey::Ctrl,
        TriggerKey::Shift,
        TriggerKey::Alt,
    ];

    /// Compact encoding for atomic storage
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    /// True if `key` is this trigger; either-side variants accept both keys
    pub fn matches(self, key: PhysicalKey) -> bool {
        use PhysicalKey as P;

        match self {
            TriggerKey::LeftCtrl => key == P::LeftCtrl,
            TriggerKey::RightCtrl => key == P::RightCtrl,
            TriggerKey::LeftShift => key == P::LeftShift,
            TriggerKey::RightShift => key == P::RightShift,
            TriggerKey::LeftAlt => key == P::LeftAlt,
            TriggerKey::RightAlt => key == P::RightAlt,
            TriggerKey::LeftWin => key == P::LeftWin,
            TriggerKey::RightWin => key == P::RightWin,
            TriggerKey::Ctrl => matches!(key, P::LeftCtrl | P::RightCtrl),
            TriggerKey::Shift => matches!(key, P::LeftShift | P::RightShift),
            TriggerKey::Alt => matches!(key, P::LeftAlt | P::RightAlt),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TriggerKey::LeftCtrl => "left-ctrl",
            TriggerKey::RightCtrl => "right-ctrl",
            TriggerKey::LeftShift => "left-shift",
            TriggerKey::RightShift => "right-shift",
            TriggerKey::LeftAlt => "left-alt",
            TriggerKey::RightAlt => "right-alt",
            TriggerKey::LeftWin => "left-win",
            TriggerKey::RightWin => "right-win",
            TriggerKey::Ctrl => "ctrl",
            TriggerKey::Shift => "shift",
            TriggerKey::Alt => "alt",
        }
    }
}

impl fmt::Display for TriggerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown trigger key `{0}`")]
pub struct ParseKeyError(pub String);

impl FromStr for TriggerKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        TriggerKey::ALL
            .into_iter()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ParseKeyError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_code_classification() {
        assert_eq!(PhysicalKey::from_scan_code(0x1D, false), PhysicalKey::LeftCtrl);
        assert_eq!(PhysicalKey::from_scan_code(0x1D, true), PhysicalKey::RightCtrl);
        assert_eq!(PhysicalKey::from_scan_code(0x38, false), PhysicalKey::LeftAlt);
        assert_eq!(PhysicalKey::from_scan_code(0x38, true), PhysicalKey::RightAlt);
        assert_eq!(PhysicalKey::from_scan_code(0x2A, false), PhysicalKey::LeftShift);
        assert_eq!(PhysicalKey::from_scan_code(0x36, false), PhysicalKey::RightShift);
        assert_eq!(PhysicalKey::from_scan_code(0x5B, true), PhysicalKey::LeftWin);
        assert_eq!(PhysicalKey::from_scan_code(0x5C, true), PhysicalKey::RightWin);
        assert_eq!(PhysicalKey::from_scan_code(0x01, false), PhysicalKey::Escape);
        assert_eq!(PhysicalKey::from_scan_code(0x1E, false), PhysicalKey::Other);
    }

    #[test]
    fn fake_shift_is_ignored() {
        assert_eq!(PhysicalKey::from_scan_code(0x2A, true), PhysicalKey::Other);
    }

    #[test]
    fn sides() {
        assert_eq!(PhysicalKey::RightAlt.side(), Some(KeySide::Right));
        assert_eq!(PhysicalKey::LeftWin.side(), Some(KeySide::Left));
        assert_eq!(PhysicalKey::Escape.side(), None);
    }

    #[test]
    fn either_side_variants_match_both_keys() {
        assert!(TriggerKey::Alt.matches(PhysicalKey::LeftAlt));
        assert!(TriggerKey::Alt.matches(PhysicalKey::RightAlt));
        assert!(!TriggerKey::Alt.matches(PhysicalKey::LeftCtrl));
        assert!(TriggerKey::Shift.matches(PhysicalKey::RightShift));
        assert!(TriggerKey::Ctrl.matches(PhysicalKey::RightCtrl));
    }

    #[test]
    fn sided_variants_match_one_key() {
        assert!(TriggerKey::LeftShift.matches(PhysicalKey::LeftShift));
        assert!(!TriggerKey::LeftShift.matches(PhysicalKey::RightShift));
        assert!(!TriggerKey::RightWin.matches(PhysicalKey::LeftWin));
    }

    #[test]
    fn u8_encoding_covers_every_key() {
        for key in TriggerKey::ALL {
            assert_eq!(TriggerKey::from_u8(key.as_u8()), Some(key));
        }
        assert_eq!(TriggerKey::from_u8(200), None);
    }

    #[test]
    fn names_parse() {
        assert_eq!("left-shift".parse::<TriggerKey>(), Ok(TriggerKey::LeftShift));
        assert_eq!("RIGHT_ALT".parse::<TriggerKey>(), Ok(TriggerKey::RightAlt));
        assert!("hyper".parse::<TriggerKey>().is_err());
    }
}
