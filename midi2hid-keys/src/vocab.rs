//! Fixed key vocabularies
//!
//! Modifier and named-key tables accepted in key specs. Both are plain
//! immutable slices; lookups are a linear scan, the tables are small.

/// HID modifier bitmask constants (first byte of a boot keyboard report).
///
/// Bit positions follow usages 0xE0-0xE7: the low nibble is the left-hand
/// modifiers, the high nibble the right-hand ones.
pub mod mods {
    pub const LCTRL: u8 = 0x01;
    pub const LSHIFT: u8 = 0x02;
    pub const LALT: u8 = 0x04;
    pub const LMETA: u8 = 0x08;
    pub const RCTRL: u8 = 0x10;
    pub const RSHIFT: u8 = 0x20;
    pub const RALT: u8 = 0x40;
    pub const RMETA: u8 = 0x80;
}

/// Modifier tokens and the bit each one sets.
pub const MODIFIERS: &[(&str, u8)] = &[
    ("--left-ctrl", mods::LCTRL),
    ("--right-ctrl", mods::RCTRL),
    ("--left-shift", mods::LSHIFT),
    ("--right-shift", mods::RSHIFT),
    ("--left-alt", mods::LALT),
    ("--right-alt", mods::RALT),
    ("--left-meta", mods::LMETA),
    ("--right-meta", mods::RMETA),
];

/// Named special keys and their HID usage codes.
pub const SPECIAL_KEYS: &[(&str, u8)] = &[
    ("--return", 0x28),
    ("--esc", 0x29),
    ("--bckspc", 0x2a),
    ("--tab", 0x2b),
    ("--spacebar", 0x2c),
    ("--caps-lock", 0x39),
    ("--f1", 0x3a),
    ("--f2", 0x3b),
    ("--f3", 0x3c),
    ("--f4", 0x3d),
    ("--f5", 0x3e),
    ("--f6", 0x3f),
    ("--f7", 0x40),
    ("--f8", 0x41),
    ("--f9", 0x42),
    ("--f10", 0x43),
    ("--f11", 0x44),
    ("--f12", 0x45),
    ("--insert", 0x49),
    ("--home", 0x4a),
    ("--pageup", 0x4b),
    ("--del", 0x4c),
    ("--end", 0x4d),
    ("--pagedown", 0x4e),
    ("--right", 0x4f),
    ("--left", 0x50),
    ("--down", 0x51),
    ("--up", 0x52),
    ("--num-lock", 0x53),
    ("--kp-enter", 0x58),
];

/// First HID usage of the letter block (`a`).
pub const LETTER_BASE: u8 = 0x04;
/// First HID usage of the digit block (`1`).
pub const DIGIT_BASE: u8 = 0x1e;
/// Digit `0` sits after `9`, not before `1`.
pub const DIGIT_ZERO: u8 = 0x27;

/// Look up the modifier bit for a token.
pub fn modifier_bit(token: &str) -> Option<u8> {
    lookup(MODIFIERS, token)
}

/// Look up a named special key.
pub fn special_key(token: &str) -> Option<u8> {
    lookup(SPECIAL_KEYS, token)
}

/// Map a single-character token (`a`-`z`, `0`-`9`) to its keycode.
pub fn char_key(token: &str) -> Option<u8> {
    let &[ch] = token.as_bytes() else {
        return None;
    };
    match ch {
        b'a'..=b'z' => Some(LETTER_BASE + (ch - b'a')),
        b'1'..=b'9' => Some(DIGIT_BASE + (ch - b'1')),
        b'0' => Some(DIGIT_ZERO),
        _ => None,
    }
}

fn lookup(table: &[(&str, u8)], token: &str) -> Option<u8> {
    table
        .iter()
        .find(|(name, _)| *name == token)
        .map(|&(_, code)| code)
}

/// Human-readable name of a keycode, for logs.
pub fn key_name(code: u8) -> &'static str {
    const LETTERS: [&str; 26] = [
        "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
        "S", "T", "U", "V", "W", "X", "Y", "Z",
    ];
    const DIGITS: [&str; 10] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "0"];
    const FKEYS: [&str; 12] = [
        "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
    ];

    match code {
        0x00 => "None",
        0x04..=0x1d => LETTERS[(code - LETTER_BASE) as usize],
        0x1e..=0x27 => DIGITS[(code - DIGIT_BASE) as usize],
        0x28 => "Enter",
        0x29 => "Escape",
        0x2a => "Backspace",
        0x2b => "Tab",
        0x2c => "Space",
        0x39 => "CapsLock",
        0x3a..=0x45 => FKEYS[(code - 0x3a) as usize],
        0x49 => "Insert",
        0x4a => "Home",
        0x4b => "PageUp",
        0x4c => "Delete",
        0x4d => "End",
        0x4e => "PageDown",
        0x4f => "Right",
        0x50 => "Left",
        0x51 => "Down",
        0x52 => "Up",
        0x53 => "NumLock",
        0x58 => "KPEnter",
        _ => "?",
    }
}
