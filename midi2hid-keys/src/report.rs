//! Boot-protocol keyboard report
//!
//! Wire layout (8 bytes):
//!
//! ```text
//! [modifiers, reserved=0, key0, key1, key2, key3, key4, key5]
//! ```
//!
//! Empty key slots are 0 and a keycode never occupies two slots. The all-zero
//! report is the canonical "all keys released" frame.

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Size of a report on the wire.
pub const REPORT_LEN: usize = 8;
/// Simultaneous keycodes a boot keyboard report can carry.
pub const MAX_KEYS: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct HidReport {
    modifiers: u8,
    _reserved: u8,
    keys: [u8; MAX_KEYS],
}

impl HidReport {
    /// The all-zero release frame.
    pub const fn release() -> Self {
        Self {
            modifiers: 0,
            _reserved: 0,
            keys: [0; MAX_KEYS],
        }
    }

    /// Decode a report from its wire bytes.
    ///
    /// The reserved byte is forced to 0 and duplicate keycodes are dropped so
    /// the returned report always upholds the slot invariants.
    pub fn from_bytes(bytes: [u8; REPORT_LEN]) -> Self {
        let mut report = Self::release();
        report.modifiers = bytes[0];
        for &code in &bytes[2..] {
            report.push_key(code);
        }
        report
    }

    pub fn modifiers(&self) -> u8 {
        self.modifiers
    }

    /// OR modifier bits into the report.
    pub fn add_modifiers(&mut self, bits: u8) {
        self.modifiers |= bits;
    }

    /// Occupied key slots, in slot order.
    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.keys.iter().copied().take_while(|&code| code != 0)
    }

    pub fn key_count(&self) -> usize {
        self.keys().count()
    }

    pub fn is_full(&self) -> bool {
        self.keys[MAX_KEYS - 1] != 0
    }

    pub fn contains(&self, code: u8) -> bool {
        code != 0 && self.keys.contains(&code)
    }

    /// Place a keycode in the next free slot.
    ///
    /// Returns `false` (and leaves the report unchanged) for keycode 0, a
    /// keycode already present, or a full report.
    pub fn push_key(&mut self, code: u8) -> bool {
        if code == 0 || self.contains(code) {
            return false;
        }
        match self.keys.iter_mut().find(|slot| **slot == 0) {
            Some(slot) => {
                *slot = code;
                true
            }
            None => false,
        }
    }

    /// True for the all-zero release frame.
    pub fn is_release(&self) -> bool {
        *self == Self::release()
    }

    /// Wire bytes, ready for a single 8-byte write.
    pub fn to_bytes(&self) -> [u8; REPORT_LEN] {
        let mut out = [0u8; REPORT_LEN];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

impl fmt::Display for HidReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
