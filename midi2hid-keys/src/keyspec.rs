//! Key spec compiler
//!
//! A key spec is a whitespace-separated list of tokens. Each token is one of:
//!
//! ```text
//! --left-ctrl … --right-meta   modifier, ORed into the modifier mask
//! --spacebar, --f1, --up, …    named special key
//! a … z                        letter, 0x04 + offset
//! 1 … 9                        digit, 0x1e + offset
//! 0                            digit zero, 0x27
//! ```
//!
//! Anything else is an unknown option: it is logged and contributes nothing.
//! Compilation never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::report::HidReport;
use crate::vocab;

/// One classified token of a key spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyToken<'a> {
    Modifier(u8),
    Key(u8),
    Unrecognized(&'a str),
}

impl<'a> KeyToken<'a> {
    /// Classify a token. Modifiers are tested first, so a token is never
    /// both a modifier and a key.
    pub fn classify(token: &'a str) -> Self {
        if let Some(bit) = vocab::modifier_bit(token) {
            return KeyToken::Modifier(bit);
        }
        if let Some(code) = vocab::special_key(token) {
            return KeyToken::Key(code);
        }
        match vocab::char_key(token) {
            Some(code) => KeyToken::Key(code),
            None => KeyToken::Unrecognized(token),
        }
    }
}

/// Non-fatal problems found while compiling a spec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeySpecIssue {
    #[error("unknown option: {0}")]
    Unrecognized(String),

    #[error("too many keys, dropped: {0}")]
    Overflow(String),
}

/// Binary form of a key spec: modifier mask plus one keycode (0 = none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompiledKey {
    pub modifiers: u8,
    pub keycode: u8,
}

impl CompiledKey {
    /// Report pressing just this key.
    pub fn to_report(self) -> HidReport {
        let mut report = HidReport::release();
        report.add_modifiers(self.modifiers);
        report.push_key(self.keycode);
        report
    }
}

/// Textual description of one key action, e.g. `"--left-shift a"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySpec(String);

impl KeySpec {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tokens(&self) -> impl Iterator<Item = KeyToken<'_>> {
        self.0.split_whitespace().map(KeyToken::classify)
    }

    /// Single-key compilation, as used for note mappings.
    ///
    /// Modifiers are accumulated; only the first resolved keycode is kept.
    pub fn compile(&self) -> CompiledKey {
        let mut compiled = CompiledKey::default();
        for token in self.tokens() {
            match token {
                KeyToken::Modifier(bit) => compiled.modifiers |= bit,
                KeyToken::Key(code) if compiled.keycode == 0 => compiled.keycode = code,
                KeyToken::Key(code) => {
                    debug!(spec = %self, "ignoring extra key {:#04x}", code);
                }
                KeyToken::Unrecognized(tok) => {
                    warn!(spec = %self, "{}", KeySpecIssue::Unrecognized(tok.to_string()));
                }
            }
        }
        compiled
    }

    /// Multi-key compilation into a full report.
    ///
    /// Up to six distinct keycodes fill the slots in token order; repeats
    /// are skipped and further keys are dropped with an overflow diagnostic.
    pub fn compile_report(&self) -> HidReport {
        let (report, issues) = self.compile_report_checked();
        for issue in &issues {
            warn!(spec = %self, "{issue}");
        }
        report
    }

    /// Problems [`compile_report`](Self::compile_report) would log, without
    /// logging them.
    pub fn issues(&self) -> Vec<KeySpecIssue> {
        self.compile_report_checked().1
    }

    fn compile_report_checked(&self) -> (HidReport, Vec<KeySpecIssue>) {
        let mut report = HidReport::release();
        let mut issues = Vec::new();

        for (raw, token) in self.0.split_whitespace().zip(self.tokens()) {
            match token {
                KeyToken::Modifier(bit) => report.add_modifiers(bit),
                KeyToken::Key(code) if report.contains(code) => {
                    debug!(spec = %self, "duplicate key {raw} in spec");
                }
                KeyToken::Key(_) if report.is_full() => {
                    issues.push(KeySpecIssue::Overflow(raw.to_string()));
                }
                KeyToken::Key(code) => {
                    report.push_key(code);
                }
                KeyToken::Unrecognized(tok) => {
                    issues.push(KeySpecIssue::Unrecognized(tok.to_string()));
                }
            }
        }

        (report, issues)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeySpec {
    fn from(spec: &str) -> Self {
        Self::new(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{mods, MODIFIERS};

    fn compile(spec: &str) -> CompiledKey {
        KeySpec::from(spec).compile()
    }

    #[test]
    fn test_letters_and_digits() {
        for (i, ch) in ('a'..='z').enumerate() {
            let key = compile(&ch.to_string());
            assert_eq!(key.keycode, 0x04 + i as u8, "letter {ch}");
            assert_eq!(key.modifiers, 0);
        }
        for (i, ch) in ('1'..='9').enumerate() {
            assert_eq!(compile(&ch.to_string()).keycode, 0x1e + i as u8, "digit {ch}");
        }
        assert_eq!(compile("0").keycode, 0x27);
    }

    #[test]
    fn test_each_modifier_alone() {
        for &(name, bit) in MODIFIERS {
            let key = compile(name);
            assert_eq!(key.modifiers, bit, "{name}");
            assert_eq!(key.keycode, 0, "{name} must not produce a keycode");
        }
    }

    #[test]
    fn test_modifier_with_key() {
        let key = compile("--left-shift a");
        assert_eq!(key, CompiledKey { modifiers: mods::LSHIFT, keycode: 0x04 });

        let key = compile("--left-alt 6");
        assert_eq!(key, CompiledKey { modifiers: mods::LALT, keycode: 0x23 });
    }

    #[test]
    fn test_special_key() {
        assert_eq!(compile("--spacebar").keycode, 0x2c);
        assert_eq!(compile("  --esc  ").keycode, 0x29);
    }

    #[test]
    fn test_unknown_token_yields_nothing() {
        let spec = KeySpec::from("--hyper");
        assert_eq!(spec.compile(), CompiledKey::default());
        assert_eq!(
            spec.issues(),
            vec![KeySpecIssue::Unrecognized("--hyper".to_string())]
        );

        // Uppercase and multi-char words are not letters
        assert_eq!(compile("A").keycode, 0);
        assert_eq!(compile("ab").keycode, 0);
    }

    #[test]
    fn test_single_key_keeps_first() {
        assert_eq!(compile("w s").keycode, 0x1a);
        assert_eq!(compile("bogus w").keycode, 0x1a);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let spec = KeySpec::from("--right-ctrl --left-meta 7 x");
        assert_eq!(spec.compile(), spec.compile());
        assert_eq!(spec.compile_report(), spec.compile_report());
    }

    #[test]
    fn test_compile_report_multi_key() {
        let report = KeySpec::from("--left-ctrl --right-shift a b --f5").compile_report();
        assert_eq!(
            report.to_bytes(),
            [mods::LCTRL | mods::RSHIFT, 0x00, 0x04, 0x05, 0x3e, 0, 0, 0]
        );
    }

    #[test]
    fn test_compile_report_overflow() {
        let spec = KeySpec::from("a b c d e f g --left-alt h");
        let report = spec.compile_report();
        assert_eq!(
            report.to_bytes(),
            [mods::LALT, 0x00, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]
        );
        assert_eq!(
            spec.issues(),
            vec![
                KeySpecIssue::Overflow("g".to_string()),
                KeySpecIssue::Overflow("h".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeated_key_does_not_use_a_slot() {
        let spec = KeySpec::from("a a b c d e f");
        assert_eq!(
            spec.compile_report().to_bytes(),
            [0x00, 0x00, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]
        );
        assert!(spec.issues().is_empty());
    }

    #[test]
    fn test_compiled_key_to_report() {
        let report = compile("--left-shift a").to_report();
        assert_eq!(report.to_bytes(), [0x02, 0x00, 0x04, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_keyspec_is_a_plain_string_in_toml() {
        #[derive(Serialize, Deserialize)]
        struct Entry {
            keys: KeySpec,
        }
        let entry: Entry = toml::from_str(r#"keys = "--left-shift a""#).unwrap();
        assert_eq!(entry.keys.as_str(), "--left-shift a");
        assert_eq!(toml::to_string(&entry).unwrap().trim(), r#"keys = "--left-shift a""#);
    }
}
