//! Key handling for the MIDI-to-HID bridge
//!
//! This crate has no I/O. It knows the key vocabulary accepted in key specs,
//! compiles specs like `"--left-shift a"` into HID modifier/keycode bytes, and
//! defines the 8-byte boot-protocol keyboard report written to the gadget.
//!
//! ```text
//! "--left-shift a"  ──KeySpec::compile──▶  CompiledKey { modifiers: 0x02, keycode: 0x04 }
//! "--left-ctrl a b" ──KeySpec::compile_report──▶  01 00 04 05 00 00 00 00
//! ```

pub mod keyspec;
pub mod report;
pub mod vocab;

pub use keyspec::{CompiledKey, KeySpec, KeySpecIssue, KeyToken};
pub use report::{HidReport, MAX_KEYS, REPORT_LEN};
pub use vocab::{key_name, mods};
