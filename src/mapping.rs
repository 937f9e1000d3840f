//! Note mapping table
//!
//! An ordered list of MIDI note → key spec bindings, compiled once at startup
//! and read-only afterwards. Several notes may share a key (redundant pads);
//! a note listed twice resolves to its first entry.

use std::collections::HashSet;
use std::fmt::Write as _;

use midi2hid_keys::{CompiledKey, KeySpec};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One configured binding, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteBinding {
    pub note: u8,
    pub keys: KeySpec,
}

impl NoteBinding {
    pub fn new(note: u8, keys: &str) -> Self {
        Self {
            note,
            keys: KeySpec::new(keys),
        }
    }
}

/// A binding together with its compiled key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub note: u8,
    pub keys: KeySpec,
    pub compiled: CompiledKey,
}

/// Compiled note → key table.
#[derive(Debug, Clone, Default)]
pub struct NoteMap {
    entries: Vec<MappingEntry>,
}

impl NoteMap {
    /// Compile every binding exactly once, in table order.
    pub fn build<'a>(bindings: impl IntoIterator<Item = &'a NoteBinding>) -> Self {
        let mut seen = HashSet::new();
        let entries = bindings
            .into_iter()
            .map(|binding| {
                if !seen.insert(binding.note) {
                    warn!(
                        "Note {:02x} is mapped more than once; \"{}\" is unreachable",
                        binding.note, binding.keys
                    );
                }
                MappingEntry {
                    note: binding.note,
                    keys: binding.keys.clone(),
                    compiled: binding.keys.compile(),
                }
            })
            .collect();
        Self { entries }
    }

    /// First entry for `note`, if any.
    pub fn lookup(&self, note: u8) -> Option<&MappingEntry> {
        self.entries.iter().find(|e| e.note == note)
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tree view of the table with each entry's compiled report.
    pub fn render_tree(&self) -> String {
        let mut out = String::from("Mapping\n");
        for entry in &self.entries {
            let _ = writeln!(out, "├── Note: {:02x}", entry.note);
            let _ = writeln!(out, "│   ├── Keys: {}", entry.keys);
            let _ = writeln!(out, "│   └── Report: {}", entry.compiled.to_report());
            out.push_str("│\n");
        }
        out
    }
}
