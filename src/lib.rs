//! MIDI drum kit → USB HID keyboard bridge
//!
//! Note-on events from an electronic drum kit are looked up in a note→key
//! table, merged per accumulation window, and written as boot-protocol
//! keyboard reports to a Linux HID gadget, each followed by a release frame
//! once the kit goes quiet.
//!
//! ```text
//! [ALSA sequencer] → midi::SequencerInput → channel → bridge::Bridge
//!                                                        │
//!                          mapping::NoteMap ← engine::Translator
//!                                                        │
//!                                          gadget::GadgetDevice (/dev/hidg0)
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod gadget;
pub mod mapping;
pub mod midi;

pub use bridge::Bridge;
pub use config::Config;
pub use engine::{
    Disposition, EngineSettings, EngineState, Flush, ReportSink, Translator, TranslatorStats,
};
pub use gadget::{GadgetDevice, GadgetError, LogSink};
pub use mapping::{MappingEntry, NoteBinding, NoteMap};
pub use midi::{MidiError, MidiEvent, SequencerInput, TimedEvent};

pub use midi2hid_keys::{CompiledKey, HidReport, KeySpec};
