//! Translation & batching engine
//!
//! Turns classified MIDI events into HID reports. Hits arriving inside one
//! accumulation window are merged into a single report; a window that goes
//! quiet after a report emits exactly one all-zero release frame.
//!
//! ```text
//!            NoteOn (mapped, new key)
//!   IDLE ───────────────────────────────▶ ACCUMULATING
//!    ▲                                        │
//!    │  window boundary / 6th key: send report│
//!    └────────────────────────────────────────┘
//!    (release pending → next quiet boundary sends 00 00 00 00 00 00 00 00)
//! ```
//!
//! The engine owns all of its state and takes the current time as an
//! argument; it does no I/O besides handing reports to a [`ReportSink`].

use std::collections::HashSet;
use std::convert::Infallible;
use std::time::{Duration, Instant};

use midi2hid_keys::{key_name, HidReport, MAX_KEYS};
use tracing::{debug, trace, warn};

use crate::mapping::NoteMap;
use crate::midi::MidiEvent;

/// Default minimum note-on velocity; softer hits are ghost triggers.
pub const DEFAULT_MIN_VELOCITY: u8 = 0x30;
/// Default accumulation window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1);

/// Destination for emitted reports.
///
/// A failed send is fatal to the caller; the engine never retries or
/// buffers a report the sink rejected.
pub trait ReportSink {
    type Error;

    fn send(&mut self, report: &HidReport) -> Result<(), Self::Error>;
}

/// Collects reports in memory.
impl ReportSink for Vec<HidReport> {
    type Error = Infallible;

    fn send(&mut self, report: &HidReport) -> Result<(), Self::Error> {
        self.push(*report);
        Ok(())
    }
}

/// Tunables consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub min_velocity: u8,
    pub window: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_velocity: DEFAULT_MIN_VELOCITY,
            window: DEFAULT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing accumulated since the last flush.
    Idle,
    /// At least one key waiting for the next flush.
    Accumulating,
}

/// What happened to one incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Note-off, controller or unknown event; observed only.
    Observed,
    BelowThreshold,
    Unmapped,
    /// Mapped, but the key spec compiled to no keycode.
    NoKeycode,
    /// Key already in the current window.
    Duplicate,
    /// Key added; `flushed` is set when it filled the last free slot.
    Accumulated { keycode: u8, flushed: bool },
}

/// Result of running the flush policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    Nothing,
    Release,
    Report(HidReport),
}

/// Running counters, logged at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslatorStats {
    pub hits: u64,
    pub below_threshold: u64,
    pub unmapped: u64,
    pub duplicates: u64,
    pub reports: u64,
    pub releases: u64,
}

/// The translation state machine.
pub struct Translator {
    map: NoteMap,
    settings: EngineSettings,
    /// Report being accumulated for the current window
    pending: HidReport,
    /// Keys already placed in `pending`
    pressed: HashSet<u8>,
    release_pending: bool,
    window_start: Instant,
    stats: TranslatorStats,
}

impl Translator {
    pub fn new(map: NoteMap, settings: EngineSettings, now: Instant) -> Self {
        Self {
            map,
            settings,
            pending: HidReport::release(),
            pressed: HashSet::with_capacity(MAX_KEYS),
            release_pending: false,
            window_start: now,
            stats: TranslatorStats::default(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn map(&self) -> &NoteMap {
        &self.map
    }

    pub fn state(&self) -> EngineState {
        if self.pressed.is_empty() {
            EngineState::Idle
        } else {
            EngineState::Accumulating
        }
    }

    pub fn release_pending(&self) -> bool {
        self.release_pending
    }

    /// Report accumulated so far in the current window.
    pub fn pending_report(&self) -> &HidReport {
        &self.pending
    }

    pub fn stats(&self) -> TranslatorStats {
        self.stats
    }

    /// Feed one classified event.
    ///
    /// Only sends a report when the event fills the sixth slot.
    pub fn handle_event<S: ReportSink>(
        &mut self,
        event: MidiEvent,
        now: Instant,
        sink: &mut S,
    ) -> Result<Disposition, S::Error> {
        let (note, velocity) = match event {
            MidiEvent::NoteOn { note, velocity } => (note, velocity),
            MidiEvent::NoteOff { note, velocity } => {
                debug!("Note off: {note:02x} vel({velocity:02x})");
                return Ok(Disposition::Observed);
            }
            MidiEvent::Controller { param, value } => {
                debug!("Control: {param:02x} val({value:02x})");
                return Ok(Disposition::Observed);
            }
            MidiEvent::Unknown => {
                trace!("Unhandled event");
                return Ok(Disposition::Observed);
            }
        };

        if velocity < self.settings.min_velocity {
            trace!("Note {note:02x} below threshold (vel {velocity:02x})");
            self.stats.below_threshold += 1;
            return Ok(Disposition::BelowThreshold);
        }

        let Some(entry) = self.map.lookup(note) else {
            warn!("No mapping for note {note:02x}");
            self.stats.unmapped += 1;
            return Ok(Disposition::Unmapped);
        };
        let keycode = entry.compiled.keycode;
        if keycode == 0 {
            warn!("Note {note:02x} maps to \"{}\", which has no key", entry.keys);
            self.stats.unmapped += 1;
            return Ok(Disposition::NoKeycode);
        }

        if !self.pressed.insert(keycode) {
            debug!(
                "Duplicate {} from note {note:02x} in this window",
                key_name(keycode)
            );
            self.stats.duplicates += 1;
            return Ok(Disposition::Duplicate);
        }

        self.pending.push_key(keycode);
        self.stats.hits += 1;
        debug!(
            "Note {note:02x} vel({velocity:02x}) -> {} ({}/{MAX_KEYS})",
            key_name(keycode),
            self.pressed.len()
        );

        let flushed = self.pressed.len() >= MAX_KEYS;
        if flushed {
            debug!("All key slots used, flushing early");
            self.flush(now, sink)?;
        }
        Ok(Disposition::Accumulated { keycode, flushed })
    }

    /// Periodic check. Runs the flush policy once the window has elapsed
    /// and starts the next window.
    pub fn tick<S: ReportSink>(&mut self, now: Instant, sink: &mut S) -> Result<Flush, S::Error> {
        if now.saturating_duration_since(self.window_start) < self.settings.window {
            return Ok(Flush::Nothing);
        }
        let flush = self.flush(now, sink)?;
        self.window_start = now;
        Ok(flush)
    }

    /// Run the flush policy immediately.
    pub fn flush<S: ReportSink>(&mut self, now: Instant, sink: &mut S) -> Result<Flush, S::Error> {
        if self.pressed.is_empty() {
            if !self.release_pending {
                return Ok(Flush::Nothing);
            }
            let release = HidReport::release();
            sink.send(&release)?;
            self.release_pending = false;
            self.stats.releases += 1;
            debug!("Sent release");
            return Ok(Flush::Release);
        }

        let report = self.pending;
        sink.send(&report)?;
        self.pending = HidReport::release();
        self.pressed.clear();
        self.release_pending = true;
        self.window_start = now;
        self.stats.reports += 1;
        debug!("Sent report {report}");
        Ok(Flush::Report(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::NoteBinding;

    const WINDOW: Duration = Duration::from_millis(10);

    fn translator(start: Instant) -> Translator {
        let bindings = vec![
            NoteBinding::new(0x24, "--spacebar"),
            NoteBinding::new(0x26, "s"),
            NoteBinding::new(0x28, "s"),
            NoteBinding::new(0x2e, "w"),
            NoteBinding::new(0x30, "--left-shift"),
        ];
        let settings = EngineSettings {
            window: WINDOW,
            ..Default::default()
        };
        Translator::new(NoteMap::build(&bindings), settings, start)
    }

    fn hit(note: u8, velocity: u8) -> MidiEvent {
        MidiEvent::NoteOn { note, velocity }
    }

    #[test]
    fn test_starts_idle() {
        let t = translator(Instant::now());
        assert_eq!(t.state(), EngineState::Idle);
        assert!(!t.release_pending());
        assert!(t.pending_report().is_release());
    }

    #[test]
    fn test_below_threshold_is_discarded() {
        let now = Instant::now();
        let mut t = translator(now);
        let mut sink = Vec::new();
        let d = t.handle_event(hit(0x24, 0x10), now, &mut sink).unwrap();
        assert_eq!(d, Disposition::BelowThreshold);
        assert_eq!(t.state(), EngineState::Idle);
        assert_eq!(t.tick(now + WINDOW, &mut sink).unwrap(), Flush::Nothing);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let now = Instant::now();
        let mut t = translator(now);
        let mut sink = Vec::new();
        let d = t.handle_event(hit(0x24, 0x30), now, &mut sink).unwrap();
        assert_eq!(d, Disposition::Accumulated { keycode: 0x2c, flushed: false });
    }

    #[test]
    fn test_unmapped_and_keyless_notes() {
        let now = Instant::now();
        let mut t = translator(now);
        let mut sink = Vec::new();
        assert_eq!(
            t.handle_event(hit(0x7f, 0x7f), now, &mut sink).unwrap(),
            Disposition::Unmapped
        );
        // Modifier-only spec has no keycode
        assert_eq!(
            t.handle_event(hit(0x30, 0x7f), now, &mut sink).unwrap(),
            Disposition::NoKeycode
        );
        assert_eq!(t.state(), EngineState::Idle);
        assert_eq!(t.stats().unmapped, 2);
    }

    #[test]
    fn test_note_off_and_controller_are_observed_only() {
        let now = Instant::now();
        let mut t = translator(now);
        let mut sink = Vec::new();
        for event in [
            MidiEvent::NoteOff { note: 0x24, velocity: 0x40 },
            MidiEvent::Controller { param: 0x04, value: 0x7f },
            MidiEvent::Unknown,
        ] {
            assert_eq!(t.handle_event(event, now, &mut sink).unwrap(), Disposition::Observed);
        }
        assert_eq!(t.state(), EngineState::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_duplicate_key_in_window() {
        let now = Instant::now();
        let mut t = translator(now);
        let mut sink = Vec::new();
        t.handle_event(hit(0x26, 0x50), now, &mut sink).unwrap();
        // Same note again, and a different pad mapped to the same key
        assert_eq!(
            t.handle_event(hit(0x26, 0x60), now, &mut sink).unwrap(),
            Disposition::Duplicate
        );
        assert_eq!(
            t.handle_event(hit(0x28, 0x60), now, &mut sink).unwrap(),
            Disposition::Duplicate
        );
        assert_eq!(t.pending_report().keys().collect::<Vec<_>>(), vec![0x16]);
        assert_eq!(t.stats().duplicates, 2);
    }

    #[test]
    fn test_window_flush_then_single_release() {
        let start = Instant::now();
        let mut t = translator(start);
        let mut sink = Vec::new();

        t.handle_event(hit(0x24, 0x40), start, &mut sink).unwrap();
        t.handle_event(hit(0x2e, 0x7f), start, &mut sink).unwrap();
        assert_eq!(t.state(), EngineState::Accumulating);

        // Not yet at the boundary
        assert_eq!(t.tick(start + WINDOW / 2, &mut sink).unwrap(), Flush::Nothing);
        assert!(sink.is_empty());

        let flush = t.tick(start + WINDOW, &mut sink).unwrap();
        assert!(matches!(flush, Flush::Report(_)));
        assert!(t.release_pending());
        assert_eq!(t.state(), EngineState::Idle);

        assert_eq!(t.tick(start + WINDOW * 2, &mut sink).unwrap(), Flush::Release);
        assert_eq!(t.tick(start + WINDOW * 3, &mut sink).unwrap(), Flush::Nothing);
        assert_eq!(t.tick(start + WINDOW * 4, &mut sink).unwrap(), Flush::Nothing);

        assert_eq!(
            sink,
            vec![
                HidReport::from_bytes([0x00, 0x00, 0x2c, 0x1a, 0, 0, 0, 0]),
                HidReport::release(),
            ]
        );
        assert_eq!(t.stats().reports, 1);
        assert_eq!(t.stats().releases, 1);
    }

    #[test]
    fn test_key_allowed_again_after_flush() {
        let start = Instant::now();
        let mut t = translator(start);
        let mut sink = Vec::new();
        t.handle_event(hit(0x26, 0x40), start, &mut sink).unwrap();
        t.tick(start + WINDOW, &mut sink).unwrap();
        let d = t
            .handle_event(hit(0x26, 0x40), start + WINDOW, &mut sink)
            .unwrap();
        assert_eq!(d, Disposition::Accumulated { keycode: 0x16, flushed: false });
    }

    #[test]
    fn test_press_before_quiet_boundary_defers_release() {
        let start = Instant::now();
        let mut t = translator(start);
        let mut sink = Vec::new();

        t.handle_event(hit(0x24, 0x40), start, &mut sink).unwrap();
        t.tick(start + WINDOW, &mut sink).unwrap();
        t.handle_event(hit(0x2e, 0x40), start + WINDOW, &mut sink)
            .unwrap();
        t.tick(start + WINDOW * 2, &mut sink).unwrap();
        t.tick(start + WINDOW * 3, &mut sink).unwrap();

        let releases = sink.iter().filter(|r| r.is_release()).count();
        assert_eq!(sink.len(), 3);
        assert_eq!(releases, 1);
        assert!(sink[2].is_release());
    }

    #[test]
    fn test_flush_on_empty_window_is_noop() {
        let start = Instant::now();
        let mut t = translator(start);
        let mut sink = Vec::new();
        assert_eq!(t.flush(start, &mut sink).unwrap(), Flush::Nothing);
        assert!(sink.is_empty());
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        type Error = &'static str;

        fn send(&mut self, _report: &HidReport) -> Result<(), Self::Error> {
            Err("device gone")
        }
    }

    #[test]
    fn test_sink_error_propagates() {
        let start = Instant::now();
        let mut t = translator(start);
        t.handle_event(hit(0x24, 0x40), start, &mut FailingSink)
            .unwrap();
        assert_eq!(t.tick(start + WINDOW, &mut FailingSink), Err("device gone"));
    }
}
