//! MIDI input
//!
//! Raw messages from the ALSA sequencer (via midir) are classified into
//! [`MidiEvent`]s in the midir callback and forwarded over an unbounded tokio
//! channel. The control loop polls that channel; it never blocks on the
//! sequencer itself.

use std::fmt;

use midir::os::unix::VirtualInput;
use midir::{Ignore, MidiInput, MidiInputConnection};
use midly::live::LiveEvent;
use midly::MidiMessage;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Errors from opening the sequencer input
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Could not open sequencer: {0}")]
    Init(String),

    #[error("No MIDI input port matching \"{0}\"")]
    PortNotFound(String),

    #[error("Could not open port: {0}")]
    Connect(String),
}

/// A classified MIDI event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8, velocity: u8 },
    Controller { param: u8, value: u8 },
    Unknown,
}

impl MidiEvent {
    /// Classify one raw MIDI message.
    ///
    /// A note-on with velocity 0 is a note-off by MIDI convention.
    pub fn classify(raw: &[u8]) -> Self {
        let Ok(LiveEvent::Midi { message, .. }) = LiveEvent::parse(raw) else {
            return MidiEvent::Unknown;
        };
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => MidiEvent::NoteOff {
                note: key.as_int(),
                velocity: 0,
            },
            MidiMessage::NoteOn { key, vel } => MidiEvent::NoteOn {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::NoteOff { key, vel } => MidiEvent::NoteOff {
                note: key.as_int(),
                velocity: vel.as_int(),
            },
            MidiMessage::Controller { controller, value } => MidiEvent::Controller {
                param: controller.as_int(),
                value: value.as_int(),
            },
            _ => MidiEvent::Unknown,
        }
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiEvent::NoteOn { note, velocity } => {
                write!(f, "Note on : {note:2x} vel({velocity:2x})")
            }
            MidiEvent::NoteOff { note, velocity } => {
                write!(f, "Note off: {note:2x} vel({velocity:2x})")
            }
            MidiEvent::Controller { param, value } => {
                write!(f, "Control:  {param:2x} val({value:2x})")
            }
            MidiEvent::Unknown => write!(f, "Unknown:  Unhandled Event Received"),
        }
    }
}

/// A classified event with the sequencer timestamp (microseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub stamp_us: u64,
    pub event: MidiEvent,
}

/// Open sequencer input. Dropping it closes the port.
pub struct SequencerInput {
    _connection: MidiInputConnection<()>,
    port: String,
}

impl SequencerInput {
    /// Open the sequencer and start forwarding classified events to `tx`.
    ///
    /// With `source` set, connects to the first input port whose name
    /// contains it. Otherwise creates a virtual port named `port_name` that
    /// other clients (e.g. `aconnect`) subscribe to.
    pub fn open(
        client_name: &str,
        port_name: &str,
        source: Option<&str>,
        tx: mpsc::UnboundedSender<TimedEvent>,
    ) -> Result<Self, MidiError> {
        let mut input = MidiInput::new(client_name).map_err(|e| MidiError::Init(e.to_string()))?;
        input.ignore(Ignore::None);

        let callback = move |stamp_us: u64, raw: &[u8], _: &mut ()| {
            let event = MidiEvent::classify(raw);
            // Receiver gone means shutdown is in progress
            let _ = tx.send(TimedEvent { stamp_us, event });
        };

        let (connection, port) = match source {
            Some(wanted) => {
                let found = input.ports().into_iter().find_map(|port| {
                    let name = input.port_name(&port).ok()?;
                    name.contains(wanted).then_some((port, name))
                });
                let (port, name) = found.ok_or_else(|| MidiError::PortNotFound(wanted.to_string()))?;
                debug!("Connecting to MIDI port {name}");
                let conn = input
                    .connect(&port, port_name, callback, ())
                    .map_err(|e| MidiError::Connect(e.to_string()))?;
                (conn, name)
            }
            None => {
                let conn = input
                    .create_virtual(port_name, callback, ())
                    .map_err(|e| MidiError::Connect(e.to_string()))?;
                (conn, format!("{client_name}:{port_name}"))
            }
        };

        info!("Listening for MIDI on {port}");
        Ok(Self {
            _connection: connection,
            port,
        })
    }

    /// Name of the port events arrive on.
    pub fn port(&self) -> &str {
        &self.port
    }
}
