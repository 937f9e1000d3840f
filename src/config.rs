//! Configuration
//!
//! Loaded from TOML; every field has a default, so an absent file or a
//! partial one is fine. The file is only ever read.
//!
//! ```toml
//! device = "/dev/hidg0"
//! min_velocity = 0x30
//! window_ms = 1
//!
//! [[mapping]]
//! note = 0x24
//! keys = "--spacebar"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::engine::{EngineSettings, DEFAULT_MIN_VELOCITY, DEFAULT_WINDOW};
use crate::mapping::NoteBinding;

/// Complete bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HID gadget device file
    #[serde(default = "default_device")]
    pub device: PathBuf,
    /// Note-on velocities below this are ignored
    #[serde(default = "default_min_velocity")]
    pub min_velocity: u8,
    /// Accumulation window in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// ALSA sequencer client name
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Name of our sequencer port
    #[serde(default = "default_port_name")]
    pub port_name: String,
    /// Connect to an existing port containing this name instead of waiting
    /// for a subscription on our own port
    #[serde(default)]
    pub source: Option<String>,
    /// Note → key table, first match wins
    #[serde(default = "default_mapping")]
    pub mapping: Vec<NoteBinding>,
}

fn default_device() -> PathBuf {
    PathBuf::from("/dev/hidg0")
}
fn default_min_velocity() -> u8 {
    DEFAULT_MIN_VELOCITY
}
fn default_window_ms() -> u64 {
    DEFAULT_WINDOW.as_millis() as u64
}
fn default_client_name() -> String {
    "Midi Listener".to_string()
}
fn default_port_name() -> String {
    "listen:in".to_string()
}

/// General MIDI percussion layout.
fn default_mapping() -> Vec<NoteBinding> {
    vec![
        NoteBinding::new(0x24, "--spacebar"), // bass drum
        NoteBinding::new(0x26, "s"),          // snare
        NoteBinding::new(0x28, "s"),          // electric snare
        NoteBinding::new(0x2a, "w"),          // closed hi-hat
        NoteBinding::new(0x2c, "w"),          // pedal hi-hat
        NoteBinding::new(0x2e, "w"),          // open hi-hat
        NoteBinding::new(0x2b, "q"),          // floor tom
        NoteBinding::new(0x2d, "a"),          // low tom
        NoteBinding::new(0x30, "d"),          // hi-mid tom
        NoteBinding::new(0x32, "e"),          // high tom
        NoteBinding::new(0x31, "--return"),   // crash
        NoteBinding::new(0x33, "--esc"),      // ride
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: default_device(),
            min_velocity: default_min_velocity(),
            window_ms: default_window_ms(),
            client_name: default_client_name(),
            port_name: default_port_name(),
            source: None,
            mapping: default_mapping(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("midi2hid")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))?
        } else {
            Self::default()
        };
        Ok(config)
    }

    /// Parse and validate TOML config text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside the MIDI/engine ranges
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_velocity > 0x7f {
            bail!("min_velocity {:#04x} exceeds the MIDI maximum 0x7f", self.min_velocity);
        }
        if self.window_ms == 0 {
            bail!("window_ms must be at least 1");
        }
        if let Some(bad) = self.mapping.iter().find(|b| b.note > 0x7f) {
            bail!("note {:#04x} (\"{}\") is not a MIDI note", bad.note, bad.keys);
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            min_velocity: self.min_velocity,
            window: self.window(),
        }
    }
}
