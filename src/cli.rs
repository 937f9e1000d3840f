// CLI definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use midi2hid::Config;

#[derive(Parser)]
#[command(name = "midi2hid")]
#[command(author, version, about = "Play a MIDI drum kit as a USB HID keyboard")]
pub struct Cli {
    /// Config file path (default: ~/.config/midi2hid/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options for the default bridge mode
#[derive(Args, Default)]
pub struct RunArgs {
    /// HID gadget device (default from config: /dev/hidg0)
    pub device: Option<PathBuf>,

    /// Minimum note-on velocity (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..128))]
    pub min_velocity: Option<u8>,

    /// Accumulation window in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub window_ms: Option<u64>,

    /// Connect to the MIDI port whose name contains this text
    #[arg(long)]
    pub source: Option<String>,

    /// Print reports instead of writing to the device
    #[arg(long)]
    pub dry_run: bool,

    /// Do not read back from the device
    #[arg(long)]
    pub no_echo: bool,
}

impl RunArgs {
    /// Overlay command-line values on the loaded config
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(device) = &self.device {
            config.device = device.clone();
        }
        if let Some(v) = self.min_velocity {
            config.min_velocity = v;
        }
        if let Some(ms) = self.window_ms {
            config.window_ms = ms;
        }
        if let Some(source) = &self.source {
            config.source = Some(source.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print incoming MIDI events (no HID output)
    #[command(visible_alias = "l")]
    Listen {
        /// Connect to the MIDI port whose name contains this text
        #[arg(long)]
        source: Option<String>,
    },

    /// Show the compiled note mapping table
    #[command(visible_aliases = ["map", "m"])]
    Mapping,

    /// Compile a key spec (e.g. "--left-shift a") into a report
    Compile {
        /// Key spec tokens
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        spec: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_device_positional() {
        let cli = Cli::try_parse_from(["midi2hid", "-v", "/dev/hidg1"]).unwrap();
        assert!(cli.verbose);
        assert!(cli.command.is_none());
        let config = cli.run.apply(Config::default());
        assert_eq!(config.device, PathBuf::from("/dev/hidg1"));
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "midi2hid",
            "--min-velocity",
            "16",
            "--window-ms",
            "4",
            "--source",
            "TD-17",
        ])
        .unwrap();
        let config = cli.run.apply(Config::default());
        assert_eq!(config.min_velocity, 16);
        assert_eq!(config.window_ms, 4);
        assert_eq!(config.source.as_deref(), Some("TD-17"));
    }

    #[test]
    fn test_global_flags_before_subcommand() {
        let cli = Cli::try_parse_from(["midi2hid", "-v", "listen"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Listen { .. })));
        assert!(cli.run.device.is_none());

        let cli = Cli::try_parse_from(["midi2hid", "--config", "x.toml", "mapping"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Mapping)));
        assert!(cli.run.device.is_none());
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_velocity_range() {
        assert!(Cli::try_parse_from(["midi2hid", "--min-velocity", "128"]).is_err());
    }

    #[test]
    fn test_compile_accepts_dashed_tokens() {
        let cli = Cli::try_parse_from(["midi2hid", "compile", "--left-shift", "a"]).unwrap();
        match cli.command {
            Some(Commands::Compile { spec }) => assert_eq!(spec, vec!["--left-shift", "a"]),
            _ => panic!("Expected compile subcommand"),
        }
    }
}
