//! HID gadget device
//!
//! The gadget file (e.g. `/dev/hidg0`, created by the kernel's USB HID
//! function driver) takes one 8-byte keyboard report per write. The engine is
//! its only writer; an optional echo reader drains what the host sends back
//! (LED output reports) on its own thread and only logs it.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::thread;

use midi2hid_keys::{HidReport, REPORT_LEN};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::ReportSink;

/// Errors from the gadget device
#[derive(Debug, Error)]
pub enum GadgetError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write report: {0}")]
    Write(#[source] io::Error),

    #[error("Short write: {written} of {} bytes", REPORT_LEN)]
    ShortWrite { written: usize },
}

/// Open HID gadget device file.
pub struct GadgetDevice {
    file: File,
    path: PathBuf,
}

impl GadgetDevice {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GadgetError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| GadgetError::Open {
                path: path.clone(),
                source,
            })?;
        info!("Opened HID gadget {}", path.display());
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start a background thread that reads whatever the host writes back
    /// to the gadget and logs it. The thread never writes and ends on EOF or
    /// the first read error.
    pub fn spawn_echo_reader(&self) -> io::Result<thread::JoinHandle<()>> {
        let reader = self.file.try_clone()?;
        let path = self.path.clone();
        thread::Builder::new()
            .name("hidg-echo".to_string())
            .spawn(move || {
                echo_loop(reader, &path);
            })
    }
}

/// Returns the number of bytes echoed before the stream ended.
fn echo_loop(mut reader: impl Read, path: &Path) -> usize {
    let mut buf = [0u8; 64];
    let mut total = 0;
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("{}: end of stream", path.display());
                return total;
            }
            Ok(n) => {
                total += n;
                debug!("{} echo: {:02x?}", path.display(), &buf[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("{}: echo reader stopped: {e}", path.display());
                return total;
            }
        }
    }
}

impl ReportSink for GadgetDevice {
    type Error = GadgetError;

    fn send(&mut self, report: &HidReport) -> Result<(), Self::Error> {
        write_report(&mut self.file, report)
    }
}

/// Write one report in a single call; anything but a full write fails.
pub fn write_report(out: &mut impl Write, report: &HidReport) -> Result<(), GadgetError> {
    let written = out.write(&report.to_bytes()).map_err(GadgetError::Write)?;
    if written != REPORT_LEN {
        return Err(GadgetError::ShortWrite { written });
    }
    Ok(())
}

/// Dry-run sink: prints each report instead of writing it.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    type Error = GadgetError;

    fn send(&mut self, report: &HidReport) -> Result<(), Self::Error> {
        println!("report: {report}");
        Ok(())
    }
}
