//! Print MIDI events as they arrive

use anyhow::Result;
use tokio::sync::mpsc;

use midi2hid::{Config, SequencerInput, TimedEvent};

pub async fn listen(config: &Config) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let input = SequencerInput::open(
        &config.client_name,
        &config.port_name,
        config.source.as_deref(),
        tx,
    )?;
    println!("Listening on {} (Ctrl+C to stop)", input.port());

    let shutdown = super::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = rx.recv() => match event {
                Some(TimedEvent { stamp_us, event }) => println!("[{stamp_us}] {event}"),
                None => break,
            },
        }
    }
    Ok(())
}
