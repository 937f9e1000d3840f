//! Default mode: MIDI in, HID reports out

use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use midi2hid::{
    Bridge, Config, GadgetDevice, LogSink, NoteMap, ReportSink, SequencerInput, Translator,
    TranslatorStats,
};

pub async fn run(config: Config, dry_run: bool, echo: bool) -> Result<()> {
    println!("MIDI-2-HID Adapter");
    println!("------------------\n");

    let map = NoteMap::build(&config.mapping);
    print!("{}", map.render_tree());
    if map.is_empty() {
        warn!("Mapping table is empty, no key will ever be pressed");
    }
    info!(
        "{} mappings, min velocity {:#04x}, window {:?}",
        map.len(),
        config.min_velocity,
        config.window()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let input = SequencerInput::open(
        &config.client_name,
        &config.port_name,
        config.source.as_deref(),
        tx,
    )?;

    let translator = Translator::new(map, config.engine_settings(), Instant::now());

    let stats = if dry_run {
        info!("Dry run: reports are printed, not sent");
        drive(translator, LogSink, &mut rx).await?
    } else {
        let device = GadgetDevice::open(&config.device)?;
        if echo {
            device
                .spawn_echo_reader()
                .context("Failed to start device reader")?;
        }
        drive(translator, device, &mut rx).await?
    };

    drop(input);
    info!(
        "{} hits, {} reports, {} releases ({} duplicates, {} below threshold, {} unmapped)",
        stats.hits,
        stats.reports,
        stats.releases,
        stats.duplicates,
        stats.below_threshold,
        stats.unmapped
    );
    Ok(())
}

async fn drive<S>(
    translator: Translator,
    sink: S,
    events: &mut mpsc::UnboundedReceiver<midi2hid::TimedEvent>,
) -> Result<TranslatorStats>
where
    S: ReportSink,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let mut bridge = Bridge::new(translator, sink);
    bridge
        .run(events, super::ctrl_c())
        .await
        .context("Failed to send HID report")?;
    Ok(bridge.translator().stats())
}
