//! Control loop
//!
//! One task owns the [`Translator`] and the sink and alternates between
//! draining the event channel and a periodic window-boundary tick, so
//! reaction latency is bounded by the tick period and nothing in the engine
//! needs a lock.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::engine::{ReportSink, Translator};
use crate::midi::TimedEvent;

/// Shortest tick period, regardless of window size.
const MIN_TICK: Duration = Duration::from_micros(100);

/// The boundary is checked four times per window.
pub fn tick_period(window: Duration) -> Duration {
    (window / 4).max(MIN_TICK)
}

/// Engine plus the sink it writes to.
pub struct Bridge<S> {
    translator: Translator,
    sink: S,
}

impl<S: ReportSink> Bridge<S> {
    pub fn new(translator: Translator, sink: S) -> Self {
        Self { translator, sink }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn into_parts(self) -> (Translator, S) {
        (self.translator, self.sink)
    }

    /// Run until `shutdown` resolves or the event channel closes.
    ///
    /// A sink error ends the loop and is returned as is. A release still
    /// pending at shutdown is not sent.
    pub async fn run(
        &mut self,
        events: &mut mpsc::UnboundedReceiver<TimedEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), S::Error> {
        let period = tick_period(self.translator.settings().window);
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Checking window boundary every {period:?}");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }

                event = events.recv() => {
                    let Some(TimedEvent { event, .. }) = event else {
                        info!("MIDI input closed");
                        break;
                    };
                    let now = Instant::now().into_std();
                    self.translator.handle_event(event, now, &mut self.sink)?;
                }

                _ = ticker.tick() => {
                    let now = Instant::now().into_std();
                    self.translator.tick(now, &mut self.sink)?;
                }
            }
        }

        if self.translator.release_pending() {
            debug!("Dropping pending release at shutdown");
        }
        Ok(())
    }
}
