use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, instrument, Instrument};

use crate::{probe::ActivityProbe, utils::clock::Clock};

use super::activity::ActivityEvaluator;

/// One observation of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleEvent {
    pub moment: DateTime<Utc>,
    pub working: bool,
}

/// Polls the probe on a fixed schedule and forwards observations to the processing side.
pub struct SamplingModule<Tz: TimeZone> {
    next: mpsc::Sender<SampleEvent>,
    probe: Box<dyn ActivityProbe>,
    shutdown: CancellationToken,
    evaluator: ActivityEvaluator<Tz>,
    sampling_interval: Duration,
    clock: Box<dyn Clock>,
}

impl<Tz: TimeZone> SamplingModule<Tz> {
    pub fn new(
        next: mpsc::Sender<SampleEvent>,
        probe: Box<dyn ActivityProbe>,
        shutdown: CancellationToken,
        evaluator: ActivityEvaluator<Tz>,
        sampling_interval: Duration,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            next,
            probe,
            shutdown,
            evaluator,
            sampling_interval,
            clock,
        }
    }

    fn sample(&mut self) -> Result<SampleEvent> {
        let idle = self.probe.idle_time()?;
        let moment = self.clock.time();
        Ok(SampleEvent {
            moment,
            working: self.evaluator.is_working(moment, idle),
        })
    }

    /// Executes the sampling loop until shutdown.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<()> {
        let mut sampling_point = self.clock.instant();
        loop {
            sampling_point += self.sampling_interval;

            match self.sample() {
                Ok(event) => {
                    let span = info_span!("Sending sample");
                    debug!("Sending sample {:?}", event);
                    self.next
                        .send(event)
                        .instrument(span)
                        .await
                        .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                }
                Err(e) => {
                    error!("Failed to read idle time, skipping tick {:?}", e)
                }
            }

            tokio::select! {
                // Returning drops the sender, which ends the processing module.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.clock.sleep_until(sampling_point) => ()
            }
        }
    }
}
