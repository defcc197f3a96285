use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::{Local, TimeZone};
use collection::{
    activity::ActivityEvaluator,
    sampler::{SampleEvent, SamplingModule},
};
use processing::{store_writer::StoreWriter, ProcessingModule};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    probe::{ActivityProbe, GenericProbe},
    store::JsonStoreFile,
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod collection;
pub mod processing;
pub mod shutdown;

pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_secs(30);

/// Represents the starting point for the daemon. Samples until Ctrl-C or SIGTERM.
pub async fn start_daemon(file: PathBuf) -> Result<()> {
    let file = std::path::absolute(file)?;
    std::env::set_current_dir("/")?;
    info!("Sampling into {:?}", file);

    let (sender, receiver) = mpsc::channel::<SampleEvent>(10);
    let probe = GenericProbe::new()?;

    let shutdown_token = CancellationToken::new();

    let sampler = create_sampler(sender, probe, &shutdown_token, DefaultClock, Local);
    let processor = create_processor(file, receiver, Local);

    let (_, sampling_result, processing_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        sampler.run(),
        processor.run(),
    );

    if let Err(sampling_result) = sampling_result {
        error!("Sampling module got an error {:?}", sampling_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    Ok(())
}

fn create_sampler<Tz: TimeZone>(
    sender: mpsc::Sender<SampleEvent>,
    probe: impl ActivityProbe + 'static,
    shutdown_token: &CancellationToken,
    clock: impl Clock,
    tz: Tz,
) -> SamplingModule<Tz> {
    SamplingModule::new(
        sender,
        Box::new(probe),
        shutdown_token.clone(),
        ActivityEvaluator::new(tz),
        DEFAULT_SAMPLING_INTERVAL,
        Box::new(clock),
    )
}

fn create_processor<Tz: TimeZone>(
    file: PathBuf,
    receiver: mpsc::Receiver<SampleEvent>,
    tz: Tz,
) -> ProcessingModule<StoreWriter<JsonStoreFile, Tz>> {
    ProcessingModule::new(receiver, StoreWriter::new(JsonStoreFile::new(file), tz))
}

#[cfg(test)]
mod daemon_tests {
    use std::{
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
        time::Duration,
    };

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;
    use tokio::{sync::mpsc, time::Instant};
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{collection::sampler::SampleEvent, create_processor, create_sampler},
        probe::MockActivityProbe,
        store::{JsonStoreFile, Status, StoreRepository},
        utils::{clock::Clock, logging::TEST_LOGGING},
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Utc>,
        reference: Instant,
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Utc> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    fn minute(m: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + chrono::Duration::minutes(m)
    }

    async fn run_for(
        probe: MockActivityProbe,
        file: std::path::PathBuf,
        duration: Duration,
    ) -> Result<()> {
        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<SampleEvent>(10);
        let clock = TestClock {
            start_time: Utc.from_utc_datetime(&TEST_START_DATE),
            reference: Instant::now(),
        };
        let sampler = create_sampler(sender, probe, &shutdown_token, clock, Utc);
        let processor = create_processor(file, receiver, Utc);

        let (_, sampling_result, processing_result) = tokio::join!(
            async {
                tokio::time::sleep(duration).await;
                shutdown_token.cancel()
            },
            sampler.run(),
            processor.run(),
        );
        sampling_result?;
        processing_result
    }

    /// Runs twenty virtual minutes of sampling. The user is away for the whole second bucket.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let calls = Arc::new(AtomicU32::new(0));
        let mut probe = MockActivityProbe::new();
        probe.expect_idle_time().returning(move || {
            let tick = calls.fetch_add(1, Ordering::SeqCst);
            if (10..20).contains(&tick) {
                Ok(Duration::from_secs(600))
            } else {
                Ok(Duration::ZERO)
            }
        });

        let dir = tempdir()?;
        let file = dir.path().join("store.json");
        run_for(probe, file.clone(), Duration::from_secs(20 * 60 + 1)).await?;

        let store = JsonStoreFile::new(file).load().await?;
        assert_eq!(
            store.samples().iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            vec![
                (minute(0), Status::Working),
                (minute(5), Status::Idle),
                (minute(10), Status::Working),
                (minute(15), Status::Working),
                (minute(20), Status::Working),
            ]
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failures_skip_ticks() -> Result<()> {
        *TEST_LOGGING;
        let mut probe = MockActivityProbe::new();
        probe
            .expect_idle_time()
            .returning(|| Err(anyhow!("display unavailable")));

        let dir = tempdir()?;
        let file = dir.path().join("store.json");
        run_for(probe, file.clone(), Duration::from_secs(5 * 60)).await?;

        assert!(!file.exists());
        Ok(())
    }
}
