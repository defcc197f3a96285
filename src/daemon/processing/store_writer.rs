use anyhow::Result;
use chrono::TimeZone;
use tracing::{error, info, warn};

use crate::{
    daemon::collection::sampler::SampleEvent,
    query::timeline::daily_timeline,
    store::{Store, StoreRepository},
    utils::format::human_duration,
};

use super::module::SampleProcessor;

/// Applies samples to the durable document. Every sample reloads the document first so edits
/// made by the CLI in between are kept. Samples that could not be saved stay pending and are
/// applied again on the next tick.
pub struct StoreWriter<R: StoreRepository, Tz: TimeZone> {
    repository: R,
    store: Store,
    pending: Vec<SampleEvent>,
    tz: Tz,
}

impl<R: StoreRepository, Tz: TimeZone> StoreWriter<R, Tz> {
    pub fn new(repository: R, tz: Tz) -> Self {
        Self {
            repository,
            store: Store::default(),
            pending: Vec::new(),
            tz,
        }
    }

    async fn reload(&mut self) {
        match self.repository.load().await {
            Ok(store) => self.store = store,
            Err(e) => warn!("Failed to reload store, keeping the in-memory copy {e:?}"),
        }
    }

    async fn flush(&mut self) -> Result<()> {
        self.repository
            .save(&self.store)
            .await
            .inspect_err(|e| error!("Failed to save store {e:?}"))?;
        self.pending.clear();
        Ok(())
    }

    fn log_today(&self, event: &SampleEvent) {
        let now = event.moment.with_timezone(&self.tz);
        let today = daily_timeline(&self.store, &now, &now);
        info!(
            "Today: {} working, {} idle",
            human_duration(today.working),
            human_duration(today.idle)
        );
    }
}

impl<R: StoreRepository, Tz: TimeZone> SampleProcessor for StoreWriter<R, Tz> {
    async fn process_next(&mut self, event: SampleEvent) -> Result<()> {
        self.pending.push(event);
        self.reload().await;
        for sample in &self.pending {
            self.store
                .upsert_sample(sample.moment.with_timezone(&self.tz), sample.working);
        }
        self.flush().await?;

        if self.store.should_compact() {
            let ranges = self.store.compact();
            info!("Compacted samples into {ranges} ranges");
            self.flush().await?;
        }

        self.log_today(&event);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        warn!("Saving {} pending samples before exit", self.pending.len());
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        daemon::{
            collection::sampler::SampleEvent,
            processing::module::SampleProcessor,
        },
        store::{entities::ConfigUpdate, JsonStoreFile, Status, Store, StoreRepository},
        utils::logging::TEST_LOGGING,
    };

    use super::StoreWriter;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn minute(m: i64) -> DateTime<Utc> {
        Utc.from_utc_datetime(&TEST_START_DATE) + Duration::minutes(m)
    }

    fn event(m: i64, working: bool) -> SampleEvent {
        SampleEvent {
            moment: minute(m),
            working,
        }
    }

    #[tokio::test]
    async fn test_samples_are_saved_and_cli_edits_survive() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let path = dir.path().join("store.json");
        let mut writer = StoreWriter::new(JsonStoreFile::new(path.clone()), Utc);

        writer.process_next(event(0, true)).await?;

        // another process changes the document between ticks
        let repository = JsonStoreFile::new(path);
        let mut edited = repository.load().await?;
        edited.apply_config("dailygoal=06:00".parse::<ConfigUpdate>()?);
        repository.save(&edited).await?;

        writer.process_next(event(6, false)).await?;

        let stored = repository.load().await?;
        assert_eq!(stored.settings().daily_goal_minutes.minutes(), 360);
        assert_eq!(stored.samples()[&minute(0)], Status::Working);
        assert_eq!(stored.samples()[&minute(5)], Status::Idle);
        Ok(())
    }

    #[tokio::test]
    async fn test_compacts_at_trigger() -> Result<()> {
        let dir = tempdir()?;
        let repository = JsonStoreFile::new(dir.path().join("store.json"));
        let mut seeded = Store::default();
        for i in 0..99 {
            seeded.upsert_sample(minute(i * 5), true);
        }
        repository.save(&seeded).await?;

        let mut writer = StoreWriter::new(&repository, Utc);
        writer.process_next(event(99 * 5, false)).await?;

        let stored = repository.load().await?;
        assert!(stored.samples().is_empty());
        assert_eq!(stored.ranges().len(), 2);
        assert_eq!(stored.ranges()[0].status, Status::Working);
        assert_eq!(stored.ranges()[0].end, minute(99 * 5));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_save_keeps_sample_pending() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("missing");
        let repository = JsonStoreFile::new(missing.join("store.json"));
        let mut writer = StoreWriter::new(&repository, Utc);

        assert!(writer.process_next(event(0, true)).await.is_err());

        tokio::fs::create_dir(&missing).await?;
        writer.process_next(event(5, true)).await?;

        let stored = repository.load().await?;
        assert_eq!(stored.samples().len(), 2);
        assert!(writer.finalize().await.is_ok());
        Ok(())
    }
}
