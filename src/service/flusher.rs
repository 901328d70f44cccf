use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use snafu::{Location, ResultExt, Snafu};
use tokio::select;
use tokio::sync::oneshot;
use tracing::instrument;

use super::counter_store::CounterStore;
use crate::database::{orm, Database, DatabaseError};
use crate::model::CounterRecord;
use crate::time;

#[derive(Debug, Snafu)]
pub enum FlushError {
    #[snafu(display("could not write {count} counter records: {source}"))]
    Write {
        count: usize,
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub records: usize,
}

/// Moves live counts into the `counters` table.
#[derive(Debug, Clone, new)]
pub struct Flusher {
    store: Arc<CounterStore>,
    database: Database,
}

impl Flusher {
    /// Drain the live store and write everything in a single transaction.
    ///
    /// The live store only loses its entries when the transaction commits. On
    /// failure nothing is written and the drained counts are merged back, to be
    /// picked up by the next flush.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<FlushReport, FlushError> {
        let drained = self.store.drain();
        if drained.is_empty() {
            tracing::debug!("nothing to flush");
            return Ok(FlushReport::default());
        }

        let records: Vec<CounterRecord> = drained.iter().map(CounterRecord::from).collect();
        let count = records.len();

        let written = orm::counters::upsert_all(&records, &self.database)
            .await
            .context(WriteSnafu { count });

        if written.is_err() {
            self.store.restore(drained);
        }
        written?;

        tracing::info!(records = count, "flushed counters");
        Ok(FlushReport { records: count })
    }

    /// Run [Flusher::flush] every `period` on a background task until the
    /// returned handle is stopped. A final flush runs on the way out.
    pub fn spawn(self, period: Duration) -> FlushTask {
        let (stop, mut signal) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut timer = time::timer(period);
            tracing::info!(?period, "started flush task");

            loop {
                select! {
                    _ = &mut signal => break,
                    _ = timer.tick() => self.tick().await,
                }
            }

            self.tick().await;
            tracing::info!("stopped flush task");
        });

        FlushTask { stop, handle }
    }

    async fn tick(&self) {
        if let Err(error) = self.flush().await {
            tracing::error!(%error, "flush failed, counts were returned to the live store");
        }
    }
}

#[derive(Debug)]
pub struct FlushTask {
    stop: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<()>,
}

impl FlushTask {
    /// Stop the task and wait for its final flush.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Catalog, ContentType, Counter, TimeBucket};

    fn content(name: &str) -> ContentType {
        Catalog::default().get(name).cloned().unwrap()
    }

    async fn setup() -> (Flusher, Arc<CounterStore>, Database) {
        let store = Arc::new(CounterStore::new());
        let database = Database::memory().await.unwrap();
        let flusher = Flusher::new(store.clone(), database.clone());
        (flusher, store, database)
    }

    #[tokio::test]
    async fn flush_moves_live_counts_into_the_table() {
        let (flusher, store, database) = setup().await;
        let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

        store.record_view(&content("sports"), &bucket);
        store.record_view(&content("sports"), &bucket);
        store.record_click(&content("sports"), &bucket);

        let report = flusher.flush().await.unwrap();
        assert_eq!(report.records, 1);
        assert!(store.is_empty());

        let record = orm::counters::find("sports", &bucket, &database).await.unwrap();
        assert_eq!(
            record,
            Some(CounterRecord::new(bucket, "sports".into(), 2, 1))
        );
    }

    #[tokio::test]
    async fn empty_flush_writes_nothing() {
        let (flusher, _store, _database) = setup().await;

        assert_eq!(flusher.flush().await.unwrap(), FlushReport::default());
    }

    #[tokio::test]
    async fn failed_flush_commits_nothing_and_keeps_the_counts() {
        let (flusher, store, database) = setup().await;
        let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

        database
            .sql("DEFINE FIELD content_type ON counters TYPE string ASSERT $value != 'business'")
            .execute()
            .await
            .unwrap();

        store.record_view(&content("sports"), &bucket);
        store.record_view(&content("business"), &bucket);

        let result = flusher.flush().await;
        assert!(matches!(result, Err(FlushError::Write { count: 2, .. })));

        let sports = orm::counters::find("sports", &bucket, &database).await.unwrap();
        assert_eq!(sports, None, "no partial commit");

        assert_eq!(store.get(&content("sports"), &bucket), Some(Counter::new(1, 0)));
        assert_eq!(store.get(&content("business"), &bucket), Some(Counter::new(1, 0)));
    }

    #[tokio::test]
    async fn flushes_on_every_tick() {
        let (flusher, store, database) = setup().await;
        let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

        let task = flusher.spawn(Duration::from_millis(20));
        store.record_view(&content("education"), &bucket);

        let mut record = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            record = orm::counters::find("education", &bucket, &database).await.unwrap();
            if record.is_some() {
                break;
            }
        }

        task.shutdown().await;
        assert_eq!(record, Some(CounterRecord::new(bucket, "education".into(), 1, 0)));
    }

    #[tokio::test]
    async fn failed_ticks_keep_the_task_running() {
        let (flusher, store, database) = setup().await;
        let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

        database
            .sql("DEFINE FIELD content_type ON counters TYPE string ASSERT $value != 'business'")
            .execute()
            .await
            .unwrap();

        let task = flusher.spawn(Duration::from_millis(20));
        store.record_view(&content("business"), &bucket);

        tokio::time::sleep(Duration::from_millis(100)).await;
        let record = orm::counters::find("business", &bucket, &database).await.unwrap();
        assert_eq!(record, None);
        assert_eq!(store.get(&content("business"), &bucket), Some(Counter::new(1, 0)));

        database
            .sql("DEFINE FIELD content_type ON counters TYPE string")
            .execute()
            .await
            .unwrap();
        store.record_view(&content("business"), &bucket);

        let mut record = None;
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            record = orm::counters::find("business", &bucket, &database).await.unwrap();
            if record.is_some() {
                break;
            }
        }

        task.shutdown().await;
        assert_eq!(record, Some(CounterRecord::new(bucket, "business".into(), 2, 0)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn shutdown_runs_a_final_flush() {
        let (flusher, store, database) = setup().await;
        let bucket = TimeBucket::from("01 Jan 24 00:00 +0000");

        let task = flusher.spawn(Duration::from_secs(3600));
        store.record_click(&content("entertainment"), &bucket);
        task.shutdown().await;

        let record = orm::counters::find("entertainment", &bucket, &database)
            .await
            .unwrap();
        assert_eq!(record, Some(CounterRecord::new(bucket, "entertainment".into(), 0, 1)));
        assert!(store.is_empty());
    }
}
