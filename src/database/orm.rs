pub mod counters {
    use serde::{Deserialize, Serialize};

    use crate::database::{Database, Result};
    use crate::model::{CounterRecord, TimeBucket};

    /// Writes every record in one transaction. A key that already exists gets
    /// the new counts added to it.
    const UPSERT_ALL: &str = "
        BEGIN TRANSACTION;
        FOR $record IN $records {
            UPDATE type::thing('counters', [$record.bucket, $record.content_type]) SET
                bucket = $record.bucket,
                content_type = $record.content_type,
                views = (views OR 0) + $record.views,
                clicks = (clicks OR 0) + $record.clicks;
        };
        COMMIT TRANSACTION;
    ";

    const FIND: &str = "SELECT bucket, content_type, views, clicks FROM counters WHERE content_type = $content AND bucket = $time LIMIT 1";

    const BY_CONTENT: &str = "SELECT bucket, content_type, views, clicks FROM counters WHERE content_type = $content ORDER BY bucket";

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Row {
        bucket: String,
        content_type: String,
        views: u64,
        clicks: u64,
    }

    impl Row {
        fn from_record(record: &CounterRecord) -> Self {
            Self {
                bucket: record.time.to_string(),
                content_type: record.content.clone(),
                views: record.view,
                clicks: record.click,
            }
        }

        fn into_record(self) -> CounterRecord {
            CounterRecord::new(self.bucket.into(), self.content_type, self.views, self.clicks)
        }
    }

    pub async fn upsert_all(records: &[CounterRecord], db: &Database) -> Result<()> {
        let rows: Vec<Row> = records.iter().map(Row::from_record).collect();
        tracing::debug!(count = rows.len(), "writing counter records to database");

        db.sql(UPSERT_ALL).bind(("records", rows)).execute().await?;

        Ok(())
    }

    pub async fn find(content: &str, time: &TimeBucket, db: &Database) -> Result<Option<CounterRecord>> {
        tracing::debug!(%content, %time, "fetching counter record from database");

        let row: Option<Row> = db
            .sql(FIND)
            .bind(("content", content.to_owned()))
            .bind(("time", time.to_string()))
            .fetch_first()
            .await?;

        Ok(row.map(Row::into_record))
    }

    pub async fn by_content(content: &str, db: &Database) -> Result<Vec<CounterRecord>> {
        let rows: Vec<Row> = db
            .sql(BY_CONTENT)
            .bind(("content", content.to_owned()))
            .fetch_first()
            .await?;

        Ok(rows.into_iter().map(Row::into_record).collect())
    }

}
