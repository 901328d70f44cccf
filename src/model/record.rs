use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{ContentType, Counter, TimeBucket};

/// An immutable snapshot of a live counter, as stored in the `counters` table
/// and returned by the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(rename_all = "PascalCase")]
pub struct CounterRecord {
    pub time: TimeBucket,
    pub content: String,
    pub view: u64,
    pub click: u64,
}

/// One drained entry of the live counter store.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Snapshot {
    pub content: ContentType,
    pub bucket: TimeBucket,
    pub counter: Counter,
}

impl From<&Snapshot> for CounterRecord {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            time: snapshot.bucket.clone(),
            content: snapshot.content.to_string(),
            view: snapshot.counter.view,
            click: snapshot.counter.click,
        }
    }
}
