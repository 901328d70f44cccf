use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// RFC 822 with a numeric zone, e.g. `02 Jan 06 15:04 -0700`.
pub const BUCKET_FORMAT: &str = "%d %b %y %H:%M %z";

pub type Timestamp = DateTime<Utc>;

/// A string key identifying the time window an event was aggregated into.
///
/// Buckets produced by [TimeBucket::at] have minute resolution. Buckets coming
/// from a query are taken verbatim and only matched for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeBucket(String);

impl TimeBucket {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(timestamp: Timestamp) -> Self {
        Self(timestamp.format(BUCKET_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TimeBucket {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TimeBucket {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for TimeBucket {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn formats_as_rfc822_with_numeric_zone() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 59).unwrap();

        assert_eq!(TimeBucket::at(timestamp).as_str(), "01 Jan 24 00:00 +0000");
    }

    #[test]
    fn events_within_the_same_minute_share_a_bucket() {
        let first = Utc.with_ymd_and_hms(2024, 3, 9, 13, 45, 1).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 3, 9, 13, 45, 58).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 3, 9, 13, 46, 0).unwrap();

        assert_eq!(TimeBucket::at(first), TimeBucket::at(second));
        assert_ne!(TimeBucket::at(second), TimeBucket::at(next));
    }
}
