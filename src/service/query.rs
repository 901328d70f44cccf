use std::sync::Arc;

use derive_new::new;
use snafu::{ensure, Location, OptionExt, ResultExt, Snafu};
use tracing::instrument;

use super::rate_limiter::RateLimiter;
use crate::database::{orm, Database, DatabaseError};
use crate::model::{Catalog, CounterRecord, TimeBucket};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QueryError {
    #[snafu(display("too many requests, please slow down"))]
    RateLimited,

    #[snafu(display("query parameter `{name}` is missing"))]
    MissingParameter { name: &'static str },

    #[snafu(display("`{content}` is not a known content type"))]
    UnknownContent { content: String },

    #[snafu(display("no counters recorded for `{content}` at `{time}`"))]
    NotFound { content: String, time: String },

    #[snafu(display("could not look up counters: {source}"))]
    Lookup {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Answers point lookups against flushed counter records.
///
/// Only the table is consulted, so counts recorded since the last flush are
/// not visible yet.
#[derive(Debug, Clone, new)]
pub struct QueryService {
    database: Database,
    catalog: Catalog,
    limiter: Arc<RateLimiter>,
}

impl QueryService {
    #[instrument(skip(self))]
    pub async fn query(
        &self, content: Option<&str>, time: Option<&str>,
    ) -> Result<CounterRecord, QueryError> {
        ensure!(self.limiter.allow(), RateLimitedSnafu);

        let content = required("content", content)?;
        let time = TimeBucket::from(required("time", time)?);

        let content = self
            .catalog
            .get(content)
            .context(UnknownContentSnafu { content })?;

        orm::counters::find(content.as_str(), &time, &self.database)
            .await
            .context(LookupSnafu)?
            .context(NotFoundSnafu {
                content: content.as_str(),
                time: time.as_str(),
            })
    }
}

fn required<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, QueryError> {
    value
        .filter(|value| !value.is_empty())
        .context(MissingParameterSnafu { name })
}
