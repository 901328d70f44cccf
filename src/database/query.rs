use derive_new::new;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use surrealdb::opt::QueryResult;

use super::{DeserializeSnafu, QuerySnafu, Result};

/// Parameters can be bound using [Bindings::bind] which takes any serializable data structure.
///
/// # Example
/// ```ignore
/// let record: Option<CounterRow> = database
///     .sql("SELECT * FROM counters WHERE content = $content LIMIT 1")
///     .bind(("content", "sports"))
///     .fetch_first()
///     .await?;
/// ```
#[derive(Debug, new)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, surrealdb::engine::any::Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute every statement and fail on the first statement that returned an error.
    ///
    /// Statements inside a failed transaction all report an error, so a
    /// successful result means the whole transaction was committed.
    pub async fn execute(self) -> Result<surrealdb::Response> {
        let response = self
            .query
            .await
            .and_then(surrealdb::Response::check)
            .context(QuerySnafu)?;
        tracing::trace!(?response, "executed query");
        Ok(response)
    }

    /// Execute the query and return the first result as a deserialized value.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<T>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        let result = statements.take::<T>(0).context(DeserializeSnafu)?;
        Ok(result)
    }
}
