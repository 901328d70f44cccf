use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::Surreal;
use url::Url;

/// Helper for executing SurrealQL with bound parameters.
pub mod query;

/// Table level operations.
pub mod orm;

pub use query::Bindings;

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

const SETUP: &str = include_str!("../../schema.surrealql");

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{url}`: {source}"))]
    Connect {
        url: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to set up the database schema: {source}"))]
    Setup {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to query the database: {source}"))]
    Query {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize the database response: {source}"))]
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url", default = "default_url")]
    pub url: Url,
    #[serde(rename = "surreal_ns", default = "default_name")]
    pub namespace: String,
    #[serde(rename = "surreal_db", default = "default_name")]
    pub database: String,
    #[serde(flatten)]
    pub credentials: Option<DatabaseCredentials>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            namespace: default_name(),
            database: default_name(),
            credentials: None,
        }
    }
}

fn default_url() -> Url {
    Url::parse("mem://").expect("`mem://` is a valid url")
}

fn default_name() -> String {
    "tally".to_owned()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseCredentials {
    #[serde(rename = "surreal_user")]
    pub username: String,
    #[serde(rename = "surreal_pass")]
    pub password: String,
}

/// Handle to the transactional store holding flushed counter records.
///
/// Cloning is cheap, every clone talks to the same underlying engine.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    /// Connect to the configured endpoint, sign in when credentials are given
    /// and apply the table schema.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.as_str();

        let database = surrealdb::engine::any::connect(url)
            .await
            .context(ConnectSnafu { url })?;

        if let Some(credentials) = &config.credentials {
            database
                .signin(auth::Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &credentials.username,
                    password: &credentials.password,
                })
                .await
                .context(ConnectSnafu { url })?;
        }

        database
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .context(ConnectSnafu { url })?;

        database
            .query(SETUP)
            .await
            .and_then(surrealdb::Response::check)
            .context(SetupSnafu)?;

        tracing::info!(%url, namespace = %config.namespace, database = %config.database, "connected to the database");

        Ok(Self { database })
    }

    /// A fresh in-memory instance with the schema applied.
    pub async fn memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::default()).await
    }

    /// Create a builder to execute arbitrary SurrealQL on the database.
    pub fn sql(&self, query: &str) -> Bindings<'_> {
        Bindings::new(self.database.query(query))
    }
}
