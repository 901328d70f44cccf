use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use tally::api::{create_app, create_router};
use tally::config::Config;
use tally::database::Database;
use tally::error::{
    ApplicationError, BindAddressSnafu, ConfigLoadSnafu, ConnectDatabaseSnafu, WebServerSnafu,
};
use tally::logger;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env().context(ConfigLoadSnafu)?;
    let settings = config.settings().context(ConfigLoadSnafu)?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.database)
        .await
        .context(ConnectDatabaseSnafu)?;

    let flush_interval = settings.flush_interval;
    let (app, flusher) = create_app(database, settings);
    let flush_task = flusher.spawn(flush_interval);

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;
    tracing::info!(address = %config.host, "listening");

    axum::serve(listener, create_router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context(WebServerSnafu)?;

    tracing::info!("shutting down");
    flush_task.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "could not listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
}
