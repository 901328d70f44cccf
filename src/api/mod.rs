use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod error;
mod state;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/view", get(view::record).post(view::record))
        .route("/view/", get(view::record).post(view::record))
        .route("/stats", get(stats::lookup))
        .route("/stats/", get(stats::lookup))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app)
}

async fn welcome() -> &'static str {
    "Welcome to tally, record a view at /view/ and read counters at /stats/"
}

pub mod view {
    use axum::extract::{Query, State};
    use serde::Deserialize;
    use snafu::OptionExt;
    use tracing::instrument;

    use super::{App, Result, UnknownContentSnafu};

    #[derive(Debug, Deserialize)]
    pub struct ViewParams {
        pub content: Option<String>,
    }

    /// Record a view for the given content type, or a random one when none is given.
    #[instrument(skip(app))]
    pub async fn record(State(app): State<App>, Query(params): Query<ViewParams>) -> Result<String> {
        let content = match params.content.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => app
                .recorder
                .catalog()
                .get(name)
                .cloned()
                .context(UnknownContentSnafu { content: name })?,
            None => app.recorder.random_content(),
        };

        let outcome = app.recorder.on_view(&content).await?;

        Ok(format!("you clicked a \"{}\" type page", outcome.content))
    }
}

pub mod stats {
    use axum::extract::{Query, State};
    use axum::Json;
    use serde::Deserialize;
    use tracing::instrument;

    use super::{App, Result};
    use crate::model::CounterRecord;

    #[derive(Debug, Deserialize)]
    pub struct StatsParams {
        pub content: Option<String>,
        pub time: Option<String>,
    }

    #[instrument(skip(app))]
    pub async fn lookup(
        State(app): State<App>, Query(params): Query<StatsParams>,
    ) -> Result<Json<CounterRecord>> {
        let record = app
            .query
            .query(params.content.as_deref(), params.time.as_deref())
            .await?;

        Ok(Json(record))
    }
}
