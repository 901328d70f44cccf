use std::sync::Arc;

use derive_new::new;

use crate::config::Settings;
use crate::database::Database;
use crate::service::counter_store::CounterStore;
use crate::service::flusher::Flusher;
use crate::service::query::QueryService;
use crate::service::rate_limiter::RateLimiter;
use crate::service::recorder::Recorder;

/// State shared by every request handler.
#[derive(Debug, Clone, new)]
pub struct App {
    pub recorder: Recorder,
    pub query: QueryService,
}

/// Wire the services around one live counter store. The returned [Flusher] is
/// the only other holder of the store and is expected to be spawned by the caller.
pub fn create_app(database: Database, settings: Settings) -> (App, Flusher) {
    let Settings {
        catalog,
        rate_limit,
        simulation,
        ..
    } = settings;

    let store = Arc::new(CounterStore::new());
    let limiter = Arc::new(RateLimiter::new(rate_limit));

    let recorder = Recorder::new(store.clone(), catalog.clone(), simulation);
    let query = QueryService::new(database.clone(), catalog, limiter);
    let flusher = Flusher::new(store, database);

    (App::new(recorder, query), flusher)
}
