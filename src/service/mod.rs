//! The counter aggregation engine.
//!
//! Views and clicks land in the [counter_store::CounterStore] through the
//! [recorder::Recorder]. The [flusher::Flusher] periodically moves them into
//! the `counters` table, where the [query::QueryService] reads them behind a
//! [rate_limiter::RateLimiter].

pub mod counter_store;
pub mod flusher;
pub mod query;
pub mod rate_limiter;
pub mod recorder;
