use std::sync::Arc;
use std::time::Duration;

use derive_new::new;
use rand::Rng;
use snafu::{ensure, Location, Snafu};
use tracing::instrument;

use super::counter_store::CounterStore;
use crate::model::{Catalog, ContentType, TimeBucket};

/// Stand-in for the work a real request would do after a view is counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulation {
    /// Upper bound of the random processing delay.
    pub max_delay: Duration,
    /// Probability that processing fails.
    pub failure_rate: f64,
    /// Probability that a view is followed by a click.
    pub click_probability: f64,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            max_delay: Duration::from_millis(50),
            failure_rate: 0.0,
            click_probability: 0.5,
        }
    }
}

#[derive(Debug, Snafu, Clone, PartialEq)]
pub enum SimulationConfigError {
    #[snafu(display("{name} must be a probability between 0 and 1, got {value}"))]
    InvalidProbability { name: &'static str, value: f64 },
}

impl Simulation {
    /// Instant, never failing, never clicking.
    pub fn disabled() -> Self {
        Self {
            max_delay: Duration::ZERO,
            failure_rate: 0.0,
            click_probability: 0.0,
        }
    }

    pub fn validate(&self) -> Result<(), SimulationConfigError> {
        for (name, value) in [
            ("processing failure rate", self.failure_rate),
            ("click probability", self.click_probability),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                InvalidProbabilitySnafu { name, value }
            );
        }
        Ok(())
    }

    fn plan(&self) -> Plan {
        let mut rng = rand::thread_rng();
        let max_delay = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);

        Plan {
            delay: Duration::from_millis(rng.gen_range(0..=max_delay)),
            fail: rng.gen_bool(self.failure_rate),
            click: rng.gen_bool(self.click_probability),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Plan {
    delay: Duration,
    fail: bool,
    click: bool,
}

#[derive(Debug, Snafu)]
pub enum ProcessingError {
    #[snafu(display("could not process the `{content}` view"))]
    Simulated {
        content: ContentType,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOutcome {
    pub content: ContentType,
    pub bucket: TimeBucket,
    pub clicked: bool,
}

/// Translates inbound engagement signals into counter store increments.
#[derive(Debug, Clone, new)]
pub struct Recorder {
    store: Arc<CounterStore>,
    catalog: Catalog,
    simulation: Simulation,
}

impl Recorder {
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn random_content(&self) -> ContentType {
        self.catalog.random(&mut rand::thread_rng()).clone()
    }

    /// Count a view in the current bucket.
    pub async fn on_view(&self, content: &ContentType) -> Result<ViewOutcome, ProcessingError> {
        self.on_view_at(content, TimeBucket::now()).await
    }

    /// Count a view, simulate processing it, and maybe follow it with a click
    /// in the same bucket.
    ///
    /// A processing failure skips the click; the view stays counted.
    #[instrument(skip_all, fields(%content, %bucket))]
    pub async fn on_view_at(
        &self, content: &ContentType, bucket: TimeBucket,
    ) -> Result<ViewOutcome, ProcessingError> {
        self.store.record_view(content, &bucket);

        let plan = self.simulation.plan();
        if !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }

        ensure!(
            !plan.fail,
            SimulatedSnafu {
                content: content.clone()
            }
        );

        if plan.click {
            self.on_click(content, &bucket);
        }

        tracing::debug!(clicked = plan.click, "recorded view");

        Ok(ViewOutcome {
            content: content.clone(),
            bucket,
            clicked: plan.click,
        })
    }

    pub fn on_click(&self, content: &ContentType, bucket: &TimeBucket) {
        self.store.record_click(content, bucket);
    }
}
