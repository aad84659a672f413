//! Orchestrates normalization and the concurrent granularity pipelines.

use crate::normalizer::normalize;
use crate::pipeline::run_granularity;
use futures::future::try_join_all;
use racebar_common::{Granularity, RaceChart, RaceError, RaceOutcome, RawTable, Result};
use racebar_config::{Config, ConfigCache};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn, Span};

/// Turns raw tables into race charts.
///
/// Configuration is read from a shared [`ConfigCache`] at the start of every
/// call, so updates to the cache apply to the next table processed.
pub struct RaceOrchestrator {
    config: Arc<ConfigCache>,
}

impl RaceOrchestrator {
    /// Creates an orchestrator with a fixed configuration.
    pub fn new(config: Config) -> Self {
        Self::with_cache(Arc::new(ConfigCache::new(config)))
    }

    /// Creates an orchestrator reading from a shared configuration cache.
    pub const fn with_cache(config: Arc<ConfigCache>) -> Self {
        Self { config }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// Processes a raw table.
    ///
    /// Structural problems with the input come back as
    /// [`RaceOutcome::Failed`]. An `Err` means a pipeline died after the table
    /// was accepted, which is a bug rather than bad input.
    #[instrument(skip_all, fields(columns = raw.column_count(), rows = raw.row_count()))]
    pub async fn process(&self, raw: &RawTable) -> Result<RaceOutcome> {
        let config = self.config.get();

        let table = match normalize(raw, &config.normalize) {
            Ok(table) => Arc::new(table),
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "Rejected raw table");
                return Ok(RaceOutcome::Failed {
                    failed: err.to_string(),
                });
            }
        };

        let elements = table.elements();
        let year_span = table.year_span();
        let run_daily = year_span <= config.pipeline.daily_year_span_limit;
        let granularities: Vec<Granularity> = Granularity::ALL
            .into_iter()
            .filter(|granularity| *granularity != Granularity::Day || run_daily)
            .collect();
        info!(
            rows = table.len(),
            elements = elements.len(),
            year_span,
            run_daily,
            "Launching granularity pipelines"
        );

        let permits = Arc::new(Semaphore::new(config.pipeline.max_concurrent_pipelines.max(1)));
        let tasks = granularities.into_iter().map(|granularity| {
            let table = Arc::clone(&table);
            let config = Arc::clone(&config);
            let permits = Arc::clone(&permits);
            let span = Span::current();
            async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| RaceError::pipeline(granularity, e.to_string()))?;
                let snapshots = tokio::task::spawn_blocking(move || {
                    span.in_scope(|| run_granularity(&table, granularity, &config))
                })
                .await
                .map_err(|e| RaceError::pipeline(granularity, e.to_string()))?;
                Ok::<_, RaceError>((granularity, snapshots))
            }
        });
        let results = try_join_all(tasks).await?;

        let mut chart = RaceChart {
            elements,
            values_by_date: Vec::new(),
            values_by_date_monthly: Vec::new(),
            values_by_date_daily: None,
        };
        for (granularity, snapshots) in results {
            match granularity {
                Granularity::Year => chart.values_by_date = snapshots,
                Granularity::Month => chart.values_by_date_monthly = snapshots,
                Granularity::Day => chart.values_by_date_daily = Some(snapshots),
            }
        }

        info!(
            years = chart.values_by_date.len(),
            months = chart.values_by_date_monthly.len(),
            days = chart.values_by_date_daily.as_ref().map(Vec::len),
            "Race chart assembled"
        );
        Ok(RaceOutcome::Ready(chart))
    }
}

impl Default for RaceOrchestrator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
