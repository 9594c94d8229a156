//! Single-pass runner: fetch inputs, evaluate, persist both batches

use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ingest::LogSource;
use crate::models::EvaluationRun;

use super::batch::{evaluate_batch, EvaluationBatches};
use super::repository::AlertRepository;

/// Everything a pass decided, plus its bookkeeping record
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    /// Run summary, as recorded in the repository
    pub run: EvaluationRun,
    /// The decisions of the pass; empty if inputs could not be fetched
    pub batches: EvaluationBatches,
}

/// Runs evaluation passes against a repository and a log source
pub struct AlertRunner<R, S> {
    repository: R,
    source: S,
    config: EngineConfig,
}

impl<R, S> AlertRunner<R, S>
where
    R: AlertRepository,
    S: LogSource,
{
    /// Create a new runner
    pub fn new(repository: R, source: S, config: EngineConfig) -> Self {
        Self {
            repository,
            source,
            config,
        }
    }

    /// The repository this runner writes to
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Run one pass evaluated at `now`.
    ///
    /// Never fails: a fetch failure is reported in `run.error`, persistence
    /// failures in `run.errors`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> PassOutcome {
        let started = Instant::now();
        let mut run = EvaluationRun::new(now);

        let batches = match self.execute(now, &mut run).await {
            Ok(batches) => batches,
            Err(e) => {
                error!(error = %e, "Evaluation pass failed");
                run.error = Some(e.to_string());
                EvaluationBatches::default()
            }
        };

        run.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if let Err(e) = self.repository.record_run(&run).await {
            warn!(run_id = %run.id, error = %e, "Failed to record evaluation run");
        }

        info!(
            run_id = %run.id,
            rules = run.rules_evaluated,
            logs = run.logs_analyzed,
            created = run.alerts_created,
            resolved = run.alerts_resolved,
            duration_ms = run.duration_ms,
            errors = run.errors.len(),
            "Evaluation pass complete"
        );

        PassOutcome { run, batches }
    }

    async fn execute(&self, now: DateTime<Utc>, run: &mut EvaluationRun) -> Result<EvaluationBatches> {
        let rules = self.repository.list_rules().await?;
        let history_start = now - Duration::hours(i64::from(self.config.alert_history_hours));
        let recent_alerts = self.repository.recent_alerts(history_start).await?;
        let pending_alerts = self.repository.pending_alerts().await?;

        let log_start = now - Duration::minutes(i64::from(self.config.log_window_minutes));
        let logs = self
            .source
            .fetch_logs(log_start, now, self.config.max_logs)
            .await?;

        let batches = evaluate_batch(&rules, &logs, &recent_alerts, &pending_alerts, now);

        run.rules_evaluated = batches.rules_evaluated;
        run.logs_analyzed = logs.len();
        run.alerts_created = batches.to_create.len();
        run.alerts_resolved = batches.to_resolve.len();

        if !batches.to_create.is_empty() {
            if let Err(e) = self.repository.insert_alerts(&batches.to_create, now).await {
                error!(count = batches.to_create.len(), error = %e, "Failed to create alerts");
                run.errors.push(format!("Failed to create alerts: {e}"));
            }
        }

        if !batches.to_resolve.is_empty() {
            if let Err(e) = self.repository.resolve_alerts(&batches.to_resolve, now).await {
                error!(count = batches.to_resolve.len(), error = %e, "Failed to auto-resolve alerts");
                run.errors.push(format!("Failed to auto-resolve alerts: {e}"));
            }
        }

        Ok(batches)
    }
}
