//! Alert repository for loading rules and persisting evaluation outcomes

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Alert, AlertId, AlertRule, EvaluationRun, NewAlert};

/// Storage the runner reads its inputs from and writes its batches to.
///
/// `insert_alerts` and `resolve_alerts` must apply the whole batch or none of
/// it.
#[async_trait::async_trait]
pub trait AlertRepository: Send + Sync {
    /// All configured rules, enabled or not
    async fn list_rules(&self) -> Result<Vec<AlertRule>>;

    /// Alerts created at or after `since`, any status
    async fn recent_alerts(&self, since: DateTime<Utc>) -> Result<Vec<Alert>>;

    /// Every alert still pending
    async fn pending_alerts(&self) -> Result<Vec<Alert>>;

    /// Insert drafts as pending alerts created at `now`
    async fn insert_alerts(&self, drafts: &[NewAlert], now: DateTime<Utc>) -> Result<Vec<Alert>>;

    /// Mark alerts resolved by the engine. Returns how many were updated.
    async fn resolve_alerts(&self, ids: &[AlertId], now: DateTime<Utc>) -> Result<usize>;

    /// Store the summary of a pass
    async fn record_run(&self, run: &EvaluationRun) -> Result<()>;
}

/// Repository keeping everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryAlertRepository {
    rules: RwLock<Vec<AlertRule>>,
    alerts: RwLock<Vec<Alert>>,
    runs: RwLock<Vec<EvaluationRun>>,
}

impl InMemoryAlertRepository {
    /// Create a repository seeded with rules and existing alerts
    pub fn new(rules: Vec<AlertRule>, alerts: Vec<Alert>) -> Self {
        Self {
            rules: RwLock::new(rules),
            alerts: RwLock::new(alerts),
            runs: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of all stored alerts
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().clone()
    }

    /// Snapshot of all recorded runs
    pub fn runs(&self) -> Vec<EvaluationRun> {
        self.runs.read().clone()
    }
}

#[async_trait::async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn list_rules(&self) -> Result<Vec<AlertRule>> {
        Ok(self.rules.read().clone())
    }

    async fn recent_alerts(&self, since: DateTime<Utc>) -> Result<Vec<Alert>> {
        Ok(self
            .alerts
            .read()
            .iter()
            .filter(|alert| alert.created_at >= since)
            .cloned()
            .collect())
    }

    async fn pending_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self
            .alerts
            .read()
            .iter()
            .filter(|alert| alert.is_pending())
            .cloned()
            .collect())
    }

    async fn insert_alerts(&self, drafts: &[NewAlert], now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let created: Vec<Alert> = drafts
            .iter()
            .cloned()
            .map(|draft| draft.into_alert(Uuid::now_v7(), now))
            .collect();

        self.alerts.write().extend(created.iter().cloned());

        Ok(created)
    }

    async fn resolve_alerts(&self, ids: &[AlertId], now: DateTime<Utc>) -> Result<usize> {
        let mut alerts = self.alerts.write();

        // Check the whole batch before touching anything.
        if let Some(missing) = ids.iter().find(|id| !alerts.iter().any(|a| a.id == **id)) {
            return Err(Error::not_found("alert", missing.to_string()));
        }

        let mut updated = 0;
        for alert in alerts.iter_mut() {
            if alert.is_pending() && ids.contains(&alert.id) {
                alert.auto_resolve(now);
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn record_run(&self, run: &EvaluationRun) -> Result<()> {
        self.runs.write().push(run.clone());
        Ok(())
    }
}
