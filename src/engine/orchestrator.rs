//! Evaluation sweep: every active center against every enabled rule.
//!
//! The sweep is an at-least-effort batch job, not a transaction. A failure
//! on one (rule, center) pair is logged and the remaining pairs still run.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::dispatch::{NotificationDispatcher, NotificationMeta};
use crate::domain::{AlertRule, Center, NewSentAlert, PendingAlert};
use crate::engine::clock::Clock;
use crate::engine::evaluator::RuleEvaluator;
use crate::engine::gate::FrequencyGate;
use crate::engine::ports::{AlertLedger, CenterStore, RecipientDirectory, RuleStore};
use crate::error::{BeaconError, Result};

/// Counters for one sweep, surfaced through the cron HTTP response
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EvaluationSummary {
    pub date: NaiveDate,
    pub centers: usize,
    pub rules: usize,
    pub fired: usize,
    pub suppressed: usize,
    pub skipped_quiet: usize,
    pub failed: usize,
}

impl EvaluationSummary {
    fn new(date: NaiveDate, centers: usize, rules: usize) -> Self {
        Self {
            date,
            centers,
            rules,
            fired: 0,
            suppressed: 0,
            skipped_quiet: 0,
            failed: 0,
        }
    }
}

enum PairOutcome {
    /// Condition did not hold
    Idle,
    /// Condition held but the cooldown window swallowed it
    Suppressed,
    /// Persisted and dispatched
    Fired,
}

/// Drives the centers x rules sweep and the per-alert trigger path
pub struct EvaluationOrchestrator {
    centers: Arc<dyn CenterStore>,
    rules: Arc<dyn RuleStore>,
    ledger: Arc<dyn AlertLedger>,
    recipients: Arc<dyn RecipientDirectory>,
    evaluator: RuleEvaluator,
    gate: FrequencyGate,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    dashboard_url: Option<String>,
}

impl EvaluationOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        centers: Arc<dyn CenterStore>,
        rules: Arc<dyn RuleStore>,
        ledger: Arc<dyn AlertLedger>,
        recipients: Arc<dyn RecipientDirectory>,
        evaluator: RuleEvaluator,
        gate: FrequencyGate,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            centers,
            rules,
            ledger,
            recipients,
            evaluator,
            gate,
            dispatcher,
            clock,
            dashboard_url: None,
        }
    }

    /// Dashboard URL embedded in notification action buttons
    pub fn with_dashboard_url(mut self, url: Option<String>) -> Self {
        self.dashboard_url = url;
        self
    }

    /// Evaluate all active centers against all enabled rules for `date`
    pub async fn evaluate_all_centers(&self, date: NaiveDate) -> Result<EvaluationSummary> {
        let centers = self.centers.active_centers().await?;
        let rules = self.rules.active_rules().await?;
        let summary = self.sweep(&centers, &rules, date).await;

        info!(
            %date,
            centers = summary.centers,
            rules = summary.rules,
            fired = summary.fired,
            suppressed = summary.suppressed,
            failed = summary.failed,
            "alert evaluation completed"
        );
        Ok(summary)
    }

    /// Diagnostic path: same per-pair logic, one center
    pub async fn check_single_center(
        &self,
        center_id: Uuid,
        date: NaiveDate,
    ) -> Result<EvaluationSummary> {
        let center = self
            .centers
            .center(center_id)
            .await?
            .ok_or_else(|| BeaconError::CenterNotFound(center_id.to_string()))?;
        let rules = self.rules.active_rules().await?;
        let summary = self.sweep(std::slice::from_ref(&center), &rules, date).await;

        info!(
            %date,
            center = %center.name,
            fired = summary.fired,
            suppressed = summary.suppressed,
            "single-center check completed"
        );
        Ok(summary)
    }

    async fn sweep(
        &self,
        centers: &[Center],
        rules: &[AlertRule],
        date: NaiveDate,
    ) -> EvaluationSummary {
        let current_time = self.clock.now().time();
        let mut summary = EvaluationSummary::new(date, centers.len(), rules.len());

        for center in centers {
            for rule in rules {
                if in_quiet_hours(rule, current_time) {
                    debug!(rule = %rule.name, center = %center.name, "skipped: quiet hours");
                    summary.skipped_quiet += 1;
                    continue;
                }

                match self.evaluate_pair(rule, center, date).await {
                    Ok(PairOutcome::Fired) => summary.fired += 1,
                    Ok(PairOutcome::Suppressed) => summary.suppressed += 1,
                    Ok(PairOutcome::Idle) => {}
                    Err(e) => {
                        warn!(
                            rule = %rule.name,
                            center = %center.name,
                            error = %e,
                            "rule evaluation failed, continuing sweep"
                        );
                        summary.failed += 1;
                    }
                }
            }
        }
        summary
    }

    async fn evaluate_pair(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<PairOutcome> {
        match self.evaluator.evaluate(rule, center, date).await? {
            Some(alert) => self.trigger(alert).await,
            None => Ok(PairOutcome::Idle),
        }
    }

    /// Gate, persist, dispatch. Ledger insert failure aborts delivery:
    /// an alert must not go out without an auditable record.
    async fn trigger(&self, alert: PendingAlert) -> Result<PairOutcome> {
        if self
            .gate
            .should_suppress(alert.rule_id, alert.center_id)
            .await?
        {
            info!(
                center = %alert.center_name,
                trigger = %alert.trigger_type,
                "alert suppressed by frequency cap"
            );
            return Ok(PairOutcome::Suppressed);
        }

        let recipients = self
            .recipients
            .recipients_for_roles(&alert.recipient_roles)
            .await?;
        let emails: Vec<String> = recipients.iter().map(|r| r.email.clone()).collect();

        let alert_id = self
            .ledger
            .insert(NewSentAlert {
                rule_id: alert.rule_id,
                center_id: alert.center_id,
                alert_type: alert.trigger_type,
                message: alert.message.clone(),
                channels_sent: alert.channels.clone(),
                recipients: emails.clone(),
                metadata: alert.metadata.clone(),
            })
            .await?;

        let meta = NotificationMeta {
            center_name: alert.center_name.clone(),
            priority: alert.priority,
            trigger_type: Some(alert.trigger_type),
            recipients: emails,
            push_user_ids: recipients.iter().map(|r| r.id).collect(),
            action_items: Vec::new(),
            dashboard_url: self.dashboard_url.clone(),
        };

        let results = self
            .dispatcher
            .dispatch(&alert.channels, &alert.message, &meta)
            .await;
        for result in &results {
            if !result.success {
                warn!(
                    %alert_id,
                    channel = %result.channel,
                    error = ?result.error,
                    "channel delivery failed"
                );
            }
        }

        info!(
            %alert_id,
            center = %alert.center_name,
            trigger = %alert.trigger_type,
            priority = %alert.priority,
            channels = ?alert.channels,
            "alert dispatched"
        );
        Ok(PairOutcome::Fired)
    }
}

/// Quiet-hours window check, wraparound-aware: `start > end` means the
/// window spans midnight (e.g. 22:00-07:00).
pub fn in_quiet_hours(rule: &AlertRule, now: NaiveTime) -> bool {
    let (Some(start_raw), Some(end_raw)) = (&rule.quiet_hours_start, &rule.quiet_hours_end)
    else {
        return false;
    };

    let (Ok(start), Ok(end)) = (
        NaiveTime::parse_from_str(start_raw, "%H:%M"),
        NaiveTime::parse_from_str(end_raw, "%H:%M"),
    ) else {
        warn!(rule = %rule.name, start = %start_raw, end = %end_raw, "unparseable quiet hours, window ignored");
        return false;
    };

    if start <= end {
        now >= start && now <= end
    } else {
        now >= start || now <= end
    }
}
