//! Per-rule threshold checks.
//!
//! Each trigger type is its own predicate over a metrics read plus the
//! wall clock. They stay separate functions rather than one generic
//! comparator: zero-sales carries a time gate, milestone matches a band
//! instead of a threshold, and the duration check compares against an
//! hour-proportional target.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{AlertRule, Center, PendingAlert, TriggerType};
use crate::engine::clock::Clock;
use crate::engine::ports::MetricsProvider;
use crate::engine::template::render_template;
use crate::error::Result;

/// Achievement rungs checked by the milestone trigger, in ascending order.
/// A pass fires at most one rung (first match wins).
const MILESTONE_LADDER: [f64; 4] = [75.0, 100.0, 125.0, 150.0];

/// Width of the band above each milestone rung that still counts as
/// "just reached" (avoids re-announcing 100% at 130%)
const MILESTONE_BAND: f64 = 5.0;

/// How many DQ category names the high-DQ message lists
const TOP_DQ_ISSUES: i64 = 3;

/// Evaluates one (rule, center, date) triple against live metrics
pub struct RuleEvaluator {
    metrics: Arc<dyn MetricsProvider>,
    clock: Arc<dyn Clock>,
}

impl RuleEvaluator {
    pub fn new(metrics: Arc<dyn MetricsProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { metrics, clock }
    }

    /// Decide whether `rule` currently holds for `center` and build the
    /// alert message if it does. Pure except for metrics reads.
    pub async fn evaluate(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        match rule.trigger_type {
            TriggerType::LowSales => self.check_low_sales(rule, center, date).await,
            TriggerType::ZeroSales => self.check_zero_sales(rule, center, date).await,
            TriggerType::HighDq => self.check_high_dq(rule, center, date).await,
            TriggerType::LowApproval => self.check_low_approval(rule, center, date).await,
            TriggerType::Milestone => self.check_milestone(rule, center, date).await,
            TriggerType::BelowThresholdDuration => {
                self.check_below_threshold_duration(rule, center, date).await
            }
        }
    }

    /// Sales volume below a percentage of the daily target
    async fn check_low_sales(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        let sales = self.metrics.sales_volume(date, center.id).await?;
        let Some(percentage) = center.target_percentage(sales) else {
            return Ok(None);
        };

        if percentage >= rule.condition_threshold {
            return Ok(None);
        }

        let hours_remaining = hours_remaining_in_day(self.clock.now());
        let message = render_template(
            &rule.message_template,
            &[
                ("[Center]", center.name.clone()),
                ("[SalesCount]", sales.to_string()),
                ("[Target]", center.daily_sales_target.to_string()),
                ("[HoursRemaining]", hours_remaining.to_string()),
                ("[Percentage]", (percentage.round() as i64).to_string()),
            ],
        );

        debug!(
            center = %center.name,
            sales,
            percentage,
            threshold = rule.condition_threshold,
            "low_sales fired"
        );

        Ok(Some(self.pending(
            rule,
            center,
            message,
            json!({
                "sales": sales,
                "target": center.daily_sales_target,
                "percentage": percentage,
            }),
        )))
    }

    /// No sales at all, and it is already afternoon
    async fn check_zero_sales(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        let sales = self.metrics.sales_volume(date, center.id).await?;
        if sales != 0 {
            return Ok(None);
        }

        let current_hour = self.clock.now().hour();
        if current_hour < 12 {
            return Ok(None);
        }

        let message = render_template(
            &rule.message_template,
            &[
                ("[Center]", center.name.clone()),
                ("[Time]", format!("{current_hour}:00")),
            ],
        );

        Ok(Some(self.pending(
            rule,
            center,
            message,
            json!({ "sales": 0, "time": current_hour }),
        )))
    }

    /// DQ percentage strictly above threshold
    async fn check_high_dq(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        let dq = self.metrics.dq_percentage(date, center.id).await?;
        if dq.percentage <= rule.condition_threshold {
            return Ok(None);
        }

        let categories = self
            .metrics
            .top_dq_categories(date, center.id, TOP_DQ_ISSUES)
            .await?;
        let top_issues = if categories.is_empty() {
            "Unknown".to_string()
        } else {
            categories.join(", ")
        };

        let message = render_template(
            &rule.message_template,
            &[
                ("[Center]", center.name.clone()),
                ("[DQPercentage]", (dq.percentage.round() as i64).to_string()),
                ("[DQCount]", dq.count.to_string()),
                ("[TopIssues]", top_issues.clone()),
            ],
        );

        Ok(Some(self.pending(
            rule,
            center,
            message,
            json!({
                "dq_percentage": dq.percentage,
                "dq_count": dq.count,
                "top_issues": top_issues,
            }),
        )))
    }

    /// Submission/transfer ratio below threshold
    async fn check_low_approval(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        let approval = self.metrics.approval_ratio(date, center.id).await?;
        if approval.ratio >= rule.condition_threshold {
            return Ok(None);
        }

        let underwriting = self.metrics.underwriting_volume(date, center.id).await?;
        let message = render_template(
            &rule.message_template,
            &[
                ("[Center]", center.name.clone()),
                ("[ApprovalRatio]", (approval.ratio.round() as i64).to_string()),
                ("[SubmissionCount]", approval.submissions.to_string()),
                ("[UWCount]", underwriting.to_string()),
            ],
        );

        Ok(Some(self.pending(
            rule,
            center,
            message,
            json!({
                "approval_ratio": approval.ratio,
                "submissions": approval.submissions,
                "transfers": approval.transfers,
                "underwriting": underwriting,
            }),
        )))
    }

    /// Positive signal: target achievement just crossed a milestone rung
    async fn check_milestone(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        let sales = self.metrics.sales_volume(date, center.id).await?;
        let Some(percentage) = center.target_percentage(sales) else {
            return Ok(None);
        };

        // First matching rung only
        let Some(milestone) = MILESTONE_LADDER
            .iter()
            .copied()
            .find(|m| percentage >= *m && percentage < *m + MILESTONE_BAND)
        else {
            return Ok(None);
        };

        let message = render_template(
            &rule.message_template,
            &[
                ("[Center]", center.name.clone()),
                ("[Milestone]", format!("{}%", milestone as i64)),
                ("[SalesCount]", sales.to_string()),
                ("[Target]", center.daily_sales_target.to_string()),
            ],
        );

        Ok(Some(self.pending(
            rule,
            center,
            message,
            json!({
                "sales": sales,
                "target": center.daily_sales_target,
                "milestone": milestone as i64,
                "percentage": percentage,
            }),
        )))
    }

    /// Running behind the hour-proportional share of the daily target
    async fn check_below_threshold_duration(
        &self,
        rule: &AlertRule,
        center: &Center,
        date: NaiveDate,
    ) -> Result<Option<PendingAlert>> {
        let sales = self.metrics.sales_volume(date, center.id).await?;
        let current_hour = self.clock.now().hour();

        let proportional_target =
            center.daily_sales_target as f64 / 24.0 * f64::from(current_hour);
        if sales as f64 >= proportional_target * (rule.condition_threshold / 100.0) {
            return Ok(None);
        }

        let message = render_template(
            &rule.message_template,
            &[
                ("[Center]", center.name.clone()),
                ("[Hours]", current_hour.to_string()),
                ("[SalesCount]", sales.to_string()),
                ("[Target]", center.daily_sales_target.to_string()),
            ],
        );

        Ok(Some(self.pending(
            rule,
            center,
            message,
            json!({
                "sales": sales,
                "target": center.daily_sales_target,
                "hours": current_hour,
            }),
        )))
    }

    fn pending(
        &self,
        rule: &AlertRule,
        center: &Center,
        message: String,
        metadata: serde_json::Value,
    ) -> PendingAlert {
        PendingAlert {
            rule_id: rule.id,
            center_id: center.id,
            center_name: center.name.clone(),
            trigger_type: rule.trigger_type,
            priority: rule.priority,
            channels: rule.channels.clone(),
            recipient_roles: rule.recipient_roles.clone(),
            message,
            metadata,
        }
    }
}

/// Hours until 23:59:59 wall-clock, rounded up, floored at 0
pub fn hours_remaining_in_day(now: NaiveDateTime) -> i64 {
    let Some(end_of_day) = now.date().and_hms_opt(23, 59, 59) else {
        return 0;
    };
    let seconds = (end_of_day - now).num_seconds();
    ((seconds + 3599) / 3600).max(0)
}
