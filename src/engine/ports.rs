use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    AlertQuery, AlertRule, ApprovalSummary, Center, DqSummary, MetricsSnapshot, NewSentAlert,
    Priority, SentAlert,
};
use crate::error::Result;

/// Read-only sales/quality metrics for a (date, center) pair.
/// Implementations must not cache across evaluations.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn sales_volume(&self, date: NaiveDate, center_id: Uuid) -> Result<i64>;

    async fn underwriting_volume(&self, date: NaiveDate, center_id: Uuid) -> Result<i64>;

    async fn dq_percentage(&self, date: NaiveDate, center_id: Uuid) -> Result<DqSummary>;

    async fn approval_ratio(&self, date: NaiveDate, center_id: Uuid) -> Result<ApprovalSummary>;

    /// Most recent DQ category names for the date, newest first
    async fn top_dq_categories(
        &self,
        date: NaiveDate,
        center_id: Uuid,
        limit: i64,
    ) -> Result<Vec<String>>;

    /// Assemble a full snapshot for diagnostics
    async fn snapshot(&self, date: NaiveDate, center_id: Uuid) -> Result<MetricsSnapshot> {
        let sales_count = self.sales_volume(date, center_id).await?;
        let underwriting_count = self.underwriting_volume(date, center_id).await?;
        let dq = self.dq_percentage(date, center_id).await?;
        let approval = self.approval_ratio(date, center_id).await?;
        Ok(MetricsSnapshot {
            sales_count,
            underwriting_count,
            transfers: approval.transfers,
            dq_percentage: dq.percentage,
            dq_count: dq.count,
            approval_ratio: approval.ratio,
        })
    }
}

/// Centers as maintained by the admin subsystem
#[async_trait]
pub trait CenterStore: Send + Sync {
    async fn active_centers(&self) -> Result<Vec<Center>>;

    async fn center(&self, id: Uuid) -> Result<Option<Center>>;
}

/// Alert rules as maintained by the admin subsystem
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Enabled rules only
    async fn active_rules(&self) -> Result<Vec<AlertRule>>;
}

/// A user who may receive alert notifications
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Resolves rule recipient roles to concrete users
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Users whose role set overlaps `roles`
    async fn recipients_for_roles(&self, roles: &[String]) -> Result<Vec<Recipient>>;
}

/// Outcome of an acknowledgement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Acknowledged,
    /// First-write-wins: the original acknowledgement is untouched
    AlreadyAcknowledged,
    NotFound,
}

/// Append-only log of sent alerts
#[async_trait]
pub trait AlertLedger: Send + Sync {
    /// Whether the (rule, center) pair already fired at or after `since`
    async fn recent_alert(
        &self,
        rule_id: Uuid,
        center_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    async fn insert(&self, alert: NewSentAlert) -> Result<Uuid>;

    async fn acknowledge(
        &self,
        id: Uuid,
        acknowledged_by: &str,
        response_action: Option<&str>,
    ) -> Result<AckOutcome>;

    /// History rows joined with their rule's priority, newest first
    async fn history(&self, query: &AlertQuery) -> Result<Vec<(SentAlert, Priority)>>;
}

/// A browser push subscription registered by a user
#[derive(Debug, Clone)]
pub struct PushSubscription {
    pub endpoint: String,
    pub p256dh_key: String,
    pub auth_key: String,
}

/// Push subscriptions keyed by user
#[async_trait]
pub trait PushSubscriptionStore: Send + Sync {
    async fn active_subscriptions(&self, user_id: Uuid) -> Result<Vec<PushSubscription>>;

    /// Mark a subscription dead after the push service rejects it
    async fn deactivate(&self, endpoint: &str) -> Result<()>;
}
