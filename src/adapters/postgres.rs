//! PostgreSQL adapter implementing every provider seam the engine needs:
//! metrics reads over daily_deal_flow/dq_items, center and rule stores,
//! the alerts_sent ledger, the user directory, and push subscriptions.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    AckFilter, AlertQuery, AlertRule, ApprovalSummary, Center, DqSummary, NewSentAlert, Priority,
    SentAlert, TriggerType,
};
use crate::engine::ports::{
    AckOutcome, AlertLedger, CenterStore, MetricsProvider, PushSubscription,
    PushSubscriptionStore, Recipient, RecipientDirectory, RuleStore,
};
use crate::error::Result;

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a PostgreSQL store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Entries logged for the date, regardless of outcome
    async fn transfer_count(&self, date: NaiveDate, center_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM daily_deal_flow WHERE date = $1 AND center_id = $2",
        )
        .bind(date)
        .bind(center_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl MetricsProvider for PostgresStore {
    /// Sales = entries pending approval with a submitted call result
    async fn sales_volume(&self, date: NaiveDate, center_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM daily_deal_flow
            WHERE date = $1 AND center_id = $2
              AND status = 'Pending Approval' AND call_result = 'Submitted'
            "#,
        )
        .bind(date)
        .bind(center_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn underwriting_volume(&self, date: NaiveDate, center_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM daily_deal_flow
            WHERE date = $1 AND center_id = $2
              AND status = 'Pending Approval' AND call_result = 'Underwriting'
            "#,
        )
        .bind(date)
        .bind(center_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn dq_percentage(&self, date: NaiveDate, center_id: Uuid) -> Result<DqSummary> {
        let transfers = self.transfer_count(date, center_id).await?;
        if transfers == 0 {
            return Ok(DqSummary::default());
        }

        let dq_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM dq_items WHERE discovered_date = $1 AND center_id = $2",
        )
        .bind(date)
        .bind(center_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DqSummary {
            percentage: round2(dq_count as f64 / transfers as f64 * 100.0),
            count: dq_count,
        })
    }

    async fn approval_ratio(&self, date: NaiveDate, center_id: Uuid) -> Result<ApprovalSummary> {
        let transfers = self.transfer_count(date, center_id).await?;
        let submissions = self.sales_volume(date, center_id).await?;
        if transfers == 0 {
            return Ok(ApprovalSummary {
                ratio: 0.0,
                submissions,
                transfers,
            });
        }

        Ok(ApprovalSummary {
            ratio: round2(submissions as f64 / transfers as f64 * 100.0),
            submissions,
            transfers,
        })
    }

    async fn top_dq_categories(
        &self,
        date: NaiveDate,
        center_id: Uuid,
        limit: i64,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT dq_category FROM dq_items
            WHERE discovered_date = $1 AND center_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(date)
        .bind(center_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.get::<String, _>("dq_category"))
            .collect())
    }
}

fn center_from_row(row: &sqlx::postgres::PgRow) -> Center {
    Center {
        id: row.get("id"),
        name: row.get("center_name"),
        daily_sales_target: row.get("daily_sales_target"),
        region: row.get("region"),
        location: row.get("location"),
        active: row.get("active"),
    }
}

#[async_trait]
impl CenterStore for PostgresStore {
    async fn active_centers(&self) -> Result<Vec<Center>> {
        let rows = sqlx::query(
            r#"
            SELECT id, center_name, daily_sales_target, region, location, active
            FROM centers WHERE active = TRUE
            ORDER BY center_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(center_from_row).collect())
    }

    async fn center(&self, id: Uuid) -> Result<Option<Center>> {
        let row = sqlx::query(
            r#"
            SELECT id, center_name, daily_sales_target, region, location, active
            FROM centers WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(center_from_row))
    }
}

#[async_trait]
impl RuleStore for PostgresStore {
    async fn active_rules(&self) -> Result<Vec<AlertRule>> {
        let rows = sqlx::query(
            r#"
            SELECT id, rule_name, trigger_type, condition_threshold,
                   message_template, recipient_roles, channels, priority,
                   enabled, quiet_hours_start, quiet_hours_end
            FROM alert_rules WHERE enabled = TRUE
            ORDER BY rule_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        // Rows with unknown trigger/priority values are skipped, not fatal:
        // one bad admin edit must not stop the whole sweep.
        let mut rules = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.get("rule_name");
            let trigger_raw: String = row.get("trigger_type");
            let priority_raw: String = row.get("priority");

            let (Some(trigger_type), Some(priority)) = (
                TriggerType::parse(&trigger_raw),
                Priority::parse(&priority_raw),
            ) else {
                warn!(
                    rule = %name,
                    trigger = %trigger_raw,
                    priority = %priority_raw,
                    "skipping rule with unknown trigger or priority"
                );
                continue;
            };

            rules.push(AlertRule {
                id: row.get("id"),
                name,
                trigger_type,
                condition_threshold: row.get("condition_threshold"),
                message_template: row.get("message_template"),
                recipient_roles: row.get("recipient_roles"),
                channels: row.get("channels"),
                priority,
                enabled: row.get("enabled"),
                quiet_hours_start: row.get("quiet_hours_start"),
                quiet_hours_end: row.get("quiet_hours_end"),
            });
        }
        Ok(rules)
    }
}

#[async_trait]
impl RecipientDirectory for PostgresStore {
    async fn recipients_for_roles(&self, roles: &[String]) -> Result<Vec<Recipient>> {
        if roles.is_empty() {
            return Ok(vec![]);
        }

        let rows = sqlx::query("SELECT id, email, name FROM users WHERE roles && $1")
            .bind(roles)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Recipient {
                id: row.get("id"),
                email: row.get("email"),
                name: row.get("name"),
            })
            .collect())
    }
}

fn sent_alert_from_row(row: &sqlx::postgres::PgRow) -> Option<(SentAlert, Priority)> {
    let alert_type_raw: String = row.get("alert_type");
    let priority_raw: String = row.get("priority");
    let (alert_type, priority) = (
        TriggerType::parse(&alert_type_raw)?,
        Priority::parse(&priority_raw)?,
    );

    Some((
        SentAlert {
            id: row.get("id"),
            rule_id: row.get("rule_id"),
            center_id: row.get("center_id"),
            alert_type,
            message: row.get("message"),
            channels_sent: row.get("channels_sent"),
            recipients: row.get("recipients"),
            sent_at: row.get("sent_at"),
            metadata: row.get("metadata"),
            acknowledged_by: row.get("acknowledged_by"),
            acknowledged_at: row.get("acknowledged_at"),
            response_action: row.get("response_action"),
        },
        priority,
    ))
}

#[async_trait]
impl AlertLedger for PostgresStore {
    async fn recent_alert(
        &self,
        rule_id: Uuid,
        center_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM alerts_sent
                WHERE rule_id = $1 AND center_id = $2 AND sent_at >= $3
            )
            "#,
        )
        .bind(rule_id)
        .bind(center_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(self, alert), fields(rule_id = %alert.rule_id, center_id = %alert.center_id))]
    async fn insert(&self, alert: NewSentAlert) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO alerts_sent
                (rule_id, center_id, alert_type, message, channels_sent,
                 recipients, sent_at, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(alert.rule_id)
        .bind(alert.center_id)
        .bind(alert.alert_type.as_str())
        .bind(&alert.message)
        .bind(&alert.channels_sent)
        .bind(&alert.recipients)
        .bind(Utc::now())
        .bind(&alert.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    /// First-write-wins: the guard on acknowledged_at makes repeated
    /// acknowledgement a no-op.
    async fn acknowledge(
        &self,
        id: Uuid,
        acknowledged_by: &str,
        response_action: Option<&str>,
    ) -> Result<AckOutcome> {
        let updated = sqlx::query(
            r#"
            UPDATE alerts_sent
            SET acknowledged_by = $2, acknowledged_at = NOW(), response_action = $3
            WHERE id = $1 AND acknowledged_at IS NULL
            "#,
        )
        .bind(id)
        .bind(acknowledged_by)
        .bind(response_action)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 1 {
            return Ok(AckOutcome::Acknowledged);
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM alerts_sent WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Ok(AckOutcome::AlreadyAcknowledged)
        } else {
            Ok(AckOutcome::NotFound)
        }
    }

    async fn history(&self, query: &AlertQuery) -> Result<Vec<(SentAlert, Priority)>> {
        let since = Utc::now() - Duration::days(query.days.max(1));

        let rows = match query.center_id {
            Some(center_id) => {
                sqlx::query(
                    r#"
                    SELECT a.id, a.rule_id, a.center_id, a.alert_type, a.message,
                           a.channels_sent, a.recipients, a.sent_at, a.metadata,
                           a.acknowledged_by, a.acknowledged_at, a.response_action,
                           r.priority
                    FROM alerts_sent a
                    JOIN alert_rules r ON r.id = a.rule_id
                    WHERE a.sent_at >= $1 AND a.center_id = $2
                    ORDER BY a.sent_at DESC
                    "#,
                )
                .bind(since)
                .bind(center_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT a.id, a.rule_id, a.center_id, a.alert_type, a.message,
                           a.channels_sent, a.recipients, a.sent_at, a.metadata,
                           a.acknowledged_by, a.acknowledged_at, a.response_action,
                           r.priority
                    FROM alerts_sent a
                    JOIN alert_rules r ON r.id = a.rule_id
                    WHERE a.sent_at >= $1
                    ORDER BY a.sent_at DESC
                    "#,
                )
                .bind(since)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut alerts: Vec<(SentAlert, Priority)> =
            rows.iter().filter_map(sent_alert_from_row).collect();

        match query.status {
            AckFilter::Acknowledged => alerts.retain(|(a, _)| a.is_acknowledged()),
            AckFilter::Unacknowledged => alerts.retain(|(a, _)| !a.is_acknowledged()),
            AckFilter::All => {}
        }
        if let Some(priority) = query.priority {
            alerts.retain(|(_, p)| *p == priority);
        }

        Ok(alerts)
    }
}

#[async_trait]
impl PushSubscriptionStore for PostgresStore {
    async fn active_subscriptions(&self, user_id: Uuid) -> Result<Vec<PushSubscription>> {
        let rows = sqlx::query(
            r#"
            SELECT endpoint, p256dh_key, auth_key FROM push_subscriptions
            WHERE user_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PushSubscription {
                endpoint: row.get("endpoint"),
                p256dh_key: row.get("p256dh_key"),
                auth_key: row.get("auth_key"),
            })
            .collect())
    }

    async fn deactivate(&self, endpoint: &str) -> Result<()> {
        sqlx::query("UPDATE push_subscriptions SET is_active = FALSE WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
