use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::{Priority, TriggerType};

/// A rule condition that held for a center, ready for the trigger path
/// (dedup gate, ledger insert, dispatch). Not yet persisted.
#[derive(Debug, Clone)]
pub struct PendingAlert {
    pub rule_id: Uuid,
    pub center_id: Uuid,
    pub center_name: String,
    pub trigger_type: TriggerType,
    pub priority: Priority,
    pub channels: Vec<String>,
    pub recipient_roles: Vec<String>,
    pub message: String,
    pub metadata: serde_json::Value,
}

/// Insert payload for the alert ledger. `sent_at` is stamped by the store.
#[derive(Debug, Clone)]
pub struct NewSentAlert {
    pub rule_id: Uuid,
    pub center_id: Uuid,
    pub alert_type: TriggerType,
    pub message: String,
    /// The rule's configured channels, recorded as intent-to-send
    /// regardless of per-channel delivery outcome
    pub channels_sent: Vec<String>,
    pub recipients: Vec<String>,
    pub metadata: serde_json::Value,
}

/// A row of the append-only alerts_sent ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentAlert {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub center_id: Uuid,
    pub alert_type: TriggerType,
    pub message: String,
    pub channels_sent: Vec<String>,
    pub recipients: Vec<String>,
    pub sent_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub response_action: Option<String>,
}

impl SentAlert {
    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged_at.is_some()
    }
}

/// Acknowledgement filter for history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckFilter {
    All,
    Acknowledged,
    Unacknowledged,
}

impl Default for AckFilter {
    fn default() -> Self {
        AckFilter::All
    }
}

/// History query parameters
#[derive(Debug, Clone)]
pub struct AlertQuery {
    pub center_id: Option<Uuid>,
    pub days: i64,
    pub status: AckFilter,
    pub priority: Option<Priority>,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            center_id: None,
            days: 7,
            status: AckFilter::All,
            priority: None,
        }
    }
}

/// Aggregate counts over a history query result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: usize,
    pub acknowledged: usize,
    pub unacknowledged: usize,
    pub by_priority: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
}

impl AlertStats {
    /// Tally stats from ledger rows joined with their rule priority
    pub fn from_rows(rows: &[(SentAlert, Priority)]) -> Self {
        let mut stats = AlertStats {
            total: rows.len(),
            ..Default::default()
        };
        for (alert, priority) in rows {
            if alert.is_acknowledged() {
                stats.acknowledged += 1;
            } else {
                stats.unacknowledged += 1;
            }
            *stats
                .by_priority
                .entry(priority.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_type
                .entry(alert.alert_type.as_str().to_string())
                .or_insert(0) += 1;
        }
        stats
    }
}
