use serde::{Deserialize, Serialize};

/// DQ (data quality) stats for one (center, date)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DqSummary {
    /// dq_items count / transfers * 100, zero when there are no transfers
    pub percentage: f64,
    pub count: i64,
}

/// Submissions vs transfers for one (center, date)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ApprovalSummary {
    /// submissions / transfers * 100, zero when there are no transfers
    pub ratio: f64,
    pub submissions: i64,
    pub transfers: i64,
}

/// Point-in-time metrics for one (center, date). Assembled on demand and
/// never cached past a single evaluation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub sales_count: i64,
    pub underwriting_count: i64,
    pub transfers: i64,
    pub dq_percentage: f64,
    pub dq_count: i64,
    pub approval_ratio: f64,
}
