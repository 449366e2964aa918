use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What condition a rule watches for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// Sales volume below a percentage of the daily target
    LowSales,
    /// No sales at all past noon
    ZeroSales,
    /// DQ percentage above threshold
    HighDq,
    /// Submission/transfer ratio below threshold
    LowApproval,
    /// Positive signal: target achievement crossed a milestone rung
    Milestone,
    /// Running behind the hour-proportional target
    BelowThresholdDuration,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::LowSales => "low_sales",
            TriggerType::ZeroSales => "zero_sales",
            TriggerType::HighDq => "high_dq",
            TriggerType::LowApproval => "low_approval",
            TriggerType::Milestone => "milestone",
            TriggerType::BelowThresholdDuration => "below_threshold_duration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low_sales" => Some(TriggerType::LowSales),
            "zero_sales" => Some(TriggerType::ZeroSales),
            "high_dq" => Some(TriggerType::HighDq),
            "low_approval" => Some(TriggerType::LowApproval),
            "milestone" => Some(TriggerType::Milestone),
            "below_threshold_duration" => Some(TriggerType::BelowThresholdDuration),
            _ => None,
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert priority, also used to pick Slack routing when no trigger type
/// is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Emoji prefix used in Slack and email badges
    pub fn emoji(&self) -> &'static str {
        match self {
            Priority::Critical => "\u{1f6a8}", // police light
            Priority::High => "\u{26a0}\u{fe0f}", // warning sign
            Priority::Medium => "\u{1f4ca}",   // bar chart
            Priority::Low => "\u{2139}\u{fe0f}", // info
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A threshold rule. Owned by the admin subsystem; immutable during one
/// evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: Uuid,
    pub name: String,
    pub trigger_type: TriggerType,
    pub condition_threshold: f64,
    /// Template with bracketed placeholders ([Center], [SalesCount], ...)
    pub message_template: String,
    pub recipient_roles: Vec<String>,
    /// Subset of {slack, email, push, whatsapp}
    pub channels: Vec<String>,
    pub priority: Priority,
    pub enabled: bool,
    /// Quiet hours as "HH:MM"; both must be set for the window to apply
    pub quiet_hours_start: Option<String>,
    pub quiet_hours_end: Option<String>,
}
