//! Frequency gate: at most one alert per (rule, center) per cooldown
//! window, regardless of how often the sweep runs while a breach persists.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::ports::AlertLedger;
use crate::error::Result;

/// Bounds on the configurable cooldown window, in minutes
const MIN_COOLDOWN_MINUTES: i64 = 5;
const MAX_COOLDOWN_MINUTES: i64 = 60;

/// Consults the alert ledger before any new alert is persisted or sent
pub struct FrequencyGate {
    ledger: Arc<dyn AlertLedger>,
    cooldown: Duration,
}

impl FrequencyGate {
    /// Out-of-range cooldowns are clamped, not rejected; the sweep must
    /// keep running on a bad config value.
    pub fn new(ledger: Arc<dyn AlertLedger>, cooldown_minutes: i64) -> Self {
        let clamped = cooldown_minutes.clamp(MIN_COOLDOWN_MINUTES, MAX_COOLDOWN_MINUTES);
        if clamped != cooldown_minutes {
            warn!(
                configured = cooldown_minutes,
                effective = clamped,
                "alert cooldown outside {MIN_COOLDOWN_MINUTES}-{MAX_COOLDOWN_MINUTES}m, clamped"
            );
        }
        Self {
            ledger,
            cooldown: Duration::minutes(clamped),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// True if the (rule, center) pair already fired within the trailing
    /// cooldown window
    pub async fn should_suppress(&self, rule_id: Uuid, center_id: Uuid) -> Result<bool> {
        let since = Utc::now() - self.cooldown;
        let suppress = self.ledger.recent_alert(rule_id, center_id, since).await?;
        if suppress {
            debug!(%rule_id, %center_id, "alert suppressed by frequency cap");
        }
        Ok(suppress)
    }
}
