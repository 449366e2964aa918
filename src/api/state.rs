use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::{AlertLedger, Clock, EvaluationOrchestrator};

/// Which notification channels have real credentials behind them
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfiguredChannels {
    pub slack: bool,
    pub email: bool,
    pub push: bool,
    pub whatsapp: bool,
}

impl ConfiguredChannels {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            slack: config.slack.webhook_sales.is_some()
                || config.slack.webhook_quality.is_some()
                || config.slack.webhook_critical.is_some(),
            email: config.smtp.is_configured(),
            push: config.push.is_configured(),
            whatsapp: config.whatsapp.is_configured(),
        }
    }
}

/// Shared state for the API server
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<EvaluationOrchestrator>,
    pub ledger: Arc<dyn AlertLedger>,
    pub clock: Arc<dyn Clock>,
    /// Present when backed by a real database; health checks ping it
    pub pool: Option<PgPool>,
    pub channels: ConfiguredChannels,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<EvaluationOrchestrator>,
        ledger: Arc<dyn AlertLedger>,
        clock: Arc<dyn Clock>,
        pool: Option<PgPool>,
        channels: ConfiguredChannels,
    ) -> Self {
        Self {
            orchestrator,
            ledger,
            clock,
            pool,
            channels,
            started_at: Utc::now(),
        }
    }
}
