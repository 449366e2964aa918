pub mod adapters;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod services;

pub use config::AppConfig;
pub use dispatch::{
    DeliveryResult, NotificationDispatcher, NotificationMeta, NotificationTransport, SlackChannel,
};
pub use engine::{
    AckOutcome, AlertLedger, CenterStore, Clock, EvaluationOrchestrator, EvaluationSummary,
    FixedClock, FrequencyGate, MetricsProvider, RecipientDirectory, RuleEvaluator, RuleStore,
    SystemClock,
};
pub use error::{BeaconError, Result};
pub use services::Scheduler;
