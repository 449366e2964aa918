//! Alert evaluation core: rule evaluator, sweep orchestrator, frequency
//! gate, and the provider seams they run against.

pub mod clock;
pub mod evaluator;
pub mod gate;
pub mod orchestrator;
pub mod ports;
pub mod template;

pub use clock::{Clock, FixedClock, SystemClock};
pub use evaluator::RuleEvaluator;
pub use gate::FrequencyGate;
pub use orchestrator::{in_quiet_hours, EvaluationOrchestrator, EvaluationSummary};
pub use ports::{
    AckOutcome, AlertLedger, CenterStore, MetricsProvider, PushSubscription,
    PushSubscriptionStore, Recipient, RecipientDirectory, RuleStore,
};
pub use template::render_template;
