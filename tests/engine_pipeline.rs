//! End-to-end sweep behavior over in-memory providers: trigger semantics,
//! cooldown dedup, quiet hours, per-pair error isolation, and ledger
//! acknowledgement.

use async_trait::async_trait;
use beacon::dispatch::formats::PushPayload;
use beacon::dispatch::{
    DeliveryResult, NotificationDispatcher, NotificationMeta, NotificationTransport, SlackChannel,
};
use beacon::domain::{
    AlertQuery, AlertRule, ApprovalSummary, Center, DqSummary, NewSentAlert, Priority, SentAlert,
    TriggerType,
};
use beacon::engine::{
    AckOutcome, AlertLedger, CenterStore, Clock, EvaluationOrchestrator, FixedClock,
    FrequencyGate, MetricsProvider, Recipient, RecipientDirectory, RuleEvaluator, RuleStore,
};
use beacon::error::{BeaconError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default, Clone)]
struct FakeMetrics {
    sales: HashMap<Uuid, i64>,
    underwriting: HashMap<Uuid, i64>,
    dq: HashMap<Uuid, DqSummary>,
    approval: HashMap<Uuid, ApprovalSummary>,
    categories: HashMap<Uuid, Vec<String>>,
    failing_center: Option<Uuid>,
}

impl FakeMetrics {
    fn check_failure(&self, center_id: Uuid) -> Result<()> {
        if self.failing_center == Some(center_id) {
            return Err(BeaconError::Provider("metrics backend down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsProvider for FakeMetrics {
    async fn sales_volume(&self, _date: NaiveDate, center_id: Uuid) -> Result<i64> {
        self.check_failure(center_id)?;
        Ok(self.sales.get(&center_id).copied().unwrap_or(0))
    }

    async fn underwriting_volume(&self, _date: NaiveDate, center_id: Uuid) -> Result<i64> {
        self.check_failure(center_id)?;
        Ok(self.underwriting.get(&center_id).copied().unwrap_or(0))
    }

    async fn dq_percentage(&self, _date: NaiveDate, center_id: Uuid) -> Result<DqSummary> {
        self.check_failure(center_id)?;
        Ok(self.dq.get(&center_id).copied().unwrap_or_default())
    }

    async fn approval_ratio(&self, _date: NaiveDate, center_id: Uuid) -> Result<ApprovalSummary> {
        self.check_failure(center_id)?;
        Ok(self.approval.get(&center_id).copied().unwrap_or_default())
    }

    async fn top_dq_categories(
        &self,
        _date: NaiveDate,
        center_id: Uuid,
        limit: i64,
    ) -> Result<Vec<String>> {
        let mut categories = self.categories.get(&center_id).cloned().unwrap_or_default();
        categories.truncate(limit as usize);
        Ok(categories)
    }
}

struct FakeCenters(Vec<Center>);

#[async_trait]
impl CenterStore for FakeCenters {
    async fn active_centers(&self) -> Result<Vec<Center>> {
        Ok(self.0.iter().filter(|c| c.active).cloned().collect())
    }

    async fn center(&self, id: Uuid) -> Result<Option<Center>> {
        Ok(self.0.iter().find(|c| c.id == id).cloned())
    }
}

struct FakeRules(Vec<AlertRule>);

#[async_trait]
impl RuleStore for FakeRules {
    async fn active_rules(&self) -> Result<Vec<AlertRule>> {
        Ok(self.0.iter().filter(|r| r.enabled).cloned().collect())
    }
}

struct FakeDirectory(Vec<Recipient>);

#[async_trait]
impl RecipientDirectory for FakeDirectory {
    async fn recipients_for_roles(&self, roles: &[String]) -> Result<Vec<Recipient>> {
        if roles.is_empty() {
            return Ok(vec![]);
        }
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct MemoryLedger {
    rows: Mutex<Vec<SentAlert>>,
}

impl MemoryLedger {
    fn rows(&self) -> Vec<SentAlert> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertLedger for MemoryLedger {
    async fn recent_alert(
        &self,
        rule_id: Uuid,
        center_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.rows.lock().unwrap().iter().any(|row| {
            row.rule_id == rule_id && row.center_id == center_id && row.sent_at >= since
        }))
    }

    async fn insert(&self, alert: NewSentAlert) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.rows.lock().unwrap().push(SentAlert {
            id,
            rule_id: alert.rule_id,
            center_id: alert.center_id,
            alert_type: alert.alert_type,
            message: alert.message,
            channels_sent: alert.channels_sent,
            recipients: alert.recipients,
            sent_at: Utc::now(),
            metadata: alert.metadata,
            acknowledged_by: None,
            acknowledged_at: None,
            response_action: None,
        });
        Ok(id)
    }

    async fn acknowledge(
        &self,
        id: Uuid,
        acknowledged_by: &str,
        response_action: Option<&str>,
    ) -> Result<AckOutcome> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| row.id == id) {
            None => Ok(AckOutcome::NotFound),
            Some(row) if row.acknowledged_at.is_some() => Ok(AckOutcome::AlreadyAcknowledged),
            Some(row) => {
                row.acknowledged_by = Some(acknowledged_by.to_string());
                row.acknowledged_at = Some(Utc::now());
                row.response_action = response_action.map(str::to_string);
                Ok(AckOutcome::Acknowledged)
            }
        }
    }

    async fn history(&self, _query: &AlertQuery) -> Result<Vec<(SentAlert, Priority)>> {
        Ok(self
            .rows()
            .into_iter()
            .map(|row| (row, Priority::Medium))
            .collect())
    }
}

#[derive(Default)]
struct RecordingTransport {
    fail_email: bool,
    slack_calls: Mutex<Vec<(SlackChannel, String)>>,
    email_calls: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn slack(
        &self,
        channel: SlackChannel,
        message: &str,
        _meta: &NotificationMeta,
    ) -> DeliveryResult {
        self.slack_calls
            .lock()
            .unwrap()
            .push((channel, message.to_string()));
        DeliveryResult::delivered("slack")
    }

    async fn email(&self, recipients: &[String], _subject: &str, _html: &str) -> DeliveryResult {
        self.email_calls.lock().unwrap().push(recipients.to_vec());
        if self.fail_email {
            DeliveryResult::failed("email", "SMTP refused connection")
        } else {
            DeliveryResult::delivered("email")
        }
    }

    async fn web_push(&self, _user_ids: &[Uuid], _payload: &PushPayload) -> DeliveryResult {
        DeliveryResult::mocked("push", "not configured in tests")
    }

    async fn whatsapp(&self, _message: &str, _meta: &NotificationMeta) -> DeliveryResult {
        DeliveryResult::mocked("whatsapp", "not configured in tests")
    }
}

fn center(target: i64) -> Center {
    Center {
        id: Uuid::new_v4(),
        name: "Manila North".to_string(),
        daily_sales_target: target,
        region: "APAC".to_string(),
        location: "Manila".to_string(),
        active: true,
    }
}

fn rule(trigger_type: TriggerType, threshold: f64, template: &str) -> AlertRule {
    AlertRule {
        id: Uuid::new_v4(),
        name: format!("{trigger_type} rule"),
        trigger_type,
        condition_threshold: threshold,
        message_template: template.to_string(),
        recipient_roles: vec!["manager".to_string()],
        channels: vec!["slack".to_string(), "email".to_string()],
        priority: Priority::High,
        enabled: true,
        quiet_hours_start: None,
        quiet_hours_end: None,
    }
}

struct Harness {
    ledger: Arc<MemoryLedger>,
    transport: Arc<RecordingTransport>,
    orchestrator: EvaluationOrchestrator,
}

fn harness(
    centers: Vec<Center>,
    rules: Vec<AlertRule>,
    metrics: FakeMetrics,
    clock: FixedClock,
) -> Harness {
    harness_with_transport(centers, rules, metrics, clock, RecordingTransport::default())
}

fn harness_with_transport(
    centers: Vec<Center>,
    rules: Vec<AlertRule>,
    metrics: FakeMetrics,
    clock: FixedClock,
    transport: RecordingTransport,
) -> Harness {
    let ledger = Arc::new(MemoryLedger::default());
    let transport = Arc::new(transport);
    let clock: Arc<dyn Clock> = Arc::new(clock);

    let evaluator = RuleEvaluator::new(Arc::new(metrics), clock.clone());
    let gate = FrequencyGate::new(ledger.clone(), 60);
    let dispatcher = NotificationDispatcher::new(transport.clone());
    let directory = FakeDirectory(vec![Recipient {
        id: Uuid::new_v4(),
        email: "ops@example.com".to_string(),
        name: "Ops".to_string(),
    }]);

    let orchestrator = EvaluationOrchestrator::new(
        Arc::new(FakeCenters(centers)),
        Arc::new(FakeRules(rules)),
        ledger.clone(),
        Arc::new(directory),
        evaluator,
        gate,
        dispatcher,
        clock,
    );

    Harness {
        ledger,
        transport,
        orchestrator,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

#[tokio::test]
async fn low_sales_fires_with_counts_and_percentage() {
    let c = center(100);
    let metrics = FakeMetrics {
        sales: HashMap::from([(c.id, 40)]),
        ..Default::default()
    };
    let h = harness(
        vec![c.clone()],
        vec![rule(
            TriggerType::LowSales,
            50.0,
            "[Center]: [SalesCount]/[Target] sales ([Percentage]%), [HoursRemaining]h left",
        )],
        metrics,
        FixedClock::at(date(), 14, 0),
    );

    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 1);

    let rows = h.ledger.rows();
    assert_eq!(rows.len(), 1);
    let message = &rows[0].message;
    assert!(message.contains("40/100"), "got: {message}");
    assert!(message.contains("(40%)"), "got: {message}");
    assert!(message.contains("10h left"), "got: {message}");
}

#[tokio::test]
async fn zero_sales_gated_until_noon() {
    let c = center(100);
    let rules = vec![rule(
        TriggerType::ZeroSales,
        0.0,
        "[Center] has no sales as of [Time]",
    )];

    let before_noon = harness(
        vec![c.clone()],
        rules.clone(),
        FakeMetrics::default(),
        FixedClock::at(date(), 10, 0),
    );
    let summary = before_noon
        .orchestrator
        .evaluate_all_centers(date())
        .await
        .unwrap();
    assert_eq!(summary.fired, 0);
    assert!(before_noon.ledger.rows().is_empty());

    let afternoon = harness(
        vec![c],
        rules,
        FakeMetrics::default(),
        FixedClock::at(date(), 13, 0),
    );
    let summary = afternoon
        .orchestrator
        .evaluate_all_centers(date())
        .await
        .unwrap();
    assert_eq!(summary.fired, 1);
    let rows = afternoon.ledger.rows();
    assert!(rows[0].message.contains("13:00"));
}

#[tokio::test]
async fn cooldown_suppresses_second_sweep() {
    let c = center(100);
    let h = harness(
        vec![c],
        vec![rule(TriggerType::ZeroSales, 0.0, "[Center] silent")],
        FakeMetrics::default(),
        FixedClock::at(date(), 14, 0),
    );

    let first = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    let second = h.orchestrator.evaluate_all_centers(date()).await.unwrap();

    assert_eq!(first.fired, 1);
    assert_eq!(second.fired, 0);
    assert_eq!(second.suppressed, 1);
    assert_eq!(h.ledger.rows().len(), 1, "at most one row per cooldown window");
}

#[tokio::test]
async fn milestone_fires_first_matching_rung_only() {
    let c = center(100);
    let metrics = FakeMetrics {
        sales: HashMap::from([(c.id, 77)]),
        ..Default::default()
    };
    let h = harness(
        vec![c],
        vec![rule(
            TriggerType::Milestone,
            0.0,
            "[Center] reached [Milestone] ([SalesCount]/[Target])",
        )],
        metrics,
        FixedClock::at(date(), 14, 0),
    );

    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 1);

    let rows = h.ledger.rows();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].message.contains("75%"), "got: {}", rows[0].message);
    assert_eq!(rows[0].metadata["milestone"], 75);
}

#[tokio::test]
async fn milestone_outside_every_band_stays_quiet() {
    let c = center(100);
    // 85% sits between the 75 and 100 rungs
    let metrics = FakeMetrics {
        sales: HashMap::from([(c.id, 85)]),
        ..Default::default()
    };
    let h = harness(
        vec![c],
        vec![rule(TriggerType::Milestone, 0.0, "[Milestone]")],
        metrics,
        FixedClock::at(date(), 14, 0),
    );

    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 0);
}

#[tokio::test]
async fn high_dq_uses_strict_inequality() {
    let c = center(100);
    let breached = FakeMetrics {
        dq: HashMap::from([(
            c.id,
            DqSummary {
                percentage: 20.0,
                count: 8,
            },
        )]),
        categories: HashMap::from([(
            c.id,
            vec!["Missing SSN".to_string(), "Bad DOB".to_string()],
        )]),
        ..Default::default()
    };
    let h = harness(
        vec![c.clone()],
        vec![rule(
            TriggerType::HighDq,
            15.0,
            "[Center] DQ at [DQPercentage]% ([DQCount]): [TopIssues]",
        )],
        breached,
        FixedClock::at(date(), 14, 0),
    );
    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 1);
    let message = &h.ledger.rows()[0].message;
    assert!(message.contains("Missing SSN, Bad DOB"), "got: {message}");

    // Exactly at threshold: > not >=
    let at_threshold = FakeMetrics {
        dq: HashMap::from([(
            c.id,
            DqSummary {
                percentage: 15.0,
                count: 6,
            },
        )]),
        ..Default::default()
    };
    let h = harness(
        vec![c],
        vec![rule(TriggerType::HighDq, 15.0, "[DQPercentage]")],
        at_threshold,
        FixedClock::at(date(), 14, 0),
    );
    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 0);
}

#[tokio::test]
async fn low_approval_substitutes_ratio_tokens() {
    let c = center(100);
    let metrics = FakeMetrics {
        approval: HashMap::from([(
            c.id,
            ApprovalSummary {
                ratio: 40.0,
                submissions: 12,
                transfers: 30,
            },
        )]),
        underwriting: HashMap::from([(c.id, 5)]),
        ..Default::default()
    };
    let h = harness(
        vec![c],
        vec![rule(
            TriggerType::LowApproval,
            50.0,
            "[Center] approval [ApprovalRatio]%: [SubmissionCount] submitted, [UWCount] in UW",
        )],
        metrics,
        FixedClock::at(date(), 14, 0),
    );

    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 1);
    let message = &h.ledger.rows()[0].message;
    assert!(message.contains("40%"), "got: {message}");
    assert!(message.contains("12 submitted"), "got: {message}");
    assert!(message.contains("5 in UW"), "got: {message}");
}

#[tokio::test]
async fn below_threshold_duration_tracks_proportional_target() {
    // 240/day is 10/hour; by 14:00 the proportional target is 140 and the
    // 50% cut line is 70
    let c = center(240);
    let behind = FakeMetrics {
        sales: HashMap::from([(c.id, 60)]),
        ..Default::default()
    };
    let h = harness(
        vec![c.clone()],
        vec![rule(
            TriggerType::BelowThresholdDuration,
            50.0,
            "[Center] at [SalesCount] after [Hours]h",
        )],
        behind,
        FixedClock::at(date(), 14, 0),
    );
    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 1);
    assert!(h.ledger.rows()[0].message.contains("after 14h"));

    let on_pace = FakeMetrics {
        sales: HashMap::from([(c.id, 80)]),
        ..Default::default()
    };
    let h = harness(
        vec![c],
        vec![rule(TriggerType::BelowThresholdDuration, 50.0, "[Hours]")],
        on_pace,
        FixedClock::at(date(), 14, 0),
    );
    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 0);
}

#[tokio::test]
async fn provider_failure_does_not_abort_the_sweep() {
    let broken = center(100);
    let healthy = center(100);
    let metrics = FakeMetrics {
        failing_center: Some(broken.id),
        ..Default::default()
    };
    let h = harness(
        vec![broken, healthy],
        vec![rule(TriggerType::ZeroSales, 0.0, "[Center] silent")],
        metrics,
        FixedClock::at(date(), 14, 0),
    );

    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.fired, 1);
    assert_eq!(h.ledger.rows().len(), 1);
}

#[tokio::test]
async fn overnight_quiet_hours_suppress_evaluation() {
    let c = center(100);
    let mut quiet_rule = rule(TriggerType::ZeroSales, 0.0, "[Center] silent");
    quiet_rule.quiet_hours_start = Some("22:00".to_string());
    quiet_rule.quiet_hours_end = Some("07:00".to_string());

    let night = harness(
        vec![c.clone()],
        vec![quiet_rule.clone()],
        FakeMetrics::default(),
        FixedClock::at(date(), 23, 30),
    );
    let summary = night.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.skipped_quiet, 1);
    assert_eq!(summary.fired, 0);

    let midday = harness(
        vec![c],
        vec![quiet_rule],
        FakeMetrics::default(),
        FixedClock::at(date(), 12, 30),
    );
    let summary = midday.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.skipped_quiet, 0);
    assert_eq!(summary.fired, 1);
}

#[tokio::test]
async fn channels_sent_records_intent_not_delivery_outcome() {
    let c = center(100);
    let transport = RecordingTransport {
        fail_email: true,
        ..Default::default()
    };
    let h = harness_with_transport(
        vec![c],
        vec![rule(TriggerType::ZeroSales, 0.0, "[Center] silent")],
        FakeMetrics::default(),
        FixedClock::at(date(), 14, 0),
        transport,
    );

    let summary = h.orchestrator.evaluate_all_centers(date()).await.unwrap();
    assert_eq!(summary.fired, 1);

    let rows = h.ledger.rows();
    assert_eq!(
        rows[0].channels_sent,
        vec!["slack".to_string(), "email".to_string()],
        "ledger records the configured channel list even when email delivery fails"
    );
    assert_eq!(h.transport.email_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn single_center_check_runs_same_rules() {
    let target = center(100);
    let other = center(100);
    let metrics = FakeMetrics {
        sales: HashMap::from([(target.id, 0), (other.id, 0)]),
        ..Default::default()
    };
    let h = harness(
        vec![target.clone(), other],
        vec![rule(TriggerType::ZeroSales, 0.0, "[Center] silent")],
        metrics,
        FixedClock::at(date(), 14, 0),
    );

    let summary = h
        .orchestrator
        .check_single_center(target.id, date())
        .await
        .unwrap();
    assert_eq!(summary.centers, 1);
    assert_eq!(summary.fired, 1);
    assert_eq!(h.ledger.rows().len(), 1);
    assert_eq!(h.ledger.rows()[0].center_id, target.id);
}

#[tokio::test]
async fn unknown_center_check_errors() {
    let h = harness(
        vec![center(100)],
        vec![],
        FakeMetrics::default(),
        FixedClock::at(date(), 14, 0),
    );
    let err = h
        .orchestrator
        .check_single_center(Uuid::new_v4(), date())
        .await
        .unwrap_err();
    assert!(matches!(err, BeaconError::CenterNotFound(_)));
}

#[tokio::test]
async fn acknowledgement_is_first_write_wins() {
    let ledger = MemoryLedger::default();
    let id = ledger
        .insert(NewSentAlert {
            rule_id: Uuid::new_v4(),
            center_id: Uuid::new_v4(),
            alert_type: TriggerType::ZeroSales,
            message: "silent".to_string(),
            channels_sent: vec!["slack".to_string()],
            recipients: vec![],
            metadata: serde_json::json!({}),
        })
        .await
        .unwrap();

    assert_eq!(
        ledger.acknowledge(id, "alice", Some("called center")).await.unwrap(),
        AckOutcome::Acknowledged
    );
    assert_eq!(
        ledger.acknowledge(id, "bob", None).await.unwrap(),
        AckOutcome::AlreadyAcknowledged
    );

    let row = &ledger.rows()[0];
    assert_eq!(row.acknowledged_by.as_deref(), Some("alice"));
    assert_eq!(row.response_action.as_deref(), Some("called center"));

    assert_eq!(
        ledger.acknowledge(Uuid::new_v4(), "alice", None).await.unwrap(),
        AckOutcome::NotFound
    );
}
