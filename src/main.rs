use beacon::adapters::{
    EmailNotifier, PostgresStore, PushNotifier, SlackNotifier, WhatsAppNotifier,
};
use beacon::api::state::ConfiguredChannels;
use beacon::api::{create_router, AppState};
use beacon::config::AppConfig;
use beacon::dispatch::{ChannelTransport, NotificationDispatcher};
use beacon::engine::{
    Clock, EvaluationOrchestrator, FrequencyGate, RuleEvaluator, SystemClock,
};
use beacon::error::Result;
use beacon::services::Scheduler;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "beacon",
    about = "Sales-performance alert pipeline for BPO call centers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server with in-process alert scheduling
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
        /// Disable the in-process scheduler (external cron only)
        #[arg(long)]
        no_scheduler: bool,
    },
    /// Run one alert evaluation sweep and exit
    Evaluate {
        /// Date to evaluate (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Evaluate every enabled rule against a single center and exit
    CheckCenter {
        center_id: Uuid,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let _log_guard = init_logging(&config);

    match cli.command {
        Commands::Serve { port, no_scheduler } => run_serve(config, port, no_scheduler).await,
        Commands::Evaluate { date } => run_evaluate(config, date).await,
        Commands::CheckCenter { center_id, date } => {
            run_check_center(config, center_id, date).await
        }
        Commands::Migrate => run_migrate(config).await,
    }
}

fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},beacon=debug,sqlx=warn", config.logging.level))
    });

    if let Some(directory) = &config.logging.directory {
        let appender = tracing_appender::rolling::daily(directory, "beacon.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(writer)
            .with_ansi(false);
        if config.logging.json {
            builder.json().init();
        } else {
            builder.init();
        }
        return Some(guard);
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    None
}

async fn connect_store(config: &AppConfig) -> Result<Arc<PostgresStore>> {
    Ok(Arc::new(
        PostgresStore::new(&config.database.url, config.database.max_connections).await?,
    ))
}

fn build_orchestrator(
    config: &AppConfig,
    store: &Arc<PostgresStore>,
    clock: Arc<dyn Clock>,
) -> Result<Arc<EvaluationOrchestrator>> {
    let transport = ChannelTransport::new(
        SlackNotifier::new(config.slack.clone()),
        EmailNotifier::new(config.smtp.clone())?,
        PushNotifier::new(config.push.clone(), store.clone()),
        WhatsAppNotifier::new(config.whatsapp.clone()),
    );
    let dispatcher = NotificationDispatcher::new(transport);
    let evaluator = RuleEvaluator::new(store.clone(), clock.clone());
    let gate = FrequencyGate::new(store.clone(), config.alerting.cooldown_minutes);

    let orchestrator = EvaluationOrchestrator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        evaluator,
        gate,
        dispatcher,
        clock,
    )
    .with_dashboard_url(config.alerting.dashboard_url.clone());

    Ok(Arc::new(orchestrator))
}

async fn run_serve(config: AppConfig, port: Option<u16>, no_scheduler: bool) -> Result<()> {
    let store = connect_store(&config).await?;
    store.migrate().await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let orchestrator = build_orchestrator(&config, &store, clock.clone())?;

    if no_scheduler {
        info!("in-process scheduler disabled, relying on external cron triggers");
    } else {
        let scheduler = Scheduler::new(
            orchestrator.clone(),
            clock.clone(),
            config.alerting.sweep_interval_secs,
        );
        tokio::spawn(scheduler.run());
    }

    let state = AppState::new(
        orchestrator,
        store.clone(),
        clock,
        Some(store.pool().clone()),
        ConfiguredChannels::from_config(&config),
    );
    let router = create_router(state);

    let port = port.unwrap_or(config.server.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn run_evaluate(config: AppConfig, date: Option<NaiveDate>) -> Result<()> {
    let store = connect_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let orchestrator = build_orchestrator(&config, &store, clock.clone())?;

    let date = date.unwrap_or_else(|| clock.today());
    let summary = orchestrator.evaluate_all_centers(date).await?;
    info!(
        %date,
        fired = summary.fired,
        suppressed = summary.suppressed,
        failed = summary.failed,
        "evaluation finished"
    );
    Ok(())
}

async fn run_check_center(
    config: AppConfig,
    center_id: Uuid,
    date: Option<NaiveDate>,
) -> Result<()> {
    let store = connect_store(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let orchestrator = build_orchestrator(&config, &store, clock.clone())?;

    let date = date.unwrap_or_else(|| clock.today());
    let summary = orchestrator.check_single_center(center_id, date).await?;
    info!(
        %center_id,
        %date,
        fired = summary.fired,
        suppressed = summary.suppressed,
        "center check finished"
    );
    Ok(())
}

async fn run_migrate(config: AppConfig) -> Result<()> {
    let store = connect_store(&config).await?;
    store.migrate().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
