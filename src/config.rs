use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub alerting: AlertingConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertingConfig {
    /// Trailing window in which a (rule, center) pair fires at most once.
    /// Valid range 5-60; both the 5-minute sweep and the hourly check
    /// consult the same value.
    #[serde(default = "default_cooldown_minutes")]
    pub cooldown_minutes: i64,
    /// Dashboard URL embedded in notification action buttons
    #[serde(default)]
    pub dashboard_url: Option<String>,
    /// Alert sweep cadence for `serve` mode, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cooldown_minutes() -> i64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            cooldown_minutes: default_cooldown_minutes(),
            dashboard_url: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Slack incoming-webhook URLs, one per audience sub-channel.
/// Any unset webhook downgrades that delivery to a mocked result.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SlackConfig {
    #[serde(default)]
    pub webhook_sales: Option<String>,
    #[serde(default)]
    pub webhook_quality: Option<String>,
    #[serde(default)]
    pub webhook_critical: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// From address, e.g. "Alert Portal <alerts@example.com>"
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_smtp_tls")]
    pub use_tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_tls() -> bool {
    true
}

impl SmtpConfig {
    /// SMTP delivery needs host + credentials; anything less means mocked sends
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.username.is_some() && self.password.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PushConfig {
    #[serde(default)]
    pub vapid_public_key: Option<String>,
    #[serde(default)]
    pub vapid_private_key: Option<String>,
    #[serde(default = "default_vapid_subject")]
    pub subject: String,
}

fn default_vapid_subject() -> String {
    "mailto:admin@example.com".to_string()
}

impl PushConfig {
    pub fn is_configured(&self) -> bool {
        self.vapid_public_key.is_some() && self.vapid_private_key.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub from_number: Option<String>,
}

impl WhatsAppConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && self.from_number.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// API/cron trigger server port
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Write daily-rolled log files here instead of stdout
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .set_default("alerting.cooldown_minutes", 60)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("BEACON_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (BEACON_SLACK__WEBHOOK_SALES, etc.)
            .add_source(
                Environment::with_prefix("BEACON")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}
