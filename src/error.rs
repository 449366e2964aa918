use thiserror::Error;

/// Main error type for the alert service
#[derive(Error, Debug)]
pub enum BeaconError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Email errors
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Email build error: {0}")]
    EmailBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    EmailAddress(#[from] lettre::address::AddressError),

    // Provider errors (metrics / rule store / center store reads)
    #[error("Provider error: {0}")]
    Provider(String),

    // Ledger errors (alerts_sent reads/writes)
    #[error("Ledger error: {0}")]
    Ledger(String),

    // Transport errors (a single channel's delivery attempt)
    #[error("Transport error on {channel}: {reason}")]
    Transport { channel: String, reason: String },

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    #[error("Center not found: {0}")]
    CenterNotFound(String),

    #[error("Invalid alert rule: {0}")]
    InvalidRule(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for BeaconError
pub type Result<T> = std::result::Result<T, BeaconError>;
