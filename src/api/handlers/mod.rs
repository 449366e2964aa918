mod alerts;
mod cron;
mod system;

pub use alerts::{acknowledge_alert, list_alerts};
pub use cron::{check_center, evaluate_alerts, hourly_check};
pub use system::health;
