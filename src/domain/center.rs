use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A BPO call center. Owned by the admin subsystem; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Center {
    pub id: Uuid,
    pub name: String,
    /// Daily sales target. Zero means "no achievable percentage" and is
    /// never used as a divisor.
    pub daily_sales_target: i64,
    pub region: String,
    pub location: String,
    pub active: bool,
}

impl Center {
    /// Percentage of the daily target covered by `sales`, if a positive
    /// target exists
    pub fn target_percentage(&self, sales: i64) -> Option<f64> {
        if self.daily_sales_target <= 0 {
            return None;
        }
        Some(sales as f64 / self.daily_sales_target as f64 * 100.0)
    }
}
