use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a worker's pay is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SalarySchema {
    /// `salary` is a percent of the revenue
    Percentage,
    /// `salary` is paid regardless of revenue
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Worker {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub salary_schema: Option<SalarySchema>,
    pub salary: i64,
    pub has_car: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create and update payload of a worker
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerInput {
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub salary_schema: Option<SalarySchema>,
    #[serde(default)]
    pub salary: i64,
    #[serde(default)]
    pub has_car: bool,
    /// Login password; when set on create, a worker account is opened for
    /// `email`. Ignored on update.
    #[serde(default)]
    pub password: Option<String>,
}

/// Which of the two adjustment ledgers an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerKind {
    Penalty,
    Bonus,
}

impl LedgerKind {
    pub fn table(self) -> &'static str {
        match self {
            LedgerKind::Penalty => "penalties",
            LedgerKind::Bonus => "bonuses",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: i64,
    pub worker_id: i64,
    pub delta: i64,
    pub description: String,
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerInput {
    pub worker_id: i64,
    pub amount: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order_id: Option<i64>,
}

/// Per-worker aggregate over a half-open date range
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkerStatistics {
    pub worker_id: i64,
    pub worker_name: String,
    pub worker_surname: String,
    pub worker_phone: String,
    pub salary_schema: Option<SalarySchema>,
    pub total_orders: i64,
    pub total_revenue: i64,
    pub total_bonus: i64,
    pub total_penalties: i64,
    pub total_salary: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalaryReport {
    pub worker_id: i64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub salary_schema: Option<SalarySchema>,
    pub revenue: i64,
    pub amount: i64,
}

/// Upper bound of a percentage rate
pub const MAX_PERCENTAGE_RATE: i64 = 100;

/// Pay for one window of revenue. Unset schema pays the raw revenue.
/// Percentage pay is truncated to the smallest currency unit; `None` on overflow.
pub fn compute_salary(schema: Option<SalarySchema>, rate: i64, revenue: i64) -> Option<i64> {
    match schema {
        Some(SalarySchema::Percentage) => revenue.checked_mul(rate).map(|pay| pay / 100),
        Some(SalarySchema::Fixed) => Some(rate),
        None => Some(revenue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_schema_takes_rate_percent_of_revenue() {
        assert_eq!(compute_salary(Some(SalarySchema::Percentage), 10, 5_000), Some(500));
        assert_eq!(compute_salary(Some(SalarySchema::Percentage), 15, 999), Some(149));
    }

    #[test]
    fn fixed_schema_ignores_revenue() {
        assert_eq!(compute_salary(Some(SalarySchema::Fixed), 2_500, 0), Some(2_500));
        assert_eq!(compute_salary(Some(SalarySchema::Fixed), 2_500, 90_000), Some(2_500));
    }

    #[test]
    fn unset_schema_falls_back_to_revenue() {
        assert_eq!(compute_salary(None, 10, 5_000), Some(5_000));
    }

    #[test]
    fn oversized_percentage_pay_does_not_wrap() {
        assert_eq!(
            compute_salary(Some(SalarySchema::Percentage), i64::MAX / 50, 1_000),
            None
        );
    }

    #[test]
    fn unknown_schema_string_is_rejected() {
        assert!(serde_json::from_str::<SalarySchema>("\"hourly\"").is_err());
    }
}
