use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order lifecycle. Transitions only move forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl OrderStatus {
    /// Staying put or moving forward (skips included) is allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        next >= self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Contract,
}

/// Which wheel a line item was performed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(rename_all = "kebab-case")]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
    RearLeftInner,
    RearLeftOuter,
    RearRightInner,
    RearRightOuter,
    MiddleLeftInner,
    MiddleLeftOuter,
    MiddleRightInner,
    MiddleRightOuter,
    All,
}

/// Order header as stored
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub status: OrderStatus,
    pub worker_id: i64,
    pub client_id: i64,
    pub vehicle_number: String,
    pub payment_method: PaymentMethod,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line item; `price` is the snapshot taken when the order was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub service_id: i64,
    #[sqlx(rename = "service_description")]
    pub description: String,
    pub wheel_position: WheelPosition,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    pub worker_id: i64,
    pub client_id: i64,
    pub vehicle_number: String,
    pub payment_method: PaymentMethod,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub services: Vec<OrderLine>,
}

impl Order {
    pub fn from_parts(row: OrderRow, services: Vec<OrderLine>) -> Self {
        Self {
            id: row.id,
            status: row.status,
            worker_id: row.worker_id,
            client_id: row.client_id,
            vehicle_number: row.vehicle_number,
            payment_method: row.payment_method,
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
            services,
        }
    }
}

/// Order payload for create and update. Required fields are optional here so
/// that a missing one is reported as a validation error, not a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderInput {
    #[serde(default)]
    pub worker_id: Option<i64>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub vehicle_number: String,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub services: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    #[serde(default)]
    pub service_id: i64,
    #[serde(default)]
    pub description: String,
    pub wheel_position: WheelPosition,
    /// Omitted means "take the current catalog price".
    #[serde(default)]
    pub price: Option<i64>,
}

/// A line whose price has been fixed, ready to insert
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub service_id: i64,
    pub description: String,
    pub wheel_position: WheelPosition,
    pub price: i64,
}

/// Validated header, ready to write
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub status: OrderStatus,
    pub worker_id: i64,
    pub client_id: i64,
    pub vehicle_number: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Shop-wide order aggregate
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderStatistics {
    pub total_orders: i64,
    pub total_revenue: i64,
    pub total_workers: i64,
    pub total_clients: i64,
    pub average_order_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_moves_forward_only() {
        use OrderStatus::*;
        assert!(Planned.can_transition_to(InProgress));
        assert!(Planned.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Planned));
    }

    #[test]
    fn new_orders_start_planned() {
        assert_eq!(OrderStatus::default(), OrderStatus::Planned);
    }

    #[test]
    fn wheel_positions_use_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&WheelPosition::RearLeftInner).unwrap();
        assert_eq!(json, "\"rear-left-inner\"");
        let parsed: WheelPosition = serde_json::from_str("\"front-right\"").unwrap();
        assert_eq!(parsed, WheelPosition::FrontRight);
    }

    #[test]
    fn unknown_wheel_position_is_rejected() {
        assert!(serde_json::from_str::<WheelPosition>("\"roof\"").is_err());
    }

    #[test]
    fn order_input_tolerates_missing_fields() {
        let input: OrderInput = serde_json::from_str("{}").unwrap();
        assert!(input.client_id.is_none());
        assert!(input.payment_method.is_none());
        assert!(input.services.is_empty());
    }
}
