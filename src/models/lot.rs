use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named, priced ticket tier attached to an event.
///
/// `quantity` is advisory: it is shown to buyers but never decremented on
/// purchase.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketLot {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
