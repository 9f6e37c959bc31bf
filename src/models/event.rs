use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventPrivacy {
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub privacy: EventPrivacy,
    /// Base ticket price; authoritative when the event has no lots.
    pub price: Decimal,
    pub currency: String,
    pub max_participants: Option<i32>,
    /// Confirmed attendees, maintained in the same transaction as every
    /// attendance write.
    pub participant_count: i32,
    pub starts_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_paid(&self) -> bool {
        self.price > Decimal::ZERO
    }

    pub fn is_full(&self) -> bool {
        matches!(self.max_participants, Some(max) if self.participant_count >= max)
    }
}
