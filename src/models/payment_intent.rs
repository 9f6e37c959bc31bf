use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentIntentStatus {
    Pending,
    Consumed,
    Superseded,
}

/// Correlation between a checkout hand-off and the (event, lot) it was
/// started for, recorded before the user is redirected to the gateway.
/// Consumed rows are kept so a success-page refresh can still recover the
/// purchase.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentIntent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub lot_id: Option<Uuid>,
    pub checkout_id: String,
    pub status: PaymentIntentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
