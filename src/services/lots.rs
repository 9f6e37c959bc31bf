use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::TicketLot;
use crate::services::{fetch_event, require_organizer};
use crate::utils::error::AppError;

/// Incoming lot data for create and update. `quantity` is display-only;
/// nothing in the purchase flow decrements it.
#[derive(Debug, Clone, Deserialize)]
pub struct LotDraft {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn validate_draft(draft: &LotDraft) -> Result<(), AppError> {
    if draft.name.trim().is_empty() {
        return Err(AppError::ValidationError(
            "lot name must not be empty".to_string(),
        ));
    }
    if draft.price < Decimal::ZERO {
        return Err(AppError::InvalidPrice(format!(
            "lot price {} is negative",
            draft.price
        )));
    }
    if draft.quantity < 0 {
        return Err(AppError::ValidationError(
            "lot quantity must not be negative".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_lot(
    pool: &PgPool,
    event_id: Uuid,
    caller: Uuid,
    draft: LotDraft,
) -> Result<TicketLot, AppError> {
    let event = fetch_event(pool, event_id).await?;
    require_organizer(&event, caller)?;
    validate_draft(&draft)?;

    let lot = sqlx::query_as::<_, TicketLot>(
        "INSERT INTO event_lots (event_id, name, price, quantity, start_date, active)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *",
    )
    .bind(event_id)
    .bind(draft.name.trim())
    .bind(draft.price)
    .bind(draft.quantity)
    .bind(draft.start_date)
    .bind(draft.active)
    .fetch_one(pool)
    .await?;

    Ok(lot)
}

pub async fn update_lot(
    pool: &PgPool,
    event_id: Uuid,
    lot_id: Uuid,
    caller: Uuid,
    draft: LotDraft,
) -> Result<TicketLot, AppError> {
    let event = fetch_event(pool, event_id).await?;
    require_organizer(&event, caller)?;
    validate_draft(&draft)?;

    sqlx::query_as::<_, TicketLot>(
        "UPDATE event_lots
         SET name = $3, price = $4, quantity = $5, start_date = $6, active = $7,
             updated_at = now()
         WHERE id = $1 AND event_id = $2
         RETURNING *",
    )
    .bind(lot_id)
    .bind(event_id)
    .bind(draft.name.trim())
    .bind(draft.price)
    .bind(draft.quantity)
    .bind(draft.start_date)
    .bind(draft.active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("lot '{lot_id}' was not found for this event")))
}

pub async fn delete_lot(
    pool: &PgPool,
    event_id: Uuid,
    lot_id: Uuid,
    caller: Uuid,
) -> Result<(), AppError> {
    let event = fetch_event(pool, event_id).await?;
    require_organizer(&event, caller)?;

    let deleted = sqlx::query("DELETE FROM event_lots WHERE id = $1 AND event_id = $2")
        .bind(lot_id)
        .bind(event_id)
        .execute(pool)
        .await?;

    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "lot '{lot_id}' was not found for this event"
        )));
    }
    Ok(())
}

pub async fn list_lots(pool: &PgPool, event_id: Uuid) -> Result<Vec<TicketLot>, AppError> {
    let lots = sqlx::query_as::<_, TicketLot>(
        "SELECT * FROM event_lots WHERE event_id = $1 ORDER BY created_at",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(lots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn draft(name: &str, price: Decimal, quantity: i32) -> LotDraft {
        LotDraft {
            name: name.to_string(),
            price,
            quantity,
            start_date: None,
            active: true,
        }
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(
            validate_draft(&draft("   ", dec!(10), 5)),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert!(matches!(
            validate_draft(&draft("Early", dec!(-1), 5)),
            Err(AppError::InvalidPrice(_))
        ));
    }

    #[test]
    fn negative_quantities_are_rejected() {
        assert!(matches!(
            validate_draft(&draft("Early", dec!(10), -5)),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn free_lots_are_allowed() {
        assert!(validate_draft(&draft("Community", Decimal::ZERO, 0)).is_ok());
    }

    #[test]
    fn active_defaults_to_true_when_omitted() {
        let parsed: LotDraft =
            serde_json::from_str(r#"{"name":"Early","price":"20","quantity":10}"#).unwrap();
        assert!(parsed.active);
    }
}
