use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Event, TicketLot};
use crate::utils::error::AppError;

/// The price a purchase will actually be charged. Client-submitted amounts
/// are never consulted; every checkout and every reconciliation goes
/// through this resolver.
#[derive(Debug, Clone)]
pub struct ResolvedPrice {
    pub amount: Decimal,
    pub display_name: String,
    pub currency: String,
}

pub async fn resolve_price(
    pool: &PgPool,
    event: &Event,
    lot_id: Option<Uuid>,
) -> Result<ResolvedPrice, AppError> {
    let resolved = match lot_id {
        Some(lot_id) => {
            let lot = sqlx::query_as::<_, TicketLot>(
                "SELECT * FROM event_lots WHERE id = $1 AND event_id = $2",
            )
            .bind(lot_id)
            .bind(event.id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                AppError::InvalidLot(format!("lot '{lot_id}' does not exist for this event"))
            })?;

            lot_price(event, &lot, Utc::now())?
        }
        None => ResolvedPrice {
            amount: event.price,
            display_name: event.title.clone(),
            currency: event.currency.clone(),
        },
    };

    if resolved.amount < Decimal::ZERO {
        return Err(AppError::InvalidPrice(format!(
            "resolved price {} is negative",
            resolved.amount
        )));
    }

    Ok(resolved)
}

fn lot_price(event: &Event, lot: &TicketLot, now: DateTime<Utc>) -> Result<ResolvedPrice, AppError> {
    if !lot.active {
        return Err(AppError::InvalidLot(format!(
            "lot '{}' is not active",
            lot.name
        )));
    }
    if let Some(start) = lot.start_date {
        if start > now {
            return Err(AppError::InvalidLot(format!(
                "lot '{}' is not on sale yet",
                lot.name
            )));
        }
    }

    Ok(ResolvedPrice {
        amount: lot.price,
        display_name: format!("{} - {}", event.title, lot.name),
        currency: event.currency.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use crate::models::EventPrivacy;
    use crate::services::test_fixtures;

    #[test]
    fn active_lot_resolves_to_its_stored_price() {
        let event = test_fixtures::event(EventPrivacy::Public, dec!(40));
        let lot = test_fixtures::lot(event.id, "Early Bird", dec!(20), true);

        let resolved = lot_price(&event, &lot, Utc::now()).unwrap();
        assert_eq!(resolved.amount, dec!(20));
        assert_eq!(resolved.display_name, "Rust Meetup - Early Bird");
        assert_eq!(resolved.currency, "USD");
    }

    #[test]
    fn inactive_lot_is_rejected() {
        let event = test_fixtures::event(EventPrivacy::Public, dec!(40));
        let lot = test_fixtures::lot(event.id, "Closed", dec!(20), false);

        assert!(matches!(
            lot_price(&event, &lot, Utc::now()),
            Err(AppError::InvalidLot(_))
        ));
    }

    #[test]
    fn lot_not_yet_on_sale_is_rejected() {
        let event = test_fixtures::event(EventPrivacy::Public, dec!(40));
        let mut lot = test_fixtures::lot(event.id, "Late", dec!(30), true);
        let now = Utc::now();
        lot.start_date = Some(now + Duration::days(2));

        assert!(matches!(
            lot_price(&event, &lot, now),
            Err(AppError::InvalidLot(_))
        ));
    }

    #[test]
    fn sale_already_open_is_accepted() {
        let event = test_fixtures::event(EventPrivacy::Public, dec!(40));
        let mut lot = test_fixtures::lot(event.id, "Open", dec!(30), true);
        let now = Utc::now();
        lot.start_date = Some(now - Duration::days(1));

        assert!(lot_price(&event, &lot, now).is_ok());
    }
}
