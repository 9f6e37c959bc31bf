use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Event;
use crate::utils::error::AppError;

pub mod attendance;
pub mod checkout;
pub mod lots;
pub mod pricing;
pub mod reconcile;

pub(crate) async fn fetch_event(pool: &PgPool, event_id: Uuid) -> Result<Event, AppError> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{event_id}' was not found")))
}

/// Organizer-only operations verify the caller against the stored event
/// row, never against anything client-supplied.
pub(crate) fn require_organizer(event: &Event, caller: Uuid) -> Result<(), AppError> {
    if event.organizer_id == caller {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "only the event organizer may perform this action".to_string(),
        ))
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use crate::models::{Event, EventPrivacy, TicketLot};

    pub fn event(privacy: EventPrivacy, price: Decimal) -> Event {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Event {
            id: Uuid::new_v4(),
            organizer_id: Uuid::new_v4(),
            title: "Rust Meetup".to_string(),
            description: None,
            location: "Cordoba".to_string(),
            privacy,
            price,
            currency: "USD".to_string(),
            max_participants: None,
            participant_count: 0,
            starts_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn lot(event_id: Uuid, name: &str, price: Decimal, active: bool) -> TicketLot {
        let now = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
        TicketLot {
            id: Uuid::new_v4(),
            event_id,
            name: name.to_string(),
            price,
            quantity: 100,
            start_date: None,
            active,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    use crate::models::EventPrivacy;

    #[test]
    fn require_organizer_rejects_everyone_else() {
        let event = test_fixtures::event(EventPrivacy::Public, Decimal::ZERO);
        assert!(require_organizer(&event, event.organizer_id).is_ok());
        assert!(matches!(
            require_organizer(&event, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }
}
