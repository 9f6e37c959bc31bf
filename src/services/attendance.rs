use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceStatus, Event, EventPrivacy};
use crate::notifications::NotificationSink;
use crate::services::{fetch_event, require_organizer};
use crate::utils::error::AppError;

/// What a join request resolved to. `CheckoutRequired` means no record was
/// created; attendance for paid events materializes only on reconciled
/// payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    Confirmed,
    Pending,
    CheckoutRequired,
    AlreadyRequested,
    AlreadyAttending,
}

enum JoinAction {
    Noop(JoinOutcome),
    CreatePending,
    CreateConfirmed,
    Checkout,
}

fn classify_join(
    event: &Event,
    existing: Option<AttendanceStatus>,
    user_id: Uuid,
) -> Result<JoinAction, AppError> {
    match existing {
        Some(AttendanceStatus::Pending) => return Ok(JoinAction::Noop(JoinOutcome::AlreadyRequested)),
        Some(AttendanceStatus::Confirmed) => {
            return Ok(JoinAction::Noop(JoinOutcome::AlreadyAttending))
        }
        None => {}
    }

    // Privacy gates membership before payment does: a private event always
    // goes through organizer approval first.
    if event.privacy == EventPrivacy::Private && user_id != event.organizer_id {
        return Ok(JoinAction::CreatePending);
    }

    if event.is_paid() {
        return Ok(JoinAction::Checkout);
    }

    if event.is_full() {
        return Err(AppError::Conflict("event is at capacity".to_string()));
    }

    Ok(JoinAction::CreateConfirmed)
}

pub async fn request_join(
    pool: &PgPool,
    notifier: &dyn NotificationSink,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<JoinOutcome, AppError> {
    let event = fetch_event(pool, event_id).await?;

    let existing: Option<AttendanceStatus> =
        sqlx::query_scalar("SELECT status FROM attendees WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    match classify_join(&event, existing, user_id)? {
        JoinAction::Noop(outcome) => Ok(outcome),
        JoinAction::Checkout => Ok(JoinOutcome::CheckoutRequired),
        JoinAction::CreatePending => {
            let inserted = sqlx::query(
                "INSERT INTO attendees (event_id, user_id, status) VALUES ($1, $2, $3)
                 ON CONFLICT (event_id, user_id) DO NOTHING",
            )
            .bind(event_id)
            .bind(user_id)
            .bind(AttendanceStatus::Pending)
            .execute(pool)
            .await?;

            // Lost a double-submission race: same answer as the pre-check.
            if inserted.rows_affected() == 0 {
                return Ok(JoinOutcome::AlreadyRequested);
            }

            notifier.join_requested(event.id, event.organizer_id, user_id);
            Ok(JoinOutcome::Pending)
        }
        JoinAction::CreateConfirmed => {
            let mut tx = pool.begin().await?;

            let inserted = sqlx::query(
                "INSERT INTO attendees (event_id, user_id, status) VALUES ($1, $2, $3)
                 ON CONFLICT (event_id, user_id) DO NOTHING",
            )
            .bind(event_id)
            .bind(user_id)
            .bind(AttendanceStatus::Confirmed)
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 0 {
                return Ok(JoinOutcome::AlreadyAttending);
            }

            bump_participant_count(&mut tx, event_id).await?;
            tx.commit().await?;
            Ok(JoinOutcome::Confirmed)
        }
    }
}

/// Increment the visible count, refusing to pass `max_participants`. Runs
/// inside the transaction that confirms the attendee, so the count and the
/// rows never diverge.
async fn bump_participant_count(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    event_id: Uuid,
) -> Result<(), AppError> {
    let bumped = sqlx::query(
        "UPDATE events
         SET participant_count = participant_count + 1, updated_at = now()
         WHERE id = $1
           AND (max_participants IS NULL OR participant_count < max_participants)",
    )
    .bind(event_id)
    .execute(&mut **tx)
    .await?;

    if bumped.rows_affected() == 0 {
        return Err(AppError::Conflict("event is at capacity".to_string()));
    }
    Ok(())
}

/// Self-cancellation, free-origin attendance only. The delete is guarded
/// against rows backed by a valid ticket; a paid attendee goes through
/// support instead.
pub async fn leave(pool: &PgPool, event_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let removed: Option<AttendanceStatus> = sqlx::query_scalar(
        "DELETE FROM attendees
         WHERE event_id = $1 AND user_id = $2
           AND NOT EXISTS (
               SELECT 1 FROM tickets t
               WHERE t.event_id = $1 AND t.user_id = $2 AND t.status = $3
           )
         RETURNING status",
    )
    .bind(event_id)
    .bind(user_id)
    .bind(crate::models::TicketStatus::Valid)
    .fetch_optional(&mut *tx)
    .await?;

    match removed {
        Some(AttendanceStatus::Confirmed) => {
            sqlx::query(
                "UPDATE events
                 SET participant_count = participant_count - 1, updated_at = now()
                 WHERE id = $1",
            )
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(())
        }
        Some(AttendanceStatus::Pending) => {
            tx.commit().await?;
            Ok(())
        }
        None => {
            let holds_ticket: bool = sqlx::query_scalar(
                "SELECT EXISTS (
                     SELECT 1 FROM tickets
                     WHERE event_id = $1 AND user_id = $2 AND status = $3
                 )",
            )
            .bind(event_id)
            .bind(user_id)
            .bind(crate::models::TicketStatus::Valid)
            .fetch_one(pool)
            .await?;

            if holds_ticket {
                Err(AppError::ValidationError(
                    "paid attendance cannot be cancelled here; contact support".to_string(),
                ))
            } else {
                Err(AppError::NotFound(
                    "no attendance record for this event".to_string(),
                ))
            }
        }
    }
}

/// Organizer decision on a pending join request. Both branches are
/// single-row conditional writes on the expected prior status, so a
/// concurrent leave or duplicate decision loses cleanly.
pub async fn decide(
    pool: &PgPool,
    notifier: &dyn NotificationSink,
    event_id: Uuid,
    subject_user: Uuid,
    approve: bool,
    caller: Uuid,
) -> Result<(), AppError> {
    let event = fetch_event(pool, event_id).await?;
    require_organizer(&event, caller)?;

    if approve {
        let mut tx = pool.begin().await?;

        let promoted = sqlx::query(
            "UPDATE attendees SET status = $3
             WHERE event_id = $1 AND user_id = $2 AND status = $4",
        )
        .bind(event_id)
        .bind(subject_user)
        .bind(AttendanceStatus::Confirmed)
        .bind(AttendanceStatus::Pending)
        .execute(&mut *tx)
        .await?;

        if promoted.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "join request is no longer pending".to_string(),
            ));
        }

        bump_participant_count(&mut tx, event_id).await?;
        tx.commit().await?;

        notifier.join_approved(event_id, subject_user);
        Ok(())
    } else {
        let removed = sqlx::query(
            "DELETE FROM attendees WHERE event_id = $1 AND user_id = $2 AND status = $3",
        )
        .bind(event_id)
        .bind(subject_user)
        .bind(AttendanceStatus::Pending)
        .execute(pool)
        .await?;

        if removed.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "join request is no longer pending".to_string(),
            ));
        }
        Ok(())
    }
}

pub async fn list_attendees(
    pool: &PgPool,
    event_id: Uuid,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let attendees = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendees WHERE event_id = $1 ORDER BY created_at",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(attendees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::services::test_fixtures;

    #[test]
    fn private_events_never_confirm_directly() {
        let event = test_fixtures::event(EventPrivacy::Private, Decimal::ZERO);
        let action = classify_join(&event, None, Uuid::new_v4()).unwrap();
        assert!(matches!(action, JoinAction::CreatePending));
    }

    #[test]
    fn organizer_joins_their_own_private_event_directly() {
        let event = test_fixtures::event(EventPrivacy::Private, Decimal::ZERO);
        let action = classify_join(&event, None, event.organizer_id).unwrap();
        assert!(matches!(action, JoinAction::CreateConfirmed));
    }

    #[test]
    fn public_free_events_confirm_directly() {
        let event = test_fixtures::event(EventPrivacy::Public, Decimal::ZERO);
        let action = classify_join(&event, None, Uuid::new_v4()).unwrap();
        assert!(matches!(action, JoinAction::CreateConfirmed));
    }

    #[test]
    fn paid_events_delegate_to_checkout_without_a_record() {
        let event = test_fixtures::event(EventPrivacy::Public, dec!(25));
        let action = classify_join(&event, None, Uuid::new_v4()).unwrap();
        assert!(matches!(action, JoinAction::Checkout));
    }

    #[test]
    fn repeated_requests_are_noops() {
        let event = test_fixtures::event(EventPrivacy::Public, Decimal::ZERO);
        let again = classify_join(&event, Some(AttendanceStatus::Pending), Uuid::new_v4()).unwrap();
        assert!(matches!(
            again,
            JoinAction::Noop(JoinOutcome::AlreadyRequested)
        ));

        let attending =
            classify_join(&event, Some(AttendanceStatus::Confirmed), Uuid::new_v4()).unwrap();
        assert!(matches!(
            attending,
            JoinAction::Noop(JoinOutcome::AlreadyAttending)
        ));
    }

    #[test]
    fn full_events_reject_new_confirmations() {
        let mut event = test_fixtures::event(EventPrivacy::Public, Decimal::ZERO);
        event.max_participants = Some(2);
        event.participant_count = 2;

        assert!(matches!(
            classify_join(&event, None, Uuid::new_v4()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn capacity_does_not_block_pending_requests() {
        let mut event = test_fixtures::event(EventPrivacy::Private, Decimal::ZERO);
        event.max_participants = Some(1);
        event.participant_count = 1;

        let action = classify_join(&event, None, Uuid::new_v4()).unwrap();
        assert!(matches!(action, JoinAction::CreatePending));
    }
}
