use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::gateway;
use crate::models::{AttendanceStatus, PaymentIntent, PaymentIntentStatus, Ticket, TicketStatus};
use crate::services::{fetch_event, pricing};
use crate::state::AppState;
use crate::utils::error::AppError;

/// Query parameters the gateway appends to the success back URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    pub payment_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub ticket: Ticket,
    /// True when this callback found the purchase already materialized
    /// (refresh, back button, concurrent duplicate).
    pub already_reconciled: bool,
}

/// Convert an external payment confirmation into a durable Ticket and a
/// confirmed AttendanceRecord, exactly once.
pub async fn reconcile(
    state: &AppState,
    user_id: Uuid,
    params: &CallbackParams,
) -> Result<ReconcileOutcome, AppError> {
    // The redirect parameter only short-circuits the obvious failure case.
    if params.status != gateway::APPROVED {
        return Err(AppError::PaymentNotApproved(format!(
            "payment returned with status '{}'",
            params.status
        )));
    }

    // The gateway, not the query string, decides whether the payment is
    // real and approved.
    let lookup = state.gateway.lookup_payment(&params.payment_id).await?;
    if !lookup.is_approved() {
        return Err(AppError::PaymentNotApproved(format!(
            "gateway reports payment '{}' as '{}'",
            lookup.id, lookup.status
        )));
    }

    // A consumed intent still identifies the purchase: a refresh of the
    // success page lands here after the first reconciliation committed.
    let intent = latest_intent(&state.pool, user_id).await?.ok_or_else(|| {
        AppError::MissingCorrelation(
            "no checkout attempt on record for this user; contact support".to_string(),
        )
    })?;

    if let Some(existing) = valid_ticket(&state.pool, intent.event_id, user_id).await? {
        return Ok(ReconcileOutcome {
            ticket: existing,
            already_reconciled: true,
        });
    }

    let event = fetch_event(&state.pool, intent.event_id).await?;
    let resolved = pricing::resolve_price(&state.pool, &event, intent.lot_id).await?;

    let issued_at = Utc::now();
    let qr_code = derive_qr_code(&params.payment_id, user_id, issued_at);

    let mut tx = state.pool.begin().await?;

    // The partial unique index on valid tickets makes this insert the
    // idempotency point; a concurrent duplicate reconciliation inserts
    // nothing here.
    let ticket: Option<Ticket> = sqlx::query_as(
        "INSERT INTO tickets (event_id, user_id, status, price_paid, qr_code)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (event_id, user_id) WHERE status = 'valid' DO NOTHING
         RETURNING *",
    )
    .bind(intent.event_id)
    .bind(user_id)
    .bind(TicketStatus::Valid)
    .bind(resolved.amount)
    .bind(&qr_code)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(ticket) = ticket else {
        // Another reconciliation of the same payment won the race.
        drop(tx);
        let existing = valid_ticket(&state.pool, intent.event_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::Conflict("ticket reconciliation raced and lost".to_string())
            })?;
        return Ok(ReconcileOutcome {
            ticket: existing,
            already_reconciled: true,
        });
    };

    // Promote a pending request or create the row outright; an existing
    // confirmed row makes this a no-op.
    let newly_confirmed: Option<Uuid> = sqlx::query_scalar(
        "INSERT INTO attendees (event_id, user_id, status) VALUES ($1, $2, $3)
         ON CONFLICT (event_id, user_id) DO UPDATE SET status = EXCLUDED.status
         WHERE attendees.status <> EXCLUDED.status
         RETURNING user_id",
    )
    .bind(intent.event_id)
    .bind(user_id)
    .bind(AttendanceStatus::Confirmed)
    .fetch_optional(&mut *tx)
    .await?;

    if newly_confirmed.is_some() {
        sqlx::query(
            "UPDATE events
             SET participant_count = participant_count + 1, updated_at = now()
             WHERE id = $1",
        )
        .bind(intent.event_id)
        .execute(&mut *tx)
        .await?;
    }

    // The correlation is cleared only in the transaction that commits the
    // ticket and the attendance row, so a failure before this point leaves
    // the intent intact and the callback retryable.
    sqlx::query(
        "UPDATE payment_intents SET status = $2, updated_at = now()
         WHERE id = $1 AND status = $3",
    )
    .bind(intent.id)
    .bind(PaymentIntentStatus::Consumed)
    .bind(PaymentIntentStatus::Pending)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    state
        .notifier
        .ticket_issued(intent.event_id, user_id, ticket.id);

    tracing::info!(
        event_id = %intent.event_id,
        %user_id,
        ticket_id = %ticket.id,
        payment_id = %params.payment_id,
        "payment reconciled into ticket"
    );

    Ok(ReconcileOutcome {
        ticket,
        already_reconciled: false,
    })
}

async fn latest_intent(pool: &PgPool, user_id: Uuid) -> Result<Option<PaymentIntent>, AppError> {
    let intent = sqlx::query_as::<_, PaymentIntent>(
        "SELECT * FROM payment_intents
         WHERE user_id = $1 AND status IN ($2, $3)
         ORDER BY created_at DESC
         LIMIT 1",
    )
    .bind(user_id)
    .bind(PaymentIntentStatus::Pending)
    .bind(PaymentIntentStatus::Consumed)
    .fetch_optional(pool)
    .await?;
    Ok(intent)
}

async fn valid_ticket(
    pool: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Ticket>, AppError> {
    let ticket = sqlx::query_as::<_, Ticket>(
        "SELECT * FROM tickets WHERE event_id = $1 AND user_id = $2 AND status = $3",
    )
    .bind(event_id)
    .bind(user_id)
    .bind(TicketStatus::Valid)
    .fetch_optional(pool)
    .await?;
    Ok(ticket)
}

fn derive_qr_code(payment_id: &str, user_id: Uuid, issued_at: DateTime<Utc>) -> String {
    format!(
        "TKT-{payment_id}-{}-{}",
        user_id.simple(),
        issued_at.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn qr_codes_embed_the_payment_and_user() {
        let user = Uuid::new_v4();
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let qr = derive_qr_code("pay_123", user, issued);

        assert!(qr.contains("pay_123"));
        assert!(qr.contains(&user.simple().to_string()));
    }

    #[test]
    fn qr_codes_differ_across_users_for_the_same_payment() {
        let issued = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let a = derive_qr_code("pay_123", Uuid::new_v4(), issued);
        let b = derive_qr_code("pay_123", Uuid::new_v4(), issued);
        assert_ne!(a, b);
    }

    #[test]
    fn callback_params_deserialize_from_the_redirect_query() {
        let params: CallbackParams =
            serde_json::from_str(r#"{"payment_id":"pay_9","status":"approved"}"#).unwrap();
        assert_eq!(params.payment_id, "pay_9");
        assert_eq!(params.status, gateway::APPROVED);
    }
}
