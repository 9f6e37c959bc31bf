use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::gateway::{BackUrls, CheckoutPreference, PreferenceMetadata, PreferencePayer};
use crate::models::{PaymentIntentStatus, User};
use crate::services::{fetch_event, pricing};
use crate::state::AppState;
use crate::utils::error::AppError;

/// Hand-off to the payment gateway. The caller redirects the user to
/// `redirect_url` and control leaves this service until the gateway sends
/// the user back.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub checkout_id: String,
    pub redirect_url: String,
}

pub async fn start_checkout(
    state: &AppState,
    event_id: Uuid,
    user_id: Uuid,
    lot_id: Option<Uuid>,
) -> Result<CheckoutSession, AppError> {
    let event = fetch_event(&state.pool, event_id).await?;
    let resolved = pricing::resolve_price(&state.pool, &event, lot_id).await?;

    if resolved.amount == Decimal::ZERO {
        return Err(AppError::InvalidPrice(
            "free attendance does not go through checkout".to_string(),
        ));
    }

    let payer = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id '{user_id}' was not found")))?;

    let preference = CheckoutPreference::single_item(
        lot_id.unwrap_or(event.id),
        resolved.display_name.clone(),
        resolved.amount,
        resolved.currency.clone(),
        PreferencePayer {
            email: payer.email,
            name: payer.name,
            surname: payer.surname,
        },
        back_urls(&state.public_base_url),
        PreferenceMetadata {
            user_id,
            event_id,
            lot_id,
        },
    );

    // Nothing durable exists yet; a gateway failure here leaves no state
    // behind and the whole call can be retried.
    let created = state.gateway.create_preference(&preference).await?;

    // Record the correlation before the user is redirected. The reconciler
    // recovers (event, lot) from this row, never from the client.
    let mut tx = state.pool.begin().await?;

    sqlx::query(
        "UPDATE payment_intents SET status = $2, updated_at = now()
         WHERE user_id = $1 AND status = $3",
    )
    .bind(user_id)
    .bind(PaymentIntentStatus::Superseded)
    .bind(PaymentIntentStatus::Pending)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO payment_intents (user_id, event_id, lot_id, checkout_id)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(event_id)
    .bind(lot_id)
    .bind(&created.id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        %event_id,
        %user_id,
        checkout_id = %created.id,
        "checkout preference created"
    );

    Ok(CheckoutSession {
        checkout_id: created.id,
        redirect_url: created.init_point,
    })
}

fn back_urls(public_base_url: &str) -> BackUrls {
    let base = public_base_url.trim_end_matches('/');
    BackUrls {
        success: format!("{base}/payments/return"),
        failure: format!("{base}/payments/failure"),
        pending: format!("{base}/payments/pending"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_urls_point_at_the_payment_routes() {
        let urls = back_urls("http://localhost:3001/");
        assert_eq!(urls.success, "http://localhost:3001/payments/return");
        assert_eq!(urls.failure, "http://localhost:3001/payments/failure");
        assert_eq!(urls.pending, "http://localhost:3001/payments/pending");
    }
}
