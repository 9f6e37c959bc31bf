use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::services::checkout;
use crate::services::reconcile::{self, CallbackParams};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::CurrentUser;
use crate::utils::response::success;

#[derive(Deserialize, Default)]
pub struct CheckoutBody {
    /// Optional ticket tier. The lot's stored price is authoritative; any
    /// price field a client sends alongside is ignored by deserialization.
    pub lot_id: Option<Uuid>,
}

pub async fn start(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    user: CurrentUser,
    body: Option<Json<CheckoutBody>>,
) -> Result<Response, AppError> {
    let Json(body) = body.unwrap_or_default();
    let session = checkout::start_checkout(&state, event_id, user.0, body.lot_id).await?;
    Ok(success(session, "Checkout created; redirect the user").into_response())
}

pub async fn payment_return(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let outcome = reconcile::reconcile(&state, user.0, &params).await?;

    let message = if outcome.already_reconciled {
        "Payment already reconciled; your ticket is unchanged"
    } else {
        "Payment confirmed; ticket issued"
    };
    Ok(success(outcome, message).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_supplied_prices_never_reach_the_checkout() {
        // A tampered body carrying a price is parsed down to just the lot
        // reference; the resolver supplies the amount.
        let body: CheckoutBody = serde_json::from_str(
            r#"{"lot_id":"00000000-0000-0000-0000-000000000000","price":1,"unit_price":1}"#,
        )
        .unwrap();
        assert_eq!(body.lot_id, Some(Uuid::nil()));
    }
}
