use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::attendance::{self, JoinOutcome};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::CurrentUser;
use crate::utils::response::{empty_success, success};

#[derive(Serialize)]
struct JoinPayload {
    outcome: JoinOutcome,
}

pub async fn request_join(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let outcome =
        attendance::request_join(&state.pool, state.notifier.as_ref(), event_id, user.0).await?;

    let message = match outcome {
        JoinOutcome::Confirmed => "You are attending this event",
        JoinOutcome::Pending => "Join request sent to the organizer",
        JoinOutcome::CheckoutRequired => "This event is paid; start a checkout to attend",
        JoinOutcome::AlreadyRequested => "Join request already pending",
        JoinOutcome::AlreadyAttending => "You are already attending this event",
    };

    Ok(success(JoinPayload { outcome }, message).into_response())
}

pub async fn leave(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    attendance::leave(&state.pool, event_id, user.0).await?;
    Ok(empty_success("You left the event").into_response())
}

#[derive(Deserialize)]
pub struct DecisionBody {
    pub approve: bool,
}

pub async fn decide(
    State(state): State<AppState>,
    Path((event_id, subject_user)): Path<(Uuid, Uuid)>,
    caller: CurrentUser,
    Json(body): Json<DecisionBody>,
) -> Result<Response, AppError> {
    attendance::decide(
        &state.pool,
        state.notifier.as_ref(),
        event_id,
        subject_user,
        body.approve,
        caller.0,
    )
    .await?;

    let message = if body.approve {
        "Join request approved"
    } else {
        "Join request rejected"
    };
    Ok(empty_success(message).into_response())
}

pub async fn list_attendees(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let attendees = attendance::list_attendees(&state.pool, event_id).await?;
    Ok(success(attendees, "Attendees retrieved").into_response())
}
