use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::services::lots::{self, LotDraft};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::CurrentUser;
use crate::utils::response::{created, empty_success, success};

pub async fn create(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    caller: CurrentUser,
    Json(draft): Json<LotDraft>,
) -> Result<Response, AppError> {
    let lot = lots::create_lot(&state.pool, event_id, caller.0, draft).await?;
    Ok(created(lot, "Lot created").into_response())
}

pub async fn list(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let lots = lots::list_lots(&state.pool, event_id).await?;
    Ok(success(lots, "Lots retrieved").into_response())
}

pub async fn update(
    State(state): State<AppState>,
    Path((event_id, lot_id)): Path<(Uuid, Uuid)>,
    caller: CurrentUser,
    Json(draft): Json<LotDraft>,
) -> Result<Response, AppError> {
    let lot = lots::update_lot(&state.pool, event_id, lot_id, caller.0, draft).await?;
    Ok(success(lot, "Lot updated").into_response())
}

pub async fn remove(
    State(state): State<AppState>,
    Path((event_id, lot_id)): Path<(Uuid, Uuid)>,
    caller: CurrentUser,
) -> Result<Response, AppError> {
    lots::delete_lot(&state.pool, event_id, lot_id, caller.0).await?;
    Ok(empty_success("Lot deleted").into_response())
}
