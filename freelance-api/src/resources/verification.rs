use super::crud;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, QueryPairs, Uploads};
use crate::headers;
use crate::state::AppState;
use axum::extract::{OriginalUri, Path, State};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use freelance_core::storage::Entity;
use freelance_core::{VerificationRequest, VerificationRequestStatus};

const PHOTO_PART: &str = "verification-photo";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/verification-requests", get(list_all))
        .route("/api/verification-requests/count", get(crud::count::<VerificationRequest>))
        .route("/api/verification-requests/my", get(list_mine))
        .route(
            "/api/verification-requests/:id",
            get(crud::get_one::<VerificationRequest>),
        )
        .route("/api/verification-requests/request-verification", post(request))
        .route(
            "/api/verification-requests/update-status/:id/:status",
            patch(update_status),
        )
        .route("/api/verification-requests/cancel-request/:id", patch(cancel))
}

pub(super) async fn request(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    mut uploads: Uploads,
) -> ApiResult<Response> {
    let photo = uploads.take(&[PHOTO_PART, "file"])?;
    let saved = state.market.verification().request(&actor, &photo).await?;
    Ok(crud::created(
        VerificationRequest::TABLE.resource,
        VerificationRequest::TABLE.entity,
        saved.id,
        saved,
    ))
}

async fn list_all(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    OriginalUri(uri): OriginalUri,
    query: QueryPairs,
) -> ApiResult<Response> {
    let criteria = query.criteria(&VerificationRequest::TABLE)?;
    let page = query.pageable(&VerificationRequest::TABLE, &state)?;
    let result = state.market.verification().list_all(&actor, &criteria, &page).await?;
    Ok(crud::paged(headers::pagination(&uri, &result), result.content))
}

async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    OriginalUri(uri): OriginalUri,
    query: QueryPairs,
) -> ApiResult<Response> {
    let criteria = query.criteria(&VerificationRequest::TABLE)?;
    let page = query.pageable(&VerificationRequest::TABLE, &state)?;
    let result = state.market.verification().list_mine(&actor, criteria, &page).await?;
    Ok(crud::paged(headers::pagination(&uri, &result), result.content))
}

/// The optional plain-text body is the rejection message, stored as sent.
async fn update_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((id, status)): Path<(i64, String)>,
    body: String,
) -> ApiResult<Json<VerificationRequest>> {
    let status: VerificationRequestStatus = status.parse()?;
    let message = Some(body).filter(|m| !m.is_empty());
    let saved = state
        .market
        .verification()
        .update_status(&actor, id, status, message)
        .await?;
    Ok(Json(saved))
}

async fn cancel(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<VerificationRequest>> {
    Ok(Json(state.market.verification().cancel(&actor, id).await?))
}
