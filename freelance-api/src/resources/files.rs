use super::crud;
use crate::error::ApiResult;
use crate::extract::{CurrentUser, Uploads};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use freelance_core::storage::Entity;
use freelance_core::FileObject;

const UPLOAD_CATEGORY: &str = "files";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/file-objects",
            get(crud::list::<FileObject>).post(crud::create::<FileObject>),
        )
        .route("/api/file-objects/count", get(crud::count::<FileObject>))
        .route("/api/file-objects/upload", post(upload))
        .route(
            "/api/file-objects/:id",
            get(crud::get_one::<FileObject>)
                .put(crud::update::<FileObject>)
                .patch(crud::partial_update::<FileObject>)
                .delete(delete),
        )
        .route("/api/file-objects/:id/content", get(content))
}

async fn upload(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    mut uploads: Uploads,
) -> ApiResult<Response> {
    let file = uploads.take(&["file"])?;
    let saved = state.market.files().store_upload(&actor, UPLOAD_CATEGORY, &file).await?;
    Ok(crud::created(
        FileObject::TABLE.resource,
        FileObject::TABLE.entity,
        saved.id,
        saved,
    ))
}

/// Raw bytes served with the recorded content type.
async fn content(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Response> {
    let (file, bytes) = state.market.files().content(id).await?;
    let content_type = file
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());
    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    actor.require_login()?;
    state.market.files().delete_with_content(id).await?;
    Ok(crud::deleted(FileObject::TABLE.entity, id))
}
