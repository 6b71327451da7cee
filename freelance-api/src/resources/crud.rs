//! Generic REST handlers shared by every entity resource.
//!
//! [`routes`] mounts the full set; workflow resources mount only the pieces
//! they do not override.

use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser, QueryPairs};
use crate::headers;
use crate::state::AppState;
use axum::extract::{OriginalUri, Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use freelance_core::Entity;
use serde::Serialize;
use serde_json::Value;

pub fn collection_path<E: Entity>() -> String {
    format!("/api/{}", E::TABLE.resource)
}

pub fn count_path<E: Entity>() -> String {
    format!("/api/{}/count", E::TABLE.resource)
}

pub fn item_path<E: Entity>() -> String {
    format!("/api/{}/:id", E::TABLE.resource)
}

pub fn routes<E: Entity>() -> Router<AppState> {
    Router::new()
        .route(&collection_path::<E>(), get(list::<E>).post(create::<E>))
        .route(&count_path::<E>(), get(count::<E>))
        .route(
            &item_path::<E>(),
            get(get_one::<E>)
                .put(update::<E>)
                .patch(partial_update::<E>)
                .delete(delete::<E>),
        )
}

/// 201 with `Location` and the created alert.
pub fn created<T: Serialize>(resource: &str, entity: &str, id: Option<i64>, body: T) -> Response {
    let id = id.unwrap_or_default();
    let mut headers = headers::created_alert(entity, id);
    if let Ok(location) = HeaderValue::from_str(&format!("/api/{resource}/{id}")) {
        headers.insert(LOCATION, location);
    }
    (StatusCode::CREATED, headers, Json(body)).into_response()
}

pub fn updated<T: Serialize>(entity: &str, id: Option<i64>, body: T) -> Response {
    (headers::updated_alert(entity, id.unwrap_or_default()), Json(body)).into_response()
}

pub fn deleted(entity: &str, id: i64) -> Response {
    (StatusCode::NO_CONTENT, headers::deleted_alert(entity, id)).into_response()
}

pub fn paged<T: Serialize>(headers: HeaderMap, content: Vec<T>) -> Response {
    (headers, Json(content)).into_response()
}

pub async fn list<E: Entity>(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: QueryPairs,
) -> ApiResult<Response> {
    let criteria = query.criteria(&E::TABLE)?;
    let page = query.pageable(&E::TABLE, &state)?;
    let result = state.market.crud::<E>().find_page(&criteria, &page).await?;
    Ok(paged(headers::pagination(&uri, &result), result.content))
}

pub async fn count<E: Entity>(State(state): State<AppState>, query: QueryPairs) -> ApiResult<Json<u64>> {
    let criteria = query.criteria(&E::TABLE)?;
    Ok(Json(state.market.crud::<E>().count(&criteria).await?))
}

pub async fn get_one<E: Entity>(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<E>> {
    Ok(Json(state.market.crud::<E>().find_one(id).await?))
}

pub async fn create<E: Entity>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(entity): ApiJson<E>,
) -> ApiResult<Response> {
    actor.require_login()?;
    let saved = state.market.crud::<E>().create(&actor, entity).await?;
    Ok(created(E::TABLE.resource, E::TABLE.entity, saved.id(), saved))
}

pub async fn update<E: Entity>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(entity): ApiJson<E>,
) -> ApiResult<Response> {
    actor.require_login()?;
    let saved = state.market.crud::<E>().update(&actor, id, entity).await?;
    Ok(updated(E::TABLE.entity, saved.id(), saved))
}

pub async fn partial_update<E: Entity>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(patch): ApiJson<Value>,
) -> ApiResult<Response> {
    actor.require_login()?;
    let saved = state.market.crud::<E>().partial_update(&actor, id, patch).await?;
    Ok(updated(E::TABLE.entity, saved.id(), saved))
}

pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    actor.require_login()?;
    state.market.crud::<E>().delete(id).await?;
    Ok(deleted(E::TABLE.entity, id))
}
