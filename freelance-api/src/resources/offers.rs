use super::crud;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, CurrentUser, QueryPairs, Uploads};
use crate::headers;
use crate::state::AppState;
use axum::extract::{OriginalUri, Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use freelance_core::service::{MediaLink, OfferCreate, OfferUpdate, ReviewCreate};
use freelance_core::storage::Entity;
use freelance_core::{Offer, OfferMedia, OfferReview};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/offers", get(list).post(create))
        .route("/api/offers/count", get(crud::count::<Offer>))
        .route(
            "/api/offers/:id",
            get(crud::get_one::<Offer>).patch(update).delete(delete),
        )
        .route(
            "/api/offers/:id/media",
            get(media).post(upload_media).delete(delete_media),
        )
        .route("/api/offers/:id/reviews", post(review))
}

async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    query: QueryPairs,
) -> ApiResult<Response> {
    let criteria = query.criteria(&Offer::TABLE)?;
    let page = query.pageable(&Offer::TABLE, &state)?;
    let result = state.market.offers().list_short(&criteria, &page).await?;
    Ok(crud::paged(headers::pagination(&uri, &result), result.content))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(request): ApiJson<OfferCreate>,
) -> ApiResult<Response> {
    let offer = state.market.offers().create(&actor, request).await?;
    Ok(crud::created(Offer::TABLE.resource, Offer::TABLE.entity, offer.id, offer))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<OfferUpdate>,
) -> ApiResult<Response> {
    let offer = state.market.offers().update(&actor, id, request).await?;
    Ok(crud::updated(Offer::TABLE.entity, offer.id, offer))
}

async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    state.market.offers().delete(&actor, id).await?;
    Ok(crud::deleted(Offer::TABLE.entity, id))
}

async fn media(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Vec<MediaLink>>> {
    Ok(Json(state.market.offers().media(id).await?))
}

async fn upload_media(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    uploads: Uploads,
) -> ApiResult<Json<Vec<OfferMedia>>> {
    let files = uploads.named("files");
    Ok(Json(state.market.offers().upload_media(&actor, id, &files).await?))
}

/// `?ids=1,2` or repeated `ids` parameters.
async fn delete_media(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    query: QueryPairs,
) -> ApiResult<Response> {
    let ids = query
        .0
        .iter()
        .filter(|(key, _)| key == "ids")
        .flat_map(|(_, raw)| raw.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ApiError::malformed("invalidIds", format!("'{s}' is not a media id")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    state.market.offers().delete_media(&actor, id, &ids).await?;
    Ok(crud::deleted(OfferMedia::TABLE.entity, id))
}

async fn review(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ReviewCreate>,
) -> ApiResult<Response> {
    let saved = state.market.reviews().review_offer(&actor, id, request).await?;
    Ok(crud::created(
        OfferReview::TABLE.resource,
        OfferReview::TABLE.entity,
        saved.id,
        saved,
    ))
}
