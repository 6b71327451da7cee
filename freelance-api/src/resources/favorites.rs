use super::crud;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use freelance_core::service::FavoriteOfferView;
use freelance_core::storage::Entity;
use freelance_core::FavoriteOffer;

pub fn routes() -> Router<AppState> {
    crud::routes::<FavoriteOffer>()
        .route("/api/favorite-offers/offer/:offer_id", post(add))
        .route("/api/favorite-offers/my", get(mine))
        .route("/api/favorite-offers/my/:id", delete(remove))
}

async fn add(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(offer_id): Path<i64>,
) -> ApiResult<Response> {
    let favorite = state.market.favorites().add(&actor, offer_id).await?;
    Ok(crud::created(
        FavoriteOffer::TABLE.resource,
        FavoriteOffer::TABLE.entity,
        favorite.id,
        favorite,
    ))
}

async fn mine(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<FavoriteOfferView>>> {
    Ok(Json(state.market.favorites().mine(&actor).await?))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    state.market.favorites().remove(&actor, id).await?;
    Ok(crud::deleted(FavoriteOffer::TABLE.entity, id))
}
