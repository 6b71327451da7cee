use super::crud;
use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser, Uploads};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use freelance_core::service::{ProfileCreation, ProfileEdit, ReviewCreate};
use freelance_core::storage::Entity;
use freelance_core::{Profile, ProfileReview};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/profiles", get(crud::list::<Profile>).post(create))
        .route("/api/profiles/count", get(crud::count::<Profile>))
        .route("/api/profiles/me", get(me))
        .route(
            "/api/profiles/:id",
            get(crud::get_one::<Profile>).put(edit).delete(crud::delete::<Profile>),
        )
        .route("/api/profiles/profile-picture", post(upload_picture))
        .route("/api/profiles/request-verification", post(super::verification::request))
        .route("/api/profiles/verify-profile/:id", patch(verify))
        .route("/api/profiles/:id/reviews", post(review))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(request): ApiJson<ProfileCreation>,
) -> ApiResult<Response> {
    let profile = state.market.profiles().create(&actor, request).await?;
    Ok(crud::created(Profile::TABLE.resource, Profile::TABLE.entity, profile.id, profile))
}

async fn edit(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ProfileEdit>,
) -> ApiResult<Response> {
    let profile = state.market.profiles().edit(&actor, id, request).await?;
    Ok(crud::updated(Profile::TABLE.entity, profile.id, profile))
}

async fn me(State(state): State<AppState>, CurrentUser(actor): CurrentUser) -> ApiResult<Json<Profile>> {
    Ok(Json(state.market.profiles().current(&actor).await?))
}

async fn upload_picture(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    mut uploads: Uploads,
) -> ApiResult<Response> {
    let file = uploads.take(&["file"])?;
    let profile = state.market.profiles().upload_picture(&actor, &file).await?;
    Ok(crud::updated(Profile::TABLE.entity, profile.id, profile))
}

async fn verify(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let profile = state.market.profiles().verify(&actor, id).await?;
    Ok(crud::updated(Profile::TABLE.entity, profile.id, profile))
}

async fn review(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ReviewCreate>,
) -> ApiResult<Response> {
    let saved = state.market.reviews().review_profile(&actor, id, request).await?;
    Ok(crud::created(
        ProfileReview::TABLE.resource,
        ProfileReview::TABLE.entity,
        saved.id,
        saved,
    ))
}
