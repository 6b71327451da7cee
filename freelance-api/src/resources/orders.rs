use super::crud;
use crate::error::ApiResult;
use crate::extract::CurrentUser;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, patch};
use axum::Router;
use freelance_core::storage::Entity;
use freelance_core::{Order, OrderStatus};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(crud::list::<Order>))
        .route("/api/orders/count", get(crud::count::<Order>))
        // POST takes the offer package id.
        .route("/api/orders/:id", get(crud::get_one::<Order>).post(place))
        .route("/api/orders/:id/status/:status", patch(update_status))
}

async fn place(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(offer_package_id): Path<i64>,
) -> ApiResult<Response> {
    let order = state.market.orders().create(&actor, offer_package_id).await?;
    Ok(crud::created(Order::TABLE.resource, Order::TABLE.entity, order.id, order))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((id, status)): Path<(i64, String)>,
) -> ApiResult<Response> {
    let status: OrderStatus = status.parse()?;
    let order = state.market.orders().update_status(&actor, id, status).await?;
    Ok(crud::updated(Order::TABLE.entity, order.id, order))
}
