use super::crud;
use crate::error::ApiResult;
use crate::extract::{ApiJson, CurrentUser};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use freelance_core::service::ConversationSummary;
use freelance_core::storage::Entity;
use freelance_core::{Conversation, Message};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub receiver_id: i64,
    pub body: String,
    #[serde(default)]
    pub client_msg_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessage {
    pub body: String,
}

pub fn routes() -> Router<AppState> {
    crud::routes::<Conversation>()
        .merge(crud::routes::<Message>())
        .route("/api/conversations/my", get(my_conversations))
        .route("/api/conversations/:id/messages", get(conversation_messages))
        .route("/api/messages/send", post(send))
        .route("/api/messages/:id/edit", patch(edit))
        .route("/api/ws/chat", get(super::chat::upgrade))
}

async fn my_conversations(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> ApiResult<Json<Vec<ConversationSummary>>> {
    Ok(Json(state.market.messaging().my_conversations(&actor).await?))
}

async fn conversation_messages(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(state.market.messaging().conversation_messages(&actor, id).await?))
}

/// 201 with the stored message, or 204 when the message was dropped.
async fn send(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    ApiJson(request): ApiJson<SendMessage>,
) -> ApiResult<Response> {
    let sent = state
        .market
        .messaging()
        .send_as(&actor, request.receiver_id, &request.body, request.client_msg_id)
        .await?;
    Ok(match sent {
        Some(message) => crud::created(Message::TABLE.resource, Message::TABLE.entity, message.id, message),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn edit(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<EditMessage>,
) -> ApiResult<Response> {
    let message = state.market.messaging().edit(&actor, id, &request.body).await?;
    Ok(crud::updated(Message::TABLE.entity, message.id, message))
}
