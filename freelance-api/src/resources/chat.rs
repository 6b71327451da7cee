//! WebSocket chat: inbound `chat.send` frames are stored and fanned out as
//! `chat.message` events to every socket of both participants.

use crate::error::ApiResult;
use crate::extract::{CurrentUser, QueryPairs};
use crate::state::AppState;
use axum::extract::ws::{Message as Frame, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use freelance_core::{Actor, Market};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Inbound {
    #[serde(rename = "chat.send", rename_all = "camelCase")]
    Send {
        receiver_id: i64,
        body: String,
        #[serde(default)]
        client_msg_id: Option<String>,
    },
}

/// Browsers cannot set headers on the upgrade request, so `?login=` is accepted too.
pub async fn upgrade(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    query: QueryPairs,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let actor = if actor.login().is_some() {
        actor
    } else {
        Actor::new(query.get("login").map(String::from), Vec::new())
    };
    let profile = state.market.profiles().current(&actor).await?;
    let profile_id = profile.id.unwrap_or_default();
    let market = state.market.clone();
    Ok(ws.on_upgrade(move |socket| session(socket, market, actor, profile_id)))
}

async fn session(socket: WebSocket, market: Market, actor: Actor, profile_id: i64) {
    let mut events = market.broadcaster().subscribe(profile_id);
    let (mut outbound, mut inbound) = socket.split();
    info!(profile_id, "chat socket opened");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(payload) => {
                    if outbound.send(Frame::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(profile_id, skipped, "chat socket lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            frame = inbound.next() => match frame {
                Some(Ok(Frame::Text(text))) => {
                    if let Some(reply) = handle_text(&market, &actor, profile_id, &text).await {
                        if outbound.send(Frame::Text(reply)).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Frame::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(profile_id, error = %e, "chat socket read failed");
                    break;
                }
            },
        }
    }
    drop(events);
    market.broadcaster().release(profile_id);
    info!(profile_id, "chat socket closed");
}

/// Returns an error frame for the sender when the message was not accepted.
async fn handle_text(market: &Market, actor: &Actor, profile_id: i64, text: &str) -> Option<String> {
    let Inbound::Send {
        receiver_id,
        body,
        client_msg_id,
    } = match serde_json::from_str(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            debug!(profile_id, error = %e, "ignoring malformed chat frame");
            return Some(error_frame("invalidFrame", None));
        }
    };

    match market
        .messaging()
        .send(actor, profile_id, receiver_id, &body, client_msg_id.clone())
        .await
    {
        Ok(_) => None,
        Err(e) => {
            warn!(profile_id, receiver_id, error = %e, "chat message rejected");
            Some(error_frame(e.key(), client_msg_id))
        }
    }
}

fn error_frame(key: &str, client_msg_id: Option<String>) -> String {
    json!({
        "type": "chat.error",
        "errorKey": key,
        "clientMsgId": client_msg_id,
    })
    .to_string()
}
