use super::{Actor, Market};
use crate::common::error::{MarketError, Result};
use crate::domain::{Audit, Conversation, Message, Profile};
use crate::storage::Pageable;
use crate::criteria::Criteria;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CHAT_MESSAGE_EVENT: &str = "chat.message";

/// Event pushed to every open socket of both participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub conversation_id: Option<i64>,
    pub id: Option<i64>,
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub client_msg_id: Option<String>,
}

impl ChatMessageEvent {
    fn from_message(message: &Message, client_msg_id: Option<String>) -> Self {
        Self {
            kind: CHAT_MESSAGE_EVENT.to_string(),
            conversation_id: message.conversation_id,
            id: message.id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            body: message.body.clone(),
            sent_at: message.sent_at,
            client_msg_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Option<i64>,
    pub last_message: Option<Message>,
    pub other_participant_id: Option<i64>,
    pub other_participant_name: String,
}

pub struct MessagingService<'a> {
    market: &'a Market,
}

impl<'a> MessagingService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    /// Stores and fans out a message. Blank bodies and messages to oneself
    /// are dropped and yield `None`.
    pub async fn send(
        &self,
        actor: &Actor,
        sender_id: i64,
        receiver_id: i64,
        body: &str,
        client_msg_id: Option<String>,
    ) -> Result<Option<Message>> {
        if body.trim().is_empty() || sender_id == receiver_id {
            debug!(sender_id, receiver_id, "ignoring empty or self-addressed message");
            return Ok(None);
        }
        if !self.market.db().repo::<Profile>().exists_by_id(receiver_id).await? {
            return Err(MarketError::not_found(
                "message",
                "receiverNotFound",
                format!("Profile {receiver_id} not found"),
            ));
        }

        let conversation = self.conversation_between(actor, sender_id, receiver_id).await?;
        let message = Message {
            id: None,
            body: body.to_string(),
            sent_at: Utc::now(),
            conversation_id: conversation.id,
            sender_id: Some(sender_id),
            receiver_id: Some(receiver_id),
            audit: Audit::default(),
        };
        let saved = self.market.crud::<Message>().create(actor, message).await?;

        let event = ChatMessageEvent::from_message(&saved, client_msg_id);
        let payload = serde_json::to_string(&event)?;
        let reached = self.market.broadcaster().publish(sender_id, payload.clone())
            + self.market.broadcaster().publish(receiver_id, payload);
        debug!(id = ?saved.id, conversation_id = ?conversation.id, reached, "message sent");
        Ok(Some(saved))
    }

    /// Sends on behalf of the caller's profile.
    pub async fn send_as(
        &self,
        actor: &Actor,
        receiver_id: i64,
        body: &str,
        client_msg_id: Option<String>,
    ) -> Result<Option<Message>> {
        let sender = self.market.profiles().current(actor).await?;
        self.send(actor, sender.id.unwrap_or_default(), receiver_id, body, client_msg_id)
            .await
    }

    pub async fn conversation_messages(&self, actor: &Actor, conversation_id: i64) -> Result<Vec<Message>> {
        let profile = self.market.profiles().current(actor).await?;
        let conversation = self.market.crud::<Conversation>().find_one(conversation_id).await?;
        if !conversation.has_participant(profile.id.unwrap_or_default()) {
            return Err(MarketError::forbidden(
                "conversation",
                "notParticipant",
                "Not a participant of this conversation",
            ));
        }
        self.market
            .db()
            .repo::<Message>()
            .find_where(
                "e.conversation_id = ?",
                vec![Value::Integer(conversation_id)],
                Some("e.sent_at ASC, e.id ASC"),
            )
            .await
    }

    pub async fn my_conversations(&self, actor: &Actor) -> Result<Vec<ConversationSummary>> {
        let profile = self.market.profiles().current(actor).await?;
        let me = profile.id.unwrap_or_default();
        let conversations = self
            .market
            .db()
            .repo::<Conversation>()
            .find_where(
                "e.participant_a_id = ? OR e.participant_b_id = ?",
                vec![Value::Integer(me), Value::Integer(me)],
                None,
            )
            .await?;

        let profiles = self.market.db().repo::<Profile>();
        let messages = self.market.db().repo::<Message>();
        let latest = Pageable::new(0, 1).sorted_by("sent_at", true).sorted_by("id", true);
        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let other = conversation.other_participant(me);
            let other_participant_name = match other {
                Some(id) => profiles.find_by_id(id).await?.map(|p| p.display_name()),
                None => None,
            }
            .unwrap_or_else(|| "Unknown".to_string());

            let criteria = Criteria::new().column_equals("conversation_id", conversation.id.unwrap_or_default());
            let last_message = messages
                .find_by_criteria(&criteria, Some(&latest))
                .await?
                .into_iter()
                .next();
            summaries.push(ConversationSummary {
                id: conversation.id,
                last_message,
                other_participant_id: other,
                other_participant_name,
            });
        }
        Ok(summaries)
    }

    /// Replaces the body of one of the caller's own messages.
    pub async fn edit(&self, actor: &Actor, message_id: i64, body: &str) -> Result<Message> {
        let profile = self.market.profiles().current(actor).await?;
        let mut message = self.market.crud::<Message>().find_one(message_id).await?;
        if message.sender_id != profile.id {
            return Err(MarketError::forbidden(
                "message",
                "notMessageSender",
                "Only the sender can edit this message",
            ));
        }
        if body.trim().is_empty() {
            return Err(MarketError::bad_request("message", "emptyBody", "Message body is empty"));
        }
        message.body = body.to_string();
        info!(message_id, "message edited");
        self.market.crud::<Message>().update(actor, message_id, message).await
    }

    async fn find_conversation(&self, first: i64, second: i64) -> Result<Option<Conversation>> {
        let found = self
            .market
            .db()
            .repo::<Conversation>()
            .find_where(
                "(e.participant_a_id = ?1 AND e.participant_b_id = ?2) \
                 OR (e.participant_a_id = ?2 AND e.participant_b_id = ?1)",
                vec![Value::Integer(first), Value::Integer(second)],
                None,
            )
            .await?;
        Ok(found.into_iter().next())
    }

    /// A concurrent first message may win the insert; the unique pair index
    /// turns that into a conflict and the stored row is read back.
    async fn conversation_between(&self, actor: &Actor, first: i64, second: i64) -> Result<Conversation> {
        if let Some(conversation) = self.find_conversation(first, second).await? {
            return Ok(conversation);
        }

        let conversation = Conversation {
            id: None,
            created_at: Utc::now(),
            participant_a_id: Some(first),
            participant_b_id: Some(second),
            audit: Audit::default(),
        };
        match self.market.crud::<Conversation>().create(actor, conversation).await {
            Ok(saved) => {
                info!(id = ?saved.id, first, second, "conversation started");
                Ok(saved)
            }
            Err(MarketError::Conflict(detail)) => self
                .find_conversation(first, second)
                .await?
                .ok_or(MarketError::Conflict(detail)),
            Err(e) => Err(e),
        }
    }
}
