use crate::storage::schema::FieldKind;
use chrono::{DateTime, Utc};
use validator::Validate;

entity! {
    /// A two-party chat thread. Participant order is not significant.
    pub struct Conversation {
        table: "conversation",
        entity: "conversation",
        resource: "conversations",
        fields: {
            #[serde(default = "Utc::now")]
            created_at: DateTime<Utc> => ("createdAt", "created_at", FieldKind::Instant),
            #[serde(default)]
            participant_a_id: Option<i64> => ("participantAId", "participant_a_id", FieldKind::Long),
            #[serde(default)]
            participant_b_id: Option<i64> => ("participantBId", "participant_b_id", FieldKind::Long),
        },
        links: {},
    }
}

impl Conversation {
    pub fn has_participant(&self, profile_id: i64) -> bool {
        self.participant_a_id == Some(profile_id) || self.participant_b_id == Some(profile_id)
    }

    pub fn other_participant(&self, profile_id: i64) -> Option<i64> {
        if self.participant_a_id == Some(profile_id) {
            self.participant_b_id
        } else {
            self.participant_a_id
        }
    }
}

entity! {
    pub struct Message {
        table: "message",
        entity: "message",
        resource: "messages",
        fields: {
            #[validate(length(max = 4096))]
            body: String => ("body", "body", FieldKind::Text),
            #[serde(default = "Utc::now")]
            sent_at: DateTime<Utc> => ("sentAt", "sent_at", FieldKind::Instant),
            #[serde(default)]
            conversation_id: Option<i64> => ("conversationId", "conversation_id", FieldKind::Long),
            #[serde(default)]
            sender_id: Option<i64> => ("senderId", "sender_id", FieldKind::Long),
            #[serde(default)]
            receiver_id: Option<i64> => ("receiverId", "receiver_id", FieldKind::Long),
        },
        links: {},
    }
}
