use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::screening::profile::{ChatMessage, ConversationState, Role, ScreeningStatus};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub state: String,
    pub status: String,
    pub message_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl MessageRow {
    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: Role::from_db(&self.role),
            content: self.content.clone(),
        }
    }
}

/// Stored `conversations.state` text for a derived conversation state.
pub fn state_label(state: ConversationState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "GREETING".to_string())
}

/// Coarse conversation status shown in listings.
pub fn status_label(status: ScreeningStatus) -> &'static str {
    match status {
        ScreeningStatus::Completed => "completed",
        ScreeningStatus::Abandoned => "abandoned",
        ScreeningStatus::InProgress | ScreeningStatus::QuestionsGenerated => "active",
    }
}
