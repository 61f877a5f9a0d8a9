use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Conversation state for one chat. Lives only in memory.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(system_prompt: Option<&str>) -> Self {
        let history = system_prompt
            .map(|prompt| vec![ChatMessage::new(ChatRole::System, prompt)])
            .unwrap_or_default();
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            history,
        }
    }

    /// Drops the oldest user/assistant messages until at most `max_turns`
    /// remain. System messages are kept.
    pub fn trim_to(&mut self, max_turns: usize) {
        let mut excess = self.turns().saturating_sub(max_turns);
        if excess == 0 {
            return;
        }
        self.history.retain(|message| {
            if excess > 0 && message.role != ChatRole::System {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    /// Number of user/assistant turns, system prompt excluded.
    pub fn turns(&self) -> usize {
        self.history
            .iter()
            .filter(|message| message.role != ChatRole::System)
            .count()
    }
}
