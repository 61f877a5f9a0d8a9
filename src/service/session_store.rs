use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::BotError;
use crate::models::session::{ChatMessage, ChatRole, ChatSession};
use crate::service::openai_service::OpenAIClient;

pub type ChatId = u64;

/// User/assistant messages sent along with each request, newest kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 40;

/// In-memory chat sessions, one per chat.
///
/// Each session sits behind its own mutex so a chat's turns run one at a time
/// while other chats proceed independently.
pub struct SessionStore {
    sessions: DashMap<ChatId, Arc<Mutex<ChatSession>>>,
    system_prompt: Option<String>,
    history_limit: usize,
}

impl SessionStore {
    pub fn new(system_prompt: Option<String>) -> Self {
        Self::with_history_limit(system_prompt, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(system_prompt: Option<String>, history_limit: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            system_prompt,
            history_limit: history_limit.max(1),
        }
    }

    pub fn session(&self, chat_id: ChatId) -> Arc<Mutex<ChatSession>> {
        let entry = self.sessions.entry(chat_id).or_insert_with(|| {
            let session = ChatSession::new(self.system_prompt.as_deref());
            info!(chat_id, session_id = %session.id, "starting chat session");
            Arc::new(Mutex::new(session))
        });
        Arc::clone(entry.value())
    }

    pub fn reset(&self, chat_id: ChatId) -> bool {
        let removed = self.sessions.remove(&chat_id).is_some();
        if removed {
            debug!(chat_id, "chat session reset");
        }
        removed
    }

    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.sessions.contains_key(&chat_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sends `text` as the chat's next turn along with at most `history_limit`
    /// earlier messages. A failed turn removes the unanswered message again.
    pub async fn send(
        &self,
        chat_id: ChatId,
        ai: &dyn OpenAIClient,
        text: &str,
    ) -> Result<String, BotError> {
        let session = self.session(chat_id);
        let mut session = session.lock().await;
        session.history.push(ChatMessage::new(ChatRole::User, text));
        session.trim_to(self.history_limit);
        match ai.converse(&session.history).await {
            Ok(reply) => {
                session
                    .history
                    .push(ChatMessage::new(ChatRole::Assistant, reply.clone()));
                Ok(reply)
            }
            Err(err) => {
                session.history.pop();
                Err(err)
            }
        }
    }
}
