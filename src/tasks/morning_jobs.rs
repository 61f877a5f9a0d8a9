use std::sync::Arc;

use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use tracing::{error, info};

use crate::error::BotError;
use crate::handlers::discord_responder::{DISCORD_MESSAGE_LIMIT, split_message};
use crate::service::assistant::Assistant;
use crate::service::session_store::ChatId;
use crate::tasks::scheduler::JobHandler;

pub const GREETING_JOB_NAME: &str = "morning_greeting";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Briefing,
    Greeting,
}

/// Payload carried by a scheduled job: what to send and to which chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledMessage {
    pub kind: JobKind,
    pub chat_id: ChatId,
}

impl ScheduledMessage {
    pub fn briefing(chat_id: ChatId) -> Self {
        Self {
            kind: JobKind::Briefing,
            chat_id,
        }
    }

    pub fn greeting(chat_id: ChatId) -> Self {
        Self {
            kind: JobKind::Greeting,
            chat_id,
        }
    }
}

/// A chat's daily briefing job is keyed by the chat id.
pub fn briefing_job_name(chat_id: ChatId) -> String {
    chat_id.to_string()
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: ChatId, content: &str) -> Result<(), BotError>;
}

pub struct DiscordSender {
    http: Arc<Http>,
}

impl DiscordSender {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageSender for DiscordSender {
    async fn send_message(&self, chat_id: ChatId, content: &str) -> Result<(), BotError> {
        if chat_id == 0 {
            return Err(BotError::Transport("chat id 0 is not a channel".to_string()));
        }
        let channel = ChannelId::new(chat_id);
        for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
            channel.say(&self.http, chunk).await?;
        }
        Ok(())
    }
}

pub struct MorningJobs {
    assistant: Arc<Assistant>,
    sender: Arc<dyn MessageSender>,
}

impl MorningJobs {
    pub fn new(assistant: Arc<Assistant>, sender: Arc<dyn MessageSender>) -> Self {
        Self { assistant, sender }
    }

    pub async fn compose(&self, kind: JobKind) -> String {
        match kind {
            JobKind::Briefing => self.assistant.briefing_text().await,
            JobKind::Greeting => self.assistant.greeting_text().await,
        }
    }
}

#[async_trait]
impl JobHandler<ScheduledMessage> for MorningJobs {
    async fn fire(&self, name: &str, payload: &ScheduledMessage) {
        let text = self.compose(payload.kind).await;
        match self.sender.send_message(payload.chat_id, &text).await {
            Ok(()) => info!(job = %name, chat_id = payload.chat_id, "scheduled message sent"),
            Err(err) => error!(job = %name, chat_id = payload.chat_id, error = %err, "scheduled message failed"),
        }
    }
}
