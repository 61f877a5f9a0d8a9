use std::sync::{Arc, LazyLock};

use chrono::NaiveTime;
use regex::Regex;
use serenity::all::{Command, Interaction};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{debug, info, warn};

use crate::handlers::commands::BotCommand;
use crate::handlers::discord_responder::{ChatResponder, SerenityResponder};
use crate::service::assistant::Assistant;
use crate::service::session_store::ChatId;
use crate::tasks::morning_jobs::{ScheduledMessage, briefing_job_name};
use crate::tasks::scheduler::DailyScheduler;

pub const BRIEFING_ACK: &str = "Einen Moment, ich lade deine Daten...";
pub const BRIEFING_STOPPED: &str = "🛑 Dein tägliches Briefing ist deaktiviert.";
pub const BRIEFING_NOT_ACTIVE: &str = "Es ist kein tägliches Briefing aktiv.";

static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@!?\d+>").expect("mention pattern is valid"));

pub fn welcome_text(briefing_time: NaiveTime) -> String {
    format!(
        "👋 Hallo! Ich bin dein persönlicher Assistent.\n\
         Jeden Morgen um {} Uhr bekommst du von mir Wetter und Termine.\n\
         Schreib mir einfach, ich antworte mit Hilfe von KI.",
        briefing_time.format("%H:%M")
    )
}

pub fn chat_id_text(chat_id: ChatId) -> String {
    format!("Deine Chat-ID ist: `{}`", chat_id)
}

/// Removes user mentions so only the addressed text reaches the chat session.
pub fn strip_mentions(content: &str) -> String {
    MENTION.replace_all(content, "").trim().to_string()
}

pub struct BotHandler {
    assistant: Arc<Assistant>,
    scheduler: Arc<DailyScheduler<ScheduledMessage>>,
    briefing_time: NaiveTime,
}

impl BotHandler {
    pub fn new(
        assistant: Arc<Assistant>,
        scheduler: Arc<DailyScheduler<ScheduledMessage>>,
        briefing_time: NaiveTime,
    ) -> Self {
        Self {
            assistant,
            scheduler,
            briefing_time,
        }
    }

    pub async fn handle_command_with<R: ChatResponder + ?Sized>(
        &self,
        responder: &R,
        chat_id: ChatId,
        command: BotCommand,
    ) {
        info!(chat_id, command = command.name(), "handling command");
        match command {
            BotCommand::Start => {
                self.assistant.reset_session(chat_id);
                self.scheduler.register(
                    &briefing_job_name(chat_id),
                    self.briefing_time,
                    ScheduledMessage::briefing(chat_id),
                );
                responder.send_text(&welcome_text(self.briefing_time)).await;
            }
            BotCommand::Stop => {
                let text = if self.scheduler.cancel(&briefing_job_name(chat_id)) {
                    BRIEFING_STOPPED
                } else {
                    BRIEFING_NOT_ACTIVE
                };
                responder.send_text(text).await;
            }
            BotCommand::Weather => {
                responder.send_typing().await;
                let report = self.assistant.weather_text().await;
                responder.send_text(&report).await;
            }
            BotCommand::Briefing => {
                responder.send_text(BRIEFING_ACK).await;
                let briefing = self.assistant.briefing_text().await;
                responder.send_text(&briefing).await;
            }
            BotCommand::Id => {
                responder.send_text(&chat_id_text(chat_id)).await;
            }
            BotCommand::Love => {
                responder.send_typing().await;
                let greeting = self.assistant.greeting_text().await;
                responder.send_text(&greeting).await;
            }
        }
    }

    pub async fn handle_text_with<R: ChatResponder + ?Sized>(
        &self,
        responder: &R,
        chat_id: ChatId,
        text: &str,
    ) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        responder.send_typing().await;
        let reply = self.assistant.reply(chat_id, text).await;
        responder.send_text(&reply).await;
    }
}

#[async_trait]
impl EventHandler for BotHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "connected to Discord");
        match Command::set_global_commands(&ctx.http, BotCommand::definitions()).await {
            Ok(commands) => info!(count = commands.len(), "slash commands registered"),
            Err(err) => warn!(error = %err, "failed to register slash commands"),
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let addressed = msg.guild_id.is_none() || msg.mentions_me(&ctx).await.unwrap_or(false);
        if !addressed {
            return;
        }
        let text = strip_mentions(&msg.content);
        if let Some(command) = text.strip_prefix('/').and_then(BotCommand::from_name) {
            let responder = SerenityResponder::for_channel(&ctx, msg.channel_id);
            self.handle_command_with(&responder, msg.channel_id.get(), command)
                .await;
            return;
        }
        debug!(chat_id = msg.channel_id.get(), "chat message received");
        let responder = SerenityResponder::for_channel(&ctx, msg.channel_id);
        self.handle_text_with(&responder, msg.channel_id.get(), &text)
            .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let Some(bot_command) = BotCommand::from_name(&command.data.name) else {
            warn!(name = %command.data.name, "unknown command");
            return;
        };
        let responder = SerenityResponder::for_command(&ctx, &command);
        self.handle_command_with(&responder, command.channel_id.get(), bot_command)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_user_mentions() {
        assert_eq!(strip_mentions("<@123> wie spät ist es?"), "wie spät ist es?");
        assert_eq!(strip_mentions("hallo <@!42>"), "hallo");
    }

    #[test]
    fn welcome_mentions_the_briefing_time() {
        let time = NaiveTime::from_hms_opt(6, 30, 0).unwrap();
        assert!(welcome_text(time).contains("06:30"));
    }
}
