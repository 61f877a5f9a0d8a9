use serenity::all::{ChannelId, CommandInteraction};
use serenity::async_trait;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
};
use serenity::prelude::Context;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Discord rejects messages longer than this many characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

#[async_trait]
pub trait ChatResponder: Send + Sync {
    async fn send_text(&self, content: &str);
    async fn send_typing(&self);
}

enum ReplyState {
    Pending,
    Deferred,
    Answered,
}

/// Replies into a channel, or to a slash command. A command must be answered
/// within three seconds, so a typing hint before slow work defers it and the
/// first text then arrives as a followup.
pub struct SerenityResponder<'a> {
    ctx: &'a Context,
    channel_id: ChannelId,
    command: Option<&'a CommandInteraction>,
    state: Mutex<ReplyState>,
}

impl<'a> SerenityResponder<'a> {
    pub fn for_channel(ctx: &'a Context, channel_id: ChannelId) -> Self {
        Self {
            ctx,
            channel_id,
            command: None,
            state: Mutex::new(ReplyState::Answered),
        }
    }

    pub fn for_command(ctx: &'a Context, command: &'a CommandInteraction) -> Self {
        Self {
            ctx,
            channel_id: command.channel_id,
            command: Some(command),
            state: Mutex::new(ReplyState::Pending),
        }
    }

    async fn deliver(&self, chunk: String) -> serenity::Result<()> {
        if let Some(command) = self.command {
            let mut state = self.state.lock().await;
            match *state {
                ReplyState::Pending => {
                    *state = ReplyState::Answered;
                    return command
                        .create_response(
                            &self.ctx.http,
                            CreateInteractionResponse::Message(
                                CreateInteractionResponseMessage::new().content(chunk),
                            ),
                        )
                        .await;
                }
                ReplyState::Deferred => {
                    *state = ReplyState::Answered;
                    return command
                        .create_followup(
                            &self.ctx.http,
                            CreateInteractionResponseFollowup::new().content(chunk),
                        )
                        .await
                        .map(|_| ());
                }
                ReplyState::Answered => {}
            }
        }
        self.channel_id.say(&self.ctx.http, chunk).await.map(|_| ())
    }
}

#[async_trait]
impl ChatResponder for SerenityResponder<'_> {
    async fn send_text(&self, content: &str) {
        for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
            if let Err(err) = self.deliver(chunk).await {
                warn!(channel_id = %self.channel_id, error = %err, "failed to send reply");
            }
        }
    }

    async fn send_typing(&self) {
        if let Some(command) = self.command {
            let mut state = self.state.lock().await;
            if matches!(*state, ReplyState::Pending) {
                match command.defer(&self.ctx.http).await {
                    Ok(()) => *state = ReplyState::Deferred,
                    Err(err) => warn!(error = %err, "failed to defer command"),
                }
                return;
            }
        }
        if let Err(err) = self.channel_id.broadcast_typing(&self.ctx.http).await {
            debug!(channel_id = %self.channel_id, error = %err, "typing indicator failed");
        }
    }
}

/// Splits `text` into chunks of at most `limit` characters, breaking at line
/// ends where possible.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            for ch in line.chars() {
                if current_len == limit {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                current.push(ch);
                current_len += 1;
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("Hallo", 2000), vec!["Hallo".to_string()]);
        assert!(split_message("", 2000).is_empty());
    }

    #[test]
    fn long_line_is_hard_split() {
        let text = "x".repeat(4500);
        let chunks = split_message(&text, 2000);
        let sizes: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(sizes, vec![2000, 2000, 500]);
    }

    #[test]
    fn prefers_line_boundaries() {
        let text = format!("{}\n{}\n", "a".repeat(6), "b".repeat(6));
        let chunks = split_message(&text, 10);
        assert_eq!(chunks, vec!["aaaaaa\n".to_string(), "bbbbbb\n".to_string()]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ä".repeat(2000);
        assert_eq!(split_message(&text, 2000).len(), 1);
    }
}
