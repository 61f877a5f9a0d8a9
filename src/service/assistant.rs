use std::sync::Arc;

use tracing::{error, info};

use crate::clients::caldav_client::CalDavClient;
use crate::clients::weather_client::WeatherClient;
use crate::config::Settings;
use crate::error::BotError;
use crate::service::agenda_service::CalendarSource;
use crate::service::briefing_service::BriefingService;
use crate::service::greeting_service::morning_greeting;
use crate::service::openai_service::{OpenAIClient, OpenAIService};
use crate::service::session_store::{ChatId, SessionStore};

pub const CHAT_FALLBACK: &str = "Entschuldigung, ich habe gerade Schwierigkeiten zu antworten.";

const CHAT_SYSTEM_PROMPT: &str = "Du bist ein hilfreicher persönlicher Assistent in einem Discord-Chat. \
Antworte in der Sprache des Nutzers. Markdown ist erlaubt.";

/// Everything a chat or a scheduled job can ask for, already turned into text.
pub struct Assistant {
    briefing: BriefingService,
    ai: Arc<dyn OpenAIClient>,
    sessions: SessionStore,
}

impl Assistant {
    pub fn new(briefing: BriefingService, ai: Arc<dyn OpenAIClient>) -> Self {
        Self {
            briefing,
            ai,
            sessions: SessionStore::new(Some(CHAT_SYSTEM_PROMPT.to_string())),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, BotError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("briefingBot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let weather = Arc::new(WeatherClient::new(
            http.clone(),
            settings.weather.clone(),
            settings.timezone.name(),
        ));
        let calendar: Option<Arc<dyn CalendarSource>> = match &settings.calendar {
            Some(account) => Some(Arc::new(CalDavClient::new(http.clone(), account)?)),
            None => None,
        };
        let ai = Arc::new(OpenAIService::from_settings(http, settings));

        info!(
            timezone = %settings.timezone,
            calendar = calendar.is_some(),
            models = ?settings.openai_models,
            "assistant configured"
        );
        Ok(Self::new(
            BriefingService::new(weather, calendar, settings.timezone),
            ai,
        ))
    }

    pub fn briefing(&self) -> &BriefingService {
        &self.briefing
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn weather_text(&self) -> String {
        self.briefing.weather_text().await
    }

    pub async fn briefing_text(&self) -> String {
        self.briefing.briefing_text().await
    }

    pub async fn greeting_text(&self) -> String {
        morning_greeting(self.ai.as_ref()).await
    }

    /// Reply for a free-text chat message, continuing the chat's session.
    pub async fn reply(&self, chat_id: ChatId, text: &str) -> String {
        match self.sessions.send(chat_id, self.ai.as_ref(), text).await {
            Ok(reply) => reply,
            Err(err) => {
                error!(chat_id, error = %err, "chat reply failed");
                CHAT_FALLBACK.to_string()
            }
        }
    }

    pub fn reset_session(&self, chat_id: ChatId) -> bool {
        self.sessions.reset(chat_id)
    }
}
