#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use briefingBot::error::BotError;
use briefingBot::models::session::ChatMessage;
use briefingBot::models::weather::WeatherReport;
use briefingBot::service::agenda_service::{CalendarRef, CalendarSource};
use briefingBot::service::assistant::Assistant;
use briefingBot::service::briefing_service::BriefingService;
use briefingBot::service::openai_service::OpenAIClient;
use briefingBot::service::weather_service::WeatherProvider;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;

pub const BERLIN: Tz = chrono_tz::Europe::Berlin;

pub fn ics(events: &[&str]) -> String {
    let mut body = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\n");
    for event in events {
        body.push_str("BEGIN:VEVENT\r\n");
        body.push_str(event);
        body.push_str("END:VEVENT\r\n");
    }
    body.push_str("END:VCALENDAR\r\n");
    body
}

/// In-memory calendar account. Calendars listed in `failing` error on query.
#[derive(Default)]
pub struct FakeCalendar {
    pub calendars: Vec<CalendarRef>,
    pub payloads: HashMap<String, Vec<String>>,
    pub failing: Vec<String>,
    pub discovery_fails: bool,
    pub queries: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl FakeCalendar {
    pub fn with_calendar(mut self, name: &str, payloads: Vec<String>) -> Self {
        self.calendars.push(CalendarRef {
            name: name.to_string(),
            url: format!("https://dav.example.com/{}/", name),
        });
        self.payloads.insert(name.to_string(), payloads);
        self
    }

    pub fn with_failing_calendar(mut self, name: &str) -> Self {
        self.calendars.push(CalendarRef {
            name: name.to_string(),
            url: format!("https://dav.example.com/{}/", name),
        });
        self.failing.push(name.to_string());
        self
    }
}

#[serenity::async_trait]
impl CalendarSource for FakeCalendar {
    async fn calendars(&self) -> Result<Vec<CalendarRef>, BotError> {
        if self.discovery_fails {
            return Err(BotError::Auth("401 Unauthorized".to_string()));
        }
        Ok(self.calendars.clone())
    }

    async fn events_between(
        &self,
        calendar: &CalendarRef,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, BotError> {
        self.queries
            .lock()
            .await
            .push((calendar.name.clone(), start, end));
        if self.failing.contains(&calendar.name) {
            return Err(BotError::Network("connection reset".to_string()));
        }
        Ok(self.payloads.get(&calendar.name).cloned().unwrap_or_default())
    }
}

pub struct FakeWeather {
    pub report: Option<WeatherReport>,
}

impl FakeWeather {
    pub fn sunny() -> Self {
        Self {
            report: Some(WeatherReport {
                location: "Hamburg".to_string(),
                current: 12.0,
                min: 8.0,
                max: 15.5,
                weather_code: Some(0),
            }),
        }
    }

    pub fn broken() -> Self {
        Self { report: None }
    }
}

#[serenity::async_trait]
impl WeatherProvider for FakeWeather {
    async fn today(&self) -> Result<WeatherReport, BotError> {
        self.report
            .clone()
            .ok_or_else(|| BotError::Network("timeout".to_string()))
    }
}

/// Answers every request with `response`, or fails when it is `None`.
pub struct FakeOpenAI {
    pub response: Option<String>,
    pub conversations: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeOpenAI {
    pub fn answering(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
            conversations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            conversations: Mutex::new(Vec::new()),
        }
    }

    fn answer(&self) -> Result<String, BotError> {
        self.response
            .clone()
            .ok_or_else(|| BotError::Network("service unavailable".to_string()))
    }
}

#[serenity::async_trait]
impl OpenAIClient for FakeOpenAI {
    async fn generate(&self, _prompt: &str) -> Result<String, BotError> {
        self.answer()
    }

    async fn converse(&self, history: &[ChatMessage]) -> Result<String, BotError> {
        self.conversations.lock().await.push(history.to_vec());
        self.answer()
    }
}

pub fn assistant(
    weather: FakeWeather,
    calendar: Option<FakeCalendar>,
    ai: FakeOpenAI,
) -> Arc<Assistant> {
    let calendar = calendar.map(|c| Arc::new(c) as Arc<dyn CalendarSource>);
    Arc::new(Assistant::new(
        BriefingService::new(Arc::new(weather), calendar, BERLIN),
        Arc::new(ai),
    ))
}
