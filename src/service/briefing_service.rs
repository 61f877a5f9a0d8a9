use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::error;

use crate::error::BotError;
use crate::models::agenda::AgendaOutcome;
use crate::service::agenda_service::{CalendarSource, agenda_for_day};
use crate::service::weather_service::{WeatherProvider, weather_text};

pub const CALENDAR_CREDENTIALS_MISSING: &str = "⚠️ Kalender-Zugangsdaten fehlen in der Konfiguration.";
pub const NO_CALENDARS: &str = "Keine Kalender gefunden.";
pub const NOTHING_TODAY: &str = "Heute stehen keine Termine im Kalender.";

/// Builds the weather, agenda and combined briefing texts.
pub struct BriefingService {
    weather: Arc<dyn WeatherProvider>,
    calendar: Option<Arc<dyn CalendarSource>>,
    timezone: Tz,
}

impl BriefingService {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        calendar: Option<Arc<dyn CalendarSource>>,
        timezone: Tz,
    ) -> Self {
        Self {
            weather,
            calendar,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn calendar(&self) -> Option<&Arc<dyn CalendarSource>> {
        self.calendar.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub async fn weather_text(&self) -> String {
        weather_text(self.weather.as_ref()).await
    }

    /// `None` when no calendar account is configured.
    pub async fn agenda(&self, day: NaiveDate) -> Option<Result<AgendaOutcome, BotError>> {
        let calendar = self.calendar.as_ref()?;
        let result = agenda_for_day(calendar.as_ref(), day, self.timezone).await;
        if let Err(err) = &result {
            error!(error = %err, day = %day, "calendar lookup failed");
        }
        Some(result)
    }

    pub async fn agenda_text(&self, day: NaiveDate) -> String {
        match self.agenda(day).await {
            Some(result) => render_agenda(&result, day == self.today()),
            None => CALENDAR_CREDENTIALS_MISSING.to_string(),
        }
    }

    pub async fn briefing_text(&self) -> String {
        let (weather, agenda) = tokio::join!(self.weather_text(), self.agenda_text(self.today()));
        format!("{}\n\n{}", weather, agenda)
    }
}

pub fn render_agenda(result: &Result<AgendaOutcome, BotError>, is_today: bool) -> String {
    match result {
        Ok(AgendaOutcome::Events { day, entries }) => {
            let header = if is_today {
                "📅 **Deine Termine heute:**".to_string()
            } else {
                format!("📅 **Deine Termine am {}:**", day.format("%d.%m.%Y"))
            };
            let lines: Vec<String> = entries.iter().map(ToString::to_string).collect();
            format!("{}\n{}", header, lines.join("\n"))
        }
        Ok(AgendaOutcome::NoCalendars) => NO_CALENDARS.to_string(),
        Ok(AgendaOutcome::NothingFound { day }) => {
            if is_today {
                NOTHING_TODAY.to_string()
            } else {
                format!("Am {} stehen keine Termine im Kalender.", day.format("%d.%m.%Y"))
            }
        }
        Err(err) => format!("Fehler beim Abrufen des Kalenders: {}", err.user_summary()),
    }
}
