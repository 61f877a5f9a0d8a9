use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::{info, warn};

use crate::error::BotError;

const DEFAULT_CONFIG_FILE: &str = ".env";
const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
const DEFAULT_DAILY_TIME: &str = "07:00";
const DEFAULT_CALDAV_URL: &str = "https://caldav.icloud.com";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, BotError> {
        let content = fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, BotError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(BotError::Config(format!(
                    "Invalid config line {}: {}",
                    idx + 1,
                    line
                )));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    /// Loads `CONFIG_FILE` when set, otherwise `.env` if it exists, otherwise nothing.
    pub fn discover() -> Result<Self, BotError> {
        match env::var("CONFIG_FILE") {
            Ok(path) => {
                info!(path = %path, "loading config file");
                Self::from_file(&path)
            }
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                info!(path = DEFAULT_CONFIG_FILE, "loading config file");
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// File values win over the process environment.
    pub fn get_prop(&self, key: &str) -> Option<String> {
        self.get(key).or_else(|| env::var(key).ok())
    }
}

#[derive(Debug, Clone)]
pub struct CalendarAccount {
    pub url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct WeatherLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_models: Vec<String>,
    pub calendar: Option<CalendarAccount>,
    pub greeting_recipient: Option<u64>,
    pub timezone: Tz,
    pub briefing_time: NaiveTime,
    pub greeting_time: NaiveTime,
    pub weather: WeatherLocation,
    pub port: u16,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Result<Self, BotError> {
        Self::from_lookup(|key| config.get_prop(key))
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_prop = |key: &str| -> Option<String> {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let timezone_name = get_prop("TIMEZONE").unwrap_or(DEFAULT_TIMEZONE.to_string());
        let timezone = Tz::from_str(&timezone_name)
            .map_err(|_| BotError::Config(format!("unknown TIMEZONE {}", timezone_name)))?;

        let openai_api_key = get_prop("OPENAI_API_KEY");
        if openai_api_key.is_none() {
            warn!("OPENAI_API_KEY not set, AI replies will use fallback texts");
        }

        let openai_models: Vec<String> = get_prop("OPENAI_MODEL")
            .unwrap_or(DEFAULT_OPENAI_MODEL.to_string())
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if openai_models.is_empty() {
            return Err(BotError::Config("OPENAI_MODEL lists no models".to_string()));
        }

        let calendar = match (get_prop("ICLOUD_EMAIL"), get_prop("ICLOUD_PASSWORD")) {
            (Some(username), Some(password)) => Some(CalendarAccount {
                url: get_prop("CALDAV_URL").unwrap_or(DEFAULT_CALDAV_URL.to_string()),
                username,
                password,
            }),
            _ => {
                warn!("calendar credentials missing, briefings will skip the agenda");
                None
            }
        };

        let greeting_recipient = get_prop("GREETING_CHAT_ID")
            .map(|raw| parse_number::<u64>("GREETING_CHAT_ID", &raw))
            .transpose()?;

        let weather = WeatherLocation {
            name: get_prop("WEATHER_LOCATION").unwrap_or("Hamburg".to_string()),
            latitude: get_prop("WEATHER_LATITUDE")
                .map(|raw| parse_number::<f64>("WEATHER_LATITUDE", &raw))
                .transpose()?
                .unwrap_or(53.55),
            longitude: get_prop("WEATHER_LONGITUDE")
                .map(|raw| parse_number::<f64>("WEATHER_LONGITUDE", &raw))
                .transpose()?
                .unwrap_or(9.99),
        };

        Ok(Self {
            discord_token: get_prop("DISCORD_BOT_TOKEN"),
            openai_api_key,
            openai_base_url: get_prop("OPENAI_BASE_URL")
                .unwrap_or(DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_models,
            calendar,
            greeting_recipient,
            timezone,
            briefing_time: parse_time(
                "BRIEFING_TIME",
                &get_prop("BRIEFING_TIME").unwrap_or(DEFAULT_DAILY_TIME.to_string()),
            )?,
            greeting_time: parse_time(
                "GREETING_TIME",
                &get_prop("GREETING_TIME").unwrap_or(DEFAULT_DAILY_TIME.to_string()),
            )?,
            weather,
            port: get_prop("PORT")
                .map(|raw| parse_number::<u16>("PORT", &raw))
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
        })
    }

    pub fn require_discord_token(&self) -> Result<&str, BotError> {
        self.discord_token
            .as_deref()
            .ok_or_else(|| BotError::Config("DISCORD_BOT_TOKEN must be set".to_string()))
    }
}

fn parse_time(key: &str, raw: &str) -> Result<NaiveTime, BotError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| BotError::Config(format!("{} must look like HH:MM, got {}", key, raw)))
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, BotError> {
    raw.parse::<T>()
        .map_err(|_| BotError::Config(format!("{} is not a valid number: {}", key, raw)))
}
