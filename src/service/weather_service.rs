use serenity::async_trait;
use tracing::error;

use crate::clients::weather_client::WeatherClient;
use crate::error::BotError;
use crate::models::weather::{WeatherReport, describe_weather_code};

pub const WEATHER_FALLBACK: &str = "⚠️ Wetter konnte nicht geladen werden.";

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn today(&self) -> Result<WeatherReport, BotError>;
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn today(&self) -> Result<WeatherReport, BotError> {
        self.fetch_today().await
    }
}

pub fn format_weather(report: &WeatherReport) -> String {
    let condition = report
        .weather_code
        .and_then(describe_weather_code)
        .map(|text| format!(" ({})", text))
        .unwrap_or_default();
    format!(
        "🌦 **Wetter in {}**\nAktuell: {:.1}°C{}\nTageswerte: {:.1}°C bis {:.1}°C",
        report.location, report.current, condition, report.min, report.max
    )
}

pub async fn weather_text<W: WeatherProvider + ?Sized>(provider: &W) -> String {
    match provider.today().await {
        Ok(report) => format_weather(&report),
        Err(err) => {
            error!(error = %err, "weather lookup failed");
            WEATHER_FALLBACK.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_report_with_condition() {
        let report = WeatherReport {
            location: "Hamburg".to_string(),
            current: 11.0,
            min: 7.94,
            max: 13.2,
            weather_code: Some(61),
        };
        assert_eq!(
            format_weather(&report),
            "🌦 **Wetter in Hamburg**\nAktuell: 11.0°C (Regen)\nTageswerte: 7.9°C bis 13.2°C"
        );
    }

    #[test]
    fn unknown_code_is_left_out() {
        let report = WeatherReport {
            location: "Hamburg".to_string(),
            current: -2.0,
            min: -4.0,
            max: 0.5,
            weather_code: Some(42),
        };
        assert!(format_weather(&report).contains("Aktuell: -2.0°C\n"));
    }
}
