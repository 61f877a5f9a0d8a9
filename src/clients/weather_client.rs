use serde::Deserialize;

use crate::config::WeatherLocation;
use crate::error::BotError;
use crate::models::weather::WeatherReport;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
    daily: DailyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

/// Open-Meteo forecast client for a single fixed point. No API key required.
pub struct WeatherClient {
    http: reqwest::Client,
    location: WeatherLocation,
    timezone: String,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, location: WeatherLocation, timezone: &str) -> Self {
        Self {
            http,
            location,
            timezone: timezone.to_string(),
        }
    }

    pub async fn fetch_today(&self) -> Result<WeatherReport, BotError> {
        let response = self
            .http
            .get(OPEN_METEO_URL)
            .query(&[
                ("latitude", self.location.latitude.to_string()),
                ("longitude", self.location.longitude.to_string()),
                ("current", "temperature_2m,weather_code".to_string()),
                (
                    "daily",
                    "weather_code,temperature_2m_max,temperature_2m_min".to_string(),
                ),
                ("timezone", self.timezone.clone()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BotError::from_status(status, &body));
        }
        parse_forecast(&body, &self.location.name)
    }
}

pub fn parse_forecast(body: &str, location: &str) -> Result<WeatherReport, BotError> {
    let forecast: ForecastResponse = serde_json::from_str(body)?;
    let (Some(max), Some(min)) = (
        forecast.daily.temperature_2m_max.first(),
        forecast.daily.temperature_2m_min.first(),
    ) else {
        return Err(BotError::MalformedResponse(
            "forecast without daily values".to_string(),
        ));
    };
    Ok(WeatherReport {
        location: location.to_string(),
        current: forecast.current.temperature_2m,
        min: *min,
        max: *max,
        weather_code: forecast.current.weather_code,
    })
}
