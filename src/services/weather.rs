// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Point-in-time weather and air quality from OpenWeatherMap.
//!
//! An activity is summarized by two weather samples (start and end) and a
//! single air quality reading for the middle of the window.

use crate::error::AppError;
use crate::models::{Coordinates, SummitTotal};
use crate::services::aqi::{AqiCategory, Concentrations};
use chrono::{DateTime, Duration, Utc};
use heck::ToTitleCase;
use serde::Deserialize;

/// Seconds per hour bucket; two timestamps in the same bucket share a sample.
const HOUR_SECS: i64 = 3600;

/// Half-width of the air quality history window around the midpoint.
const AQI_WINDOW_SECS: i64 = 1800;

/// Text that marks a description as already carrying a weather line.
pub const WEATHER_MARKER: &str = "AQI";

/// Weather for one moment of the activity.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodWeather {
    pub icon: &'static str,
    /// Title-cased condition text ("Light Rain")
    pub description: String,
    /// °C
    pub temperature: f64,
    /// °C
    pub feels_like: f64,
    /// Percent
    pub humidity: f64,
    pub wind_speed_kmh: f64,
    pub wind_direction: &'static str,
    /// `None` renders the sample as an indoor ("Pain Cave") session.
    pub coordinates: Option<Coordinates>,
}

/// Weather over the whole activity window.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherInfo {
    pub start: PeriodWeather,
    pub end: PeriodWeather,
    /// `None` when the air quality lookup failed.
    pub aqi: Option<AqiCategory>,
}

impl WeatherInfo {
    /// Render the one-line summary appended to the description.
    pub fn render(&self, summit: Option<&SummitTotal>) -> String {
        let mut segments = vec![
            condition(&self.start),
            format!(
                "🌡 {}-{}°C",
                whole(self.start.temperature),
                whole(self.end.temperature)
            ),
            format!("👌 {}°C", whole(self.start.feels_like)),
            format!(
                "💦 {}-{}%",
                whole(self.start.humidity),
                whole(self.end.humidity)
            ),
        ];

        let indoors = self.start.coordinates.is_none();
        if !indoors {
            segments.push(format!(
                "💨 {}km/h {}",
                whole(self.start.wind_speed_kmh),
                self.start.wind_direction
            ));
        }

        if let Some(summit) = summit {
            segments.push(format!("⛰ {}m YTD", whole(summit.total)));
        }

        segments.push(format!(
            "{} {}",
            WEATHER_MARKER,
            self.aqi.map(AqiCategory::glyph).unwrap_or("?")
        ));

        let line = segments.join(" | ");
        if indoors {
            format!("The Pain Cave: {}\n", line)
        } else {
            format!("{}\n", line)
        }
    }
}

fn whole(value: f64) -> i64 {
    value.round() as i64
}

fn condition(sample: &PeriodWeather) -> String {
    if sample.icon.is_empty() {
        sample.description.clone()
    } else {
        format!("{} {}", sample.icon, sample.description)
    }
}

// ─── Provider responses ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TimeMachineResponse {
    #[serde(default)]
    data: Vec<WeatherData>,
}

#[derive(Debug, Deserialize)]
struct WeatherData {
    temp: f64,
    feels_like: f64,
    humidity: f64,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    wind_deg: f64,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct AirPollutionResponse {
    #[serde(default)]
    list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
struct AirPollutionEntry {
    components: AirComponents,
}

#[derive(Debug, Deserialize)]
struct AirComponents {
    #[serde(default)]
    co: f64,
    #[serde(default)]
    no2: f64,
    #[serde(default)]
    pm2_5: f64,
}

// ─── Sampler ─────────────────────────────────────────────────

/// OpenWeatherMap client.
#[derive(Clone)]
pub struct WeatherService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherService {
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: std::time::Duration,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Sample weather for an activity window at `location`.
    pub async fn sample(
        &self,
        start: DateTime<Utc>,
        elapsed_secs: i64,
        location: Coordinates,
    ) -> Result<WeatherInfo, AppError> {
        self.sample_at(start, elapsed_secs, location, Utc::now())
            .await
    }

    /// Like [`Self::sample`], with an explicit notion of "now" for choosing
    /// between historical and current air quality.
    pub async fn sample_at(
        &self,
        start: DateTime<Utc>,
        elapsed_secs: i64,
        location: Coordinates,
        now: DateTime<Utc>,
    ) -> Result<WeatherInfo, AppError> {
        let end = start + Duration::seconds(elapsed_secs.max(0));

        let start_sample = self
            .weather_at(location, start)
            .await?
            .ok_or_else(|| no_description(start))?;

        let end_sample = if same_hour(start, end) {
            start_sample.clone()
        } else {
            match self.weather_at(location, end).await {
                Ok(Some(sample)) => sample,
                Ok(None) => return Err(no_description(end)),
                Err(e) => {
                    tracing::warn!(error = %e, "End-of-activity weather unavailable, reusing start");
                    start_sample.clone()
                }
            }
        };

        let midpoint = start + Duration::seconds(elapsed_secs.max(0) / 2);
        let aqi = match self.air_quality(location, midpoint, end, now).await {
            Ok(conc) => Some(conc.category()),
            Err(e) => {
                tracing::warn!(error = %e, "Air quality unavailable");
                None
            }
        };

        Ok(WeatherInfo {
            start: start_sample,
            end: end_sample,
            aqi,
        })
    }

    /// `Ok(None)` when the provider answered without a condition description.
    async fn weather_at(
        &self,
        location: Coordinates,
        at: DateTime<Utc>,
    ) -> Result<Option<PeriodWeather>, AppError> {
        let url = format!("{}/data/3.0/onecall/timemachine", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                ("dt", at.timestamp().to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("lang", "en".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Weather(e.to_string()))?;

        let body: TimeMachineResponse = check_response_json(response).await?;

        Ok(body
            .data
            .into_iter()
            .next()
            .and_then(|data| period_from(data, location)))
    }

    async fn air_quality(
        &self,
        location: Coordinates,
        midpoint: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Concentrations, AppError> {
        let mut query = vec![
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
            ("appid", self.api_key.clone()),
        ];

        let url = if end < now - Duration::seconds(HOUR_SECS) {
            let mid = midpoint.timestamp();
            query.push(("start", (mid - AQI_WINDOW_SECS).to_string()));
            query.push(("end", (mid + AQI_WINDOW_SECS).to_string()));
            format!("{}/data/2.5/air_pollution/history", self.base_url)
        } else {
            format!("{}/data/2.5/air_pollution", self.base_url)
        };

        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Weather(e.to_string()))?;

        let body: AirPollutionResponse = check_response_json(response).await?;

        body.list
            .into_iter()
            .next()
            .map(|entry| Concentrations {
                pm2_5: entry.components.pm2_5,
                co: entry.components.co,
                no2: entry.components.no2,
            })
            .ok_or_else(|| AppError::Weather("No air quality readings".to_string()))
    }
}

fn no_description(at: DateTime<Utc>) -> AppError {
    AppError::Weather(format!("No weather description at {}", at))
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Weather(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Weather(format!("JSON parse error: {}", e)))
}

fn period_from(data: WeatherData, location: Coordinates) -> Option<PeriodWeather> {
    let condition = data.weather.into_iter().next()?;
    if condition.description.trim().is_empty() {
        return None;
    }

    Some(PeriodWeather {
        icon: weather_icon(&condition.icon),
        description: condition.description.to_title_case(),
        temperature: data.temp,
        feels_like: data.feels_like,
        humidity: data.humidity,
        wind_speed_kmh: (data.wind_speed * 3.6).round(),
        wind_direction: wind_direction_icon(data.wind_deg),
        coordinates: Some(location),
    })
}

fn same_hour(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp().div_euclid(HOUR_SECS) == b.timestamp().div_euclid(HOUR_SECS)
}

/// Map an OpenWeatherMap icon code ("10d", "04n") to a pictogram.
pub fn weather_icon(code: &str) -> &'static str {
    let code = code.trim_end_matches(['d', 'n']);
    match code {
        "01" => "☀️",
        "02" => "🌤",
        "03" => "⛅",
        "04" => "🌥",
        "09" => "🌧",
        "10" => "🌦",
        "11" => "⛈",
        "13" => "🌨",
        "50" => "🌫",
        _ => "",
    }
}

/// Arrow pointing where the wind blows *to*, for a bearing it blows *from*.
pub fn wind_direction_icon(degrees: f64) -> &'static str {
    let deg = degrees.round().rem_euclid(360.0) as u32;
    match deg {
        23..=67 => "↙",
        68..=112 => "←",
        113..=157 => "↖",
        158..=202 => "↑",
        203..=247 => "↗",
        248..=292 => "→",
        293..=337 => "↘",
        _ => "↓",
    }
}
