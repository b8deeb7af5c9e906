use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::instrument;

use crate::{
    error::WeatherError,
    model::{
        Coordinates, CurrentConditionsRaw, RawConditionsSample, SuggestionCandidate,
        WeatherClassification,
    },
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Rebuild the HTTP client with a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, WeatherError> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, path, "OpenWeather request failed");
            return Err(WeatherError::Api { status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body)
            .map_err(|e| WeatherError::Parse(format!("OpenWeather {path}: {e}")))
    }
}

fn coordinate_query(at: Coordinates) -> Vec<(&'static str, String)> {
    vec![
        ("lat", at.latitude.to_string()),
        ("lon", at.longitude.to_string()),
        ("units", "metric".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    #[serde(default)]
    temp_min: Option<f64>,
    #[serde(default)]
    temp_max: Option<f64>,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
    main: String,
    description: String,
    icon: String,
}

impl From<OwWeather> for WeatherClassification {
    fn from(w: OwWeather) -> Self {
        Self { code: w.id, main: w.main, description: w.description, icon: w.icon }
    }
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn primary_weather(weather: Vec<OwWeather>, what: &str) -> Result<WeatherClassification, WeatherError> {
    weather
        .into_iter()
        .next()
        .map(WeatherClassification::from)
        .ok_or_else(|| WeatherError::Parse(format!("{what} has no weather classification")))
}

impl TryFrom<OwCurrentResponse> for CurrentConditionsRaw {
    type Error = WeatherError;

    fn try_from(r: OwCurrentResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            weather: primary_weather(r.weather, "current conditions")?,
            city_name: r.name,
            timestamp: r.dt,
            utc_offset_secs: r.timezone,
            temperature: r.main.temp,
            feels_like: r.main.feels_like,
            humidity_pct: r.main.humidity,
            wind_speed_mps: r.wind.speed,
            clouds_pct: r.clouds.all,
        })
    }
}

impl TryFrom<OwForecastEntry> for RawConditionsSample {
    type Error = WeatherError;

    fn try_from(e: OwForecastEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            weather: primary_weather(e.weather, "forecast entry")?,
            timestamp: e.dt,
            temperature: e.main.temp,
            feels_like: e.main.feels_like,
            temp_min: e.main.temp_min.unwrap_or(e.main.temp),
            temp_max: e.main.temp_max.unwrap_or(e.main.temp),
            humidity_pct: e.main.humidity,
            wind_speed_mps: e.wind.speed,
            clouds_pct: e.clouds.all,
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), level = "info")]
    async fn fetch_current(&self, at: Coordinates) -> Result<CurrentConditionsRaw, WeatherError> {
        let parsed: OwCurrentResponse =
            self.get_json("/data/2.5/weather", &coordinate_query(at)).await?;
        parsed.try_into()
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast_series(
        &self,
        at: Coordinates,
    ) -> Result<Vec<RawConditionsSample>, WeatherError> {
        let parsed: OwForecastResponse =
            self.get_json("/data/2.5/forecast", &coordinate_query(at)).await?;
        tracing::debug!(samples = parsed.list.len(), "forecast received");
        parsed.list.into_iter().map(RawConditionsSample::try_from).collect()
    }

    #[instrument(skip(self), level = "info")]
    async fn geocode(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SuggestionCandidate>, WeatherError> {
        let mut places: Vec<SuggestionCandidate> = self
            .get_json(
                "/geo/1.0/direct",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        places.truncate(limit);
        Ok(places)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
