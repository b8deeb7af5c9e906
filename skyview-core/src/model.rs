use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Primary weather classification as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherClassification {
    pub code: u16,
    /// Short group name, e.g. "Rain".
    pub main: String,
    pub description: String,
    pub icon: String,
}

/// One forecast record covering a three-hour window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConditionsSample {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub clouds_pct: u8,
    pub weather: WeatherClassification,
}

/// The "now" record of the current-conditions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditionsRaw {
    pub city_name: String,
    pub timestamp: i64,
    /// Shift of the location's local time from UTC, in seconds.
    pub utc_offset_secs: i32,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub clouds_pct: u8,
    pub weather: WeatherClassification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: i64,
    pub feels_like: i64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// Heuristic estimate, not a measurement.
    pub uv_index: u8,
    pub weather_code: u16,
    pub icon: String,
    pub description: String,
    pub city_name: String,
}

/// Per-day summary folded from forecast samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    /// Timestamp of the first sample that fell on `date`.
    pub first_timestamp: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather: WeatherClassification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySlot {
    pub timestamp: i64,
    pub temperature: i64,
    pub weather: WeatherClassification,
}

/// Everything shown at one time. Built whole, then published; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coordinates: Coordinates,
    pub current: CurrentConditions,
    pub daily: Vec<DailyAggregate>,
    pub hourly: Vec<HourlySlot>,
    /// Offset reported for the location, for formatting times in its zone.
    pub utc_offset_secs: i32,
    pub fetched_at: DateTime<Utc>,
}

/// A geocoded place offered as a search suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
}

impl SuggestionCandidate {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Text placed in the search field once this candidate is chosen.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }

    pub fn region_label(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{state}, {}", self.country),
            None => self.country.clone(),
        }
    }
}
