//! Values computed from provider data rather than reported by it.

use chrono::{DateTime, TimeZone, Timelike};

use crate::model::{CurrentConditions, CurrentConditionsRaw, HourlySlot, RawConditionsSample};

/// Number of upcoming samples shown in the hourly strip.
pub const HOURLY_SLOTS: usize = 6;

/// Rough UV estimate from the hour of day and cloud cover.
///
/// Peaks at 10 at noon under a clear sky and is zero outside 06:00..=18:00.
/// This is a heuristic and must never be presented as a measurement.
pub fn approximate_uv_index(hour: u32, clouds_pct: u8) -> u8 {
    let base = if (6..=18).contains(&hour) {
        10.0 - (12.0 - f64::from(hour)).abs()
    } else {
        0.0
    };
    let clouds = f64::from(clouds_pct.min(100));
    let scaled = base * (1.0 - clouds / 100.0);

    scaled.round().clamp(0.0, 11.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    /// Band for a UV index; each band includes its upper bound.
    pub fn from_index(uvi: f64) -> Self {
        if uvi <= 2.0 {
            Self::Low
        } else if uvi <= 5.0 {
            Self::Moderate
        } else if uvi <= 7.0 {
            Self::High
        } else if uvi <= 10.0 {
            Self::VeryHigh
        } else {
            Self::Extreme
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
            Self::Extreme => "Extreme",
        }
    }
}

impl std::fmt::Display for UvLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Human-readable text for an OpenWeather condition code.
pub fn condition_text(code: u16) -> &'static str {
    match code {
        200 => "Thunderstorm with light rain",
        201 => "Thunderstorm with rain",
        202 => "Thunderstorm with heavy rain",
        210 => "Light thunderstorm",
        211 => "Thunderstorm",
        212 => "Heavy thunderstorm",
        221 => "Ragged thunderstorm",
        230 => "Thunderstorm with light drizzle",
        231 => "Thunderstorm with drizzle",
        232 => "Thunderstorm with heavy drizzle",

        300 => "Light Drizzle",
        301 => "Drizzle",
        302 => "Heavy Drizzle",
        310 => "Light Drizzle Rain",
        311 => "Drizzle Rain",
        312 => "Heavy Drizzle Rain",
        313 => "Shower Rain and Drizzle",
        314 => "Heavy Shower Rain and Drizzle",
        321 => "Shower Drizzle",

        500 => "Light Rain",
        501 => "Moderate Rain",
        502 => "Heavy Rain",
        503 => "Very Heavy Rain",
        504 => "Extreme Rain",
        511 => "Freezing Rain",
        520 => "Light Rain Shower",
        521 => "Rain Shower",
        522 => "Heavy Rain Shower",
        531 => "Ragged Rain Shower",

        600 => "Light Snow",
        601 => "Snow",
        602 => "Heavy Snow",
        611 => "Sleet",
        612 => "Light Shower Sleet",
        613 => "Shower Sleet",
        615 => "Light Rain and Snow",
        616 => "Rain and Snow",
        620 => "Light Shower Snow",
        621 => "Shower Snow",
        622 => "Heavy Shower Snow",

        701 => "Mist",
        711 => "Smoke",
        721 => "Haze",
        731 => "Sand/Dust Whirls",
        741 => "Fog",
        751 => "Sand",
        761 => "Dust",
        762 => "Ash",
        771 => "Squalls",
        781 => "Tornado",

        800 => "Clear Sky",
        801 => "Few Clouds",
        802 => "Scattered Clouds",
        803 => "Broken Clouds",
        804 => "Overcast Clouds",

        _ => "Unknown",
    }
}

/// Locator of the 2x icon image for an icon key. Does not check it exists.
pub fn icon_url(icon_base: &str, icon: &str) -> String {
    format!("{}/{icon}@2x.png", icon_base.trim_end_matches('/'))
}

pub fn wind_kmh(mps: f64) -> i64 {
    (mps * 3.6).round() as i64
}

fn local_hour<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<u32> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(tz).hour())
}

/// Build the displayed "now" record. UV is estimated from the hour of the
/// observation in `tz`.
pub fn parse_current<Tz: TimeZone>(raw: &CurrentConditionsRaw, tz: &Tz) -> CurrentConditions {
    let uv_index = match local_hour(raw.timestamp, tz) {
        Some(hour) => approximate_uv_index(hour, raw.clouds_pct),
        None => {
            tracing::warn!(timestamp = raw.timestamp, "invalid observation time, UV set to 0");
            0
        }
    };

    CurrentConditions {
        temperature: raw.temperature.round() as i64,
        feels_like: raw.feels_like.round() as i64,
        humidity_pct: raw.humidity_pct,
        wind_speed_mps: raw.wind_speed_mps,
        uv_index,
        weather_code: raw.weather.code,
        icon: raw.weather.icon.clone(),
        description: raw.weather.description.clone(),
        city_name: raw.city_name.clone(),
    }
}

pub fn hourly_strip(samples: &[RawConditionsSample], count: usize) -> Vec<HourlySlot> {
    samples
        .iter()
        .take(count)
        .map(|s| HourlySlot {
            timestamp: s.timestamp,
            temperature: s.temperature.round() as i64,
            weather: s.weather.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherClassification;
    use chrono::{FixedOffset, Utc};

    fn classification(code: u16) -> WeatherClassification {
        WeatherClassification {
            code,
            main: "Clear".into(),
            description: "clear sky".into(),
            icon: "01d".into(),
        }
    }

    #[test]
    fn uv_peaks_at_clear_noon() {
        assert_eq!(approximate_uv_index(12, 0), 10);
    }

    #[test]
    fn uv_is_zero_at_night() {
        for clouds in [0, 50, 100] {
            assert_eq!(approximate_uv_index(0, clouds), 0);
            assert_eq!(approximate_uv_index(23, clouds), 0);
            assert_eq!(approximate_uv_index(5, clouds), 0);
            assert_eq!(approximate_uv_index(19, clouds), 0);
        }
    }

    #[test]
    fn uv_scales_with_clouds() {
        assert_eq!(approximate_uv_index(12, 50), 5);
        assert_eq!(approximate_uv_index(12, 100), 0);
        // 10 - |12 - 9| = 7, 7 * 0.75 = 5.25
        assert_eq!(approximate_uv_index(9, 25), 5);
        // Edges of the daylight window: 10 - 6 = 4
        assert_eq!(approximate_uv_index(6, 0), 4);
        assert_eq!(approximate_uv_index(18, 0), 4);
    }

    #[test]
    fn uv_level_boundaries_are_inclusive_upper() {
        assert_eq!(UvLevel::from_index(0.0), UvLevel::Low);
        assert_eq!(UvLevel::from_index(2.0), UvLevel::Low);
        assert_eq!(UvLevel::from_index(2.01), UvLevel::Moderate);
        assert_eq!(UvLevel::from_index(3.0), UvLevel::Moderate);
        assert_eq!(UvLevel::from_index(5.0), UvLevel::Moderate);
        assert_eq!(UvLevel::from_index(7.0), UvLevel::High);
        assert_eq!(UvLevel::from_index(10.0), UvLevel::VeryHigh);
        assert_eq!(UvLevel::from_index(11.0), UvLevel::Extreme);
    }

    #[test]
    fn uv_level_labels() {
        assert_eq!(UvLevel::from_index(2.0).label(), "Low");
        assert_eq!(UvLevel::VeryHigh.to_string(), "Very High");
        assert_eq!(UvLevel::from_index(11.0).to_string(), "Extreme");
    }

    #[test]
    fn condition_text_lookup() {
        assert_eq!(condition_text(800), "Clear Sky");
        assert_eq!(condition_text(504), "Extreme Rain");
        assert_eq!(condition_text(731), "Sand/Dust Whirls");
        assert_eq!(condition_text(999), "Unknown");
        assert_eq!(condition_text(0), "Unknown");
    }

    #[test]
    fn icon_url_formats_locator() {
        assert_eq!(
            icon_url("https://openweathermap.org/img/wn", "10d"),
            "https://openweathermap.org/img/wn/10d@2x.png"
        );
        assert_eq!(icon_url("http://icons/", "01n"), "http://icons/01n@2x.png");
    }

    #[test]
    fn wind_is_converted_to_kmh() {
        assert_eq!(wind_kmh(5.0), 18);
        assert_eq!(wind_kmh(0.0), 0);
        assert_eq!(wind_kmh(3.3), 12);
    }

    #[test]
    fn parse_current_rounds_and_estimates_uv() {
        let raw = CurrentConditionsRaw {
            city_name: "Lisbon".into(),
            // 2024-03-01T11:00:00Z
            timestamp: 1_709_290_800,
            utc_offset_secs: 0,
            temperature: 17.5,
            feels_like: 16.4,
            humidity_pct: 55,
            wind_speed_mps: 4.1,
            clouds_pct: 0,
            weather: classification(800),
        };

        let at_utc = parse_current(&raw, &Utc);
        assert_eq!(at_utc.temperature, 18);
        assert_eq!(at_utc.feels_like, 16);
        assert_eq!(at_utc.uv_index, 9);
        assert_eq!(at_utc.weather_code, 800);
        assert_eq!(at_utc.city_name, "Lisbon");

        let plus_one = FixedOffset::east_opt(3600).expect("valid offset");
        assert_eq!(parse_current(&raw, &plus_one).uv_index, 10);
    }

    #[test]
    fn hourly_strip_takes_leading_samples() {
        let samples: Vec<_> = (0..10)
            .map(|i| RawConditionsSample {
                timestamp: 1_709_251_200 + i * 10_800,
                temperature: 10.4 + i as f64,
                feels_like: 9.0,
                temp_min: 9.0,
                temp_max: 12.0,
                humidity_pct: 70,
                wind_speed_mps: 2.0,
                clouds_pct: 10,
                weather: classification(801),
            })
            .collect();

        let strip = hourly_strip(&samples, HOURLY_SLOTS);
        assert_eq!(strip.len(), 6);
        assert_eq!(strip[0].temperature, 10);
        assert_eq!(strip[5].timestamp, 1_709_251_200 + 5 * 10_800);
        assert!(hourly_strip(&samples[..2], HOURLY_SLOTS).len() == 2);
    }
}
