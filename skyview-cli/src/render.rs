//! Terminal presentation of snapshots and suggestion lists.
//!
//! Every field is written on its own; a field that fails to render is logged
//! and skipped so the rest of the panel still shows.

use std::io::Write;

use chrono::{DateTime, Local};
use skyview_core::{
    Config, DayBoundary, SearchState, WeatherError, WeatherSnapshot,
    aggregate::location_offset,
    derived::{UvLevel, condition_text, icon_url, wind_kmh},
    search::{Segment, highlight},
};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone)]
pub struct Renderer {
    icon_base: String,
    boundary: DayBoundary,
    color: bool,
}

/// Write one line for `field`, logging instead of failing.
fn emit(out: &mut impl Write, field: &'static str, line: std::fmt::Arguments<'_>) {
    if let Err(e) = out.write_fmt(line).and_then(|()| out.write_all(b"\n")) {
        tracing::warn!(field, error = %e, "skipping field");
    }
}

fn flush(out: &mut impl Write) {
    if let Err(e) = out.flush() {
        tracing::warn!(error = %e, "failed to flush output");
    }
}

impl Renderer {
    pub fn new(config: &Config, color: bool) -> Self {
        Self {
            icon_base: config.endpoints.icon_base.clone(),
            boundary: config.day_boundary,
            color,
        }
    }

    fn clock(&self, timestamp: i64, utc_offset_secs: i32) -> Option<String> {
        let utc = DateTime::from_timestamp(timestamp, 0)?;
        let text = match self.boundary {
            DayBoundary::Local => utc.with_timezone(&Local).format("%H:%M").to_string(),
            DayBoundary::Location => {
                utc.with_timezone(&location_offset(utc_offset_secs)).format("%H:%M").to_string()
            }
        };
        Some(text)
    }

    pub fn snapshot(&self, out: &mut impl Write, snap: &WeatherSnapshot) {
        let now = &snap.current;

        emit(out, "location", format_args!("{}", now.city_name));
        emit(out, "condition", format_args!("{}", condition_text(now.weather_code)));
        emit(out, "temperature", format_args!("{}°", now.temperature));
        emit(
            out,
            "icon",
            format_args!("{} ({})", icon_url(&self.icon_base, &now.icon), now.description),
        );

        emit(out, "heading", format_args!("\nAIR CONDITIONS"));
        emit(out, "real_feel", format_args!("  Real Feel  {}°", now.feels_like));
        emit(out, "wind", format_args!("  Wind       {} km/h", wind_kmh(now.wind_speed_mps)));
        let uv_level = UvLevel::from_index(f64::from(now.uv_index));
        emit(out, "uv_index", format_args!("  UV Index   {} ({uv_level}, estimated)", now.uv_index));
        emit(out, "humidity", format_args!("  Humidity   {}%", now.humidity_pct));

        emit(out, "heading", format_args!("\nTODAY'S FORECAST"));
        for slot in &snap.hourly {
            match self.clock(slot.timestamp, snap.utc_offset_secs) {
                Some(time) => emit(
                    out,
                    "hourly",
                    format_args!("  {time}  {:>4}°  {}", slot.temperature, slot.weather.description),
                ),
                None => tracing::warn!(timestamp = slot.timestamp, "skipping hourly slot"),
            }
        }

        emit(out, "heading", format_args!("\nFORECAST"));
        for (i, day) in snap.daily.iter().enumerate() {
            let name = if i == 0 { "Today".to_string() } else { day.date.format("%A").to_string() };
            emit(
                out,
                "daily",
                format_args!(
                    "  {name:<10} {:<14} {}°/{}°  {} ({})",
                    day.weather.main,
                    day.temp_max.round() as i64,
                    day.temp_min.round() as i64,
                    icon_url(&self.icon_base, &day.weather.icon),
                    day.weather.description
                ),
            );
        }

        flush(out);
    }

    pub fn error(&self, out: &mut impl Write, err: &WeatherError) {
        emit(out, "error", format_args!("{}", err.user_message()));
        flush(out);
    }

    fn marked(&self, name: &str, query: &str) -> String {
        highlight(name, query)
            .into_iter()
            .map(|segment| match segment {
                Segment::Plain(text) => text.to_string(),
                Segment::Match(text) if self.color => format!("{BOLD}{text}{RESET}"),
                Segment::Match(text) => format!("[{text}]"),
            })
            .collect()
    }

    pub fn search_state(&self, out: &mut impl Write, state: &SearchState) {
        match state {
            SearchState::Idle | SearchState::AwaitingDebounce { .. } => {}
            SearchState::Fetching { .. } => {
                emit(out, "suggestions", format_args!("Loading suggestions..."))
            }
            SearchState::ShowingResults { query, candidates } => {
                for (i, place) in candidates.iter().enumerate() {
                    emit(
                        out,
                        "suggestion",
                        format_args!(
                            "  :{}  {}  {}",
                            i + 1,
                            self.marked(&place.name, query),
                            place.region_label()
                        ),
                    );
                }
            }
            SearchState::ShowingEmpty { .. } => {
                emit(out, "suggestions", format_args!("No matching cities found"))
            }
            SearchState::ShowingError { .. } => {
                emit(out, "suggestions", format_args!("Error loading suggestions"))
            }
        }
    }
}
