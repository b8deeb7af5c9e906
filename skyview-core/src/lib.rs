//! Core library for the `skyview` weather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherProvider`] trait
//! - Folding forecast samples into daily aggregates
//! - Derived values (approximate UV, condition text, icon locators)
//! - Debounced suggestion search with stale-result suppression
//! - The refresh path producing immutable [`WeatherSnapshot`]s
//!
//! It is used by `skyview-cli`, but exposes plain data only and can drive any
//! front end.

pub mod aggregate;
pub mod config;
pub mod derived;
pub mod error;
pub mod generation;
pub mod location;
pub mod model;
pub mod provider;
pub mod search;
pub mod service;

pub use config::{Config, DayBoundary, SearchSettings};
pub use error::{ErrorCategory, LocationError, WeatherError};
pub use generation::Generation;
pub use model::{
    Coordinates, CurrentConditions, DailyAggregate, HourlySlot, RawConditionsSample,
    SuggestionCandidate, WeatherSnapshot,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use search::{SearchController, SearchSession, SearchState, Selection};
pub use service::{SnapshotSlot, WeatherService};
