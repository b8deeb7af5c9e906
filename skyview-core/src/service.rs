//! The one refresh path: coordinates in, a complete immutable snapshot out.
//!
//! Start-up geolocation, direct city search and suggestion selection all end
//! in [`WeatherService::snapshot`]. Snapshots are published through a
//! [`SnapshotSlot`], which refuses results from refreshes that a later one
//! has superseded.

use std::sync::Arc;

use chrono::{Local, TimeZone, Utc};
use tokio::sync::watch;

use crate::{
    aggregate::{aggregate_daily_in, location_offset},
    config::{Config, DayBoundary},
    derived::{HOURLY_SLOTS, hourly_strip, parse_current},
    error::WeatherError,
    generation::{Generation, GenerationCounter},
    location::{LOCATE_TIMEOUT, LocationSource, locate_within},
    model::{
        Coordinates, CurrentConditionsRaw, RawConditionsSample, SuggestionCandidate,
        WeatherSnapshot,
    },
    provider::WeatherProvider,
};

#[derive(Debug, Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    boundary: DayBoundary,
    min_query_len: usize,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, boundary: DayBoundary) -> Self {
        Self { provider, boundary, min_query_len: 2 }
    }

    pub fn from_config(provider: Arc<dyn WeatherProvider>, config: &Config) -> Self {
        Self {
            provider,
            boundary: config.day_boundary,
            min_query_len: config.search.min_query_len,
        }
    }

    pub fn provider(&self) -> Arc<dyn WeatherProvider> {
        Arc::clone(&self.provider)
    }

    /// Fetch current conditions and forecast together and build the snapshot.
    ///
    /// Either both requests succeed and a whole snapshot is returned, or the
    /// first error is returned and nothing is built.
    pub async fn snapshot(&self, at: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        tracing::info!(%at, "refreshing weather");
        let (current, samples) = tokio::try_join!(
            self.provider.fetch_current(at),
            self.provider.fetch_forecast_series(at),
        )?;

        let snapshot = match self.boundary {
            DayBoundary::Local => build_snapshot(at, &current, &samples, &Local),
            DayBoundary::Location => {
                let tz = location_offset(current.utc_offset_secs);
                build_snapshot(at, &current, &samples, &tz)
            }
        };

        tracing::info!(
            city = %snapshot.current.city_name,
            days = snapshot.daily.len(),
            "weather snapshot ready"
        );
        Ok(snapshot)
    }

    /// Resolve a typed city name to its best match, then refresh for it.
    pub async fn snapshot_for_place(
        &self,
        query: &str,
    ) -> Result<(SuggestionCandidate, WeatherSnapshot), WeatherError> {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            return Err(WeatherError::QueryTooShort { min: self.min_query_len });
        }

        let place = self
            .provider
            .geocode(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::PlaceNotFound(query.to_string()))?;

        let snapshot = self.snapshot(place.coordinates()).await?;
        Ok((place, snapshot))
    }

    /// Refresh for `at` under `generation` and publish the result into `slot`.
    ///
    /// A failure is returned only while `generation` is still the latest
    /// refresh of `slot`; failures of superseded refreshes are dropped.
    pub async fn refresh_into(
        &self,
        slot: &SnapshotSlot,
        generation: Generation,
        at: Coordinates,
    ) -> Option<WeatherError> {
        match self.snapshot(at).await {
            Ok(snapshot) => {
                slot.publish(generation, snapshot);
                None
            }
            Err(err) if slot.is_current(generation) => Some(err),
            Err(err) => {
                tracing::debug!(stale = %generation, error = %err, "dropping superseded refresh failure");
                None
            }
        }
    }

    /// Start-up path: ask the location source, then refresh.
    pub async fn snapshot_for_location(
        &self,
        source: &dyn LocationSource,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let at = locate_within(source, LOCATE_TIMEOUT).await?;
        self.snapshot(at).await
    }
}

/// Assemble a snapshot with day boundaries and UV hours taken in `tz`.
pub fn build_snapshot<Tz: TimeZone>(
    at: Coordinates,
    current: &CurrentConditionsRaw,
    samples: &[RawConditionsSample],
    tz: &Tz,
) -> WeatherSnapshot {
    WeatherSnapshot {
        coordinates: at,
        current: parse_current(current, tz),
        daily: aggregate_daily_in(samples, tz),
        hourly: hourly_strip(samples, HOURLY_SLOTS),
        utc_offset_secs: current.utc_offset_secs,
        fetched_at: Utc::now(),
    }
}

/// The single "currently shown weather" slot.
#[derive(Debug)]
pub struct SnapshotSlot {
    generations: GenerationCounter,
    tx: watch::Sender<Option<Arc<WeatherSnapshot>>>,
}

impl Default for SnapshotSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { generations: GenerationCounter::new(), tx }
    }

    /// Announce a refresh; every earlier refresh becomes stale.
    pub fn begin(&self) -> Generation {
        self.generations.advance()
    }

    /// Whether no refresh has begun since `generation`.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generations.is_current(generation)
    }

    /// Replace the shown snapshot if `generation` is still the latest refresh.
    pub fn publish(&self, generation: Generation, snapshot: WeatherSnapshot) -> bool {
        if !self.is_current(generation) {
            tracing::debug!(stale = %generation, "dropping superseded weather snapshot");
            return false;
        }
        self.tx.send_replace(Some(Arc::new(snapshot)));
        true
    }

    pub fn current(&self) -> Option<Arc<WeatherSnapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<WeatherSnapshot>>> {
        self.tx.subscribe()
    }
}
