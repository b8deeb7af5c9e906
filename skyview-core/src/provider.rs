use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, CurrentConditionsRaw, RawConditionsSample, SuggestionCandidate},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// A source of weather and geocoding data.
///
/// Implementations are stateless apart from their HTTP client and make a
/// single attempt per call.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, at: Coordinates) -> Result<CurrentConditionsRaw, WeatherError>;

    /// Forecast samples in ascending time order, as the provider returns them.
    async fn fetch_forecast_series(
        &self,
        at: Coordinates,
    ) -> Result<Vec<RawConditionsSample>, WeatherError>;

    /// Places matching `query`, in provider ranking order, at most `limit`.
    async fn geocode(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SuggestionCandidate>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    provider_with_env_key(config, Config::env_api_key())
}

fn provider_with_env_key(
    config: &Config,
    from_env: Option<String>,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.resolve_api_key(from_env)?;
    let provider = OpenWeatherProvider::new(api_key, &config.endpoints.api_base)
        .with_timeout(config.request_timeout())?;

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_when_missing_api_key() {
        let err = provider_with_env_key(&Config::default(), None).unwrap_err();
        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn provider_works_with_stored_key() {
        let cfg = Config { api_key: Some("KEY".into()), ..Config::default() };
        assert!(provider_with_env_key(&cfg, None).is_ok());
        assert!(provider_from_config(&cfg).is_ok());
    }

    #[test]
    fn provider_works_with_env_key_only() {
        assert!(provider_with_env_key(&Config::default(), Some("ENV".into())).is_ok());
    }
}
