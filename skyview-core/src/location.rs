use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

use crate::{error::LocationError, model::Coordinates};

/// How long to wait for a position before giving up.
pub const LOCATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the "current position" comes from.
#[async_trait]
pub trait LocationSource: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// A position known up front, e.g. from the command line or the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<Coordinates>);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        self.0.ok_or(LocationError::Unavailable)
    }
}

/// Ask `source` for a position, failing with [`LocationError::Timeout`] after `limit`.
pub async fn locate_within(
    source: &dyn LocationSource,
    limit: Duration,
) -> Result<Coordinates, LocationError> {
    match tokio::time::timeout(limit, source.locate()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?limit, "location request timed out");
            Err(LocationError::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NeverAnswers;

    #[async_trait]
    impl LocationSource for NeverAnswers {
        async fn locate(&self) -> Result<Coordinates, LocationError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn fixed_location_returns_coordinates() {
        let source = FixedLocation(Some(Coordinates::new(59.91, 10.75)));
        let at = locate_within(&source, LOCATE_TIMEOUT).await.expect("fixed position");
        assert_eq!(at, Coordinates::new(59.91, 10.75));
    }

    #[tokio::test]
    async fn missing_location_is_unavailable() {
        let err = locate_within(&FixedLocation(None), LOCATE_TIMEOUT).await.unwrap_err();
        assert_eq!(err, LocationError::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let err = locate_within(&NeverAnswers, LOCATE_TIMEOUT).await.unwrap_err();
        assert_eq!(err, LocationError::Timeout);
    }
}
