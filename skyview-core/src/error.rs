use reqwest::StatusCode;
use thiserror::Error;

/// Failures of the location source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location service unavailable")]
    Unavailable,
}

/// Errors produced while fetching or resolving weather data.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport failure: DNS, timeout, connection reset.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Failed to parse provider response: {0}")]
    Parse(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("City not found: {0}")]
    PlaceNotFound(String),

    #[error("Please enter at least {min} characters")]
    QueryTooShort { min: usize },
}

/// User-facing error categories, each with one static message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Location,
    Network,
    Api,
    General,
}

impl ErrorCategory {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Api => "Weather data unavailable. Please try again later.",
            Self::Network => "Please check your internet connection.",
            Self::Location => {
                "Unable to get your location. Please allow location access or search for a city."
            }
            Self::General => "Something went wrong. Please try again.",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl WeatherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::Api { .. } => ErrorCategory::Api,
            Self::Location(_) => ErrorCategory::Location,
            Self::Parse(_) | Self::PlaceNotFound(_) | Self::QueryTooShort { .. } => {
                ErrorCategory::General
            }
        }
    }

    /// Message to show in place of the weather panel.
    ///
    /// Search-specific failures keep their own wording; everything else
    /// collapses to the category text.
    pub fn user_message(&self) -> String {
        match self {
            Self::PlaceNotFound(_) => "City not found".to_string(),
            Self::QueryTooShort { .. } => self.to_string(),
            other => other.category().message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_api_category() {
        let err = WeatherError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: "Invalid API key".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(err.to_string().contains("401"));
        assert!(err.user_message().contains("unavailable"));
    }

    #[test]
    fn location_errors_map_to_location_category() {
        let err = WeatherError::from(LocationError::PermissionDenied);
        assert_eq!(err.category(), ErrorCategory::Location);
        assert!(err.user_message().contains("allow location access"));
    }

    #[test]
    fn search_errors_keep_their_own_wording() {
        let err = WeatherError::PlaceNotFound("Atlantis".into());
        assert_eq!(err.category(), ErrorCategory::General);
        assert_eq!(err.user_message(), "City not found");

        let err = WeatherError::QueryTooShort { min: 2 };
        assert_eq!(err.user_message(), "Please enter at least 2 characters");
    }

    #[test]
    fn parse_errors_fall_back_to_general_message() {
        let err = WeatherError::Parse("missing field `main`".into());
        assert_eq!(err.user_message(), ErrorCategory::General.message());
    }
}
