//! Weather-specific error types.

use thiserror::Error;

/// Underlying reason a provider request failed.
#[derive(Error, Debug)]
pub enum FetchCause {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    /// `endpoint` never includes the API key.
    #[error("Request to {endpoint} failed: {cause}")]
    FetchFailed {
        endpoint: String,
        #[source]
        cause: FetchCause,
    },

    #[error("Store unavailable for key '{key}': {message}")]
    StoreUnavailable { key: String, message: String },
}

impl WeatherError {
    pub(crate) fn fetch_failed(endpoint: impl Into<String>, cause: impl Into<FetchCause>) -> Self {
        Self::FetchFailed {
            endpoint: endpoint.into(),
            cause: cause.into(),
        }
    }

    pub(crate) fn store_unavailable(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied => "Allow location access or search for a city".to_string(),
            Self::PositionUnavailable(_) => "Your location could not be determined".to_string(),
            Self::FetchFailed { cause: FetchCause::Status { status, .. }, .. }
                if *status == 401 || *status == 403 =>
            {
                "Weather API key is invalid. Check settings.".to_string()
            }
            Self::FetchFailed { .. } => "Weather service error. Please try again.".to_string(),
            Self::StoreUnavailable { .. } => "Saved settings could not be accessed".to_string(),
        }
    }

    /// Whether this error comes from the location resolver.
    pub fn is_location_error(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::PositionUnavailable(_))
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;
