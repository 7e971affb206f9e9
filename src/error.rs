// src/error.rs
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("HTTP request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parsing failed: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonDeserializationFailed(String),

    #[error("Coordinate out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation failed: {}", messages.join(" / "))]
    Validation { messages: Vec<String> },

    #[error("Geocoder request denied: {0}")]
    RequestDenied(String),

    #[error("Geocoder quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Other geocoder error (HTTP {code}): {message}")]
    OtherGeocoderError { code: u16, message: String },

    #[error("Search task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl MapError {
    /// Creates a `MapError` from an HTTP status code and a JSON response body.
    ///
    /// Geocoding APIs put a machine readable `status` and a human readable
    /// `error_message` in their error bodies; both are folded into the message.
    pub(crate) fn from_response(status_code: u16, response_body: Value) -> Self {
        let status = response_body
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let error_message = response_body
            .get("error_message")
            .or_else(|| response_body.get("error"))
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown error")
            .to_string();

        match status.as_str() {
            "REQUEST_DENIED" => {
                MapError::RequestDenied(format!("({}) {}", status, error_message))
            }
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => {
                MapError::QuotaExceeded(format!("({}) {}", status, error_message))
            }
            "INVALID_REQUEST" => MapError::InvalidInput(format!("({}) {}", status, error_message)),
            _ => {
                if status_code >= 500 {
                    MapError::InternalServerError(format!(
                        "Server error (HTTP {}): {}",
                        status_code, error_message
                    ))
                } else if status_code == 401 || status_code == 403 {
                    MapError::RequestDenied(format!(
                        "Auth error (HTTP {}): {}",
                        status_code, error_message
                    ))
                } else if status_code == 429 {
                    MapError::QuotaExceeded(format!(
                        "Rate limited (HTTP {}): {}",
                        status_code, error_message
                    ))
                } else {
                    MapError::OtherGeocoderError {
                        code: status_code,
                        message: error_message,
                    }
                }
            }
        }
    }
}
