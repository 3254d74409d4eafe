//! Error types and handling for the minimalweather service

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the minimalweather service
#[derive(Error, Debug)]
pub enum WeatherError {
    /// No city matched a by-name lookup
    #[error("City not found: {name}")]
    NotFound { name: String },

    /// Coordinates or other request input could not be parsed
    #[error("Invalid input: {message}")]
    MalformedInput { message: String },

    /// The HTML page could not be produced
    #[error("Render error: {message}")]
    Render { message: String },

    /// A collaborator (city directory, weather provider, geolocation) failed
    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// A collaborator did not answer within the bounded wait
    #[error("{service} did not respond within {}s", after.as_secs_f64())]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a new malformed-input error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create a new upstream error for the named collaborator
    pub fn upstream<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }

    pub fn timeout(service: &'static str, after: Duration) -> Self {
        Self::Timeout { service, after }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status this error is reported with
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::NotFound { .. } => StatusCode::NOT_FOUND,
            WeatherError::MalformedInput { .. } => StatusCode::BAD_REQUEST,
            WeatherError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            WeatherError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            WeatherError::Render { .. } | WeatherError::Config { .. } | WeatherError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::NotFound { name } => format!("No city named '{name}' is known"),
            WeatherError::MalformedInput { message } => format!("Invalid input: {message}"),
            WeatherError::Render { message } => message.clone(),
            WeatherError::Upstream { service, .. } => {
                format!("The {service} is currently unavailable. Please try again later.")
            }
            WeatherError::Timeout { service, .. } => {
                format!("The {service} took too long to answer. Please try again later.")
            }
            WeatherError::Config { .. } | WeatherError::Io { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            WeatherError::NotFound { .. } => status.into_response(),
            WeatherError::Upstream { .. } | WeatherError::Timeout { .. } => {
                tracing::warn!("Request failed: {}", self);
                (status, self.user_message()).into_response()
            }
            WeatherError::Render { .. } | WeatherError::Config { .. } | WeatherError::Io { .. } => {
                tracing::error!("Request failed: {}", self);
                (status, self.user_message()).into_response()
            }
            WeatherError::MalformedInput { .. } => (status, self.user_message()).into_response(),
        }
    }
}
