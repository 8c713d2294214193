use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Every way a request can fail, mapped to one status code each.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field is present but its value is unacceptable.
    #[error("{message}")]
    Invalid { field: String, message: String },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but acting on someone else's record.
    #[error("Forbidden")]
    Forbidden,

    /// Store, blob or notifier failure. Only `message` reaches the client.
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_) | ApiError::Invalid { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { message, source } = &self {
            error!("{}: {:#}", message, source);
        }

        let fields = match &self {
            ApiError::MissingFields(names) => names.iter().map(|n| n.to_string()).collect(),
            ApiError::Invalid { field, .. } => vec![field.clone()],
            _ => Vec::new(),
        };

        let body = ErrorBody {
            error: self.to_string(),
            fields,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Turn a gateway failure into a 500 carrying the handler's public message.
pub trait OrInternal<T> {
    fn or_internal(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T, E> OrInternal<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_internal(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::Internal {
            message,
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_names_fields() {
        let err = ApiError::MissingFields(vec!["userId", "value"]);
        assert_eq!(err.to_string(), "Missing required fields: userId, value");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_error_hides_source() {
        let err: Result<(), _> = Err(anyhow::anyhow!("disk I/O error at /var/lib/pings.db"));
        let err = err.or_internal("Failed to process checkin").unwrap_err();
        assert_eq!(err.to_string(), "Failed to process checkin");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
