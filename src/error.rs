use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Parse(_) => "ParseError",
            AppError::EmptyInput(_) => "EmptyInputError",
            AppError::UnsupportedInput(_) => "UnsupportedInputError",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::PayloadTooLarge(_) => "PayloadTooLargeError",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Parse(_) | AppError::EmptyInput(_) | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::UnsupportedInput(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &str {
        match self {
            AppError::Parse(msg)
            | AppError::EmptyInput(msg)
            | AppError::UnsupportedInput(msg)
            | AppError::InvalidInput(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Parse(format!("Invalid CSV format: {}", err))
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge(format!("Upload exceeds the size limit: {}", err))
            }
            _ => AppError::InvalidInput(format!("Failed to read upload: {}", err)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("{} ({})", self, self.kind());

        let status = self.status();
        let body = Json(json!({
            "error": self.kind(),
            "detail": self.detail(),
        }));

        (status, body).into_response()
    }
}
