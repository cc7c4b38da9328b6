use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use shared_types::ApiResponse;

/// Failure of a request, rendered as the uniform `{success: false, ...}`
/// envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<shared_types::StatusError> for ApiError {
    fn from(err: shared_types::StatusError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<shared_types::FlagChainError> for ApiError {
    fn from(err: shared_types::FlagChainError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<shared_types::DateRangeError> for ApiError {
    fn from(err: shared_types::DateRangeError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<shared_types::TabError> for ApiError {
    fn from(err: shared_types::TabError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body: ApiResponse<()> = match self {
            ApiError::Unauthorized => ApiResponse::session_expired(self.to_string()),
            ApiError::Database(msg) => {
                tracing::error!("Database failure: {}", msg);
                ApiResponse::failure("Something went wrong, please try again")
            }
            _ => ApiResponse::failure(self.to_string()),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Routes body/query deserialization failures into the envelope as 400s.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    ApiError::Validation(format!("Invalid request body: {}", err)).into()
}

pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    ApiError::Validation(format!("Invalid query parameters: {}", err)).into()
}
