use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use snafu::Snafu;

use crate::service::query::QueryError;
use crate::service::recorder::ProcessingError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(transparent)]
    Query { source: QueryError },

    #[snafu(transparent)]
    Processing { source: ProcessingError },

    #[snafu(display("`{content}` is not a known content type"))]
    UnknownContent { content: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Query { source } => match source {
                QueryError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                QueryError::MissingParameter { .. } | QueryError::UnknownContent { .. } => {
                    StatusCode::BAD_REQUEST
                }
                QueryError::NotFound { .. } => StatusCode::NOT_FOUND,
                QueryError::Lookup { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Processing { .. } | ApiError::UnknownContent { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Query { source } => match source {
                QueryError::RateLimited => "rate_limited",
                QueryError::MissingParameter { .. } => "missing_parameter",
                QueryError::UnknownContent { .. } => "unknown_content",
                QueryError::NotFound { .. } => "not_found",
                QueryError::Lookup { .. } => "internal",
            },
            ApiError::Processing { .. } => "processing",
            ApiError::UnknownContent { .. } => "unknown_content",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "something went wrong, please try again later".to_owned()
        } else {
            tracing::debug!(error = %self, %status, "rejected request");
            self.to_string()
        };

        let content = ErrorResponse {
            error: self.kind(),
            message,
        };

        (status, Json(content)).into_response()
    }
}
