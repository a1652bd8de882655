use axum::{ http::StatusCode, response::{ IntoResponse, Response }, Json };
use log::error;
use thiserror::Error;

use crate::history::HistoryError;
use crate::llm::UpstreamError;
use crate::models::api::ErrorResponse;

pub const NOT_CONFIGURED_DETAIL: &str =
    "Gemini API key not configured. Please set GEMINI_API_KEY.";
pub const BAD_GATEWAY_DETAIL: &str = "Bad Gateway";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", NOT_CONFIGURED_DETAIL)]
    NotConfigured,
    #[error("upstream call failed: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("history store failed: {0}")]
    History(#[from] HistoryError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) | ApiError::History(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ApiError::NotConfigured => NOT_CONFIGURED_DETAIL.to_string(),
            // Upstream detail stays in the log.
            other => {
                error!("Error in /chat: {}", other);
                BAD_GATEWAY_DETAIL.to_string()
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::NotConfigured.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let upstream = ApiError::from(UpstreamError::Status { status: 429, body: "quota".into() });
        assert_eq!(upstream.status_code(), StatusCode::BAD_GATEWAY);
        let history = ApiError::from(HistoryError::Backend("down".into()));
        assert_eq!(history.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
