use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::notice::NoticeError;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("rate limit exceeded, retry later")]
    RateLimited,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<NoticeError> for AppError {
    fn from(e: NoticeError) -> Self {
        match e {
            NoticeError::Validation(m) => AppError::Validation(m),
            NoticeError::NotFound(_) => AppError::NotFound(e.to_string()),
        }
    }
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let request_id = Uuid::new_v4();
        if let AppError::Internal(e) = &self {
            tracing::error!(%request_id, error = ?e, "request failed");
        }
        let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        let body = json!({
            "error": kind,
            "message": self.to_string(),
            "request_id": request_id,
            "timestamp": timestamp,
        });
        let mut res = (status, Json(body)).into_response();
        if let Ok(v) = HeaderValue::from_str(&request_id.to_string()) {
            res.headers_mut().insert("x-request-id", v);
        }
        res
    }
}
