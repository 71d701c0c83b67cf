use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::fiscal::FiscalDataError;
use crate::ports::{CacheError, StoreError};
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Exchange rate provider error: {0}")]
    Upstream(String),

    #[error("No {currency} exchange rate within 6 months before {date}")]
    RateUnavailable { currency: String, date: NaiveDate },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Input(_) | AppError::Validation(_) | AppError::InvalidId(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Store(_) | AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::RateUnavailable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidId(id) => AppError::InvalidId(id),
            StoreError::Backend(msg) => AppError::Store(msg),
        }
    }
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        AppError::Cache(err.0)
    }
}

impl From<FiscalDataError> for AppError {
    fn from(err: FiscalDataError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
