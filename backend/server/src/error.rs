use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use records::Envelope;
use thiserror::Error;
use tracing::error;

use crate::database::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Certificate Number is required")]
    MissingCertificateNo,

    #[error("Database empty")]
    EmptyStore,

    #[error("Certificate not found")]
    NotFound,

    #[error("Invalid action")]
    InvalidAction,

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unexpected fault: {0}")]
    Unexpected(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MissingCertificateNo
            | AppError::InvalidAction
            | AppError::MalformedQuery { .. }
            | AppError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            AppError::EmptyStore | AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Store { .. } | AppError::Unexpected { .. } => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(Envelope::<()>::error(self.to_string()))).into_response()
    }
}
