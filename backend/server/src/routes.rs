use std::{any::Any, sync::Arc};

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use records::{Action, Certificate, Envelope};
use serde::{Deserialize, Serialize};
#[cfg(feature = "verbose")]
use tracing::info;

use crate::{error::AppError, state::AppState};

#[derive(Deserialize, Debug, Default)]
pub struct ActionParams {
    action: Option<String>,

    #[serde(rename = "certificateNo")]
    certificate_no: Option<String>,
}

#[derive(Deserialize)]
struct DeleteBody {
    #[serde(rename = "certificateNo")]
    certificate_no: Option<String>,
}

/// GET dispatch: `search` and `getAll`.
pub async fn query_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ActionParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| AppError::MalformedQuery(e.body_text()))?;

    #[cfg(feature = "verbose")]
    info!("GET {:?}", params);

    match parse_action(params.action.as_deref())? {
        Action::Search => {
            let certificate = state
                .directory
                .search(params.certificate_no.as_deref())
                .await?;

            Ok(success(certificate))
        }
        Action::GetAll => Ok(success(state.directory.get_all().await?)),
        Action::Add | Action::Delete => Err(AppError::InvalidAction),
    }
}

/// POST dispatch: `add` (also when no action is given) and `delete`.
pub async fn command_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ActionParams>, QueryRejection>,
    body: Bytes,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| AppError::MalformedQuery(e.body_text()))?;

    #[cfg(feature = "verbose")]
    info!("POST {:?}, {} byte body", params, body.len());

    let action = match params.action.as_deref() {
        None => Action::Add,
        action => parse_action(action)?,
    };

    match action {
        Action::Add => {
            let certificate: Certificate = serde_json::from_slice(&body)?;
            state.directory.add(certificate).await?;

            Ok(confirmed("Certificate added"))
        }
        Action::Delete => {
            let certificate_no = match params.certificate_no {
                Some(certificate_no) => Some(certificate_no),
                None if body.is_empty() => None,
                None => serde_json::from_slice::<DeleteBody>(&body)?.certificate_no,
            };

            state.directory.delete(certificate_no.as_deref()).await?;

            Ok(confirmed("Certificate deleted"))
        }
        Action::Search | Action::GetAll => Err(AppError::InvalidAction),
    }
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Panics inside a handler still answer with the error envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };

    AppError::Unexpected(detail).into_response()
}

fn parse_action(action: Option<&str>) -> Result<Action, AppError> {
    action
        .and_then(|action| action.parse().ok())
        .ok_or(AppError::InvalidAction)
}

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope::success(data))).into_response()
}

fn confirmed(message: &str) -> Response {
    (StatusCode::OK, Json(Envelope::<()>::confirmed(message))).into_response()
}
