//! Certificate directory service.
//!
//! Public lookup of issued certificates by number, plus the admin operations to
//! list, add and delete them. Backed by one flat table (see [`database`]).
//!
//!
//!
//! # Endpoint
//!
//! Everything goes through `/`, the `action` query parameter picks the operation.
//!
//! | Action | Method | Params | Data |
//! |---|---|---|---|
//! | `search` | GET | `certificateNo` | one certificate |
//! | `getAll` | GET | | all certificates, maybe none |
//! | `add` | POST | JSON certificate body | |
//! | `delete` | POST | `certificateNo` (query or body) | |
//!
//! A POST without `action` is an add. Anything else is `Invalid action`.
//!
//! Every answer, including failures and panics, is an envelope:
//! ```json
//! { "status": "success" | "error", "data": ..., "message": "..." }
//! ```
//!
//!
//!
//! # Environment
//!
//! - `RUST_PORT`: listen port, default `8080`
//! - `STORE_BACKEND`: `redis` or `memory`
//! - `REDIS_URL`, `TABLE_KEY`: where the table lives
//! - `LOCK_WAIT_MS`: directory lock wait, default 10 seconds
//! - `/run/secrets/REDIS_PASSWORD`: optional
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! docker run -p 6379:6379 redis
//! RUST_LOG=info cargo run -p certify
//! ```
//!
//! Run without Redis.
//! ```sh
//! STORE_BACKEND=memory RUST_LOG=info cargo run -p certify
//! ```
//!
//! Per-request logging.
//! ```sh
//! cargo run -p certify --features verbose
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod directory;
pub mod error;
pub mod routes;
pub mod state;

use routes::{command_handler, handle_panic, health_handler, query_handler};
use state::AppState;

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting server...");
    let app = app(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(query_handler).post(command_handler))
        .route("/health", get(health_handler))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use records::{Certificate, Envelope, Row, Status};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, database::MemoryStore};

    fn jane() -> Row {
        ["CIT-01", "Jane Doe", "John Doe", "6 Months", "2024-01-15", "Completed"]
            .iter()
            .map(|cell| cell.to_string())
            .collect()
    }

    fn router(store: MemoryStore) -> Router {
        let config = Config {
            lock_wait: Duration::from_millis(200),
            ..Config::default()
        };

        app(AppState::with_store(config, Arc::new(store)))
    }

    async fn call<T: DeserializeOwned>(
        app: &Router,
        request: Request<Body>,
    ) -> (StatusCode, Envelope<T>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri).body(Body::from(body.to_string())).unwrap()
    }

    const CIT_02: &str = r#"{"certificateNo":"CIT-02","studentName":"Sara Khan","fatherName":"Imran Khan","duration":"3 Months","completionDate":"2024-06-01","status":"In Progress"}"#;

    #[tokio::test]
    async fn test_search_scenario() {
        let app = router(MemoryStore::with_rows(vec![jane()]));

        let (status, envelope) =
            call::<Certificate>(&app, get("/?action=search&certificateNo=cit-01")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Success);

        let certificate = envelope.data.unwrap();
        assert_eq!(certificate.certificate_no, "CIT-01");
        assert_eq!(certificate.father_name, "John Doe");

        let (status, envelope) =
            call::<Certificate>(&app, get("/?action=search&certificateNo=CIT-99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.message.as_deref(), Some("Certificate not found"));
    }

    #[tokio::test]
    async fn test_search_missing_id() {
        let app = router(MemoryStore::with_rows(vec![jane()]));

        for uri in ["/?action=search", "/?action=search&certificateNo="] {
            let (status, envelope) = call::<Certificate>(&app, get(uri)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                envelope.message.as_deref(),
                Some("Certificate Number is required")
            );
        }
    }

    #[tokio::test]
    async fn test_empty_store() {
        let app = router(MemoryStore::new());

        let (status, envelope) = call::<Vec<Certificate>>(&app, get("/?action=getAll")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.data, Some(Vec::new()));

        let (_, envelope) =
            call::<Certificate>(&app, get("/?action=search&certificateNo=CIT-01")).await;
        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.message.as_deref(), Some("Database empty"));
    }

    #[tokio::test]
    async fn test_add_then_get_all() {
        let app = router(MemoryStore::with_rows(vec![jane()]));

        let (status, envelope) = call::<()>(&app, post("/?action=add", CIT_02)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.message.as_deref(), Some("Certificate added"));

        let (_, envelope) = call::<Vec<Certificate>>(&app, get("/?action=getAll")).await;
        let all = envelope.data.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[1], serde_json::from_str::<Certificate>(CIT_02).unwrap());
    }

    #[tokio::test]
    async fn test_post_without_action_adds() {
        let app = router(MemoryStore::new());

        let (status, _) = call::<()>(&app, post("/", CIT_02)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, envelope) =
            call::<Certificate>(&app, get("/?action=search&certificateNo=cit-02")).await;
        assert_eq!(envelope.data.unwrap().student_name, "Sara Khan");
    }

    #[tokio::test]
    async fn test_add_rejects_incomplete_body() {
        let app = router(MemoryStore::new());

        for body in [r#"{"certificateNo":"CIT-03"}"#, "not json", ""] {
            let (status, envelope) = call::<()>(&app, post("/?action=add", body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(envelope.status, Status::Error);
            assert!(envelope.message.unwrap().starts_with("Malformed payload"));
        }

        let (_, envelope) = call::<Vec<Certificate>>(&app, get("/?action=getAll")).await;
        assert!(envelope.data.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let app = router(MemoryStore::with_rows(vec![jane()]));

        let (status, envelope) =
            call::<()>(&app, post("/?action=delete&certificateNo=cit-01", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(envelope.message.as_deref(), Some("Certificate deleted"));

        let (status, envelope) = call::<()>(
            &app,
            post("/?action=delete", r#"{"certificateNo":"CIT-01"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(envelope.message.as_deref(), Some("Certificate not found"));
    }

    #[tokio::test]
    async fn test_invalid_action() {
        let app = router(MemoryStore::with_rows(vec![jane()]));

        for request in [
            get("/"),
            get("/?action=drop"),
            get("/?action=add"),
            post("/?action=getAll", ""),
        ] {
            let (status, envelope) = call::<()>(&app, request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(envelope.message.as_deref(), Some("Invalid action"));
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(MemoryStore::new());

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_panic_envelope() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
