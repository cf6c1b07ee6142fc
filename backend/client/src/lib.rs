//! # Directory Client
//!
//! Async wrapper around the certificate directory endpoint.
//!
//! ## Contract
//! - Never returns an error to the caller
//! - Lookups degrade to `None` / empty, commands to a failed [`Outcome`]
//! - No endpoint configured is logged and treated like any other failure
//! - One request per call, no caching, no retries
//!
//! ## Configuration
//! - `CERTIFY_API_URL`: directory endpoint, e.g. `https://certs.example.org/`
//! - `CERTIFY_TIMEOUT_SECS`: optional per-request timeout
use std::{env, time::Duration};

use records::{Action, Certificate, Envelope, Status};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;
use tracing::{debug, error, warn};

pub mod models;
pub mod utils;

pub use models::Outcome;

pub const API_URL_VAR: &str = "CERTIFY_API_URL";
pub const TIMEOUT_VAR: &str = "CERTIFY_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("API Configuration Missing")]
    Configuration,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Rejected(String),
}

#[derive(Clone, Debug)]
pub struct DirectoryClient {
    http: Client,
    endpoint: Option<Url>,
}

impl DirectoryClient {
    pub fn new(endpoint: Option<&str>) -> Self {
        Self::with_timeout(endpoint, None)
    }

    pub fn with_timeout(endpoint: Option<&str>, timeout: Option<Duration>) -> Self {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| {
                Url::parse(raw)
                    .map_err(|e| error!("Invalid API URL {raw}: {e}"))
                    .ok()
            });

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().unwrap_or_else(|e| {
            warn!("Failed to build HTTP client, using defaults: {e}");
            Client::new()
        });

        Self { http, endpoint }
    }

    pub fn from_env() -> Self {
        Self::from_env_with(None, None)
    }

    /// Explicit values win, `CERTIFY_API_URL` and `CERTIFY_TIMEOUT_SECS` fill the gaps.
    pub fn from_env_with(endpoint: Option<&str>, timeout: Option<Duration>) -> Self {
        let endpoint = endpoint
            .map(str::to_string)
            .or_else(|| env::var(API_URL_VAR).ok());

        let timeout = timeout.or_else(|| {
            env::var(TIMEOUT_VAR)
                .ok()
                .and_then(|raw| {
                    raw.parse()
                        .map_err(|e| warn!("Invalid {TIMEOUT_VAR} value {raw}: {e}"))
                        .ok()
                })
                .map(Duration::from_secs)
        });

        Self::with_timeout(endpoint.as_deref(), timeout)
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    pub async fn fetch_certificate(&self, certificate_no: &str) -> Option<Certificate> {
        let request = self.request(
            Method::GET,
            &[
                ("action", Action::Search.as_str()),
                ("certificateNo", certificate_no),
            ],
        );

        match Self::send::<Certificate>(request).await {
            Ok(certificate) => certificate,
            Err(ClientError::Configuration) => {
                error!("API URL is not defined, set {API_URL_VAR}");
                None
            }
            Err(ClientError::Rejected(message)) => {
                debug!("Lookup of {certificate_no} rejected: {message}");
                None
            }
            Err(e) => {
                error!("Failed to fetch certificate: {e}");
                None
            }
        }
    }

    pub async fn fetch_all_certificates(&self) -> Vec<Certificate> {
        let request = self.request(Method::GET, &[("action", Action::GetAll.as_str())]);

        match Self::send::<Vec<Certificate>>(request).await {
            Ok(certificates) => certificates.unwrap_or_default(),
            Err(ClientError::Configuration) => {
                error!("API URL is not defined, set {API_URL_VAR}");
                Vec::new()
            }
            Err(e) => {
                error!("Failed to fetch all certificates: {e}");
                Vec::new()
            }
        }
    }

    pub async fn add_certificate(&self, certificate: &Certificate) -> Outcome {
        let request = self
            .request(Method::POST, &[("action", Action::Add.as_str())])
            .map(|request| request.json(certificate));

        match Self::send::<IgnoredAny>(request).await {
            Ok(_) => Outcome::success("Added successfully"),
            Err(e) => {
                warn!("Error adding certificate {}: {e}", certificate.certificate_no);
                Outcome::failure(e.to_string())
            }
        }
    }

    pub async fn delete_certificate(&self, certificate_no: &str) -> Outcome {
        let request = self.request(
            Method::POST,
            &[
                ("action", Action::Delete.as_str()),
                ("certificateNo", certificate_no),
            ],
        );

        match Self::send::<IgnoredAny>(request).await {
            Ok(_) => Outcome::success("Deleted successfully"),
            Err(e) => {
                warn!("Error deleting certificate {certificate_no}: {e}");
                Outcome::failure(e.to_string())
            }
        }
    }

    fn request(&self, method: Method, query: &[(&str, &str)]) -> Result<RequestBuilder, ClientError> {
        let endpoint = self.endpoint.clone().ok_or(ClientError::Configuration)?;

        Ok(self.http.request(method, endpoint).query(query))
    }

    async fn send<T: DeserializeOwned>(
        request: Result<RequestBuilder, ClientError>,
    ) -> Result<Option<T>, ClientError> {
        let envelope: Envelope<T> = request?.send().await?.json().await?;

        match envelope.status {
            Status::Success => Ok(envelope.data),
            Status::Error => Err(ClientError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }
}
