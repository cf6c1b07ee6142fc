//! # Directory
//!
//! Certificate operations over the shared [`TableStore`].
//!
//! ## Operations
//! - **search**: first row (store order) whose certificate number matches, ignoring case
//! - **get_all**: every data row, store order, empty when only the header exists
//! - **add**: appends the six cells in column order
//! - **delete**: removes the first row matched the same way as search
//!
//! ## Lock
//! - One process-wide mutex in front of the store, taken by all four operations
//! - Waits at most `lock_wait`, then carries on without it and logs a warning
//! - Guard is scoped to the operation so every return path releases it
use std::{sync::Arc, time::Duration};

use records::{Certificate, ids_match};
use tokio::{
    sync::{Mutex, MutexGuard},
    time::timeout,
};
use tracing::warn;

use crate::{database::TableStore, error::AppError};

pub struct Directory {
    store: Arc<dyn TableStore>,
    lock: Mutex<()>,
    lock_wait: Duration,
}

impl Directory {
    pub fn new(store: Arc<dyn TableStore>, lock_wait: Duration) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            lock_wait,
        }
    }

    /// `None` when the wait ran out; the caller proceeds unprotected.
    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match timeout(self.lock_wait, self.lock.lock()).await {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!(
                    "Directory lock not acquired within {:?}, proceeding without it",
                    self.lock_wait
                );
                None
            }
        }
    }

    pub async fn search(&self, certificate_no: Option<&str>) -> Result<Certificate, AppError> {
        let certificate_no = required(certificate_no)?;

        let _guard = self.acquire().await;
        let rows = self.store.read_all().await?;

        if rows.len() <= 1 {
            return Err(AppError::EmptyStore);
        }

        rows.iter()
            .skip(1)
            .map(|row| Certificate::from_row(row))
            .find(|certificate| certificate.matches(certificate_no))
            .ok_or(AppError::NotFound)
    }

    pub async fn get_all(&self) -> Result<Vec<Certificate>, AppError> {
        let _guard = self.acquire().await;
        let rows = self.store.read_all().await?;

        Ok(rows
            .iter()
            .skip(1)
            .map(|row| Certificate::from_row(row))
            .collect())
    }

    pub async fn add(&self, certificate: Certificate) -> Result<(), AppError> {
        if certificate.certificate_no.is_empty() {
            return Err(AppError::MissingCertificateNo);
        }

        let _guard = self.acquire().await;
        self.store.append(certificate.to_row()).await?;

        Ok(())
    }

    pub async fn delete(&self, certificate_no: Option<&str>) -> Result<(), AppError> {
        let certificate_no = required(certificate_no)?;

        let _guard = self.acquire().await;
        let removed = self
            .store
            .remove_matching(&|row: &[String]| {
                row.first()
                    .is_some_and(|cell| ids_match(cell, certificate_no))
            })
            .await?;

        if removed {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}

fn required(certificate_no: Option<&str>) -> Result<&str, AppError> {
    certificate_no
        .filter(|id| !id.is_empty())
        .ok_or(AppError::MissingCertificateNo)
}
