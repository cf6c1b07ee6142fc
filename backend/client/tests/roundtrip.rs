use std::{sync::Arc, time::Duration};

use client::DirectoryClient;
use records::{Certificate, Row};
use server::{app, config::Config, database::MemoryStore, state::AppState};
use tokio::net::TcpListener;

fn jane() -> Row {
    ["CIT-01", "Jane Doe", "John Doe", "6 Months", "2024-01-15", "Completed"]
        .iter()
        .map(|cell| cell.to_string())
        .collect()
}

fn sara() -> Certificate {
    Certificate {
        certificate_no: "CIT-02".to_string(),
        student_name: "Sara Khan".to_string(),
        father_name: "Imran Khan".to_string(),
        duration: "3 Months".to_string(),
        completion_date: "2024-06-01".to_string(),
        status: "In Progress".to_string(),
    }
}

async fn serve(store: MemoryStore) -> DirectoryClient {
    let config = Config {
        lock_wait: Duration::from_secs(1),
        ..Config::default()
    };
    let router = app(AppState::with_store(config, Arc::new(store)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    DirectoryClient::with_timeout(
        Some(&format!("http://{address}/")),
        Some(Duration::from_secs(5)),
    )
}

#[tokio::test]
async fn test_lookup_scenario() {
    let client = serve(MemoryStore::with_rows(vec![jane()])).await;

    let found = client.fetch_certificate("cit-01").await.unwrap();
    assert_eq!(found.certificate_no, "CIT-01");
    assert_eq!(found.student_name, "Jane Doe");

    assert_eq!(client.fetch_certificate("CIT-99").await, None);
    assert_eq!(client.fetch_all_certificates().await.len(), 1);
}

#[tokio::test]
async fn test_add_then_reload() {
    let client = serve(MemoryStore::with_rows(vec![jane()])).await;

    let outcome = client.add_certificate(&sara()).await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Added successfully");

    let all = client.fetch_all_certificates().await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[1], sara());

    assert_eq!(client.fetch_certificate("cit-02").await, Some(sara()));
}

#[tokio::test]
async fn test_delete() {
    let client = serve(MemoryStore::with_rows(vec![jane()])).await;

    let outcome = client.delete_certificate("Cit-01").await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Deleted successfully");

    let outcome = client.delete_certificate("CIT-01").await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Certificate not found");

    assert!(client.fetch_all_certificates().await.is_empty());
}

#[tokio::test]
async fn test_empty_directory() {
    let client = serve(MemoryStore::new()).await;

    assert!(client.fetch_all_certificates().await.is_empty());
    assert_eq!(client.fetch_certificate("CIT-01").await, None);
}

#[tokio::test]
async fn test_add_without_id_is_rejected() {
    let client = serve(MemoryStore::new()).await;

    let mut nameless = sara();
    nameless.certificate_no = String::new();

    let outcome = client.add_certificate(&nameless).await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Certificate Number is required");
}
