//! Sync engine driving the Google Sheets client against a mocked API.

use std::sync::Arc;

use dotpoint_core::engine::{NoopReporter, SyncEngine, SyncJob};
use dotpoint_core::report::SyncMode;
use dotpoint_sheets::{GoogleSheetsClient, StaticTokenSource};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> Arc<GoogleSheetsClient> {
    Arc::new(
        GoogleSheetsClient::new(
            "doc-1",
            Arc::new(StaticTokenSource::new("token")),
            Some(server.uri()),
        )
        .unwrap(),
    )
}

async fn mount_tabs(server: &MockServer, titles: &[&str]) {
    let sheets: Vec<_> = titles
        .iter()
        .map(|t| serde_json::json!({"properties": {"title": t}}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sheets": sheets
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn overwrite_creates_missing_tab_and_writes_header() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("heredity.csv");
    std::fs::write(&csv, "question,answer\n\"Define allele, briefly\",variant\n").unwrap();

    let server = MockServer::start().await;
    mount_tabs(&server, &["Acids"]).await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/doc-1:batchUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/doc-1/values/'heredity'!A1:B2"))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_json(serde_json::json!({
            "range": "'heredity'!A1:B2",
            "majorDimension": "ROWS",
            "values": [["question", "answer"], ["Define allele, briefly", "variant"]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "updatedRange": "heredity!A1:B2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = SyncEngine::new(client(&server), SyncMode::Overwrite);
    let report = engine.run(&[SyncJob::for_path(&csv)], &NoopReporter).await;

    assert_eq!(report.backend, "google-sheets");
    assert_eq!(report.succeeded(), 1);
    assert!(report.files[0].tab_created);
    assert_eq!(report.files[0].range.as_deref(), Some("heredity!A1:B2"));
}

#[tokio::test]
async fn append_writes_below_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("acids.csv");
    std::fs::write(&csv, "question,answer\nQ3,A3\n").unwrap();

    let server = MockServer::start().await;
    mount_tabs(&server, &["Acids"]).await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/'Acids'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [["question", "answer"], ["Q1", "A1"], ["Q2", "A2"]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/doc-1/values/'Acids'!A4:B4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "updatedRange": "Acids!A4:B4"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = SyncEngine::new(client(&server), SyncMode::Append);
    let report = engine
        .run(&[SyncJob::new(&csv, "Acids")], &NoopReporter)
        .await;

    assert_eq!(report.succeeded(), 1);
    assert!(!report.files[0].tab_created);
    assert_eq!(report.files[0].rows_written, 1);
}

#[tokio::test]
async fn api_failure_is_reported_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("waves.csv");
    std::fs::write(&csv, "question\nQ1\n").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Requested entity was not found."))
        .mount(&server)
        .await;

    let engine = SyncEngine::new(client(&server), SyncMode::Overwrite);
    let report = engine.run(&[SyncJob::for_path(&csv)], &NoopReporter).await;

    assert_eq!(report.failed(), 1);
    let error = report.files[0].error.as_deref().unwrap();
    assert!(error.contains("not found"), "unexpected error: {error}");
}
