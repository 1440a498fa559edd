// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::mock_repository::MockRecordRepository;
use super::helpers::mock_session::{
    clients_url, login_url, services_url, MockSession, MockSite, SessionObserver,
};
use super::helpers::{create_test_repository, create_test_settings};
use chrono::{Duration as ChronoDuration, Utc};
use client_crawler::application::use_cases::extraction_run::ExtractionRun;
use client_crawler::config::settings::Settings;
use client_crawler::domain::repositories::record_repository::{PurgeCounts, RecordRepository};
use client_crawler::domain::models::UNKNOWN_STATUS;
use client_crawler::domain::services::extraction_service::{ExtractionService, ExtractionState};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn two_client_site() -> MockSite {
    MockSite::new()
        .client("C001", "Ana Souza", Some("ana@example.com"), Some("555-0101"))
        .client("C002", "Bruno Lima", Some("bruno@example.com"), None)
        .service("C001", "2024-03-01", "Maintenance", Some("done"))
        .service("C002", "2024-03-02", "Inspection", None)
}

fn run_with<R>(
    site: MockSite,
    settings: &Settings,
    repo: Arc<R>,
) -> (
    ExtractionRun<MockSession, R>,
    SessionObserver,
)
where
    R: RecordRepository + 'static,
{
    let (session, observer) = MockSession::new(site);
    let extraction =
        ExtractionService::new(session, settings.web.clone(), settings.crawler.clone());
    let run = ExtractionRun::new(extraction, repo, settings.crawler.clone());
    (run, observer)
}

#[tokio::test]
async fn test_full_run_persists_clients_and_services() {
    let dir = TempDir::new().unwrap();
    let settings = create_test_settings(&dir.path().join("run.db"));
    let repo = Arc::new(create_test_repository(&settings).await);
    let started = Utc::now() - ChronoDuration::seconds(1);

    let (mut run, observer) = run_with(two_client_site(), &settings, repo.clone());
    let summary = run.execute().await;

    assert!(summary.logged_in);
    assert_eq!(summary.clients_extracted, 2);
    assert_eq!(summary.services_extracted, 2);
    assert_eq!(summary.clients_saved, Some(true));
    assert_eq!(summary.services_saved, Some(true));
    assert_eq!(summary.purged, Some(PurgeCounts::default()));
    assert_eq!(summary.total_clients, 2);
    assert_eq!(summary.total_services, 2);

    let clients = repo.find_clients_since(started).await.unwrap();
    let bruno = clients.iter().find(|c| c.client_id == "C002").unwrap();
    assert_eq!(bruno.phone, None);
    assert_eq!(bruno.email.as_deref(), Some("bruno@example.com"));

    let services = repo.find_services_since(started).await.unwrap();
    let inspection = services.iter().find(|s| s.client_id == "C002").unwrap();
    assert_eq!(inspection.status, UNKNOWN_STATUS);
    assert_eq!(inspection.description, "");

    assert_eq!(
        observer.visited(),
        vec![
            login_url(),
            clients_url(),
            services_url("C001"),
            services_url("C002"),
        ]
    );
    assert!(observer.is_closed());
    assert_eq!(run.extraction().state(), &ExtractionState::Done);
}

#[tokio::test]
async fn test_repeated_runs_append_snapshots() {
    let dir = TempDir::new().unwrap();
    let settings = create_test_settings(&dir.path().join("history.db"));
    let repo = Arc::new(create_test_repository(&settings).await);

    let (mut first, _) = run_with(two_client_site(), &settings, repo.clone());
    first.execute().await;
    let (mut second, _) = run_with(two_client_site(), &settings, repo.clone());
    let summary = second.execute().await;

    assert_eq!(summary.total_clients, 2);
    assert_eq!(summary.total_services, 4);
}

#[tokio::test]
async fn test_login_failure_skips_scraping_and_persistence() {
    let dir = TempDir::new().unwrap();
    let settings = create_test_settings(&dir.path().join("unused.db"));
    let repo = Arc::new(MockRecordRepository::new());

    let (mut run, observer) = run_with(two_client_site().reject_login(), &settings, repo.clone());
    let summary = run.execute().await;

    assert!(!summary.logged_in);
    assert_eq!(summary.clients_extracted, 0);
    assert!(repo.calls().is_empty());
    assert_eq!(observer.visited(), vec![login_url()]);
    assert!(observer.is_closed());
}

#[tokio::test]
async fn test_no_clients_stops_before_persistence() {
    let dir = TempDir::new().unwrap();
    let settings = create_test_settings(&dir.path().join("unused.db"));
    let repo = Arc::new(MockRecordRepository::new());

    let (mut run, observer) = run_with(MockSite::new(), &settings, repo.clone());
    let summary = run.execute().await;

    assert!(summary.logged_in);
    assert_eq!(summary.clients_extracted, 0);
    assert!(repo.calls().is_empty());
    assert!(observer.is_closed());
}

#[tokio::test]
async fn test_clients_without_services_skip_service_save() {
    let dir = TempDir::new().unwrap();
    let settings = create_test_settings(&dir.path().join("unused.db"));
    let repo = Arc::new(MockRecordRepository::new());
    let site = MockSite::new().client("C001", "Ana Souza", None, None);

    let (mut run, _) = run_with(site, &settings, repo.clone());
    let summary = run.execute().await;

    assert_eq!(summary.clients_saved, Some(true));
    assert_eq!(summary.services_saved, None);
    assert_eq!(
        repo.calls(),
        vec![
            "save_clients",
            "cleanup_old_data",
            "get_client_count",
            "get_service_count",
        ]
    );
    assert_eq!(summary.total_clients, 1);
    assert_eq!(summary.total_services, 0);
}

#[tokio::test]
async fn test_failed_saves_still_run_cleanup_and_counts() {
    let dir = TempDir::new().unwrap();
    let settings = create_test_settings(&dir.path().join("unused.db"));
    let repo = Arc::new(MockRecordRepository::failing());

    let (mut run, observer) = run_with(two_client_site(), &settings, repo.clone());
    let summary = run.execute().await;

    assert_eq!(summary.clients_extracted, 2);
    assert_eq!(summary.services_extracted, 2);
    assert_eq!(summary.clients_saved, Some(false));
    assert_eq!(summary.services_saved, Some(false));
    assert_eq!(summary.purged, Some(PurgeCounts::default()));
    assert_eq!(
        repo.calls(),
        vec![
            "save_clients",
            "save_services",
            "cleanup_old_data",
            "get_client_count",
            "get_service_count",
        ]
    );
    assert_eq!(summary.total_clients, 0);
    assert_eq!(summary.total_services, 0);
    assert!(observer.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_delay_between_clients_but_not_after_last() {
    let dir = TempDir::new().unwrap();
    let mut settings = create_test_settings(&dir.path().join("unused.db"));
    settings.crawler.delay_between_requests_ms = 1000;
    let repo = Arc::new(MockRecordRepository::new());
    let site = MockSite::new()
        .client("C001", "Ana", None, None)
        .client("C002", "Bruno", None, None)
        .client("C003", "Carla", None, None);

    let (mut run, _) = run_with(site, &settings, repo);
    let started = tokio::time::Instant::now();
    let summary = run.execute().await;

    assert_eq!(summary.clients_extracted, 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_secs(3));
}
