//! Batch synchronizer against the SQLite state and failure stores

use std::sync::Arc;

use catalog_sync_core::application::{BatchSynchronizer, FailureThresholdTracker, SyncStateTracker};
use catalog_sync_core::domain::{ErrorCode, Product, ProductId, ProductRef, SyncKind, SyncStatus};
use catalog_sync_core::port::remote_client::mocks::MockRemoteClient;
use catalog_sync_core::port::sync_listener::mocks::RecordingListener;
use catalog_sync_core::port::time_provider::mocks::ManualTimeProvider;
use catalog_sync_core::port::StaticIntegrationStatus;
use catalog_sync_core::{AppError, SyncConfig};
use catalog_sync_infra_sqlite::{
    create_pool, run_migrations, SqliteFailureRepository, SqliteSyncStateRepository,
};

const START: i64 = 1_700_000_000_000;

struct Engine {
    client: Arc<MockRemoteClient>,
    time: Arc<ManualTimeProvider>,
    states: Arc<SyncStateTracker>,
    failures: Arc<FailureThresholdTracker>,
    listener: Arc<RecordingListener>,
    sync: BatchSynchronizer,
}

async fn engine(max_batch_size: usize) -> Engine {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let config = SyncConfig::default();
    let client = Arc::new(MockRemoteClient::new(max_batch_size));
    let time = Arc::new(ManualTimeProvider::new(START));
    let states = Arc::new(SyncStateTracker::new(
        Arc::new(SqliteSyncStateRepository::new(pool.clone())),
        time.clone(),
    ));
    let failures = Arc::new(FailureThresholdTracker::from_config(
        Arc::new(SqliteFailureRepository::new(pool)),
        time.clone(),
        &config,
    ));
    let listener = Arc::new(RecordingListener::new());
    let sync = BatchSynchronizer::new(
        client.clone(),
        states.clone(),
        failures.clone(),
        Arc::new(StaticIntegrationStatus::connected()),
        &config,
    )
    .with_listener(listener.clone());

    Engine {
        client,
        time,
        states,
        failures,
        listener,
        sync,
    }
}

fn products(ids: impl IntoIterator<Item = ProductId>) -> Vec<Product> {
    ids.into_iter()
        .map(|id| Product::simple(id, format!("Product {}", id)))
        .collect()
}

async fn status_of(engine: &Engine, id: ProductId) -> Option<SyncStatus> {
    engine.states.state(id).await.unwrap().map(|state| state.status)
}

#[tokio::test]
async fn test_update_then_delete_round_trip() {
    let e = engine(5).await;
    let all = products(1..=12);

    let outcome = e.sync.update(&all).await.unwrap();
    assert_eq!(outcome.succeeded.len(), 12);
    assert_eq!(e.client.chunk_sizes(), vec![5, 5, 2]);
    assert_eq!(e.states.count_by_status(SyncStatus::Synced).await.unwrap(), 12);

    let synced = e.states.state(7).await.unwrap().unwrap();
    assert_eq!(synced.remote_id.as_deref(), Some("remote-7"));
    assert_eq!(synced.synced_version.as_deref(), Some("v1"));

    let refs: Vec<ProductRef> = all.iter().map(|p| p.reference.clone()).collect();
    let outcome = e.sync.delete(&refs).await.unwrap();

    assert_eq!(outcome.succeeded.len(), 12);
    assert_eq!(e.client.chunk_sizes(), vec![5, 5, 2, 5, 5, 2]);
    assert_eq!(e.states.count_by_status(SyncStatus::Synced).await.unwrap(), 0);
    assert_eq!(e.states.count_by_status(SyncStatus::Unsynced).await.unwrap(), 12);
    assert_eq!(e.listener.completions().len(), 2);
}

#[tokio::test]
async fn test_invalid_product_is_persisted_without_remote_call() {
    let e = engine(10).await;
    let mut all = products(1..=3);
    all[1].title.clear();

    let outcome = e.sync.update(&all).await.unwrap();

    assert_eq!(e.client.submitted_ids(), vec![1, 3]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].code, ErrorCode::InvalidPayload);

    let state = e.states.state(2).await.unwrap().unwrap();
    assert_eq!(state.status, SyncStatus::Invalid);
    assert_eq!(
        state.last_error.as_deref(),
        Some("[invalid_payload] missing required attributes: title")
    );
    assert!(e.listener.retries().is_empty());
}

#[tokio::test]
async fn test_transport_error_keeps_completed_chunks() {
    let e = engine(5).await;
    e.client.fail_call(2);

    let err = e.sync.update(&products(1..=7)).await.unwrap_err();

    assert!(matches!(err, AppError::RemoteCallFailed { chunk: 2, .. }));
    for id in 1..=5 {
        assert_eq!(status_of(&e, id).await, Some(SyncStatus::Synced));
    }
    assert_eq!(status_of(&e, 6).await, None);
    assert_eq!(status_of(&e, 7).await, None);
    assert!(e.listener.completions().is_empty());
}

#[tokio::test]
async fn test_retries_stop_at_threshold_and_resume_after_window() {
    let e = engine(10).await;
    let item = products([55]);
    e.client
        .fail_item(55, ErrorCode::InternalError, "backend unavailable");

    for _ in 0..5 {
        e.sync.update(&item).await.unwrap();
        e.time.advance(1_000);
    }
    assert_eq!(e.listener.retries().len(), 5);
    assert_eq!(e.listener.retries()[0], (SyncKind::Update, vec![55]));

    // Sixth in-window failure is recorded but not retried
    e.sync.update(&item).await.unwrap();
    assert_eq!(e.listener.retries().len(), 5);

    let window = e.failures.window(&item[0].reference).await.unwrap();
    assert_eq!(window.attempts, 6);
    assert_eq!(window.first_failure_at, Some(START));
    assert_eq!(status_of(&e, 55).await, Some(SyncStatus::Invalid));

    // Past the window every earlier failure has rolled over
    e.time.advance(SyncConfig::default().failure_window_ms() + 1);
    e.sync.update(&item).await.unwrap();

    assert_eq!(e.listener.retries().len(), 6);
    assert_eq!(e.failures.window(&item[0].reference).await.unwrap().attempts, 1);
}

#[tokio::test]
async fn test_manual_reset_clears_failures() {
    let e = engine(10).await;
    let item = products([8]);
    e.client.fail_item(8, ErrorCode::InternalError, "try later");
    for _ in 0..6 {
        e.sync.update(&item).await.unwrap();
    }
    assert!(e.failures.is_suppressed(&item[0].reference).await.unwrap());

    assert_eq!(e.failures.reset(&item[0].reference).await.unwrap(), 6);
    e.states.mark_as_unsynced(&item[0].reference).await.unwrap();

    assert!(!e.failures.is_suppressed(&item[0].reference).await.unwrap());
    assert_eq!(status_of(&e, 8).await, Some(SyncStatus::Unsynced));

    e.client.clear_item_errors();
    e.sync.update(&item).await.unwrap();
    assert_eq!(status_of(&e, 8).await, Some(SyncStatus::Synced));
}
