#![allow(dead_code)]

use orderdesk::migration::{provision, SchemaStatus};
use orderdesk::store::SqliteBackend;
use orderdesk::StoreAdapter;
use std::sync::Arc;
use tempfile::TempDir;

/// Fresh provisioned embedded store. Keep the TempDir alive for the test's duration.
pub async fn embedded_store() -> (TempDir, StoreAdapter) {
    let dir = tempfile::tempdir().expect("tempdir");
    let backend = SqliteBackend::open(dir.path()).await.expect("open sqlite");
    let store = StoreAdapter::new(Arc::new(backend));
    assert_eq!(provision(&store).await, SchemaStatus::Ready);
    (dir, store)
}
