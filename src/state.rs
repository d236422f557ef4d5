//! Shared application state for all routes. Built once at startup and injected.

use crate::migration::SchemaStatus;
use crate::service::AggregationEngine;
use crate::store::StoreAdapter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreAdapter,
    pub dashboard: AggregationEngine,
    /// Result of boot-time provisioning; fixed for the process lifetime.
    pub schema: Arc<SchemaStatus>,
    pub admin_password: Arc<str>,
}

impl AppState {
    pub fn new(store: StoreAdapter, schema: SchemaStatus, admin_password: &str) -> Self {
        AppState {
            dashboard: AggregationEngine::new(store.clone()),
            store,
            schema: Arc::new(schema),
            admin_password: Arc::from(admin_password),
        }
    }
}
