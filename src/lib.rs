//! Orderdesk: back-office service for a made-to-order goods business.
//!
//! One store interface over an embedded sqlite file or a postgres server, idempotent schema
//! provisioning, entity CRUD, a dashboard aggregation, and a shared-secret login.

pub mod case;
pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{from_env, AppConfig, BackendConfig};
pub use error::{AppError, ConfigError};
pub use migration::{provision, SchemaStatus};
pub use routes::{api_routes, app, common_routes, ApiDoc};
pub use service::{AggregationEngine, CrudService};
pub use state::AppState;
pub use store::{ExecResult, Row, StoreAdapter};
