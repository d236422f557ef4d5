//! CrudService for the entity endpoints and the dashboard AggregationEngine.

mod crud;
pub mod dashboard;
pub use crud::CrudService;
pub use dashboard::AggregationEngine;
