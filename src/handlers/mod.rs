//! HTTP handlers for entity CRUD, the dashboard and login.

pub mod auth;
pub mod dashboard;
pub mod entity;
