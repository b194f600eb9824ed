//! HTTP API for the storefront: routing and JSON mapping.

pub mod app;
pub mod config;
