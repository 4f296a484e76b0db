//! HTTP server for the record store.
//!
//! Exposes Get, Put, Delete, History, and List under
//! `/{operation}/{collection}[/{key}]`, every one of them behind bearer-token
//! authentication, plus unauthenticated health and metrics endpoints.

mod config;
mod error;
pub mod handlers;
mod http;
pub mod metrics;
mod middleware;
pub mod router;

pub use config::{CliArgs, RecordServerConfig};
pub use error::ApiError;
pub use http::{RecordServer, build_router};
