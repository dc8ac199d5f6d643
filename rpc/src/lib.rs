//! HTTP API for the praman issuance core.
//!
//! Provides endpoints for:
//! - Issuance flows (challenge out, code in, commit)
//! - Registry lookups and searches
//! - Invoice and compliance filing
//! - Consumer credentialing and the signed evaluation endpoint
//! - Health and Prometheus metrics

pub mod error;
pub mod evaluate;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::RpcError;
pub use server::{build_router, AppState, CoreStore, RpcServer};
