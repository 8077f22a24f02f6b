//! Caller-facing HTTP surface: document upload + job polling.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{ingest_router, serve, ApiContext};
