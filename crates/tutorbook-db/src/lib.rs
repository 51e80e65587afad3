//! Tutorbook database — SurrealDB connection management, schema
//! migrations and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbSettings`], [`connect`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - Implementations of the `tutorbook-core` repository traits

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbSettings, connect};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
