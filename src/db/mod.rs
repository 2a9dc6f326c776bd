//! Database layer
//!
//! SQLite-backed storage for the Byline platform. The layer is split into:
//! - `pool`: connection pool construction (file-based or in-memory)
//! - `migrations`: embedded schema migrations applied at startup
//! - `repositories`: one trait + SQLx implementation per entity
//!
//! Repositories are the only code that writes SQL against the schema; the
//! services layer composes them into the behavior the pages need.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
