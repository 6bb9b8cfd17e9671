//! Test helpers module
//!
//! Shared setup for the integration tests: an application router backed by a
//! database pool that never connects, a real PostgreSQL for repository
//! tests, and request builders.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
