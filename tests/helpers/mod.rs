//! Test helpers module
//!
//! Shared setup for the integration tests: an in-memory service context
//! with a manual clock, event fixtures, and an optional Postgres database.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
