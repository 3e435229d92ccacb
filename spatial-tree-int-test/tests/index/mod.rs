//! Spatial tree index integration tests.
//!
//! These tests drive the index through a table, a database and its shared
//! store, including reopening a database from disk.

mod configuration_test;
mod cost_test;
mod lifecycle_test;
mod query_test;
