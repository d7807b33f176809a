//! Test Helper Utilities
//!
//! Shared utilities for testing royalty-engine

#![allow(dead_code)]

pub mod db_utils;
pub mod flaky_store;
pub mod statements;

// Re-export commonly used items
pub use db_utils::{count_rows, count_runs_for_upload, create_test_store, memory_store};
pub use flaky_store::FlakyStore;
pub use statements::{options, StatementBuilder};
