//! # Royalty Common Library
//!
//! Shared code for the royalty services including:
//! - Error types
//! - Configuration loading and root folder resolution
//! - Exact decimal money helpers
//! - Database bootstrap (schema creation)

pub mod config;
pub mod db;
pub mod error;
pub mod money;

pub use error::{Error, Result};
