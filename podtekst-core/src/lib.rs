//! # podtekst-core
//!
//! Core library for PodTeksT - quantitative conversation analytics.
//!
//! This library provides:
//! - Domain types for conversations, messages and analysis snapshots
//! - Conversation fingerprinting for re-upload detection
//! - Analytics: aggregation, percentile rankings, deltas, badges and awards
//! - Database storage layer with SQLite
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use podtekst_core::{Config, Database};
//!
//! // Load configuration
//! let config = Config::load().expect("failed to load config");
//!
//! // Open database
//! let db = Database::open(&Config::database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! for summary in db.list_analyses(Some(10)).expect("failed to list analyses") {
//!     println!("{} {}", summary.id, summary.title);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod logging;
pub mod types;
