//! Database layer for PodTeksT
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository for stored analyses, looked up by id or fingerprint

pub mod repo;
pub mod schema;

pub use repo::Database;
