//! # Roster Shared Library
//!
//! Data layer for the Roster user admin: database access, the user and image
//! models, and the position reindexer that keeps both lists densely ordered.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and migrations
//! - `models`: Users and their image galleries
//! - `ordering`: Position reindexing (append, remove and compact, reorder)

pub mod db;
pub mod models;
pub mod ordering;

/// Current version of the Roster shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
