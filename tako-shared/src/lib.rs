//! # Tako Tasks Shared Library
//!
//! Types, persistence and integrations shared by the Tako Tasks API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (access keys, workspaces, tasks, task history)
//! - `db`: Connection pool and migration runner
//! - `auth`: Access-key and JWT primitives, request authentication context
//! - `slack`: OAuth exchange, Web API client, request signing, Block Kit
//! - `email`: Transactional email capability with one sender per provider

pub mod auth;
pub mod db;
pub mod email;
pub mod models;
pub mod slack;

/// Current version of the Tako Tasks shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
