//! # Tako Tasks API Server Library
//!
//! This library provides the core functionality for the Tako Tasks API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers
//! - `services`: Access key lifecycle and Slack interaction handling

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
