//! # Taskboard API Server Library
//!
//! HTTP surface of the task board: configuration, error mapping, bearer
//! authentication and the route handlers that call into the resource
//! managers of `taskboard-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Bearer token authentication
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
