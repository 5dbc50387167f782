//! # Taskboard Shared Library
//!
//! Domain layer of the task board service: persistence, credentials, the
//! nested collection reconciliation engine and the resource managers. The
//! HTTP surface lives in `taskboard-api`.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, bearer tokens, authorization checks
//! - `db`: connection pool, migrations, role seeding
//! - `error`: domain error type
//! - `mail`: outbound email for password resets
//! - `models`: tables and their queries
//! - `reconcile`: child collection diff/merge
//! - `services`: user, project, card and comment managers
//! - `validation`: field rules for submitted input

pub mod auth;
pub mod db;
pub mod error;
pub mod mail;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod validation;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
