//! blotter-core library.
//!
//! Articles, users, and categories on SQLite, plus the transactional
//! counter path for article views and likes:
//!
//! - [`ledger`] remembers which views and likes were already counted
//! - [`counter`] runs check, mutate, record, and commit as one transaction
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums on the counter path, `anyhow::Result`
//!   with context everywhere else.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod counter;
pub mod db;
pub mod error;
pub mod ledger;
pub mod model;
