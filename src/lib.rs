//! bytecraft - Offline-First Project Dashboard Library
//!
//! This library provides the core functionality for the bytecraft CLI:
//! one locally persisted document of clients, projects, tasks and
//! collaborators, with a recoverable trash and an offline asset cache.
//!
//! # Core Concepts
//!
//! - **Store**: the single persisted document, rewritten whole on every change
//! - **Ledger**: soft-deleted records, restorable until purged
//! - **Connectivity Gate**: mutations are refused while offline
//! - **Offline Cache**: versioned buckets of shell assets, cache-first
//! - **Notifications**: capped in-store log plus optional desktop display
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.bytecraft.toml`
//! - `error`: Error types and result aliases
//! - `model`: Record types and enumerations
//! - `document`: The persisted document and its backup shapes
//! - `store`: Load, save, import, reset, export
//! - `records`: Create and edit operations
//! - `ledger`: Soft delete, restore, purge
//! - `integrity`: Reference rules applied on delete
//! - `gate`: Connectivity state and network probes
//! - `notify`: Notification log and desktop sinks
//! - `view`: Dashboard read-models
//! - `cache`: Offline cache worker
//! - `storage`: Key-value storage backends
//! - `lock`: File locking and atomic operations for concurrency safety

pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod gate;
pub mod integrity;
pub mod ledger;
pub mod lock;
pub mod model;
pub mod notify;
pub mod output;
pub mod records;
pub mod storage;
pub mod store;
pub mod view;

pub use error::{Error, Result};
pub use store::Store;
