//! daybook - personal task tracking library
//!
//! This library provides the task store behind the daybook CLI: a single
//! in-memory collection of task records, persisted as one JSON document
//! through a pluggable key/value backend.
//!
//! # Core Concepts
//!
//! - **Task records**: title, description, status, stickiness, notes and the
//!   list of days the task was active on
//! - **Sticky tasks**: incomplete sticky tasks roll forward onto each new day
//! - **Snapshot**: the whole collection plus the time of the last save
//! - **Subscribers**: listeners notified with the snapshot after each change
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `clock`: Wall clock abstraction and day stamps
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes
//! - `notes`: Note editing on a working copy
//! - `observe`: Subscriber registry
//! - `output`: Human and JSON command output
//! - `query`: Filtering, sorting and id resolution
//! - `session`: Current/selected date and the task being edited
//! - `storage`: Key/value persistence backends
//! - `store`: The task store
//! - `task`: Record types and factories

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod notes;
pub mod observe;
pub mod output;
pub mod query;
pub mod session;
pub mod storage;
pub mod store;
pub mod task;

pub use error::{Error, Result};
