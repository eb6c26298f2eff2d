//! bugboard-core library.
//!
//! Client core of a shared bug-report board: a live cache of reports fed
//! by store snapshots, filtering over it, and a workflow controller that
//! turns user actions into single remote writes.
//!
//! # Conventions
//!
//! - **Errors**: Domain operations return [`error::BoardError`]; config and
//!   other plumbing use `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod board;
pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod lock;
pub mod model;
pub mod session;
pub mod store;
pub mod sync;
pub mod workflow;

pub use board::{Board, BoardOptions};
pub use error::{BoardError, ErrorCode};
