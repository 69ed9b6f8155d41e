//! # rpbridge Core
//!
//! Core functionality of rpbridge, the bridge between a test framework's
//! lifecycle and a ReportPortal server.
//!
//! This crate provides:
//! - The lifecycle event channel the test framework publishes to
//! - The reporter trait and the ReportPortal reporter
//! - The session that maps launch / fixture / step onto client calls
//! - The client capability trait the session talks through
//! - Configuration management
//!
//! ## Architecture (block diagram)
//!
//! ```text
//! +---------------------+      +---------------------+      +---------------------+
//! | test framework      | ---> | events (channel)    | ---> | reporter            |
//! | lifecycle hooks     |      | TaskStart/TestDone  |      | ReportPortalReporter|
//! +---------------------+      +---------------------+      +---------------------+
//!                                                                     |
//!                                                                     v
//! +---------------------+      +---------------------+      +---------------------+
//! | config              | ---> | session             | ---> | client (injected)   |
//! | rpbridge.toml + env |      | connected/degraded  |      | start/finish/log    |
//! +---------------------+      +---------------------+      +---------------------+
//! ```
//!
//! Most users should use the main `rpbridge` crate rather than importing `rpbridge-core` directly.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod reporter;
pub mod session;
#[cfg(test)]
mod testing;

pub use async_trait;
pub use eyre;

pub use client::{Client, ItemId, Status, Timestamp, Tracked};
pub use config::{get_config, Config};
pub use error::{Error, Result};
pub use events::{ConsoleFormatter, ErrorFormatter, Message, RunInfo, Screenshot, TestError};
pub use reporter::{ReportPortalReporter, Reporter};
pub use session::{Connectivity, LaunchSettings, Session};
