//! # rpbridge - Forward Test Lifecycle Events to ReportPortal
//!
//! rpbridge listens to a test framework's lifecycle events (task start,
//! fixture start, test done, task done) and reports them to a ReportPortal
//! server as a launch containing one suite per fixture and one step per test.
//! Screenshots are uploaded as attachments and test errors as log entries.
//!
//! When the server can not be reached at startup rpbridge logs a warning and
//! keeps consuming events without reporting anything, so a broken reporting
//! setup never fails the test run.
//!
//! ## Quick Start
//!
//! Configure the connection with environment variables (a `.env` file works too):
//!
//! ```bash
//! REPORT_PORTAL_BASE_URL=https://reportportal.example.com
//! REPORT_PORTAL_TOKEN=...
//! REPORT_PORTAL_PROJECT_NAME=default_personal
//! REPORT_PORTAL_LAUNCH_NAME=nightly
//! REPORT_PORTAL_TAGS=nightly,regression
//! ```
//!
//! Start the app with a [`Client`] implementation, then publish events from
//! the test framework's hooks:
//!
//! ```rust,ignore
//! use rpbridge::{events::{self, Message, TaskStart}, App};
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let reporting = App::new(MyClient::new()).start().await?;
//!
//!     events::publish(Message::TaskStart(TaskStart {
//!         user_agents: vec!["Chrome 120".into()],
//!         test_count: 12,
//!     }))?;
//!     // ... FixtureStart, TestDone ..., TaskDone
//!
//!     events::close()?;
//!     reporting.await??;
//!     Ok(())
//! }
//! ```

mod app;

pub use eyre;

pub use app::{init_logging, App};

pub use rpbridge_core::{
    async_trait,
    client::{self, Client, ItemId, Status, Timestamp, Tracked},
    config::{get_config, Config},
    events::{self, ConsoleFormatter, ErrorFormatter, Message, RunInfo, Screenshot, TestError},
    reporter::{ReportPortalReporter, Reporter},
    session::{Connectivity, LaunchSettings, Session},
    Error, Result,
};
