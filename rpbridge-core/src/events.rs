//! Test framework lifecycle events.
//!
//! The test framework publishes a [`Message`] for each lifecycle hook and
//! reporters subscribe to see them in real time.
use console::style;
use eyre::WrapErr;
use once_cell::sync::Lazy;
use std::{ops::Deref, path::PathBuf, sync::Mutex, time::Duration};
use tokio::sync::broadcast;

pub static CHANNEL: Lazy<Mutex<Option<broadcast::Sender<Message>>>> =
    Lazy::new(|| Mutex::new(Some(broadcast::channel(1000).0)));

pub fn publish(msg: Message) -> eyre::Result<()> {
    let Ok(guard) = CHANNEL.lock() else {
        eyre::bail!("failed to acquire event channel lock");
    };
    let Some(tx) = guard.deref() else {
        eyre::bail!("event channel has been already closed");
    };

    tx.send(msg)
        .wrap_err("failed to publish message to the event channel")?;

    Ok(())
}

/// Subscribe to the channel to see the real-time lifecycle events.
pub fn subscribe() -> eyre::Result<broadcast::Receiver<Message>> {
    let Ok(guard) = CHANNEL.lock() else {
        eyre::bail!("failed to acquire event channel lock");
    };
    let Some(tx) = guard.deref() else {
        eyre::bail!("event channel has been already closed");
    };

    Ok(tx.subscribe())
}

/// Close the channel. Subscribed reporters stop once they drained it.
pub fn close() -> eyre::Result<()> {
    let Ok(mut guard) = CHANNEL.lock() else {
        eyre::bail!("failed to acquire event channel lock");
    };
    guard.take();
    Ok(())
}

#[derive(Debug, Clone)]
pub enum Message {
    TaskStart(TaskStart),
    FixtureStart(FixtureStart),
    TestDone(TestDone),
    TaskDone(TaskDone),
}

/// The whole run is about to start.
#[derive(Debug, Clone)]
pub struct TaskStart {
    pub user_agents: Vec<String>,
    pub test_count: usize,
}

#[derive(Debug, Clone)]
pub struct FixtureStart {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TestDone {
    pub name: String,
    pub run_info: RunInfo,
}

#[derive(Debug, Clone)]
pub struct TaskDone {
    pub passed: usize,
    pub warnings: Vec<String>,
}

/// What the framework knows about a finished test.
#[derive(Debug, Clone, Default)]
pub struct RunInfo {
    pub duration: Duration,
    pub errors: Vec<TestError>,
    pub screenshots: Vec<Screenshot>,
    pub skipped: bool,
    pub unstable: bool,
}

/// A screenshot taken during the test, uploaded as a PNG attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    pub path: PathBuf,
}

impl Screenshot {
    pub fn new(path: impl Into<PathBuf>) -> Screenshot {
        Screenshot { path: path.into() }
    }
}

/// A raw test failure, before formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct TestError {
    pub kind: String,
    pub message: String,
    pub call_site: Option<String>,
    pub user_agent: Option<String>,
}

impl TestError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> TestError {
        TestError {
            kind: kind.into(),
            message: message.into(),
            call_site: None,
            user_agent: None,
        }
    }
}

/// Renders a [`TestError`] the way the framework shows it to users.
/// The output may contain terminal color codes.
pub trait ErrorFormatter: Send + Sync {
    fn format_error(&self, err: &TestError) -> String;
}

impl<F: ErrorFormatter + ?Sized> ErrorFormatter for Box<F> {
    fn format_error(&self, err: &TestError) -> String {
        (**self).format_error(err)
    }
}

/// Colored, multi-line rendering for terminals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormatter;

impl ErrorFormatter for ConsoleFormatter {
    fn format_error(&self, err: &TestError) -> String {
        let mut out = format!("{}: {}", style(&err.kind).red().bold(), err.message);
        if let Some(user_agent) = &err.user_agent {
            out.push_str(&format!("\n\n{}", style(format!("Browser: {user_agent}")).dim()));
        }
        if let Some(call_site) = &err.call_site {
            out.push_str(&format!("\n\n{}", style(call_site).dim()));
        }
        out
    }
}
