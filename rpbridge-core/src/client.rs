//! Capability interface of the reporting client.
//!
//! The session never talks to the network itself. Everything goes through
//! [`Client`], which mirrors the asynchronous ReportPortal client model: every
//! start/finish/log call hands back a provisional ID right away while the real
//! request proceeds in the background.
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::Serialize;
use std::{fmt, ops::Add, time::Duration};

/// Opaque item identifier issued by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    const UNKNOWN_LAUNCH: &'static str = "Unknown Launch ID";
    const UNKNOWN_TEST: &'static str = "Unknown Test ID";

    pub fn new(id: impl Into<String>) -> ItemId {
        ItemId(id.into())
    }

    /// Placeholder returned instead of a launch ID when not connected.
    pub fn unknown_launch() -> ItemId {
        ItemId(Self::UNKNOWN_LAUNCH.into())
    }

    /// Placeholder returned instead of a fixture ID when not connected.
    pub fn unknown_test() -> ItemId {
        ItemId(Self::UNKNOWN_TEST.into())
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::UNKNOWN_LAUNCH || self.0 == Self::UNKNOWN_TEST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Timestamp {
        Timestamp(millis)
    }

    pub fn now() -> Timestamp {
        Timestamp(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_millis(self) -> i64 {
        self.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let millis = i64::try_from(rhs.as_millis()).unwrap_or(i64::MAX);
        Timestamp(self.0.saturating_add(millis))
    }
}

/// Outcome of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Suite,
    Step,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    NotIssue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub issue_type: IssueType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLaunch {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub start_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTestItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub start_time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishTestItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub end_time: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinishLaunch {
    pub end_time: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(rename = "status")]
    pub level: LogLevel,
    pub message: String,
    pub time: Timestamp,
}

/// File uploaded together with a log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(skip)]
    pub content: Bytes,
}

/// Account details returned by the connectivity check.
#[derive(Debug, Clone, Default)]
pub struct UserInfo {
    pub full_name: Option<String>,
}

/// Completion of a request the client has already sent.
pub type Promise = BoxFuture<'static, eyre::Result<()>>;

/// Result of a start/finish/log call: the provisional ID is usable at once,
/// `promise` resolves once the server has acknowledged the request.
///
/// Dropping `promise` must not cancel the request.
pub struct Tracked {
    pub temp_id: ItemId,
    pub promise: Promise,
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("temp_id", &self.temp_id)
            .finish_non_exhaustive()
    }
}

/// Reporting client used by [`crate::Session`].
#[async_trait::async_trait]
pub trait Client: Send + Sync {
    /// Check that the server is reachable and the credentials are valid.
    async fn check_connect(&self) -> eyre::Result<UserInfo>;

    fn start_launch(&self, launch: StartLaunch) -> Tracked;

    /// Start a test item under `launch`, nested in `parent` when given.
    fn start_test_item(
        &self,
        item: StartTestItem,
        launch: &ItemId,
        parent: Option<&ItemId>,
    ) -> Tracked;

    fn finish_test_item(&self, id: &ItemId, finish: FinishTestItem) -> Tracked;

    fn send_log(&self, item: &ItemId, log: LogEntry, file: Option<Attachment>) -> Tracked;

    fn finish_launch(&self, id: &ItemId, finish: FinishLaunch) -> Tracked;

    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
