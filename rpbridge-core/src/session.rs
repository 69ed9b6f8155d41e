//! Maps the launch → fixture → step hierarchy onto start/finish calls of a
//! [`Client`].
//!
//! ```text
//! start_launch ──► start_fixture ──► record_step ... ──► finish_launch
//!      │                │                                    │
//!      │                └── pending fixtures ◄── drained by ─┤
//!      └────────────────────────── finished last ────────────┘
//! ```
//!
//! When the connectivity check fails the session turns degraded: every
//! operation becomes a no-op and placeholder IDs are handed out so callers
//! keep working without a server.
use bytes::Bytes;
use tracing::*;

use crate::{
    client::{
        Attachment, Client, FinishLaunch, FinishTestItem, Issue, IssueType, ItemId, ItemType,
        LogEntry, LogLevel, Promise, StartLaunch, StartTestItem, Status,
    },
    config::Config,
    events::{ErrorFormatter, RunInfo},
    Error,
};

const SCREENSHOT_MESSAGE: &str = "Error Screenshot";
const SCREENSHOT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    /// The connectivity check failed; nothing reaches the server.
    Degraded,
}

/// Launch attributes copied from the configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchSettings {
    pub project: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl From<&Config> for LaunchSettings {
    fn from(cfg: &Config) -> LaunchSettings {
        LaunchSettings {
            project: cfg.project.clone(),
            name: cfg.launch_name().unwrap_or_default().to_string(),
            description: cfg.description.clone(),
            tags: cfg.tags.clone(),
        }
    }
}

pub struct Session<C> {
    client: C,
    settings: LaunchSettings,
    connectivity: Connectivity,
    pending_fixtures: Vec<ItemId>,
}

impl<C: Client> Session<C> {
    /// Create a session and run the connectivity check.
    ///
    /// A failed check is not an error: the session is returned degraded.
    pub async fn connect(settings: LaunchSettings, client: C) -> Session<C> {
        let connectivity = match client.check_connect().await {
            Ok(user) => {
                match user.full_name {
                    Some(name) => info!("connected to ReportPortal as {name}"),
                    None => info!("connected to ReportPortal"),
                }
                Connectivity::Connected
            }
            Err(e) => {
                warn!("Error connecting to ReportPortal, confirm that your details are correct: {e:#}");
                Connectivity::Degraded
            }
        };

        Session {
            client,
            settings,
            connectivity,
            pending_fixtures: Vec::new(),
        }
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn is_connected(&self) -> bool {
        self.connectivity == Connectivity::Connected
    }

    /// Fixtures started but not finished yet, in start order.
    pub fn pending_fixtures(&self) -> &[ItemId] {
        &self.pending_fixtures
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Start the launch and return its provisional ID.
    pub fn start_launch(&mut self) -> ItemId {
        if !self.is_connected() {
            return ItemId::unknown_launch();
        }

        let tracked = self.client.start_launch(StartLaunch {
            name: self.settings.name.clone(),
            description: self.settings.description.clone(),
            tags: self.settings.tags.clone(),
            start_time: self.client.now(),
        });
        debug!(
            "launch {} started in project {:?}",
            tracked.temp_id, self.settings.project
        );
        detach("start launch", tracked.promise);
        tracked.temp_id
    }

    /// Start a suite item for a fixture and remember it for [`Session::finish_fixtures`].
    pub fn start_fixture(&mut self, launch: &ItemId, name: &str) -> ItemId {
        if !self.is_connected() {
            return ItemId::unknown_test();
        }

        let tracked = self.client.start_test_item(
            StartTestItem {
                name: name.to_string(),
                item_type: ItemType::Suite,
                start_time: self.client.now(),
            },
            launch,
            None,
        );
        debug!("fixture \"{name}\" started as {}", tracked.temp_id);
        detach("start fixture", tracked.promise);
        self.pending_fixtures.push(tracked.temp_id.clone());
        tracked.temp_id
    }

    /// Report a finished step with its screenshots and errors.
    ///
    /// Logs are stamped with the step's start time; the step ends `duration` later.
    pub async fn record_step(
        &mut self,
        launch: &ItemId,
        fixture: &ItemId,
        name: &str,
        status: Status,
        run_info: &RunInfo,
        formatter: &dyn ErrorFormatter,
    ) -> eyre::Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        let start_time = self.client.now();
        let step = self.client.start_test_item(
            StartTestItem {
                name: name.to_string(),
                item_type: ItemType::Step,
                start_time,
            },
            launch,
            Some(fixture),
        );
        detach("start step", step.promise);
        let step_id = step.temp_id;

        for screenshot in &run_info.screenshots {
            let content = tokio::fs::read(&screenshot.path)
                .await
                .map_err(|source| Error::Screenshot {
                    path: screenshot.path.clone(),
                    source,
                })?;

            let tracked = self.client.send_log(
                &step_id,
                LogEntry {
                    level: LogLevel::Error,
                    message: SCREENSHOT_MESSAGE.into(),
                    time: start_time,
                },
                Some(Attachment {
                    name: format!("{name}.png"),
                    mime_type: SCREENSHOT_MIME_TYPE.into(),
                    content: Bytes::from(content),
                }),
            );
            detach("send screenshot", tracked.promise);
        }

        for err in &run_info.errors {
            let formatted = formatter.format_error(err);
            let tracked = self.client.send_log(
                &step_id,
                LogEntry {
                    level: LogLevel::Error,
                    message: console::strip_ansi_codes(&formatted).into_owned(),
                    time: start_time,
                },
                None,
            );
            detach("send error log", tracked.promise);
        }

        let issue = (status == Status::Skipped).then_some(Issue {
            issue_type: IssueType::NotIssue,
        });
        let tracked = self.client.finish_test_item(
            &step_id,
            FinishTestItem {
                status: Some(status),
                end_time: start_time + run_info.duration,
                issue,
            },
        );
        detach("finish step", tracked.promise);
        debug!("step \"{name}\" finished as {status}");

        Ok(())
    }

    /// Finish every pending fixture, oldest first.
    pub fn finish_fixtures(&mut self) {
        if !self.is_connected() {
            return;
        }

        for id in std::mem::take(&mut self.pending_fixtures) {
            let tracked = self.client.finish_test_item(
                &id,
                FinishTestItem {
                    status: None,
                    end_time: self.client.now(),
                    issue: None,
                },
            );
            detach("finish fixture", tracked.promise);
        }
    }

    /// Finish pending fixtures, then the launch, and wait until the server
    /// acknowledged the launch.
    ///
    /// A rejected finish is logged and not returned: the run is over and
    /// there is nothing left to report it to.
    pub async fn finish_launch(&mut self, launch: &ItemId) {
        if !self.is_connected() {
            return;
        }

        self.finish_fixtures();
        let tracked = self.client.finish_launch(
            launch,
            FinishLaunch {
                end_time: self.client.now(),
            },
        );
        match tracked.promise.await {
            Ok(()) => info!("launch {launch} finished"),
            Err(e) => error!("failed to finish launch {launch}: {e:#}"),
        }
    }
}

/// Let a request complete in the background, logging a failure if it is rejected.
fn detach(what: &'static str, promise: Promise) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        trace!("no runtime to observe \"{what}\"");
        return;
    };
    handle.spawn(async move {
        if let Err(e) = promise.await {
            error!("failed to {what}: {e:#}");
        }
    });
}
