use tokio::sync::broadcast;
use tracing::*;

use crate::{
    client::{Client, ItemId, Status},
    events::{self, ErrorFormatter, FixtureStart, Message, RunInfo, TaskDone, TaskStart, TestDone},
    session::Session,
};

/// Reporter trait. The trait is based on the "template method" pattern.
/// You can implement on_xxx methods to hook into the test lifecycle. This way is enough for most usecases.
/// If you need more control, you can override the "run" method.
#[async_trait::async_trait]
pub trait Reporter {
    async fn run(&mut self) -> eyre::Result<()> {
        let rx = events::subscribe()?;
        self.run_with(rx).await
    }

    /// Dispatch messages from `rx` until the sending side is closed.
    ///
    /// A failing hook only loses its own event; later events are still
    /// dispatched. The error of `on_task_done` is returned once the channel
    /// is closed.
    async fn run_with(&mut self, mut rx: broadcast::Receiver<Message>) -> eyre::Result<()> {
        let mut task_result = Ok(());
        loop {
            match rx.recv().await {
                Ok(Message::TaskStart(task)) => {
                    if let Err(e) = self.on_task_start(task).await {
                        error!("failed to report task start: {e:#}");
                    }
                }
                Ok(Message::FixtureStart(fixture)) => {
                    let name = fixture.name.clone();
                    if let Err(e) = self.on_fixture_start(fixture).await {
                        error!("failed to report fixture \"{name}\": {e:#}");
                    }
                }
                Ok(Message::TestDone(test)) => {
                    let name = test.name.clone();
                    if let Err(e) = self.on_test_done(test).await {
                        error!("failed to report test \"{name}\": {e:#}");
                    }
                }
                Ok(Message::TaskDone(task)) => {
                    task_result = self.on_task_done(task).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("event channel has been closed");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("event channel lagged, {skipped} messages skipped");
                    continue;
                }
            }
        }

        task_result
    }

    /// Called once before any fixture starts.
    async fn on_task_start(&mut self, _task: TaskStart) -> eyre::Result<()> {
        Ok(())
    }

    /// Called when a fixture starts.
    async fn on_fixture_start(&mut self, _fixture: FixtureStart) -> eyre::Result<()> {
        Ok(())
    }

    /// Called when a test finishes.
    async fn on_test_done(&mut self, _test: TestDone) -> eyre::Result<()> {
        Ok(())
    }

    /// Called once after every test finished.
    async fn on_task_done(&mut self, _task: TaskDone) -> eyre::Result<()> {
        Ok(())
    }
}

/// Status reported for a finished test.
pub fn status_of(run_info: &RunInfo) -> Status {
    if run_info.skipped {
        Status::Skipped
    } else if !run_info.errors.is_empty() {
        Status::Failed
    } else {
        Status::Passed
    }
}

/// Forwards the test lifecycle to ReportPortal through a [`Session`].
pub struct ReportPortalReporter<C> {
    session: Session<C>,
    formatter: Box<dyn ErrorFormatter>,
    launch: ItemId,
    fixture: ItemId,
}

impl<C: Client> ReportPortalReporter<C> {
    pub fn new(session: Session<C>, formatter: impl ErrorFormatter + 'static) -> Self {
        ReportPortalReporter {
            session,
            formatter: Box::new(formatter),
            launch: ItemId::unknown_launch(),
            fixture: ItemId::unknown_test(),
        }
    }

    pub fn session(&self) -> &Session<C> {
        &self.session
    }
}

#[async_trait::async_trait]
impl<C: Client> Reporter for ReportPortalReporter<C> {
    async fn on_task_start(&mut self, task: TaskStart) -> eyre::Result<()> {
        debug!(
            "task started with {} tests on {:?}",
            task.test_count, task.user_agents
        );
        self.launch = self.session.start_launch();
        Ok(())
    }

    async fn on_fixture_start(&mut self, fixture: FixtureStart) -> eyre::Result<()> {
        self.fixture = self.session.start_fixture(&self.launch, &fixture.name);
        Ok(())
    }

    async fn on_test_done(&mut self, test: TestDone) -> eyre::Result<()> {
        let TestDone { name, run_info } = test;
        let status = status_of(&run_info);
        if run_info.unstable {
            debug!("\"{name}\" is unstable");
        }
        self.session
            .record_step(
                &self.launch,
                &self.fixture,
                &name,
                status,
                &run_info,
                self.formatter.as_ref(),
            )
            .await
    }

    async fn on_task_done(&mut self, task: TaskDone) -> eyre::Result<()> {
        debug!(
            "task done: {} passed, {} warnings",
            task.passed,
            task.warnings.len()
        );
        self.session.finish_launch(&self.launch).await;
        Ok(())
    }
}
