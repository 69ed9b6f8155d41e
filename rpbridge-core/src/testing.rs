//! In-memory [`Client`] double that records every call.
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use crate::client::{
    Attachment, Client, FinishLaunch, FinishTestItem, ItemId, LogEntry, StartLaunch,
    StartTestItem, Timestamp, Tracked, UserInfo,
};

/// Value returned by [`RecordingClient::now`].
pub const NOW: i64 = 1_700_000_000_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CheckConnect,
    StartLaunch(StartLaunch),
    StartTestItem {
        item: StartTestItem,
        launch: ItemId,
        parent: Option<ItemId>,
    },
    FinishTestItem {
        id: ItemId,
        finish: FinishTestItem,
    },
    SendLog {
        item: ItemId,
        log: LogEntry,
        file: Option<Attachment>,
    },
    FinishLaunch {
        id: ItemId,
        finish: FinishLaunch,
    },
}

#[derive(Debug, Default)]
struct Inner {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    unreachable: bool,
    reject_finish_launch: bool,
}

/// Cloning shares the call log, so a test can keep a handle while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingClient {
    inner: Arc<Inner>,
}

impl RecordingClient {
    pub fn new() -> RecordingClient {
        RecordingClient::default()
    }

    /// A client whose connectivity check fails.
    pub fn unreachable() -> RecordingClient {
        RecordingClient {
            inner: Arc::new(Inner {
                unreachable: true,
                ..Default::default()
            }),
        }
    }

    /// A client whose finish-launch request is rejected by the server.
    pub fn rejecting_finish_launch() -> RecordingClient {
        RecordingClient {
            inner: Arc::new(Inner {
                reject_finish_launch: true,
                ..Default::default()
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Calls made after the connectivity check.
    pub fn reporting_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| *call != Call::CheckConnect)
            .collect()
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().unwrap().push(call);
    }

    fn next_id(&self, prefix: &str) -> ItemId {
        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        ItemId::new(format!("{prefix}-{n}"))
    }

    fn accepted(temp_id: ItemId) -> Tracked {
        Tracked {
            temp_id,
            promise: Box::pin(async { Ok(()) }),
        }
    }
}

#[async_trait::async_trait]
impl Client for RecordingClient {
    async fn check_connect(&self) -> eyre::Result<UserInfo> {
        self.record(Call::CheckConnect);
        if self.inner.unreachable {
            eyre::bail!("connection refused");
        }
        Ok(UserInfo {
            full_name: Some("Test Runner".into()),
        })
    }

    fn start_launch(&self, launch: StartLaunch) -> Tracked {
        self.record(Call::StartLaunch(launch));
        RecordingClient::accepted(self.next_id("launch"))
    }

    fn start_test_item(
        &self,
        item: StartTestItem,
        launch: &ItemId,
        parent: Option<&ItemId>,
    ) -> Tracked {
        self.record(Call::StartTestItem {
            item,
            launch: launch.clone(),
            parent: parent.cloned(),
        });
        RecordingClient::accepted(self.next_id("item"))
    }

    fn finish_test_item(&self, id: &ItemId, finish: FinishTestItem) -> Tracked {
        self.record(Call::FinishTestItem {
            id: id.clone(),
            finish,
        });
        RecordingClient::accepted(id.clone())
    }

    fn send_log(&self, item: &ItemId, log: LogEntry, file: Option<Attachment>) -> Tracked {
        self.record(Call::SendLog {
            item: item.clone(),
            log,
            file,
        });
        RecordingClient::accepted(self.next_id("log"))
    }

    fn finish_launch(&self, id: &ItemId, finish: FinishLaunch) -> Tracked {
        self.record(Call::FinishLaunch {
            id: id.clone(),
            finish,
        });
        if self.inner.reject_finish_launch {
            return Tracked {
                temp_id: id.clone(),
                promise: Box::pin(async { Err(eyre::eyre!("launch not found")) }),
            };
        }
        RecordingClient::accepted(id.clone())
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_millis(NOW)
    }
}
