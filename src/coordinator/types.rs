use super::activity::ActivityHandler;
use crate::response::envelope::ResponseEnvelope;
use crate::transport::descriptor::AttributionRequestDescriptor;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use url::Url;

/// Everything `init` (re)configures on the coordinator.
#[derive(Clone)]
pub struct CoordinatorParams {
    pub activity: Arc<dyn ActivityHandler>,
    pub descriptor: AttributionRequestDescriptor,
    pub starts_sending: bool,
    pub has_listener: bool,
}

impl CoordinatorParams {
    pub fn new(
        activity: Arc<dyn ActivityHandler>,
        descriptor: AttributionRequestDescriptor,
        starts_sending: bool,
        has_listener: bool,
    ) -> Self {
        Self {
            activity,
            descriptor,
            starts_sending,
            has_listener,
        }
    }
}

impl fmt::Debug for CoordinatorParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinatorParams")
            .field("descriptor", &self.descriptor)
            .field("starts_sending", &self.starts_sending)
            .field("has_listener", &self.has_listener)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of the coordinator state, read on the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSnapshot {
    pub paused: bool,
    pub has_listener: bool,
    /// Remaining wait of the pending lookup, `None` when nothing is scheduled.
    pub pending_fire_in: Option<Duration>,
    pub last_url: Option<Url>,
}

#[derive(Debug)]
pub(super) enum Command {
    Init(CoordinatorParams),
    RequestLookup(Duration),
    Pause,
    Resume,
    Response(ResponseEnvelope),
    Snapshot(oneshot::Sender<CoordinatorSnapshot>),
}

pub(super) type CommandSender = mpsc::UnboundedSender<Command>;
pub(super) type CommandReceiver = mpsc::UnboundedReceiver<Command>;

pub(super) enum LoopStep {
    Command(Command),
    Fire,
    Shutdown,
}

pub(super) enum FetchDecision<T> {
    Finished(T),
    Cancelled,
}
