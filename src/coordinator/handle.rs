use super::types::{Command, CommandSender, CoordinatorParams, CoordinatorSnapshot};
use super::worker::{CoordinatorWorker, WorkerParams};
use crate::response::envelope::{ResponseData, ResponseEnvelope};
use crate::runtime::config::CoordinatorConfig;
use crate::runtime::telemetry::{CoordinatorTelemetry, TelemetrySnapshot};
use crate::transport::client::{AttributionTransport, HttpTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Cloneable handle to the attribution coordinator.
///
/// Every operation is queued onto the coordinator worker and returns
/// immediately, so the handle can be used from any thread, inside or outside
/// the runtime. Failures never surface to callers; they end the current lookup
/// cycle and are logged.
#[derive(Debug, Clone)]
pub struct AttributionCoordinator {
    commands: CommandSender,
    shutdown: CancellationToken,
    telemetry: Arc<CoordinatorTelemetry>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl AttributionCoordinator {
    /// Starts a coordinator backed by the default HTTP transport.
    ///
    /// Must be called from within a tokio runtime; otherwise the coordinator is
    /// created disabled and every lookup request is dropped.
    pub fn new(config: CoordinatorConfig, params: CoordinatorParams) -> Self {
        match HttpTransport::from_config(&config) {
            Ok(transport) => Self::with_transport(config, Arc::new(transport), params),
            Err(err) => {
                tracing::error!(
                    error = %format!("{err:#}"),
                    "attribution transport unavailable; attribution coordinator is disabled"
                );
                Self::disabled()
            }
        }
    }

    pub fn with_transport(
        config: CoordinatorConfig,
        transport: Arc<dyn AttributionTransport>,
        params: CoordinatorParams,
    ) -> Self {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    "timer not initialized; attribution coordinator is disabled"
                );
                return Self::disabled();
            }
        };

        let (commands, receiver) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let telemetry = Arc::new(CoordinatorTelemetry::default());

        let worker = CoordinatorWorker::new(WorkerParams {
            params,
            transport,
            base_url: config.base_url().clone(),
            commands: receiver,
            shutdown: shutdown.clone(),
            telemetry: Arc::clone(&telemetry),
        });
        let handle = runtime.spawn(worker.run());

        Self {
            commands,
            shutdown,
            telemetry,
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    fn disabled() -> Self {
        let (commands, _) = mpsc::unbounded_channel();
        Self {
            commands,
            shutdown: CancellationToken::new(),
            telemetry: Arc::new(CoordinatorTelemetry::default()),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    /// Reconfigures the activity handler, descriptor and flags. A pending
    /// lookup stays scheduled.
    pub fn init(&self, params: CoordinatorParams) {
        self.send(Command::Init(params));
    }

    /// Asks for a lookup as soon as possible.
    pub fn request_lookup(&self) {
        self.request_lookup_in(Duration::ZERO);
    }

    /// Asks for a lookup after `delay`, unless one is already due sooner.
    pub fn request_lookup_in(&self, delay: Duration) {
        self.send(Command::RequestLookup(delay));
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    pub fn check_session_response(&self, response: ResponseData) {
        self.send(Command::Response(ResponseEnvelope::Session(response)));
    }

    pub fn check_attribution_response(&self, response: ResponseData) {
        self.send(Command::Response(ResponseEnvelope::Attribution(response)));
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Reads the coordinator state on the worker, after every previously
    /// queued operation. Returns `None` when the coordinator is not running.
    pub async fn snapshot(&self) -> Option<CoordinatorSnapshot> {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Snapshot(reply)).is_err() {
            return None;
        }
        response.await.ok()
    }

    /// URL of the last lookup that reached the server.
    pub async fn last_request_url(&self) -> Option<Url> {
        self.snapshot().await.and_then(|snapshot| snapshot.last_url)
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    /// Stops the worker, abandoning any in-flight lookup, and waits for it to exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "attribution coordinator task panicked");
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("attribution coordinator is not running; dropping command");
        }
    }
}
