use super::activity::ActivityHandler;
use super::types::{
    Command, CommandReceiver, CoordinatorParams, CoordinatorSnapshot, FetchDecision, LoopStep,
};
use crate::response::classifier::{classify, Classification};
use crate::response::envelope::ResponseEnvelope;
use crate::runtime::telemetry::CoordinatorTelemetry;
use crate::timer::{millis, wait_for_deadline, DebounceTimer};
use crate::transport::client::AttributionTransport;
use crate::transport::descriptor::AttributionRequestDescriptor;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

const ATTRIBUTION_TIMER_NAME: &str = "attribution timer";

struct CoordinatorState {
    activity: Arc<dyn ActivityHandler>,
    descriptor: AttributionRequestDescriptor,
    paused: bool,
    has_listener: bool,
    last_url: Option<Url>,
}

impl CoordinatorState {
    fn new(params: CoordinatorParams) -> Self {
        Self {
            activity: params.activity,
            descriptor: params.descriptor,
            paused: !params.starts_sending,
            has_listener: params.has_listener,
            last_url: None,
        }
    }

    fn apply(&mut self, params: CoordinatorParams) {
        self.activity = params.activity;
        self.descriptor = params.descriptor;
        self.paused = !params.starts_sending;
        self.has_listener = params.has_listener;
    }
}

pub(super) struct WorkerParams {
    pub params: CoordinatorParams,
    pub transport: Arc<dyn AttributionTransport>,
    pub base_url: Url,
    pub commands: CommandReceiver,
    pub shutdown: CancellationToken,
    pub telemetry: Arc<CoordinatorTelemetry>,
}

/// Sole owner of the coordinator state. Commands are applied strictly in
/// submission order and the timer fires on this same task, so no state is ever
/// touched concurrently.
pub(super) struct CoordinatorWorker {
    state: CoordinatorState,
    timer: DebounceTimer,
    transport: Arc<dyn AttributionTransport>,
    base_url: Url,
    commands: CommandReceiver,
    shutdown: CancellationToken,
    telemetry: Arc<CoordinatorTelemetry>,
}

impl CoordinatorWorker {
    pub(super) fn new(params: WorkerParams) -> Self {
        let WorkerParams {
            params,
            transport,
            base_url,
            commands,
            shutdown,
            telemetry,
        } = params;

        Self {
            state: CoordinatorState::new(params),
            timer: DebounceTimer::new(ATTRIBUTION_TIMER_NAME),
            transport,
            base_url,
            commands,
            shutdown,
            telemetry,
        }
    }

    #[tracing::instrument(name = "attribution_coordinator", skip_all)]
    pub(super) async fn run(mut self) {
        tracing::debug!(
            paused = self.state.paused,
            has_listener = self.state.has_listener,
            "attribution coordinator started"
        );

        loop {
            let deadline = self.timer.deadline();
            let step = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => LoopStep::Shutdown,
                command = self.commands.recv() => match command {
                    Some(command) => LoopStep::Command(command),
                    None => LoopStep::Shutdown,
                },
                _ = wait_for_deadline(deadline) => LoopStep::Fire,
            };

            match step {
                LoopStep::Command(command) => self.handle_command(command),
                LoopStep::Fire => {
                    if self.timer.take_expired() {
                        self.fire().await;
                    }
                }
                LoopStep::Shutdown => break,
            }
        }

        tracing::debug!("attribution coordinator stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Init(params) => {
                tracing::debug!(
                    path = params.descriptor.path(),
                    starts_sending = params.starts_sending,
                    has_listener = params.has_listener,
                    "attribution coordinator reconfigured"
                );
                self.state.apply(params);
            }
            Command::RequestLookup(delay) => self.request_lookup(delay),
            Command::Pause => {
                if !self.state.paused {
                    tracing::debug!("attribution lookups paused");
                }
                self.state.paused = true;
            }
            Command::Resume => {
                if self.state.paused {
                    tracing::debug!("attribution lookups resumed");
                }
                self.state.paused = false;
            }
            Command::Response(envelope) => self.handle_response(envelope),
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Arms the timer unless a pending arm already fires no later than `delay`.
    fn request_lookup(&mut self, delay: Duration) {
        self.telemetry.record_lookup_requested();

        if self.timer.is_armed() && self.timer.fire_in() <= delay {
            tracing::trace!(
                requested_ms = millis(delay),
                pending_ms = millis(self.timer.fire_in()),
                "earlier attribution lookup already pending"
            );
            self.telemetry.record_lookup_debounced();
            return;
        }

        if !delay.is_zero() {
            tracing::debug!(
                timer = self.timer.name(),
                wait_secs = format!("{:.1}", delay.as_secs_f64()),
                "waiting to query attribution"
            );
        }

        self.timer.start_in(delay);
    }

    fn handle_response(&mut self, mut envelope: ResponseEnvelope) {
        match classify(envelope.data_mut()) {
            Classification::AskIn(delay) => {
                self.state.activity.set_asking_attribution(true);
                self.telemetry.record_reschedule();
                self.request_lookup(delay);
            }
            Classification::Final => {
                self.state.activity.set_asking_attribution(false);
                self.deliver(envelope);
            }
            Classification::MissingBody => self.deliver(envelope),
        }
    }

    fn deliver(&self, envelope: ResponseEnvelope) {
        let kind = envelope.kind();
        let has_attribution = envelope.data().attribution.is_some();
        match envelope {
            ResponseEnvelope::Session(data) => {
                self.state.activity.launch_session_response_tasks(data)
            }
            ResponseEnvelope::Attribution(data) => {
                self.state.activity.launch_attribution_response_tasks(data)
            }
        }
        self.telemetry.record_delivery();
        tracing::debug!(kind = ?kind, has_attribution, "attribution outcome delivered");
    }

    async fn fire(&mut self) {
        if !self.state.has_listener {
            tracing::trace!("no attribution listener; skipping lookup");
            return;
        }

        if self.state.paused {
            tracing::debug!("attribution coordinator is paused");
            self.telemetry.record_paused_fire();
            return;
        }

        tracing::trace!(descriptor = %self.state.descriptor, "querying attribution");

        let request = match self.state.descriptor.to_request(&self.base_url, Utc::now()) {
            Ok(request) => request,
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "failed to build attribution request");
                self.telemetry.record_lookup_failure();
                return;
            }
        };

        self.telemetry.record_lookup_issued();
        let decision = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => FetchDecision::Cancelled,
            result = self.transport.perform_get(&request) => FetchDecision::Finished(result),
        };

        match decision {
            FetchDecision::Cancelled => {
                tracing::debug!("attribution lookup abandoned during shutdown");
            }
            FetchDecision::Finished(Err(err)) => {
                tracing::error!(error = %format!("{err:#}"), "failed to get attribution");
                self.telemetry.record_lookup_failure();
            }
            FetchDecision::Finished(Ok(envelope)) => {
                self.state.last_url = Some(request.url);
                match envelope {
                    ResponseEnvelope::Attribution(_) => self.handle_response(envelope),
                    other => {
                        tracing::debug!(
                            kind = ?other.kind(),
                            "discarding non-attribution response to attribution lookup"
                        );
                        self.telemetry.record_discarded_response();
                    }
                }
            }
        }
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            paused: self.state.paused,
            has_listener: self.state.has_listener,
            pending_fire_in: self.timer.is_armed().then(|| self.timer.fire_in()),
            last_url: self.state.last_url.clone(),
        }
    }
}
