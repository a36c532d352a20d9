use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Counters describing what the coordinator did with each lookup cycle.
#[derive(Default, Debug)]
pub struct CoordinatorTelemetry {
    lookups_requested: AtomicU64,
    lookups_debounced: AtomicU64,
    lookups_issued: AtomicU64,
    lookup_failures: AtomicU64,
    reschedules: AtomicU64,
    deliveries: AtomicU64,
    paused_fires: AtomicU64,
    discarded_responses: AtomicU64,
}

impl CoordinatorTelemetry {
    pub fn record_lookup_requested(&self) {
        self.lookups_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_debounced(&self) {
        self.lookups_debounced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_issued(&self) {
        self.lookups_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reschedule(&self) {
        self.reschedules.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_paused_fire(&self) {
        self.paused_fires.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded_response(&self) {
        self.discarded_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lookups_issued(&self) -> u64 {
        self.lookups_issued.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            lookups_requested: self.lookups_requested.load(Ordering::Relaxed),
            lookups_debounced: self.lookups_debounced.load(Ordering::Relaxed),
            lookups_issued: self.lookups_issued.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
            reschedules: self.reschedules.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            paused_fires: self.paused_fires.load(Ordering::Relaxed),
            discarded_responses: self.discarded_responses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub lookups_requested: u64,
    pub lookups_debounced: u64,
    pub lookups_issued: u64,
    pub lookup_failures: u64,
    pub reschedules: u64,
    pub deliveries: u64,
    pub paused_fires: u64,
    pub discarded_responses: u64,
}
