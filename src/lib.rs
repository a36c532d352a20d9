pub mod coordinator;
pub mod response;
pub mod runtime;
pub mod timer;
pub mod transport;

pub use coordinator::{
    ActivityHandler, AttributionCoordinator, CoordinatorParams, CoordinatorSnapshot,
};
pub use response::{
    classify, Attribution, Classification, ResponseData, ResponseEnvelope, ResponseKind,
};
pub use runtime::config::{CoordinatorConfig, CoordinatorConfigBuilder, CoordinatorConfigParams};
pub use runtime::telemetry::{init_tracing, CoordinatorTelemetry, TelemetrySnapshot};
pub use timer::DebounceTimer;
pub use transport::{
    AttributionRequestDescriptor, AttributionTransport, HttpTransport, LookupRequest,
    TransportError, TransportOptions,
};
