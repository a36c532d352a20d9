//! Outbound lookup plumbing: the immutable request descriptor, just-in-time
//! URL construction, and the transport seam with its reqwest implementation.

pub mod client;
pub mod descriptor;
pub mod options;

pub use client::{AttributionTransport, HttpTransport, TransportError};
pub use descriptor::{format_sent_at, AttributionRequestDescriptor, LookupRequest};
pub use options::TransportOptions;
