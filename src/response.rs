//! Server response model: the attribution payload, the tagged response
//! envelope produced by the transport, and the classifier that decides between
//! "ask again later" and a final answer.

pub mod attribution;
pub mod classifier;
pub mod envelope;

pub use attribution::Attribution;
pub use classifier::{classify, Classification};
pub use envelope::{ResponseData, ResponseEnvelope, ResponseKind};
