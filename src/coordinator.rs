//! Attribution coordinator split across focused submodules:
//! - `activity`: the external activity state the coordinator reports to
//! - `types`: construction params, worker commands and snapshots
//! - `handle`: the cloneable public handle callable from any thread
//! - `worker`: the single task that owns all mutable state and the timer
//! - `tests`: coordinator behaviour under a paused clock

mod activity;
mod handle;
mod types;
mod worker;


pub use activity::ActivityHandler;
pub use handle::AttributionCoordinator;
pub use types::{CoordinatorParams, CoordinatorSnapshot};
