//! Single-shot, re-armable delay used to debounce attribution lookups.
//!
//! The timer itself never spawns anything: it only records the armed deadline.
//! The coordinator worker races [`wait_for_deadline`] against its command queue,
//! so a fire is always handled on the same task that owns the coordinator state.

use std::future::pending;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Stand-in deadline for delays too large to represent as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug)]
pub struct DebounceTimer {
    name: &'static str,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            deadline: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Arms the timer to fire `delay` from now, replacing any pending arm.
    pub fn start_in(&mut self, delay: Duration) {
        if let Some(previous) = self.deadline {
            tracing::trace!(
                timer = self.name,
                replaced_in_ms = millis(previous.saturating_duration_since(Instant::now())),
                "replacing pending timer arm"
            );
        }
        self.deadline = Some(deadline_after(delay));
        tracing::trace!(timer = self.name, delay_ms = millis(delay), "timer armed");
    }

    /// Remaining time until the pending arm fires, `Duration::ZERO` when idle.
    pub fn fire_in(&self) -> Duration {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Clears the arm if its deadline has passed. Returns `true` exactly once per arm.
    pub(crate) fn take_expired(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Resolves once `deadline` is reached; never resolves for an idle timer.
pub(crate) async fn wait_for_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}
