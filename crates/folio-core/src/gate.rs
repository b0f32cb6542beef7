//! Input suppression after state-changing actions.
//!
//! Remote receivers often repeat a signal right after the action it caused.
//! Every routed input is checked against the gate before dispatch, and
//! suppressed inputs are dropped without any side effect.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub struct InputGate {
    suppress_until: Option<Instant>,
}

impl InputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self, now: Instant) -> bool {
        self.suppress_until.is_some_and(|until| now < until)
    }

    /// Suppress input until `now + duration`.
    ///
    /// Re-arming always resets the window, even to an earlier deadline.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.suppress_until = Some(now + duration);
    }
}
