//! Cancellable schedulers driven by the UI loop.
//!
//! Neither type reads the clock: the loop measures elapsed time and feeds it
//! in through `advance`, which keeps both deterministic under test.

use std::time::Duration;

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Repeating one-second tick source for the session countdown
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    active: bool,
    accumulated: Duration,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.active = true;
        self.accumulated = Duration::ZERO;
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.accumulated = Duration::ZERO;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of whole seconds that elapsed; zero while cancelled.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.active {
            return 0;
        }
        self.accumulated += elapsed;
        let mut fired = 0;
        while self.accumulated >= ONE_SECOND {
            self.accumulated -= ONE_SECOND;
            fired += 1;
        }
        fired
    }
}

/// One-shot pause between answer feedback and the next problem
#[derive(Debug, Clone)]
pub struct SettleDelay {
    delay: Duration,
    remaining: Option<Duration>,
}

impl SettleDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            remaining: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the delay, replacing any pending one
    pub fn schedule(&mut self) {
        self.remaining = Some(self.delay);
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }

    /// True exactly once, when the delay runs out.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        match self.remaining {
            Some(left) if elapsed >= left => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - elapsed);
                false
            }
            None => false,
        }
    }
}
