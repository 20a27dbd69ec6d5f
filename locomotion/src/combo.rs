//! Punch combo counter with a cancellable reset.
//!
//! The reset is an armed deadline, not a sleeping task: whoever drives the controller
//! polls it with the current time. Arming again cancels the previous deadline, so the
//! window always counts from the latest punch.

/// Highest combo step before wrapping back to 1.
pub const MAX_COMBO: u8 = 3;

/// Identifies one arming of a `ResetTimer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelToken(u64);

/// Single-shot deadline that can be cancelled and re-armed.
#[derive(Clone, Debug, Default)]
pub struct ResetTimer {
    deadline: Option<f64>,
    generation: u64,
}

impl ResetTimer {
    /// Arm (or re-arm) the timer to fire at `now + interval`.
    pub fn arm(&mut self, now: f64, interval: f64) -> CancelToken {
        self.generation += 1;
        self.deadline = Some(now + interval);
        CancelToken(self.generation)
    }

    /// Cancel whatever is pending. Safe to call when nothing is.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Cancel only if `token` is still the current arming.
    pub fn cancel_token(&mut self, token: CancelToken) -> bool {
        token.0 == self.generation && self.cancel()
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ComboState {
    count: u8,
    interval: f64,
    timer: ResetTimer,
    pending: Option<CancelToken>,
}

impl ComboState {
    pub fn new(reset_interval: f32) -> Self {
        Self {
            count: 0,
            interval: f64::from(reset_interval),
            timer: ResetTimer::default(),
            pending: None,
        }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    /// Count one accepted punch and restart the reset window from `now`.
    pub fn advance(&mut self, now: f64) -> u8 {
        self.count = if self.count >= MAX_COMBO {
            1
        } else {
            self.count + 1
        };
        self.rearm(now);
        self.count
    }

    /// Cancel the pending reset and start a fresh window from `now`.
    pub fn rearm(&mut self, now: f64) -> CancelToken {
        if let Some(token) = self.pending.take() {
            self.timer.cancel_token(token);
        }
        let token = self.timer.arm(now, self.interval);
        self.pending = Some(token);
        token
    }

    /// Drop the counter to zero if the window has elapsed. True when that happened.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.timer.poll(now) {
            self.count = 0;
            self.pending = None;
            true
        } else {
            false
        }
    }
}
