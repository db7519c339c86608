//! Polling strategies for the barrier spin.

/// Decides what a hart does each time it observes an unsatisfied barrier.
pub trait PollStrategy {
    /// Called once per unsatisfied observation. Returning `false` abandons the wait.
    fn pause(&mut self) -> bool;
}

/// Pure busy-wait. Never gives up.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl PollStrategy for Spin {
    #[inline]
    fn pause(&mut self) -> bool {
        core::hint::spin_loop();
        true
    }
}

/// Busy-wait that gives up after a fixed number of unsatisfied observations.
#[derive(Debug, Clone, Copy)]
pub struct Bounded {
    limit: usize,
    spent: usize,
}

impl Bounded {
    pub const fn new(limit: usize) -> Self {
        Self { limit, spent: 0 }
    }

    /// Number of pauses taken so far.
    pub fn spent(&self) -> usize {
        self.spent
    }

    pub fn is_exhausted(&self) -> bool {
        self.spent >= self.limit
    }
}

impl PollStrategy for Bounded {
    fn pause(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.spent += 1;
        core::hint::spin_loop();
        true
    }
}
