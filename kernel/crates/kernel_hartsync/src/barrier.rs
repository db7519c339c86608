//! One-shot check-in barrier shared by every hart.
//!
//! Each hart moves through `STARTED -> CHECKED_IN -> RELEASED`. The states are
//! carried by tokens: [`HartBarrier::checkin`] hands out a [`CheckedIn`], and
//! only that token can be exchanged for a [`Released`], which in turn is what
//! [`handoff`](crate::handoff) requires.

use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicUsize, Ordering};

use log::trace;

use crate::error::Stalled;
use crate::lock::BootLock;
use crate::poll::{PollStrategy, Spin};

/// Total number of harts taking part in the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HartCount(NonZeroUsize);

impl HartCount {
    /// A lone hart.
    pub const MIN: Self = Self(NonZeroUsize::MIN);

    pub const fn new(count: usize) -> Option<Self> {
        match NonZeroUsize::new(count) {
            Some(count) => Some(Self(count)),
            None => None,
        }
    }

    /// `count` limited to `1..=max`, for harts that only have room for `max`.
    pub fn capped(count: usize, max: usize) -> Self {
        Self::new(count.clamp(1, max.max(1))).unwrap_or(Self::MIN)
    }

    pub const fn get(self) -> usize {
        self.0.get()
    }
}

/// Proof that the boot lock is held. Gives the lock back when dropped.
struct Held<'a, L: BootLock>(&'a L);

impl<'a, L: BootLock> Held<'a, L> {
    fn take(lock: &'a L) -> Self {
        lock.take();
        Self(lock)
    }
}

impl<L: BootLock> Drop for Held<'_, L> {
    fn drop(&mut self) {
        self.0.give();
    }
}

/// Number of harts that have checked in.
///
/// Writes need a [`Held`] proof. Reads are lock-free; a stale read only costs
/// another spin iteration because the value never decreases.
struct CheckinCounter(AtomicUsize);

impl CheckinCounter {
    const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    fn current<L: BootLock>(&self, _held: &Held<'_, L>) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn increment<L: BootLock>(&self, _held: &Held<'_, L>) -> usize {
        let next = self.0.load(Ordering::Relaxed) + 1;
        self.0.store(next, Ordering::Release);
        next
    }

    fn observe(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// A hart that has checked in and may wait for release.
#[derive(Debug)]
#[must_use = "a checked-in hart must wait for release"]
pub struct CheckedIn {
    ticket: usize,
    hart_count: HartCount,
}

impl CheckedIn {
    /// Counter value right after this hart's increment.
    pub fn ticket(&self) -> usize {
        self.ticket
    }

    pub fn hart_count(&self) -> HartCount {
        self.hart_count
    }
}

/// A hart that observed every hart checked in.
#[derive(Debug)]
#[must_use = "a released hart should hand off to the payload"]
pub struct Released {
    hart_count: HartCount,
}

impl Released {
    pub fn hart_count(&self) -> HartCount {
        self.hart_count
    }

    #[cfg(test)]
    pub(crate) fn for_test(hart_count: HartCount) -> Self {
        Self { hart_count }
    }
}

/// The barrier itself: a boot lock and the counter it guards.
pub struct HartBarrier<L: BootLock> {
    lock: L,
    counter: CheckinCounter,
}

impl<L: BootLock> HartBarrier<L> {
    /// Wraps `lock` into a barrier.
    ///
    /// Precondition for every other method: `lock` was initialized and that
    /// initialization was published with a release fence before any hart
    /// calls in. [`BootMonitor`](crate::BootMonitor) only hands out the barrier
    /// once this holds.
    pub(crate) const fn new(lock: L) -> Self {
        Self {
            lock,
            counter: CheckinCounter::new(),
        }
    }

    pub(crate) fn lock(&self) -> &L {
        &self.lock
    }

    /// Registers the calling hart. Must be called exactly once per hart.
    ///
    /// # Panics
    /// If more than `hart_count` check-ins happen, which means some hart
    /// checked in twice or the harts disagree on the hart count.
    pub fn checkin(&self, hart_count: HartCount) -> CheckedIn {
        let ticket = {
            let held = Held::take(&self.lock);
            let arrived = self.counter.current(&held);
            // the counter stays at or below the hart count even on misuse
            assert!(
                arrived < hart_count.get(),
                "check-in {} exceeds hart count {}",
                arrived + 1,
                hart_count.get()
            );
            self.counter.increment(&held)
        };
        trace!("hart checked in ({ticket}/{})", hart_count.get());
        CheckedIn { ticket, hart_count }
    }

    /// Spins until every hart has checked in.
    ///
    /// There is no timeout: a hart that never checks in stalls the caller
    /// forever.
    pub fn wait_for_release(&self, checked_in: CheckedIn) -> Released {
        match self.wait_for_release_with(checked_in, &mut Spin) {
            Ok(released) => released,
            Err(_) => unreachable!("spin polling never gives up"),
        }
    }

    /// Like [`wait_for_release`](Self::wait_for_release), but lets `poll`
    /// decide when to give up.
    pub fn wait_for_release_with<P: PollStrategy>(
        &self,
        checked_in: CheckedIn,
        poll: &mut P,
    ) -> Result<Released, Stalled> {
        let expected = checked_in.hart_count.get();
        loop {
            let observed = self.counter.observe();
            debug_assert!(observed <= expected);
            if observed == expected {
                return Ok(Released {
                    hart_count: checked_in.hart_count,
                });
            }
            if !poll.pause() {
                return Err(Stalled {
                    token: checked_in,
                    observed,
                    expected,
                });
            }
        }
    }

    /// Number of harts checked in so far.
    pub fn arrivals(&self) -> usize {
        self.counter.observe()
    }
}
