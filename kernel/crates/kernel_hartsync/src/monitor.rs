//! Process-wide boot state and its one-shot initialization.

use core::convert::Infallible;
use core::sync::atomic::{Ordering, fence};

use log::{debug, info};
use spin::Once;

use crate::barrier::{HartBarrier, HartCount};
use crate::error::{BarrierError, InitError};
use crate::handoff::{EntryArgs, HandoffPolicy, HartControl, handoff};
use crate::lock::BootLock;
use crate::payload::PayloadImage;
use crate::relocate::{PayloadRegion, Relocation, plan, relocate};

/// Everything the harts share during boot.
///
/// Lives in a `static`. The barrier inside is only reachable after
/// [`initialize_once`](Self::initialize_once) succeeded.
pub struct BootMonitor<L: BootLock> {
    barrier: HartBarrier<L>,
    relocation: Once<Relocation>,
}

impl<L: BootLock> BootMonitor<L> {
    pub const fn new(lock: L) -> Self {
        Self {
            barrier: HartBarrier::new(lock),
            relocation: Once::new(),
        }
    }

    /// Initializes the boot lock, publishes it and relocates the payload.
    ///
    /// Must be called by the designated boot hart before any hart touches the
    /// barrier. Later calls return the first relocation without copying again.
    /// A failure leaves the monitor uninitialized and is meant to end the boot.
    /// A rejected payload is detected before the lock is initialized, so a
    /// retry reports the relocation error again.
    pub fn initialize_once(
        &self,
        image: PayloadImage<'_>,
        region: &mut impl PayloadRegion,
    ) -> Result<&Relocation, InitError> {
        if let Some(relocation) = self.relocation.get() {
            debug!("boot monitor already initialized");
            return Ok(relocation);
        }

        self.relocation.try_call_once(|| {
            // a payload that cannot be placed must not consume the lock init
            plan(image, &*region)?;
            self.barrier.lock().init().map_err(InitError::Lock)?;

            // Release: the lock initialization above must be visible to every
            // hart that takes the lock later.
            fence(Ordering::Release);

            let relocation = relocate(image, region)?;
            info!("payload relocated: {relocation}");
            Ok(relocation)
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.relocation.is_completed()
    }

    pub fn relocation(&self) -> Option<&Relocation> {
        self.relocation.get()
    }

    /// The barrier, once the boot lock is initialized and published.
    pub fn barrier(&self) -> Result<&HartBarrier<L>, BarrierError> {
        if self.is_initialized() {
            Ok(&self.barrier)
        } else {
            Err(BarrierError::NotInitialized)
        }
    }

    /// Runs the per-hart sequence: check in, wait for every hart, then hand
    /// off to the payload or park, as `policy` decides.
    ///
    /// Only returns if the monitor was never initialized.
    pub fn run_hart<C: HartControl>(
        &self,
        control: &mut C,
        hart_count: HartCount,
        args: EntryArgs,
        policy: HandoffPolicy,
    ) -> Result<Infallible, BarrierError> {
        let barrier = self.barrier()?;
        let relocation = self.relocation().ok_or(BarrierError::NotInitialized)?;

        let checked_in = barrier.checkin(hart_count);
        let released = barrier.wait_for_release(checked_in);
        info!("hart {}: loading done", control.hart_id());

        if !policy.admits(control.hart_id()) {
            debug!("hart {} not selected for handoff, parking", control.hart_id());
            control.park();
        }
        handoff(released, control, relocation.destination, args)
    }
}
