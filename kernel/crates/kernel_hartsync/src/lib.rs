//! Multi-hart boot synchronization and payload handoff.
//!
//! Every hart runs the same sequence after reset:
//!
//! 1. The boot hart calls [`BootMonitor::initialize_once`], which initializes
//!    the boot lock, publishes it with a release fence and copies the payload
//!    image to its execution address.
//! 2. Every hart (the boot hart included) checks in at the [`HartBarrier`] and
//!    spins until all harts have checked in.
//! 3. Every released hart points its trap vector at the payload and traps
//!    into it through [`handoff`].
//!
//! # Example
//!
//! ```ignore
//! static MONITOR: BootMonitor<SpinBootLock> = BootMonitor::new(SpinBootLock::new());
//!
//! // boot hart only
//! MONITOR.initialize_once(image, &mut region)?;
//!
//! // every hart
//! MONITOR.run_hart(&mut control, hart_count, EntryArgs::zeroed(), HandoffPolicy::all())
//! ```
#![no_std]

#[cfg(test)]
extern crate std;

mod barrier;
mod error;
mod handoff;
mod lock;
mod monitor;
mod payload;
mod poll;
mod relocate;

pub use barrier::{CheckedIn, HartBarrier, HartCount, Released};
pub use error::{BarrierError, InitError, LockError, RelocateError, Stalled};
pub use handoff::{EntryArgs, HandoffPolicy, HartControl, handoff};
pub use lock::{BootLock, SpinBootLock};
pub use monitor::BootMonitor;
pub use payload::{DEFAULT_PAYLOAD_DEST, PayloadDestination, PayloadImage};
pub use poll::{Bounded, PollStrategy, Spin};
pub use relocate::{PayloadRegion, PhysicalRegion, Relocation, plan, relocate};
