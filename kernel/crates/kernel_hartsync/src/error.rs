//! Boot protocol errors.

use crate::barrier::CheckedIn;

/// Errors reported by a [`BootLock`](crate::BootLock) implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// `init` was called on a lock that is already initialized.
    #[error("boot lock is already initialized")]
    AlreadyInitialized,

    /// The platform could not provide the lock.
    #[error("boot lock unavailable: {0}")]
    Unavailable(&'static str),
}

/// Errors raised while copying the payload to its execution address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RelocateError {
    /// The payload does not fit into the destination region.
    #[error("payload of {required} bytes does not fit into {capacity} byte destination")]
    DestinationTooSmall { required: usize, capacity: usize },

    /// Source and destination ranges overlap.
    #[error("payload source overlaps its destination")]
    Overlap,
}

/// Errors from the one-time initialization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// The boot lock could not be initialized. The barrier is unsound without it.
    #[error("failed to initialize boot lock")]
    Lock(#[source] LockError),

    /// The payload could not be relocated.
    #[error("failed to relocate payload")]
    Relocate(#[from] RelocateError),
}

/// Errors from barrier access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BarrierError {
    /// The barrier was accessed before [`BootMonitor::initialize_once`](crate::BootMonitor::initialize_once)
    /// completed.
    #[error("barrier used before the boot monitor was initialized")]
    NotInitialized,
}

/// A bounded wait gave up before every hart had checked in.
///
/// Carries the hart's check-in token so the wait can be resumed.
#[derive(Debug, thiserror::Error)]
#[error("barrier stalled with {observed} of {expected} harts checked in")]
pub struct Stalled {
    pub(crate) token: CheckedIn,
    pub observed: usize,
    pub expected: usize,
}

impl Stalled {
    /// Returns the check-in token to retry the wait with.
    pub fn into_checked_in(self) -> CheckedIn {
        self.token
    }
}
