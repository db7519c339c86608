//! Boot lock contract and the spinning implementation used on bare metal.

use core::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

use crate::error::LockError;

/// A mutual-exclusion primitive with a separate initialization step.
///
/// Implementations must give acquire semantics on [`take`](BootLock::take) and
/// release semantics on [`give`](BootLock::give). Publishing the effects of
/// [`init`](BootLock::init) to other harts is the caller's job, see
/// [`BootMonitor::initialize_once`](crate::BootMonitor::initialize_once).
pub trait BootLock: Sync {
    /// Prepares the lock for use. Called exactly once per boot.
    fn init(&self) -> Result<(), LockError>;

    /// Blocks until this hart holds the lock.
    fn take(&self);

    /// Releases a lock previously obtained with [`take`](BootLock::take).
    fn give(&self);
}

/// Boot lock backed by a [`spin::Mutex`].
///
/// The guard is not kept around, so `take` and `give` can be called from
/// separate places the same way a platform lock is used.
pub struct SpinBootLock {
    inner: Mutex<()>,
    initialized: AtomicBool,
}

impl SpinBootLock {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        self.inner.is_locked()
    }
}

impl Default for SpinBootLock {
    fn default() -> Self {
        Self::new()
    }
}

impl BootLock for SpinBootLock {
    fn init(&self) -> Result<(), LockError> {
        // Relaxed: visibility to other harts comes from the caller's release fence.
        self.initialized
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| LockError::AlreadyInitialized)
    }

    fn take(&self) {
        debug_assert!(self.is_initialized(), "boot lock taken before init");
        core::mem::forget(self.inner.lock());
    }

    fn give(&self) {
        debug_assert!(self.inner.is_locked(), "boot lock given while not held");
        // SAFETY: the guard leaked by `take` on this hart is the only
        // outstanding one, so releasing it here ends that critical section.
        unsafe { self.inner.force_unlock() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_only_once() {
        let lock = SpinBootLock::new();
        assert!(!lock.is_initialized());
        assert_eq!(Ok(()), lock.init());
        assert!(lock.is_initialized());
        assert_eq!(Err(LockError::AlreadyInitialized), lock.init());
    }

    #[test]
    fn take_give_roundtrip() {
        let lock = SpinBootLock::new();
        lock.init().unwrap();

        lock.take();
        assert!(lock.is_held());
        lock.give();
        assert!(!lock.is_held());

        // usable again after release
        lock.take();
        lock.give();
    }

    #[test]
    fn excludes_other_threads() {
        use std::sync::atomic::AtomicUsize;
        use std::thread;

        let lock = SpinBootLock::new();
        lock.init().unwrap();
        let value = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        lock.take();
                        // non-atomic read-modify-write, only correct under the lock
                        let v = value.load(Ordering::Relaxed);
                        value.store(v + 1, Ordering::Relaxed);
                        lock.give();
                    }
                });
            }
        });

        assert_eq!(4000, value.load(Ordering::Relaxed));
    }
}
