//! Transfer of a released hart into the payload.

use log::debug;

use crate::barrier::Released;
use crate::payload::PayloadDestination;

/// Per-hart control over the trap vector and the trap itself.
///
/// Implementations own every register access; nothing above this trait
/// touches a CSR directly.
pub trait HartControl {
    /// Identifier of the hart this handle controls.
    fn hart_id(&self) -> usize;

    /// Points this hart's trap vector at `target`.
    ///
    /// The write must take effect before the next trap on this hart.
    fn set_trap_target(&mut self, target: PayloadDestination);

    /// Raises a synchronous trap with `arg0` and `arg1` in the first two
    /// argument registers.
    fn trap_now(&mut self, arg0: usize, arg1: usize) -> !;

    /// Stops this hart for good. Used for harts that do not enter the payload.
    fn park(&mut self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Values placed in the payload's argument registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EntryArgs {
    /// Goes to `a0`.
    pub hart_id: usize,
    /// Goes to `a1`, usually a device tree pointer.
    pub boot_metadata: usize,
}

impl EntryArgs {
    pub const fn zeroed() -> Self {
        Self {
            hart_id: 0,
            boot_metadata: 0,
        }
    }

    pub const fn new(hart_id: usize, boot_metadata: usize) -> Self {
        Self {
            hart_id,
            boot_metadata,
        }
    }
}

/// Selects the released harts that trap into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffPolicy {
    mask: u64,
}

impl HandoffPolicy {
    /// Every hart enters the payload.
    pub const fn all() -> Self {
        Self { mask: u64::MAX }
    }

    /// Harts whose bit is set in `mask` enter the payload.
    pub const fn from_mask(mask: u64) -> Self {
        Self { mask }
    }

    pub const fn admits(&self, hart_id: usize) -> bool {
        if hart_id >= u64::BITS as usize {
            return self.mask == u64::MAX;
        }
        self.mask & (1 << hart_id) != 0
    }
}

impl Default for HandoffPolicy {
    fn default() -> Self {
        Self::all()
    }
}

/// Points the trap vector at `destination` and traps into it.
///
/// Taking [`Released`] means this can only run after the barrier fired, and
/// therefore after the payload was relocated.
pub fn handoff<C: HartControl>(
    _released: Released,
    control: &mut C,
    destination: PayloadDestination,
    args: EntryArgs,
) -> ! {
    debug!(
        "hart {} entering payload at {destination} ({args:?})",
        control.hart_id()
    );
    control.set_trap_target(destination);
    control.trap_now(args.hart_id, args.boot_metadata)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::boxed::Box;
    use std::panic::{self, AssertUnwindSafe};

    use super::*;

    /// Register state recorded when the mock hart traps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Trapped {
        pub hart_id: usize,
        pub trap_target: Option<PayloadDestination>,
        pub a0: usize,
        pub a1: usize,
    }

    /// Hart that unwinds with [`Trapped`] instead of jumping.
    pub(crate) struct MockHart {
        pub hart_id: usize,
        pub trap_target: Option<PayloadDestination>,
    }

    impl MockHart {
        pub fn new(hart_id: usize) -> Self {
            Self {
                hart_id,
                trap_target: None,
            }
        }
    }

    impl HartControl for MockHart {
        fn hart_id(&self) -> usize {
            self.hart_id
        }

        fn set_trap_target(&mut self, target: PayloadDestination) {
            self.trap_target = Some(target);
        }

        fn trap_now(&mut self, arg0: usize, arg1: usize) -> ! {
            panic::resume_unwind(Box::new(Trapped {
                hart_id: self.hart_id,
                trap_target: self.trap_target,
                a0: arg0,
                a1: arg1,
            }))
        }

        fn park(&mut self) -> ! {
            panic::resume_unwind(Box::new(Parked(self.hart_id)))
        }
    }

    /// Unwind payload of a mock hart that parked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct Parked(pub usize);

    /// Runs `f` and returns what the mock hart recorded when it trapped.
    pub(crate) fn catch_trap(f: impl FnOnce()) -> Trapped {
        let payload = panic::catch_unwind(AssertUnwindSafe(|| {
            f();
        }))
        .unwrap_err();
        *payload
            .downcast::<Trapped>()
            .expect("hart panicked instead of trapping")
    }

    #[test]
    fn sets_vector_then_traps() {
        use crate::barrier::HartCount;

        let dest = PayloadDestination::new(0x6000_0000);
        let released = Released::for_test(HartCount::new(1).unwrap());
        let mut hart = MockHart::new(0);

        let trapped = catch_trap(|| handoff(released, &mut hart, dest, EntryArgs::zeroed()));
        assert_eq!(
            Trapped {
                hart_id: 0,
                trap_target: Some(dest),
                a0: 0,
                a1: 0,
            },
            trapped
        );
    }

    #[test]
    fn passes_entry_args() {
        use crate::barrier::HartCount;

        let dest = PayloadDestination::new(0x6000_0000);
        let released = Released::for_test(HartCount::new(2).unwrap());
        let mut hart = MockHart::new(1);

        let args = EntryArgs::new(1, 0x8220_0000);
        let trapped = catch_trap(|| handoff(released, &mut hart, dest, args));
        assert_eq!(1, trapped.a0);
        assert_eq!(0x8220_0000, trapped.a1);
    }

    #[test]
    fn policy_masks() {
        let all = HandoffPolicy::all();
        assert!(all.admits(0));
        assert!(all.admits(63));
        assert!(all.admits(200));

        let boot_only = HandoffPolicy::from_mask(0b1);
        assert!(boot_only.admits(0));
        assert!(!boot_only.admits(1));
        assert!(!boot_only.admits(64));

        let odd = HandoffPolicy::from_mask(0b1010);
        assert!(!odd.admits(0));
        assert!(odd.admits(1));
        assert!(!odd.admits(2));
        assert!(odd.admits(3));
    }
}
