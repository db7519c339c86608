use core::arch::asm;

use kernel_hartsync::{HartControl, PayloadDestination};
use log::error;
use riscv::register::mhartid;
use riscv::register::mtvec::{self, TrapMode};

/// Id of the hart executing this.
pub fn hart_id() -> usize {
    mhartid::read()
}

/// Machine-mode control of the current hart.
pub struct MachineHart {
    hart_id: usize,
}

impl MachineHart {
    pub fn current() -> Self {
        Self { hart_id: hart_id() }
    }
}

impl HartControl for MachineHart {
    fn hart_id(&self) -> usize {
        self.hart_id
    }

    fn set_trap_target(&mut self, target: PayloadDestination) {
        debug_assert!(target.is_aligned(4), "mtvec base must be 4-byte aligned");
        // SAFETY: interrupts are disabled since reset, so the only trap that
        // can reach the new vector is the one raised by `trap_now`.
        unsafe { mtvec::write(target.as_usize(), TrapMode::Direct) };
    }

    fn trap_now(&mut self, arg0: usize, arg1: usize) -> ! {
        // SAFETY: mtvec points at the relocated payload, which takes over this
        // hart with a0/a1 as its arguments.
        unsafe {
            asm!(
                "unimp",
                in("a0") arg0,
                in("a1") arg1,
                options(nostack),
            );
        }

        error!(
            "hart {}: trap returned instead of entering the payload",
            self.hart_id
        );
        self.park()
    }

    fn park(&mut self) -> ! {
        loop {
            // SAFETY: waiting for an interrupt has no side effects here.
            unsafe { riscv::asm::wfi() };
        }
    }
}
