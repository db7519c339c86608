//! Power-off through the SiFive test finisher of the QEMU `virt` machine.

use core::ptr::NonNull;

use volatile::VolatilePtr;

use crate::config;

const FINISHER_FAIL: u32 = 0x3333;

/// Powers the machine off, reporting `code` as the exit status.
pub fn fail(code: u16) -> ! {
    finish(FINISHER_FAIL | (u32::from(code) << 16))
}

fn finish(value: u32) -> ! {
    // SAFETY: TEST_FINISHER_BASE is the MMIO address of the test finisher,
    // which accepts 32-bit writes.
    let finisher = unsafe {
        VolatilePtr::new(NonNull::new_unchecked(
            config::TEST_FINISHER_BASE as *mut u32,
        ))
    };
    finisher.write(value);

    // If the finisher is missing, stop here
    loop {
        // SAFETY: Safe to wait for interrupt in infinite loop.
        unsafe {
            riscv::asm::wfi();
        }
    }
}
