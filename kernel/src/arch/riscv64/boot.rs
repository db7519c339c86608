use core::arch::global_asm;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::{BOOT_HART_ID, HART_STACK_SIZE, MAX_HARTS};

/// Stacks for every hart, indexed by hart id. Lives in `.bss`.
#[repr(C, align(16))]
struct HartStacks([[u8; HART_STACK_SIZE]; MAX_HARTS]);

static mut HART_STACKS: HartStacks = HartStacks([[0; HART_STACK_SIZE]; MAX_HARTS]);

/// Secondary harts spin on this word until the boot hart has initialized the
/// boot monitor. It lives in `.data` so the boot hart clearing `.bss` cannot
/// race with the secondaries reading it.
#[unsafe(link_section = ".data.boot_gate")]
static BOOT_GATE: AtomicU32 = AtomicU32::new(0);

// Reset entry for every hart: a0 = hart id, a1 = device tree pointer.
// The boot hart clears .bss and initializes, all other harts wait at the gate.
global_asm!(
    ".section .text.entry",
    ".globl _start",
    "_start:",
    "    csrw mie, zero",
    "    csrr t0, mhartid",
    "    li t1, {max_harts}",
    "    bgeu t0, t1, 9f",
    ".option push",
    ".option norelax",
    "    la gp, __global_pointer$",
    ".option pop",
    // sp = HART_STACKS + (hart id + 1) * HART_STACK_SIZE
    "    la sp, {stacks}",
    "    li t1, {stack_size}",
    "    addi t2, t0, 1",
    "    mul t2, t2, t1",
    "    add sp, sp, t2",
    "    mv a0, t0",
    "    li t1, {boot_hart}",
    "    bne t0, t1, 3f",
    "    la t3, __bss_start",
    "    la t4, __bss_end",
    "1:  bgeu t3, t4, 2f",
    "    sd zero, 0(t3)",
    "    addi t3, t3, 8",
    "    j 1b",
    "2:  call {boot}",
    "3:  la t3, {gate}",
    "4:  lw t4, 0(t3)",
    "    beqz t4, 4b",
    "    fence r, rw",
    "    call {secondary}",
    "9:  wfi",
    "    j 9b",
    max_harts = const MAX_HARTS,
    boot_hart = const BOOT_HART_ID,
    stack_size = const HART_STACK_SIZE,
    stacks = sym HART_STACKS,
    gate = sym BOOT_GATE,
    boot = sym boot_hart_entry,
    secondary = sym secondary_hart_entry,
);

/// Lets the secondary harts leave the reset gate.
///
/// Everything the boot hart wrote before this call is visible to them.
pub fn open_boot_gate() {
    BOOT_GATE.store(1, Ordering::Release);
}

/// Rust entry of the boot hart (called from assembly).
///
/// # Safety
/// Called once, by the boot hart, with `.bss` cleared and a valid stack.
unsafe extern "C" fn boot_hart_entry(hart_id: usize, dtb_addr: usize) -> ! {
    crate::boot_main(hart_id, dtb_addr)
}

/// Rust entry of the secondary harts (called from assembly).
///
/// # Safety
/// Called after the boot gate opened, with a valid per-hart stack.
unsafe extern "C" fn secondary_hart_entry(hart_id: usize, dtb_addr: usize) -> ! {
    crate::hart_main(hart_id, dtb_addr)
}
