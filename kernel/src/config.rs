//! Platform constants for the QEMU `virt` machine.

use kernel_hartsync::{DEFAULT_PAYLOAD_DEST, HandoffPolicy, PayloadDestination};
use log::LevelFilter;

/// Where the payload is copied to and entered at.
///
/// `HARTBOOT_PAYLOAD_DEST` (hex, at build time) overrides the default, which
/// is not RAM on every board.
pub fn payload_dest() -> PayloadDestination {
    option_env!("HARTBOOT_PAYLOAD_DEST")
        .and_then(PayloadDestination::from_hex)
        .unwrap_or(DEFAULT_PAYLOAD_DEST)
}

/// Bytes available at [`payload_dest`].
pub const PAYLOAD_REGION_SIZE: usize = 0x1000_0000;

/// NS16550A compatible UART.
pub const UART_BASE: usize = 0x1000_0000;

/// SiFive test finisher, used to power off.
pub const TEST_FINISHER_BASE: usize = 0x10_0000;

/// Stack reserved for every hart.
pub const HART_STACK_SIZE: usize = 0x4000;

/// Harts with an id at or above this park at reset without a stack.
pub const MAX_HARTS: usize = 8;

/// Hart that initializes the monitor and opens the boot gate.
///
/// `HARTBOOT_BOOT_HART` (decimal, at build time) overrides it for platforms
/// without a hart 0 among the participating harts.
pub const BOOT_HART_ID: usize = match option_env!("HARTBOOT_BOOT_HART") {
    Some(id) => match usize::from_str_radix(id, 10) {
        Ok(id) => id,
        Err(_) => panic!("HARTBOOT_BOOT_HART is not a hart id"),
    },
    None => 0,
};

const _: () = assert!(BOOT_HART_ID < MAX_HARTS, "boot hart has no stack");

/// Hart count used when the device tree does not list any cpu.
pub fn fallback_hart_count() -> usize {
    option_env!("HARTBOOT_HART_COUNT")
        .and_then(|count| count.parse().ok())
        .unwrap_or(1)
}

/// Released harts that trap into the payload.
pub const HANDOFF_POLICY: HandoffPolicy = HandoffPolicy::all();

pub const LOG_LEVEL: LevelFilter = if cfg!(feature = "log-trace") {
    LevelFilter::Trace
} else if cfg!(feature = "log-debug") {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};
