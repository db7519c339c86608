#![no_std]
#![no_main]

#[cfg(not(target_arch = "riscv64"))]
compile_error!("hartboot only runs on riscv64 in machine mode");

use core::panic::PanicInfo;

use conquer_once::spin::OnceCell;
use kernel_hartsync::{BootMonitor, EntryArgs, HartCount, PhysicalRegion, SpinBootLock};
use log::{error, info};

mod arch;
mod config;
mod logger;

static MONITOR: BootMonitor<SpinBootLock> = BootMonitor::new(SpinBootLock::new());

/// Fixed by the boot hart before the gate opens, read by every hart.
static HART_COUNT: OnceCell<HartCount> = OnceCell::uninit();

/// Boot hart: bring up logging, relocate the payload, let the other harts go,
/// then join them at the barrier.
pub(crate) fn boot_main(hart_id: usize, dtb_addr: usize) -> ! {
    logger::init();
    info!("hartboot");
    info!("========");

    let hart_count = arch::hart_count(dtb_addr);
    HART_COUNT.init_once(|| hart_count);
    info!("{} harts, boot hart {hart_id}", hart_count.get());

    // SAFETY: the payload region is RAM reserved for the payload and only
    // the boot hart touches it until handoff.
    let mut region =
        unsafe { PhysicalRegion::new(config::payload_dest(), config::PAYLOAD_REGION_SIZE) };
    if let Err(e) = MONITOR.initialize_once(arch::payload_image(), &mut region) {
        error!("boot monitor initialization failed: {e}");
        if let Some(source) = core::error::Error::source(&e) {
            error!("caused by: {source}");
        }
        arch::shutdown::fail(1);
    }

    arch::open_boot_gate();
    hart_main(hart_id, dtb_addr)
}

/// Every hart: check in, wait for the others and enter the payload.
pub(crate) fn hart_main(hart_id: usize, dtb_addr: usize) -> ! {
    let Some(&hart_count) = HART_COUNT.get() else {
        error!("hart {hart_id} started before the hart count was known");
        arch::shutdown::fail(2);
    };

    let args = if cfg!(feature = "entry-args") {
        EntryArgs::new(hart_id, dtb_addr)
    } else {
        EntryArgs::zeroed()
    };

    let mut hart = arch::MachineHart::current();
    match MONITOR.run_hart(&mut hart, hart_count, args, config::HANDOFF_POLICY) {
        Ok(never) => match never {},
        Err(e) => {
            error!("hart {hart_id}: {e}");
            arch::shutdown::fail(2);
        }
    }
}

#[panic_handler]
fn rust_panic(info: &PanicInfo) -> ! {
    error!("PANIC!");
    if let Some(location) = info.location() {
        error!(
            "Panicked at {}:{}:{}",
            location.file(),
            location.line(),
            location.column(),
        );
    }
    error!("{}", info.message());

    arch::shutdown::fail(3)
}
