use fdt::Fdt;
use kernel_hartsync::HartCount;
use log::{debug, warn};

use crate::config;

/// Number of harts taking part in the boot.
///
/// Counts the `cpu` nodes of the device tree at `dtb_addr` and falls back to
/// the configured count. Harts beyond [`config::MAX_HARTS`] are parked at
/// reset and never check in, so the result is capped there.
pub fn hart_count(dtb_addr: usize) -> HartCount {
    let discovered = if dtb_addr == 0 {
        None
    } else {
        // SAFETY: the previous boot stage passes a pointer to a valid device
        // tree in a1, and nothing writes to it during boot.
        match unsafe { Fdt::from_ptr(dtb_addr as *const u8) } {
            Ok(fdt) => Some(fdt.cpus().count()).filter(|&count| count > 0),
            Err(e) => {
                warn!("failed to parse device tree at 0x{dtb_addr:x}: {e:?}");
                None
            }
        }
    };

    let count = discovered.unwrap_or_else(|| {
        let fallback = config::fallback_hart_count();
        debug!("no cpus in device tree, assuming {fallback} harts");
        fallback
    });
    if count > config::MAX_HARTS {
        warn!(
            "{count} harts present, only {} take part in the boot",
            config::MAX_HARTS
        );
    }

    HartCount::capped(count, config::MAX_HARTS)
}
