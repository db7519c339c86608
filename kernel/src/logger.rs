//! Serial console logger.

use core::fmt::Write;

use conquer_once::spin::OnceCell;
use log::{Level, Log, Metadata, Record};
use spin::Mutex;
use uart_16550::MmioSerialPort;

use crate::arch;
use crate::config;

static SERIAL: OnceCell<Mutex<MmioSerialPort>> = OnceCell::uninit();
static LOGGER: SerialLogger = SerialLogger;

/// Sets up the UART and installs the serial logger.
///
/// Called by the boot hart only, before any secondary hart is let go.
pub fn init() {
    SERIAL.init_once(|| {
        // SAFETY: UART_BASE is the MMIO base of the platform UART and nothing
        // else drives it.
        let mut port = unsafe { MmioSerialPort::new(config::UART_BASE) };
        port.init();
        Mutex::new(port)
    });

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(config::LOG_LEVEL);
    }
}

struct SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(serial) = SERIAL.get() else {
            return;
        };

        let color = match record.level() {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[90m",
        };
        let mut serial = serial.lock();
        let _ = writeln!(
            serial,
            "{color}{:5}\x1b[0m [hart {}] {}: {}",
            record.level(),
            arch::hart_id(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
