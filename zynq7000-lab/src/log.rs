//! # Simple logging provider
//!
//! Both lab applications log their setup progress and failures through the [log] facade. This
//! module provides a blocking logger which writes to a [UartConsole].
use core::sync::atomic::AtomicBool;

static LOGGER_INIT_DONE: AtomicBool = AtomicBool::new(false);

/// Blocking UART logger.
pub mod uart_blocking {
    use super::*;
    use core::{cell::RefCell, fmt::Write as _};

    use critical_section::Mutex;
    use log::{LevelFilter, set_logger, set_max_level};

    use crate::uart::UartConsole;

    pub struct UartLoggerBlocking(Mutex<RefCell<Option<UartConsole>>>);

    static UART_LOGGER_BLOCKING: UartLoggerBlocking =
        UartLoggerBlocking(Mutex::new(RefCell::new(None)));

    /// Initialize the logger with a UART console.
    ///
    /// This is a blocking logger which performs a write inside a critical section, so interrupts
    /// are disabled while a record is written. Only the first call has an effect.
    pub fn init(console: UartConsole, level: LevelFilter) {
        if LOGGER_INIT_DONE.swap(true, core::sync::atomic::Ordering::Relaxed) {
            return;
        }
        critical_section::with(|cs| {
            UART_LOGGER_BLOCKING.0.borrow(cs).replace(Some(console));
        });
        // Fails only if another logger was installed by foreign code, which then keeps logging.
        if set_logger(&UART_LOGGER_BLOCKING).is_ok() {
            set_max_level(level);
        }
    }

    impl log::Log for UartLoggerBlocking {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            critical_section::with(|cs| {
                if let Some(console) = self.0.borrow_ref_mut(cs).as_mut() {
                    // Writes to the console are infallible.
                    let _ = write!(console, "{} - {}\r\n", record.level(), record.args());
                }
            })
        }

        fn flush(&self) {
            critical_section::with(|cs| {
                if let Some(console) = self.0.borrow_ref_mut(cs).as_mut() {
                    console.flush();
                }
            });
        }
    }
}
