//! # Polled UART console
//!
//! Transmit-only console on a PS UART which was already configured by the boot loader. It is
//! used as the report console of the sampler and as the sink of the blocking logger.
use core::convert::Infallible;

use crate::regs::uart::{Fifo, MmioUart, UART_1_BASE_ADDR, Uart};

pub struct UartConsole {
    regs: MmioUart<'static>,
}

// SAFETY: The console is only used from behind a critical section or by its single owner.
unsafe impl Send for UartConsole {}

impl UartConsole {
    /// Create a console for the UART at the given base address.
    ///
    /// # Safety
    ///
    /// `base_addr` must be the base address of a configured PS UART. This circumvents ownership
    /// checks, so concurrent users of the same UART might interleave their output.
    pub const unsafe fn new_at(base_addr: usize) -> Self {
        Self {
            regs: unsafe { Uart::new_mmio_at(base_addr) },
        }
    }

    /// Console on UART1, which is connected to the USB UART bridge of the Zedboard.
    ///
    /// # Safety
    ///
    /// See [Self::new_at].
    pub const unsafe fn steal_uart1() -> Self {
        unsafe { Self::new_at(UART_1_BASE_ADDR) }
    }

    pub fn write_byte(&mut self, byte: u8) {
        while self.regs.read_sr().tx_full() {
            core::hint::spin_loop();
        }
        self.regs.write_fifo(Fifo::new_with_raw_value(byte as u32));
    }

    /// Write raw bytes without any line ending conversion.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_byte(*byte);
        }
    }

    /// Block until all queued bytes were sent.
    pub fn flush(&mut self) {
        while !self.regs.read_sr().tx_empty() {
            core::hint::spin_loop();
        }
    }
}

impl core::fmt::Write for UartConsole {
    /// Line feeds without a preceding carriage return are expanded to `\r\n`.
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut last = 0u8;
        for byte in s.bytes() {
            if byte == b'\n' && last != b'\r' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
            last = byte;
        }
        Ok(())
    }
}

impl embedded_io::ErrorType for UartConsole {
    type Error = Infallible;
}

impl embedded_io::Write for UartConsole {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UartConsole::flush(self);
        Ok(())
    }
}
