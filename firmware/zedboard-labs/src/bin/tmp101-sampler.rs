//! Reads the TMP101 on the PS I2C controller and the TMP101 on the I2C controller in the
//! programmable logic and prints both temperatures on UART1.
#![no_std]
#![no_main]

use core::panic::PanicInfo;
use embedded_io::Write;
use log::error;
use zedboard_labs::halt;
use zynq7000_lab::{
    config::zedboard, i2c::PsI2c, log::uart_blocking, sampler::SamplingLoop, uart::UartConsole,
};

use zynq7000_rt as _;

/// Entry point (not called like a normal main function)
#[unsafe(no_mangle)]
pub extern "C" fn boot_core(cpu_id: u32) -> ! {
    if cpu_id != 0 {
        panic!("unexpected CPU ID {}", cpu_id);
    }
    main();
}

#[unsafe(export_name = "main")]
pub fn main() -> ! {
    // SAFETY: UART1 was configured by the FSBL. The report console and the logger share the
    // UART, both only write complete lines.
    let mut console = unsafe { UartConsole::steal_uart1() };
    let _ = console.write_all(b"-- Zynq 7000 TMP101 sampler --\r\n");
    uart_blocking::init(
        unsafe { UartConsole::steal_uart1() },
        log::LevelFilter::Info,
    );

    let buses = [
        PsI2c::new(zedboard::CPU_1X_CLOCK),
        PsI2c::new(zedboard::CPU_1X_CLOCK),
    ];
    let mut sampler = SamplingLoop::start(&zedboard::SAMPLER, buses, console);
    sampler.run()
}

#[unsafe(no_mangle)]
pub extern "C" fn _irq_handler() {}

#[unsafe(no_mangle)]
pub extern "C" fn _abort_handler() {
    halt();
}

#[unsafe(no_mangle)]
pub extern "C" fn _undefined_handler() {
    halt();
}

#[unsafe(no_mangle)]
pub extern "C" fn _prefetch_handler() {
    halt();
}

/// Panic handler
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    error!("Panic: {info:?}");
    halt();
}
