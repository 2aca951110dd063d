//! Counts the expirations of the CPU private timer and shows the count on the eight user LEDs
//! which are connected to the AXI GPIO core.
#![no_std]
#![no_main]

use core::panic::PanicInfo;
use embedded_io::Write;
use log::{error, info};
use zedboard_labs::{CortexA9, halt};
use zynq7000_lab::{
    axi_gpio::AxiGpio,
    config::zedboard,
    counter::{CounterPeripherals, TickCounter, TickSlot, start_periodic_counter},
    gic::{self, BindingTable, Gic},
    log::uart_blocking,
    priv_tim::PrivateTimer,
    regs::gic::GICC_BASE_ADDR,
    uart::UartConsole,
};

use zynq7000_rt as _;

static BINDINGS: BindingTable = BindingTable::new();
static TICK: TickSlot<PrivateTimer, AxiGpio> = TickSlot::new();
static COUNTER: TickCounter = TickCounter::new();

fn on_timer_tick() {
    TICK.on_interrupt();
}

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
    // SAFETY: UART1 was configured by the FSBL and is only used by the logger.
    let mut console = unsafe { UartConsole::steal_uart1() };
    let _ = console.write_all(b"-- Zynq 7000 LED counter --\r\n");
    uart_blocking::init(console, log::LevelFilter::Info);

    let mut gic = Gic::new(&BINDINGS);
    let mut cpu = CortexA9;
    let peripherals = CounterPeripherals {
        timer: PrivateTimer::new(),
        leds: AxiGpio::new(),
        irq: &mut gic,
        cpu: &mut cpu,
    };
    // SAFETY: Not called inside a critical section.
    let result = unsafe {
        start_periodic_counter(
            &zedboard::COUNTER,
            peripherals,
            &TICK,
            &COUNTER,
            on_timer_tick,
        )
    };
    match result {
        Ok(state) => info!("LED counter is {state:?}"),
        Err(fault) => error!("{fault}"),
    }
    // All work is done in the interrupt handler.
    halt();
}

#[unsafe(no_mangle)]
pub extern "C" fn _irq_handler() {
    // SAFETY: Fixed GIC CPU interface address of the Zynq7000.
    unsafe { gic::handle_irq(GICC_BASE_ADDR, &BINDINGS) };
}

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
