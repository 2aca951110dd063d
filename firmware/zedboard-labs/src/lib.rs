//! Board glue shared by the Zedboard lab applications.
#![no_std]

use zynq7000_lab::counter::CpuInterrupts;

/// IRQ exception control of the Cortex-A9 core the application runs on.
pub struct CortexA9;

impl CpuInterrupts for CortexA9 {
    unsafe fn enable(&mut self) {
        unsafe { cortex_ar::interrupt::enable() };
    }
}

/// Park the core.
pub fn halt() -> ! {
    loop {
        cortex_ar::asm::nop();
    }
}
