//! CPU private timer register module.
//!
//! Register names follow the Cortex-A9 MPCore TRM chapter 4.1: load, counter, control and
//! interrupt status.

pub const CPU_PRIV_TIM_BASE_ADDR: usize = super::MPCORE_BASE_ADDR + 0x0000_0600;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct Control {
    /// The timer clock is divided by this value + 1.
    #[bits(8..=15, rw)]
    prescaler: u8,
    #[bit(2, rw)]
    irq_enable: bool,
    /// Reload the counter from the load register when it reaches zero.
    #[bit(1, rw)]
    auto_reload: bool,
    #[bit(0, rw)]
    timer_enable: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct InterruptStatus {
    /// Set when the counter reached zero. Cleared by writing a one.
    #[bit(0, rw)]
    event_flag: bool,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct PrivateTimer {
    /// Writing the load register also writes the counter register.
    load: u32,
    #[mmio(PureRead)]
    counter: u32,
    control: Control,
    #[mmio(PureRead, Write)]
    isr: InterruptStatus,
}

static_assertions::const_assert_eq!(core::mem::size_of::<PrivateTimer>(), 0x10);
